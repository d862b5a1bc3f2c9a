use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use scout_insights::sqlite_source;
use scout_insights::tables::{self, RawTables};

/// Usage: csv_to_sqlite <csv-dir> <db-path>
fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let [dir, db] = args.as_slice() else {
        return Err(anyhow!("usage: csv_to_sqlite <csv-dir> <db-path>"));
    };
    let dir = PathBuf::from(dir);
    let db = PathBuf::from(db);

    let loaded = tables::load_csv_dir(&dir)
        .with_context(|| format!("load tables from {}", dir.display()))?;
    let raw = RawTables::from_tables(&loaded);
    sqlite_source::write_sqlite(&db, &raw)?;

    println!("SQLite import complete");
    println!("DB: {}", db.display());
    for table in raw.tables() {
        println!("{}: {} rows", table.name, table.rows.len());
    }
    Ok(())
}
