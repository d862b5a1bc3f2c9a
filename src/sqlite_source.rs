use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params};
use tracing::debug;

use crate::model::Tables;
use crate::tables::{
    MATCH_TABLE, PLAYER_ATTRIBUTES_TABLE, PLAYER_TABLE, POSITION_REFERENCE_TABLE,
    POSSESSION_TABLE, RawTable, RawTables, SHOTS_OFF_TABLE, SHOTS_ON_TABLE, TEAM_ATTRIBUTES_TABLE,
    TEAM_TABLE,
};

pub fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("open sqlite db {}", path.display()))
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .with_context(|| format!("look up table {name}"))?;
    Ok(count > 0)
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => None,
    }
}

/// Every row of `name`, in rowid order, with values rendered as text.
pub fn read_table(conn: &Connection, name: &str) -> Result<RawTable> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{name}\""))
        .with_context(|| format!("prepare select from {name}"))?;
    let headers: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = headers.len();
    let rows = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(value_text(row.get_ref(idx)?));
            }
            Ok(values)
        })
        .with_context(|| format!("query {name}"))?;

    let mut table = RawTable::new(name, headers);
    for row in rows {
        table
            .rows
            .push(row.with_context(|| format!("decode {name} row"))?);
    }
    debug!(table = name, rows = table.rows.len(), "read sqlite table");
    Ok(table)
}

fn optional_table(conn: &Connection, name: &str) -> Result<Option<RawTable>> {
    if table_exists(conn, name)? {
        read_table(conn, name).map(Some)
    } else {
        Ok(None)
    }
}

/// Load the database layout: the five core tables are required, the rest are optional.
/// The allow-list of names never lives in the database.
pub fn load_sqlite(path: &Path, promising_names: Option<Vec<String>>) -> Result<Tables> {
    let conn = open_read_only(path)?;
    let raw = RawTables {
        matches: read_table(&conn, MATCH_TABLE)?,
        players: read_table(&conn, PLAYER_TABLE)?,
        player_attributes: read_table(&conn, PLAYER_ATTRIBUTES_TABLE)?,
        teams: read_table(&conn, TEAM_TABLE)?,
        team_attributes: read_table(&conn, TEAM_ATTRIBUTES_TABLE)?,
        possession: optional_table(&conn, POSSESSION_TABLE)?,
        shots_on: optional_table(&conn, SHOTS_ON_TABLE)?,
        shots_off: optional_table(&conn, SHOTS_OFF_TABLE)?,
        slot_roles: optional_table(&conn, POSITION_REFERENCE_TABLE)?,
        promising_names,
    };
    raw.into_tables()
        .with_context(|| format!("parse tables from {}", path.display()))
}

/// Store a raw table with every column as TEXT. Used to build databases from CSV exports.
pub fn write_table(conn: &mut Connection, table: &RawTable) -> Result<()> {
    let columns = table
        .headers
        .iter()
        .map(|h| format!("\"{h}\" TEXT"))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.headers.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction().context("begin sqlite transaction")?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS \"{name}\"; CREATE TABLE \"{name}\" ({columns});",
        name = table.name
    ))
    .with_context(|| format!("create table {}", table.name))?;
    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO \"{}\" VALUES ({placeholders})",
                table.name
            ))
            .with_context(|| format!("prepare insert into {}", table.name))?;
        for row in &table.rows {
            let mut values: Vec<Option<&str>> = row.iter().map(|v| v.as_deref()).collect();
            values.resize(table.headers.len(), None);
            stmt.execute(rusqlite::params_from_iter(values))
                .with_context(|| format!("insert into {}", table.name))?;
        }
    }
    tx.commit().context("commit sqlite transaction")?;
    Ok(())
}

/// Create (or replace) a database holding every table of `raw`.
pub fn write_sqlite(path: &Path, raw: &RawTables) -> Result<()> {
    let mut conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    for table in raw.tables() {
        write_table(&mut conn, table)?;
    }
    Ok(())
}
