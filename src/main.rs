use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use scout_insights::config::{ConfigOverrides, PipelineConfig};
use scout_insights::logging;
use scout_insights::pipeline::{self, RunSummary, Stages};
use scout_insights::synthetic::{self, SyntheticSpec};
use scout_insights::tables::{RawTables, write_csv_dir};

#[derive(Debug, Parser)]
#[command(
    name = "scout_insights",
    version,
    about = "Promising players, role heatmaps and opponent performance from soccer history tables"
)]
struct Cli {
    /// JSON config file; environment and flags override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Role datasets and heatmaps for the allow-listed players.
    Players,
    /// Target team's results against every opponent.
    Teams,
    /// Promising young players; writes the allow-list.
    Scan,
    /// Scan, then players with the scan's allow-list, then teams.
    All,
    /// Run everything on a generated league.
    Demo {
        #[arg(long, default_value_t = 8558)]
        seed: u64,
        #[arg(long, default_value_t = 12)]
        teams: usize,
        /// Also write the generated tables as CSV into this directory.
        #[arg(long)]
        write_data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let mut cfg = PipelineConfig::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut cfg)?;
    logging::init(&cfg.log_level, cfg.log_format);

    let summary = match cli.command {
        Command::Players => run_loaded(&cfg, Stages {
            scan: false,
            players: true,
            teams: false,
        })?,
        Command::Teams => run_loaded(&cfg, Stages {
            scan: false,
            players: false,
            teams: true,
        })?,
        Command::Scan => run_loaded(&cfg, Stages {
            scan: true,
            players: false,
            teams: false,
        })?,
        Command::All => run_loaded(&cfg, Stages::ALL)?,
        Command::Demo {
            seed,
            teams,
            write_data,
        } => {
            let tables = synthetic::generate(SyntheticSpec {
                seed,
                teams,
                ..Default::default()
            });
            if let Some(dir) = write_data {
                write_csv_dir(&dir, &RawTables::from_tables(&tables))?;
                println!("Demo tables: {}", dir.display());
            }
            pipeline::run(&tables, &cfg, Stages::ALL)?
        }
    };

    println!("Wrote {} file(s) to {}", summary.files.len(), cfg.out_dir.display());
    for path in &summary.files {
        println!("  {}", path.display());
    }
    if summary.join_issues > 0 {
        println!("Unmatched join keys: {}", summary.join_issues);
    }
    Ok(())
}

fn run_loaded(cfg: &PipelineConfig, stages: Stages) -> Result<RunSummary> {
    let tables = pipeline::load_tables(cfg)?;
    pipeline::run(&tables, cfg, stages)
}
