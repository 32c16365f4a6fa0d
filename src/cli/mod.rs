pub mod companies;
pub mod fetch;
pub mod import;
pub mod init;
pub mod period;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{FpnaError, Result};
use crate::settings::db_path;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(FpnaError::Settings(format!(
            "No database found at {}\nRun `fpna init` to create one.",
            path.display()
        )));
    }
    get_connection(&path)
}

#[derive(Parser)]
#[command(name = "fpna", about = "Budget-vs-actual financial statements from period ledgers.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for fpna data (default: ~/Documents/fpna)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage the company directory.
    Companies {
        #[command(subcommand)]
        command: CompaniesCommands,
    },
    /// Make a company the default report scope.
    Select {
        /// Company id, e.g. 'AFP'
        company: String,
    },
    /// Show or move the current reporting month.
    Period {
        #[command(subcommand)]
        command: PeriodCommands,
    },
    /// Import actual or budget figures from a CSV file.
    Import {
        /// CSV with columns company,year,period,name,kind,value
        file: String,
        /// Ledger to load: actual or budget
        #[arg(long)]
        ledger: String,
    },
    /// List the raw records of one dataset for a date window.
    Fetch {
        /// Dataset kind, e.g. actual-metric or variance-account
        kind: String,
        /// First day of the window: YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// End of the window (its month is excluded): YYYY-MM-DD
        #[arg(long)]
        to: String,
        /// Company id; repeat for several (default: selected company)
        #[arg(long = "company")]
        companies: Vec<String>,
    },
    /// Build the budget-vs-actual statement.
    Report {
        /// Company id; repeat for several (default: selected company)
        #[arg(long = "company")]
        companies: Vec<String>,
        /// Fiscal year (default: current reporting year)
        #[arg(long)]
        year: Option<i32>,
        /// Quarter 1-4 to report on
        #[arg(long, conflicts_with = "period")]
        quarter: Option<u32>,
        /// First period of the current column, 1-12
        #[arg(long)]
        period: Option<u32>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Line-item template JSON (default: bundled layout)
        #[arg(long)]
        template: Option<String>,
    },
    /// Show settings, database location and row counts.
    Status,
}

#[derive(Subcommand)]
pub enum CompaniesCommands {
    /// List all companies.
    List,
    /// Add a company.
    Add {
        /// Company id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PeriodCommands {
    /// Print the current reporting month.
    Show,
    /// Set the current reporting month.
    Set {
        #[arg(long)]
        year: i32,
        /// Month 1-12
        #[arg(long)]
        month: u32,
    },
    /// Advance the reporting month by one.
    Roll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
