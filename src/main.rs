mod assembler;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod index;
mod period;
mod report;
mod settings;
mod source;
mod store;
mod template;

use clap::Parser;

use cli::{Cli, Commands, CompaniesCommands, PeriodCommands};

/// Diagnostics go to stderr so report output on stdout stays clean.
/// `RUST_LOG` overrides the default `fpna=warn`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fpna=warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Companies { command } => match command {
            CompaniesCommands::List => cli::companies::list(),
            CompaniesCommands::Add { id } => cli::companies::add(&id),
        },
        Commands::Select { company } => cli::companies::select(&company),
        Commands::Period { command } => match command {
            PeriodCommands::Show => cli::period::show(),
            PeriodCommands::Set { year, month } => cli::period::set(year, month),
            PeriodCommands::Roll => cli::period::roll(),
        },
        Commands::Import { file, ledger } => cli::import::run(&file, &ledger),
        Commands::Fetch {
            kind,
            from,
            to,
            companies,
        } => cli::fetch::run(&kind, &from, &to, companies),
        Commands::Report {
            companies,
            year,
            quarter,
            period,
            format,
            template,
        } => cli::report::run(cli::report::ReportArgs {
            companies,
            year,
            quarter,
            period,
            format,
            template,
        })
        .map(|out| println!("{out}")),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
