use std::path::PathBuf;

use crate::cli::open_db;
use crate::db::Ledger;
use crate::error::{FpnaError, Result};
use crate::importer::import_file;

pub fn run(file: &str, ledger: &str) -> Result<()> {
    let ledger = Ledger::from_key(&ledger.to_lowercase()).ok_or_else(|| {
        FpnaError::Other(format!("Unknown ledger '{ledger}': expected actual or budget"))
    })?;
    let file_path = PathBuf::from(file);
    let conn = open_db()?;

    let result = import_file(&conn, &file_path, ledger)?;

    if result.duplicate_file {
        println!("This file has already been imported as {} (duplicate checksum).", ledger.key());
        return Ok(());
    }

    println!("{} {} figures imported", result.imported, ledger.key());
    Ok(())
}
