use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{add_company, company_exists};
use crate::error::{FpnaError, Result};
use crate::settings::{load_settings, save_settings};
use crate::source::CompanyDirectory;
use crate::store::SqliteStore;

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let selected = load_settings().selected_company;
    let ids = SqliteStore::new(&conn).list_companies()?;

    let mut table = Table::new();
    table.set_header(vec!["Company", "Selected"]);
    for id in ids {
        let mark = if id == selected { "*" } else { "" };
        table.add_row(vec![Cell::new(id), Cell::new(mark)]);
    }
    println!("Companies\n{table}");
    Ok(())
}

pub fn add(id: &str) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(FpnaError::Other("Company id cannot be empty".to_string()));
    }
    let conn = open_db()?;
    if add_company(&conn, id)? {
        println!("Added company: {id}");
    } else {
        println!("Company already exists: {id}");
    }
    Ok(())
}

pub fn select(company: &str) -> Result<()> {
    let conn = open_db()?;
    if !company_exists(&conn, company)? {
        return Err(FpnaError::UnknownCompany(company.to_string()));
    }
    let mut settings = load_settings();
    settings.selected_company = company.to_string();
    save_settings(&settings)?;
    println!("Selected {company}");
    Ok(())
}
