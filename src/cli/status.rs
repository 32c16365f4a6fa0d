use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{db_path, load_settings};

fn count(conn: &rusqlite::Connection, table: &str) -> Result<i64> {
    Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Company:    {}", settings.selected_company);
    match settings.reporting_period() {
        Ok(period) => println!("Period:     {}", period.label()),
        Err(e) => println!("Period:     (invalid: {e})"),
    }
    println!(
        "Template:   {}",
        settings.template_path.as_deref().unwrap_or("(bundled)")
    );

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        println!();
        println!("Companies:  {}", count(&conn, "companies")?);
        println!("Actuals:    {}", count(&conn, "actuals")?);
        println!("Budgets:    {}", count(&conn, "budgets")?);
        println!("Imports:    {}", count(&conn, "imports")?);
    } else {
        println!();
        println!("Database not found. Run `fpna init` to set up.");
    }

    Ok(())
}
