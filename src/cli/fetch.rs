use std::collections::BTreeSet;

use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_db;
use crate::error::{FpnaError, Result};
use crate::fmt::accounting_format;
use crate::period::PeriodRange;
use crate::settings::load_settings;
use crate::source::{kind_by_key, CompanyDirectory, DataSource, ALL_KINDS};
use crate::store::SqliteStore;

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| FpnaError::InvalidPeriod(format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Explicit companies as given; otherwise the selected company, or the first
/// listed one when the selection is no longer in the directory.
fn resolve_scope(companies: Vec<String>, selected: &str, known: &[String]) -> BTreeSet<String> {
    if !companies.is_empty() {
        return companies.into_iter().collect();
    }
    if known.iter().any(|id| id == selected) {
        return BTreeSet::from([selected.to_string()]);
    }
    match known.first() {
        Some(first) => {
            tracing::warn!(selected, fallback = %first, "selected company not found, using first listed");
            BTreeSet::from([first.clone()])
        }
        None => BTreeSet::from([selected.to_string()]),
    }
}

pub(crate) fn company_scope<D: CompanyDirectory>(
    companies: Vec<String>,
    directory: &D,
) -> Result<BTreeSet<String>> {
    let known = directory.list_companies()?;
    Ok(resolve_scope(companies, &load_settings().selected_company, &known))
}

pub fn run(kind: &str, from: &str, to: &str, companies: Vec<String>) -> Result<()> {
    let kind = kind_by_key(kind).ok_or_else(|| {
        let known: Vec<&str> = ALL_KINDS.iter().map(|k| k.key()).collect();
        FpnaError::Other(format!("Unknown dataset '{kind}'. Expected one of: {}", known.join(", ")))
    })?;
    let (start, end) = (parse_date(from)?, parse_date(to)?);

    let conn = open_db()?;
    let store = SqliteStore::new(&conn);
    let range = PeriodRange::from_dates(start, end, company_scope(companies, &store)?)?;
    let known = store.list_companies()?;
    if let Some(unknown) = range.company_ids.iter().find(|id| !known.contains(id)) {
        return Err(FpnaError::UnknownCompany(unknown.clone()));
    }

    let records = store.fetch(kind, &range, None)?;

    let mut table = Table::new();
    table.set_header(vec!["Name", "Value"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.key),
            Cell::new(accounting_format(record.value.get())).set_alignment(CellAlignment::Right),
        ]);
    }
    let periods: Vec<String> = range.periods().iter().map(|(y, p)| format!("{y}-{p:02}")).collect();
    println!("{kind} for {}\n{table}", periods.join(", "));
    println!("{} records", records.len());
    Ok(())
}
