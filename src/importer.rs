use std::path::Path;

use rusqlite::Connection;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::db::{company_exists, Ledger};
use crate::error::{FpnaError, Result};
use crate::source::ItemFamily;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a ledger amount; accepts `$`, thousands separators and `(123)` negatives.
/// A blank cell is `None`; anything else that is not a number is an error.
pub fn parse_amount(raw: &str, line: usize) -> Result<Option<f64>> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let parsed = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => inner.trim().parse::<f64>().map(|v| -v),
        None => s.parse::<f64>(),
    };
    match parsed {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(FpnaError::Other(format!("line {line}: invalid amount '{raw}'"))),
    }
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawFigure {
    company: String,
    year: i32,
    period: u32,
    name: String,
    kind: String,
    #[serde(default)]
    value: String,
}

/// One per-period figure destined for the actuals or budgets table.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub company: String,
    pub year: i32,
    pub period: u32,
    pub name: String,
    pub family: ItemFamily,
    pub value: Option<f64>,
}

/// Read `company,year,period,name,kind,value` rows.
pub fn parse_figures(file_path: &Path) -> Result<Vec<Figure>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let mut figures = Vec::new();
    for (i, result) in rdr.deserialize::<RawFigure>().enumerate() {
        let raw = result?;
        let line = i + 2;
        if !(1..=12).contains(&raw.period) {
            return Err(FpnaError::InvalidPeriod(format!(
                "line {line}: period {} outside 1..=12",
                raw.period
            )));
        }
        let family = ItemFamily::from_key(&raw.kind.to_lowercase()).ok_or_else(|| {
            FpnaError::Other(format!(
                "line {line}: kind must be 'account' or 'metric', got '{}'",
                raw.kind
            ))
        })?;
        if raw.name.is_empty() {
            return Err(FpnaError::Other(format!("line {line}: missing name")));
        }
        figures.push(Figure {
            company: raw.company,
            year: raw.year,
            period: raw.period,
            name: raw.name,
            family,
            value: parse_amount(&raw.value, line)?,
        });
    }
    Ok(figures)
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportResult {
    pub imported: usize,
    pub duplicate_file: bool,
}

pub fn import_file(conn: &Connection, file_path: &Path, ledger: Ledger) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND ledger = ?2")?;
        if stmt.exists(rusqlite::params![checksum, ledger.key()])? {
            return Ok(ImportResult {
                imported: 0,
                duplicate_file: true,
            });
        }
    }

    let figures = parse_figures(file_path)?;
    for figure in &figures {
        if !company_exists(conn, &figure.company)? {
            return Err(FpnaError::UnknownCompany(figure.company.clone()));
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, ledger, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            ledger.key(),
            figures.len() as i64,
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (company_id, year, period, name, item_kind, value, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            ledger.table()
        ))?;
        for f in &figures {
            stmt.execute(rusqlite::params![
                f.company,
                f.year,
                f.period,
                f.name,
                f.family.key(),
                f.value,
                import_id,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(
        file = %file_path.display(),
        ledger = ledger.key(),
        figures = figures.len(),
        "imported figures"
    );
    Ok(ImportResult {
        imported: figures.len(),
        duplicate_file: false,
    })
}
