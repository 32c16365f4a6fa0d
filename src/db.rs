use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS actuals (
    id INTEGER PRIMARY KEY,
    company_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    period INTEGER NOT NULL CHECK (period BETWEEN 1 AND 12),
    name TEXT NOT NULL,
    item_kind TEXT NOT NULL CHECK (item_kind IN ('account', 'metric')),
    value REAL,
    import_id INTEGER,
    FOREIGN KEY (company_id) REFERENCES companies(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY,
    company_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    period INTEGER NOT NULL CHECK (period BETWEEN 1 AND 12),
    name TEXT NOT NULL,
    item_kind TEXT NOT NULL CHECK (item_kind IN ('account', 'metric')),
    value REAL,
    import_id INTEGER,
    FOREIGN KEY (company_id) REFERENCES companies(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_actuals_lookup ON actuals (item_kind, company_id, year, period);
CREATE INDEX IF NOT EXISTS idx_budgets_lookup ON budgets (item_kind, company_id, year, period);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    ledger TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT
);
";

const DEFAULT_COMPANIES: &[&str] = &["AFP"];

/// Figures are kept in one table per ledger; the aggregates are derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ledger {
    Actual,
    Budget,
}

impl Ledger {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Actual => "actuals",
            Self::Budget => "budgets",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Budget => "budget",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "actual" | "actuals" => Some(Self::Actual),
            "budget" | "budgets" => Some(Self::Budget),
            _ => None,
        }
    }
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM companies", [], |row| row.get(0))?;
    if count == 0 {
        for id in DEFAULT_COMPANIES {
            add_company(conn, id)?;
        }
    }
    Ok(())
}

pub fn add_company(conn: &Connection, id: &str) -> Result<bool> {
    let inserted = conn.execute("INSERT OR IGNORE INTO companies (id) VALUES (?1)", [id])?;
    Ok(inserted > 0)
}

pub fn company_exists(conn: &Connection, id: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM companies WHERE id = ?1")?;
    Ok(stmt.exists([id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["companies", "actuals", "budgets", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM companies", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_init_db_seeds_default_company() {
        let (_dir, conn) = test_db();
        assert!(company_exists(&conn, "AFP").unwrap());
        assert!(!company_exists(&conn, "afp").unwrap());
    }

    #[test]
    fn test_add_company_ignores_existing() {
        let (_dir, conn) = test_db();
        assert!(add_company(&conn, "Company1").unwrap());
        assert!(!add_company(&conn, "Company1").unwrap());
    }

    #[test]
    fn test_period_check_constraint() {
        let (_dir, conn) = test_db();
        let result = conn.execute(
            "INSERT INTO actuals (company_id, year, period, name, item_kind, value) \
             VALUES ('AFP', 2025, 13, 'Net Sales', 'metric', 1.0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ledger_keys() {
        assert_eq!(Ledger::from_key("actual"), Some(Ledger::Actual));
        assert_eq!(Ledger::from_key("budgets"), Some(Ledger::Budget));
        assert_eq!(Ledger::from_key("forecast"), None);
        assert_eq!(Ledger::Budget.table(), "budgets");
    }
}
