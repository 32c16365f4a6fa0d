use std::collections::BTreeSet;

use rusqlite::types::Value;
use rusqlite::Connection;

use crate::db::Ledger;
use crate::error::{FpnaError, Result};
use crate::period::PeriodRange;
use crate::source::{CompanyDirectory, DataSource, DatasetKind, Measure, RecordValue, SourceRecord};

/// Aggregate queries over the `actuals` and `budgets` tables.
///
/// Actual and budget datasets sum the range; averages divide that sum by the
/// number of periods in the range; variance is actual minus budget.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn query(
        &self,
        kind: DatasetKind,
        range: &PeriodRange,
        names: Option<&BTreeSet<String>>,
    ) -> rusqlite::Result<Vec<SourceRecord>> {
        let mut params: Vec<Value> = vec![
            Value::Text(kind.family().key().to_string()),
            Value::Integer(range.start_ordinal()),
            Value::Integer(range.end_ordinal()),
        ];
        let companies = placeholders(&mut params, range.company_ids.iter());
        let mut clause = format!(
            "item_kind = ?1 AND (year * 12 + period - 1) >= ?2 AND (year * 12 + period - 1) < ?3 \
             AND company_id IN ({companies})"
        );
        if let Some(names) = names {
            if names.is_empty() {
                return Ok(Vec::new());
            }
            let names = placeholders(&mut params, names.iter());
            clause.push_str(&format!(" AND name IN ({names})"));
        }

        let sql = match kind.measure() {
            Measure::Actual | Measure::Budget => {
                let table = if kind.measure() == Measure::Actual {
                    Ledger::Actual.table()
                } else {
                    Ledger::Budget.table()
                };
                format!(
                    "SELECT name, SUM(value) FROM {table} WHERE {clause} \
                     GROUP BY name ORDER BY name"
                )
            }
            Measure::Average => {
                params.push(Value::Real(range.period_count() as f64));
                let divisor = params.len();
                format!(
                    "SELECT name, SUM(value) / ?{divisor} FROM actuals WHERE {clause} \
                     GROUP BY name ORDER BY name"
                )
            }
            Measure::Variance => format!(
                "SELECT name, SUM(signed) FROM ( \
                     SELECT name, value AS signed FROM actuals WHERE {clause} \
                     UNION ALL \
                     SELECT name, -value AS signed FROM budgets WHERE {clause} \
                 ) GROUP BY name ORDER BY name"
            ),
        };

        let measure = kind.measure();
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok(SourceRecord::new(
                    row.get::<_, String>(0)?,
                    RecordValue::for_measure(measure, row.get::<_, Option<f64>>(1)?),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

/// Append `values` to `params` and return the matching `?N, ?M, ...` list.
fn placeholders<'a>(params: &mut Vec<Value>, values: impl Iterator<Item = &'a String>) -> String {
    let mut slots = Vec::new();
    for v in values {
        params.push(Value::Text(v.clone()));
        slots.push(format!("?{}", params.len()));
    }
    slots.join(", ")
}

impl DataSource for SqliteStore<'_> {
    fn fetch(
        &self,
        kind: DatasetKind,
        range: &PeriodRange,
        names: Option<&BTreeSet<String>>,
    ) -> Result<Vec<SourceRecord>> {
        let records = self.query(kind, range, names).map_err(|e| FpnaError::Fetch {
            kind,
            source: Box::new(e),
        })?;
        tracing::debug!(%kind, %range, records = records.len(), "fetched dataset");
        Ok(records)
    }
}

impl CompanyDirectory for SqliteStore<'_> {
    fn list_companies(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT id FROM companies ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
