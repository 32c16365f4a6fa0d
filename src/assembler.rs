use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{FpnaError, Result};
use crate::index::DatasetIndex;
use crate::source::{DatasetKind, ItemFamily, Measure};
use crate::template::{LineItemKind, LineItemSpec, PercentBasis};

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    PriorActual,
    CurrentActual,
    CurrentBudget,
    CurrentAverage,
    NextBudget,
    Variance,
}

pub const ALL_COLUMNS: [Column; 6] = [
    Column::PriorActual,
    Column::CurrentActual,
    Column::CurrentBudget,
    Column::CurrentAverage,
    Column::NextBudget,
    Column::Variance,
];

impl Column {
    /// The only dataset measure allowed to feed this column.
    pub fn measure(&self) -> Measure {
        match self {
            Self::PriorActual | Self::CurrentActual => Measure::Actual,
            Self::CurrentBudget | Self::NextBudget => Measure::Budget,
            Self::CurrentAverage => Measure::Average,
            Self::Variance => Measure::Variance,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::PriorActual => "prior_actual",
            Self::CurrentActual => "current_actual",
            Self::CurrentBudget => "current_budget",
            Self::CurrentAverage => "current_average",
            Self::NextBudget => "next_budget",
            Self::Variance => "variance",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One resolved value per comparison column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Columns {
    pub prior_actual: f64,
    pub current_actual: f64,
    pub current_budget: f64,
    pub current_average: f64,
    pub next_budget: f64,
    pub variance: f64,
}

impl Columns {
    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::PriorActual => self.prior_actual,
            Column::CurrentActual => self.current_actual,
            Column::CurrentBudget => self.current_budget,
            Column::CurrentAverage => self.current_average,
            Column::NextBudget => self.next_budget,
            Column::Variance => self.variance,
        }
    }

    fn set(&mut self, column: Column, value: f64) {
        let slot = match column {
            Column::PriorActual => &mut self.prior_actual,
            Column::CurrentActual => &mut self.current_actual,
            Column::CurrentBudget => &mut self.current_budget,
            Column::CurrentAverage => &mut self.current_average,
            Column::NextBudget => &mut self.next_budget,
            Column::Variance => &mut self.variance,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub kind: LineItemKind,
    pub group: Option<String>,
    pub is_group_header: bool,
    pub columns: Columns,
}

// ---------------------------------------------------------------------------
// Index wiring
// ---------------------------------------------------------------------------

/// The account and metric indices feeding each column of one assembly.
#[derive(Debug, Default)]
pub struct StatementIndices {
    indices: HashMap<(Column, ItemFamily), DatasetIndex>,
}

impl StatementIndices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `index` to `column`. The index's measure must match the column.
    pub fn insert(&mut self, column: Column, index: DatasetIndex) -> Result<()> {
        let kind = index.kind();
        if kind.measure() != column.measure() {
            return Err(FpnaError::IndexKindMismatch { column, kind });
        }
        self.indices.insert((column, kind.family()), index);
        Ok(())
    }

    pub fn get(&self, column: Column, family: ItemFamily) -> Option<&DatasetIndex> {
        self.indices.get(&(column, family))
    }

    fn require(&self, column: Column, family: ItemFamily) -> Result<&DatasetIndex> {
        self.get(column, family).ok_or(FpnaError::MissingIndexKind {
            column,
            kind: DatasetKind::of(column.measure(), family),
        })
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Merge every index into one row per line item, in template order.
///
/// Account and metric rows read their own family's index for each column; a name
/// with no record reads as zero. Group headers carry whatever the dataset holds
/// for their name. Percentage rows with a basis are computed from the resolved
/// numerator and denominator rows, otherwise they stay zero placeholders.
pub fn assemble(items: &[LineItemSpec], indices: &StatementIndices) -> Result<Vec<ReportRow>> {
    for family in [ItemFamily::Account, ItemFamily::Metric] {
        if items.iter().any(|i| i.kind.family() == Some(family)) {
            for column in ALL_COLUMNS {
                indices.require(column, family)?;
            }
        }
    }

    let mut resolved: HashMap<&str, Columns> = HashMap::new();
    let mut values: Vec<Columns> = Vec::with_capacity(items.len());
    for item in items {
        let columns = match item.kind.family() {
            Some(family) => {
                let mut columns = Columns::default();
                for column in ALL_COLUMNS {
                    columns.set(column, indices.require(column, family)?.value_of(&item.name));
                }
                resolved.insert(item.name.as_str(), columns);
                columns
            }
            None => Columns::default(),
        };
        values.push(columns);
    }

    let mut placeholders = 0usize;
    let mut rows = Vec::with_capacity(items.len());
    for (item, mut columns) in items.iter().zip(values) {
        if item.kind == LineItemKind::Percentage {
            match &item.basis {
                Some(basis) => columns = percentage_columns(&item.name, basis, &resolved)?,
                None => {
                    placeholders += 1;
                    tracing::debug!(row = %item.name, "percentage row has no basis, left at zero");
                }
            }
        }
        rows.push(ReportRow {
            name: item.name.clone(),
            kind: item.kind,
            group: item.group.clone(),
            is_group_header: item.is_group_header,
            columns,
        });
    }

    tracing::info!(rows = rows.len(), placeholders, "assembled statement");
    Ok(rows)
}

fn percentage_columns(
    row: &str,
    basis: &PercentBasis,
    resolved: &HashMap<&str, Columns>,
) -> Result<Columns> {
    let lookup = |name: &str| {
        resolved.get(name).copied().ok_or_else(|| {
            FpnaError::Template(format!("percentage row '{row}' refers to unknown line item '{name}'"))
        })
    };
    let numerator = lookup(&basis.numerator)?;
    let denominator = lookup(&basis.denominator)?;

    let mut columns = Columns::default();
    for column in ALL_COLUMNS {
        columns.set(column, percent(numerator.get(column), denominator.get(column)));
    }
    // Percentage points between actual and budget share, not a ratio of variances.
    columns.variance = columns.current_actual - columns.current_budget;
    Ok(columns)
}

fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}
