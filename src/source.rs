use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::period::PeriodRange;

/// Granularity of a line item: raw ledger account or pre-aggregated metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFamily {
    Account,
    Metric,
}

impl ItemFamily {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Metric => "metric",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "account" => Some(Self::Account),
            "metric" => Some(Self::Metric),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset kinds: one per aggregate the data store exposes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DatasetKind {
    ActualAccount,
    ActualMetric,
    BudgetAccount,
    BudgetMetric,
    VarianceAccount,
    VarianceMetric,
    AverageAccount,
    AverageMetric,
}

/// What a dataset measures, independent of granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Actual,
    Budget,
    Variance,
    Average,
}

pub const ALL_KINDS: &[DatasetKind] = &[
    DatasetKind::ActualAccount,
    DatasetKind::ActualMetric,
    DatasetKind::BudgetAccount,
    DatasetKind::BudgetMetric,
    DatasetKind::VarianceAccount,
    DatasetKind::VarianceMetric,
    DatasetKind::AverageAccount,
    DatasetKind::AverageMetric,
];

impl DatasetKind {
    pub fn of(measure: Measure, family: ItemFamily) -> Self {
        match (measure, family) {
            (Measure::Actual, ItemFamily::Account) => Self::ActualAccount,
            (Measure::Actual, ItemFamily::Metric) => Self::ActualMetric,
            (Measure::Budget, ItemFamily::Account) => Self::BudgetAccount,
            (Measure::Budget, ItemFamily::Metric) => Self::BudgetMetric,
            (Measure::Variance, ItemFamily::Account) => Self::VarianceAccount,
            (Measure::Variance, ItemFamily::Metric) => Self::VarianceMetric,
            (Measure::Average, ItemFamily::Account) => Self::AverageAccount,
            (Measure::Average, ItemFamily::Metric) => Self::AverageMetric,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::ActualAccount => "actual-account",
            Self::ActualMetric => "actual-metric",
            Self::BudgetAccount => "budget-account",
            Self::BudgetMetric => "budget-metric",
            Self::VarianceAccount => "variance-account",
            Self::VarianceMetric => "variance-metric",
            Self::AverageAccount => "average-account",
            Self::AverageMetric => "average-metric",
        }
    }

    pub fn measure(&self) -> Measure {
        match self {
            Self::ActualAccount | Self::ActualMetric => Measure::Actual,
            Self::BudgetAccount | Self::BudgetMetric => Measure::Budget,
            Self::VarianceAccount | Self::VarianceMetric => Measure::Variance,
            Self::AverageAccount | Self::AverageMetric => Measure::Average,
        }
    }

    pub fn family(&self) -> ItemFamily {
        match self {
            Self::ActualAccount
            | Self::BudgetAccount
            | Self::VarianceAccount
            | Self::AverageAccount => ItemFamily::Account,
            Self::ActualMetric
            | Self::BudgetMetric
            | Self::VarianceMetric
            | Self::AverageMetric => ItemFamily::Metric,
        }
    }

    /// Whether a record's value variant belongs in a dataset of this kind.
    pub fn accepts(&self, value: &RecordValue) -> bool {
        matches!(
            (self.measure(), value),
            (Measure::Actual | Measure::Budget, RecordValue::Point(_))
                | (Measure::Average, RecordValue::Average(_))
                | (Measure::Variance, RecordValue::Variance(_))
        )
    }
}

pub fn kind_by_key(key: &str) -> Option<DatasetKind> {
    ALL_KINDS.iter().find(|k| k.key() == key).copied()
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The single meaningful number a record carries, tagged by dataset measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordValue {
    /// Actual or budget amount.
    Point(Option<f64>),
    Average(Option<f64>),
    Variance(Option<f64>),
}

impl RecordValue {
    pub fn get(&self) -> Option<f64> {
        match *self {
            Self::Point(v) | Self::Average(v) | Self::Variance(v) => v,
        }
    }

    pub fn for_measure(measure: Measure, value: Option<f64>) -> Self {
        match measure {
            Measure::Actual | Measure::Budget => Self::Point(value),
            Measure::Average => Self::Average(value),
            Measure::Variance => Self::Variance(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    pub key: String,
    pub value: RecordValue,
}

impl SourceRecord {
    pub fn new(key: impl Into<String>, value: RecordValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// External contracts
// ---------------------------------------------------------------------------

/// Storage-side aggregate queries consumed by the statement builder.
///
/// `names` narrows the result to the given line items; `None` means every name
/// the store knows for that kind. Implementations return at most one record per
/// key and report failures as `FpnaError::Fetch`.
pub trait DataSource {
    fn fetch(
        &self,
        kind: DatasetKind,
        range: &PeriodRange,
        names: Option<&BTreeSet<String>>,
    ) -> Result<Vec<SourceRecord>>;
}

pub trait CompanyDirectory {
    /// Company ids, ordered.
    fn list_companies(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_keys_roundtrip() {
        for kind in ALL_KINDS {
            assert_eq!(kind_by_key(kind.key()), Some(*kind));
            assert_eq!(DatasetKind::of(kind.measure(), kind.family()), *kind);
        }
        assert_eq!(kind_by_key("actual_account"), None);
    }

    #[test]
    fn test_kind_accepts_matching_variant() {
        assert!(DatasetKind::ActualAccount.accepts(&RecordValue::Point(Some(1.0))));
        assert!(DatasetKind::BudgetMetric.accepts(&RecordValue::Point(None)));
        assert!(DatasetKind::AverageMetric.accepts(&RecordValue::Average(Some(1.0))));
        assert!(DatasetKind::VarianceAccount.accepts(&RecordValue::Variance(None)));
        assert!(!DatasetKind::ActualMetric.accepts(&RecordValue::Average(Some(1.0))));
        assert!(!DatasetKind::AverageAccount.accepts(&RecordValue::Point(Some(1.0))));
    }
}
