use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{FpnaError, Result};

pub const PERIODS_PER_YEAR: u32 = 12;
pub const PERIODS_PER_QUARTER: u32 = 3;

/// Half-open `[start, end)` range of fiscal periods scoped to a set of companies.
///
/// Periods are always kept inside `1..=12`: a range that ends after December is
/// expressed as ending at period `n` of the following year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start_year: i32,
    pub start_period: u32,
    pub end_year: i32,
    pub end_period: u32,
    pub company_ids: BTreeSet<String>,
}

impl PeriodRange {
    pub fn new(
        start_year: i32,
        start_period: u32,
        end_year: i32,
        end_period: u32,
        company_ids: BTreeSet<String>,
    ) -> Result<Self> {
        check_period(start_period)?;
        check_period(end_period)?;
        if start_year > end_year {
            return Err(FpnaError::InvalidPeriod(format!(
                "start year {start_year} is after end year {end_year}"
            )));
        }
        if ordinal(start_year, start_period) >= ordinal(end_year, end_period) {
            return Err(FpnaError::InvalidPeriod(format!(
                "empty range {start_year}-{start_period:02} .. {end_year}-{end_period:02}"
            )));
        }
        if company_ids.is_empty() {
            return Err(FpnaError::EmptyCompanyScope);
        }
        Ok(Self {
            start_year,
            start_period,
            end_year,
            end_period,
            company_ids,
        })
    }

    /// Range covering `len` periods starting at `(year, period)`.
    pub fn spanning(year: i32, period: u32, len: u32, company_ids: &BTreeSet<String>) -> Result<Self> {
        check_period(period)?;
        let (end_year, end_period) = shift(year, period, len as i32);
        Self::new(year, period, end_year, end_period, company_ids.clone())
    }

    /// Months map to periods; the end date's month is excluded.
    pub fn from_dates(start: NaiveDate, end: NaiveDate, company_ids: BTreeSet<String>) -> Result<Self> {
        Self::new(start.year(), start.month(), end.year(), end.month(), company_ids)
    }

    pub fn start_ordinal(&self) -> i64 {
        ordinal(self.start_year, self.start_period)
    }

    pub fn end_ordinal(&self) -> i64 {
        ordinal(self.end_year, self.end_period)
    }

    pub fn period_count(&self) -> u32 {
        (self.end_ordinal() - self.start_ordinal()) as u32
    }

    /// Every `(year, period)` pair inside the range, in order.
    pub fn periods(&self) -> Vec<(i32, u32)> {
        (0..self.period_count() as i32)
            .map(|i| shift(self.start_year, self.start_period, i))
            .collect()
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02} .. {}-{:02}",
            self.start_year, self.start_period, self.end_year, self.end_period
        )
    }
}

/// Query ranges for each comparison column of the budget-vs-actual statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumns {
    pub prior_actual: PeriodRange,
    pub current_actual: PeriodRange,
    pub current_budget: PeriodRange,
    pub current_average: PeriodRange,
    pub next_budget: PeriodRange,
    pub variance: PeriodRange,
}

/// Derive the six column ranges for the quarter starting at `base_period`.
///
/// The prior column covers the three periods before the base, the next-budget
/// column the three periods after the current quarter.
pub fn derive_columns(
    base_year: i32,
    base_period: u32,
    company_ids: &BTreeSet<String>,
) -> Result<ReportColumns> {
    check_period(base_period)?;
    if company_ids.is_empty() {
        return Err(FpnaError::EmptyCompanyScope);
    }
    let len = PERIODS_PER_QUARTER;
    let (prior_year, prior_period) = shift(base_year, base_period, -(len as i32));
    let (next_year, next_period) = shift(base_year, base_period, len as i32);

    let current = PeriodRange::spanning(base_year, base_period, len, company_ids)?;
    Ok(ReportColumns {
        prior_actual: PeriodRange::spanning(prior_year, prior_period, len, company_ids)?,
        current_actual: current.clone(),
        current_budget: current.clone(),
        current_average: current.clone(),
        next_budget: PeriodRange::spanning(next_year, next_period, len, company_ids)?,
        variance: current,
    })
}

/// First period of a calendar quarter (1..=4).
pub fn quarter_start(quarter: u32) -> Result<u32> {
    match quarter {
        1..=4 => Ok((quarter - 1) * PERIODS_PER_QUARTER + 1),
        q => Err(FpnaError::InvalidPeriod(format!("quarter {q} outside 1..=4"))),
    }
}

/// The month the books are currently open for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        check_period(month)?;
        Ok(Self { year, month })
    }

    pub fn today() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn roll(self) -> Self {
        let (year, month) = shift(self.year, self.month, 1);
        Self { year, month }
    }

    /// First period of the quarter containing this month.
    pub fn quarter_start(self) -> u32 {
        (self.month - 1) / PERIODS_PER_QUARTER * PERIODS_PER_QUARTER + 1
    }

    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }
}

fn check_period(period: u32) -> Result<()> {
    if (1..=PERIODS_PER_YEAR).contains(&period) {
        Ok(())
    } else {
        Err(FpnaError::InvalidPeriod(format!("period {period} outside 1..=12")))
    }
}

fn ordinal(year: i32, period: u32) -> i64 {
    year as i64 * PERIODS_PER_YEAR as i64 + period as i64 - 1
}

fn shift(year: i32, period: u32, delta: i32) -> (i32, u32) {
    let ord = ordinal(year, period) + delta as i64;
    let per_year = PERIODS_PER_YEAR as i64;
    (ord.div_euclid(per_year) as i32, (ord.rem_euclid(per_year) + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn afp() -> BTreeSet<String> {
        BTreeSet::from(["AFP".to_string()])
    }

    fn contains(range: &PeriodRange, year: i32, period: u32) -> bool {
        let ord = ordinal(year, period);
        ord >= range.start_ordinal() && ord < range.end_ordinal()
    }

    #[test]
    fn test_quarter_from_period_four() {
        let cols = derive_columns(2025, 4, &afp()).unwrap();
        assert_eq!(cols.current_actual.start_period, 4);
        assert_eq!(cols.current_actual.end_period, 7);
        assert_eq!(cols.current_actual.periods(), vec![(2025, 4), (2025, 5), (2025, 6)]);
        assert_eq!(cols.next_budget.start_period, 7);
        assert_eq!(cols.next_budget.end_period, 10);
        assert_eq!(cols.next_budget.periods(), vec![(2025, 7), (2025, 8), (2025, 9)]);
        assert_eq!(cols.prior_actual.periods(), vec![(2025, 1), (2025, 2), (2025, 3)]);
    }

    #[test]
    fn test_current_columns_share_range() {
        let cols = derive_columns(2025, 4, &afp()).unwrap();
        assert_eq!(cols.current_actual, cols.current_budget);
        assert_eq!(cols.current_actual, cols.current_average);
        assert_eq!(cols.current_actual, cols.variance);
        assert_eq!(cols.current_actual.company_ids, afp());
    }

    #[test]
    fn test_fourth_quarter_rolls_into_next_year() {
        let cols = derive_columns(2025, 10, &afp()).unwrap();
        assert_eq!((cols.current_actual.end_year, cols.current_actual.end_period), (2026, 1));
        assert_eq!(cols.current_actual.periods(), vec![(2025, 10), (2025, 11), (2025, 12)]);
        assert_eq!(cols.next_budget.periods(), vec![(2026, 1), (2026, 2), (2026, 3)]);
    }

    #[test]
    fn test_first_quarter_prior_is_previous_year() {
        let cols = derive_columns(2025, 1, &afp()).unwrap();
        assert_eq!(cols.prior_actual.periods(), vec![(2024, 10), (2024, 11), (2024, 12)]);
        assert_eq!((cols.prior_actual.end_year, cols.prior_actual.end_period), (2025, 1));
    }

    #[test]
    fn test_invalid_base_period() {
        assert!(matches!(derive_columns(2025, 0, &afp()), Err(FpnaError::InvalidPeriod(_))));
        assert!(matches!(derive_columns(2025, 13, &afp()), Err(FpnaError::InvalidPeriod(_))));
    }

    #[test]
    fn test_empty_company_scope() {
        let result = derive_columns(2025, 4, &BTreeSet::new());
        assert!(matches!(result, Err(FpnaError::EmptyCompanyScope)));
    }

    #[test]
    fn test_range_validation() {
        assert!(matches!(
            PeriodRange::new(2025, 4, 2024, 7, afp()),
            Err(FpnaError::InvalidPeriod(_))
        ));
        assert!(matches!(
            PeriodRange::new(2025, 4, 2025, 4, afp()),
            Err(FpnaError::InvalidPeriod(_))
        ));
        assert!(matches!(
            PeriodRange::new(2025, 4, 2025, 13, afp()),
            Err(FpnaError::InvalidPeriod(_))
        ));
        assert!(PeriodRange::new(2024, 12, 2025, 1, afp()).is_ok());
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = PeriodRange::new(2025, 4, 2025, 7, afp()).unwrap();
        assert!(!contains(&range, 2025, 3));
        assert!(contains(&range, 2025, 4));
        assert!(contains(&range, 2025, 6));
        assert!(!contains(&range, 2025, 7));
    }

    #[test]
    fn test_from_dates_excludes_end_month() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let range = PeriodRange::from_dates(start, end, afp()).unwrap();
        assert_eq!(range.periods(), vec![(2025, 3), (2025, 4)]);
    }

    #[test]
    fn test_quarter_start() {
        assert_eq!(quarter_start(1).unwrap(), 1);
        assert_eq!(quarter_start(2).unwrap(), 4);
        assert_eq!(quarter_start(4).unwrap(), 10);
        assert!(quarter_start(5).is_err());
    }

    #[test]
    fn test_reporting_period_roll() {
        let p = ReportingPeriod::new(2025, 11).unwrap();
        assert_eq!(p.roll(), ReportingPeriod { year: 2025, month: 12 });
        assert_eq!(p.roll().roll(), ReportingPeriod { year: 2026, month: 1 });
        assert_eq!(ReportingPeriod { year: 2025, month: 5 }.quarter_start(), 4);
        assert_eq!(ReportingPeriod { year: 2025, month: 12 }.quarter_start(), 10);
        assert_eq!(p.label(), "November 2025");
    }
}
