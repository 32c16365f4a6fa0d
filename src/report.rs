use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::assembler::{assemble, Column, ReportRow, StatementIndices, ALL_COLUMNS};
use crate::error::{FpnaError, Result};
use crate::index::index;
use crate::period::{derive_columns, quarter_start, PeriodRange, ReportColumns, ReportingPeriod};
use crate::source::{CompanyDirectory, DataSource, DatasetKind, ItemFamily};
use crate::template::Template;

/// Who and when a statement is for. Passed explicitly into every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    pub company_ids: BTreeSet<String>,
    pub year: i32,
    /// First period of the current quarter.
    pub base_period: u32,
}

impl ReportContext {
    pub fn new(company_ids: BTreeSet<String>, year: i32, base_period: u32) -> Self {
        Self {
            company_ids,
            year,
            base_period,
        }
    }

    pub fn for_quarter(company_ids: BTreeSet<String>, year: i32, quarter: u32) -> Result<Self> {
        Ok(Self::new(company_ids, year, quarter_start(quarter)?))
    }

    /// The quarter containing the current reporting month.
    pub fn for_period(company_ids: BTreeSet<String>, period: ReportingPeriod) -> Self {
        Self::new(company_ids, period.year, period.quarter_start())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub template: String,
    pub template_version: u32,
    pub context: ReportContext,
    pub columns: ReportColumns,
    pub rows: Vec<ReportRow>,
}

/// Fetch, index and assemble one budget-vs-actual statement.
///
/// Any fetch or index failure aborts the whole statement; no rows are returned
/// for a report that could not be fully built.
pub fn build_statement<S>(source: &S, template: &Template, ctx: &ReportContext) -> Result<Statement>
where
    S: DataSource + CompanyDirectory,
{
    if ctx.company_ids.is_empty() {
        return Err(FpnaError::EmptyCompanyScope);
    }
    let known = source.list_companies()?;
    if let Some(unknown) = ctx.company_ids.iter().find(|id| !known.contains(id)) {
        return Err(FpnaError::UnknownCompany(unknown.clone()));
    }

    let columns = derive_columns(ctx.year, ctx.base_period, &ctx.company_ids)?;

    let families: BTreeMap<ItemFamily, BTreeSet<String>> = [ItemFamily::Account, ItemFamily::Metric]
        .into_iter()
        .filter(|f| template.needs(*f))
        .map(|f| (f, template.names(f)))
        .collect();

    let mut indices = StatementIndices::new();
    for column in ALL_COLUMNS {
        let range = column_range(&columns, column);
        for (family, names) in &families {
            let kind = DatasetKind::of(column.measure(), *family);
            let records = source.fetch(kind, range, Some(names))?;
            let idx = index(kind, records)?;
            if idx.is_empty() {
                tracing::debug!(%column, %kind, %range, "no records");
            } else {
                tracing::debug!(%column, %kind, %range, records = idx.len(), "column dataset ready");
            }
            indices.insert(column, idx)?;
        }
    }

    let rows = assemble(&template.items, &indices)?;
    tracing::info!(
        template = %template.name,
        companies = ?ctx.company_ids,
        year = ctx.year,
        base_period = ctx.base_period,
        rows = rows.len(),
        "built statement"
    );

    Ok(Statement {
        template: template.name.clone(),
        template_version: template.version,
        context: ctx.clone(),
        columns,
        rows,
    })
}

fn column_range(columns: &ReportColumns, column: Column) -> &PeriodRange {
    match column {
        Column::PriorActual => &columns.prior_actual,
        Column::CurrentActual => &columns.current_actual,
        Column::CurrentBudget => &columns.current_budget,
        Column::CurrentAverage => &columns.current_average,
        Column::NextBudget => &columns.next_budget,
        Column::Variance => &columns.variance,
    }
}
