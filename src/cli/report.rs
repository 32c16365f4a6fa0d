use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::assembler::{Column, ReportRow, ALL_COLUMNS};
use crate::cli::fetch::company_scope;
use crate::cli::{open_db, OutputFormat};
use crate::error::Result;
use crate::fmt::{accounting_format, percentage_format};
use crate::report::{build_statement, ReportContext, Statement};
use crate::settings::{load_settings, shellexpand_path};
use crate::store::SqliteStore;
use crate::template::{LineItemKind, Template};

pub struct ReportArgs {
    pub companies: Vec<String>,
    pub year: Option<i32>,
    pub quarter: Option<u32>,
    pub period: Option<u32>,
    pub format: OutputFormat,
    pub template: Option<String>,
}

pub fn run(args: ReportArgs) -> Result<String> {
    let settings = load_settings();
    let template = match args.template.or_else(|| settings.template_path.clone()) {
        Some(path) => Template::load(Path::new(&shellexpand_path(&path)))?,
        None => Template::builtin()?,
    };

    if template.is_empty() {
        tracing::warn!(template = %template.name, "template has no line items");
    }
    tracing::debug!(template = %template.name, items = template.len(), "loaded template");

    let mut current = settings.reporting_period()?;
    if let Some(year) = args.year {
        current.year = year;
    }
    let conn = open_db()?;
    let store = SqliteStore::new(&conn);
    let companies = company_scope(args.companies, &store)?;
    let ctx = match (args.quarter, args.period) {
        (Some(quarter), _) => ReportContext::for_quarter(companies, current.year, quarter)?,
        (None, Some(period)) => ReportContext::new(companies, current.year, period),
        (None, None) => ReportContext::for_period(companies, current),
    };

    let statement = build_statement(&store, &template, &ctx)?;

    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&statement)?),
        OutputFormat::Table => Ok(format_statement(&statement)),
    }
}

// ---------------------------------------------------------------------------
// Pure formatting functions (statement → String)
// ---------------------------------------------------------------------------

fn column_label(column: Column) -> &'static str {
    match column {
        Column::PriorActual => "Prior Actual",
        Column::CurrentActual => "Actual",
        Column::CurrentBudget => "Budget",
        Column::CurrentAverage => "Average",
        Column::NextBudget => "Next Budget",
        Column::Variance => "Variance",
    }
}

fn row_label(row: &ReportRow) -> String {
    if row.is_group_header {
        row.name.bold().to_string()
    } else if row.group.is_some() {
        format!("  {}", row.name)
    } else {
        row.name.clone()
    }
}

fn value_cell(row: &ReportRow, column: Column) -> Cell {
    let value = Some(row.columns.get(column));
    let text = match row.kind {
        LineItemKind::Percentage => percentage_format(value),
        LineItemKind::Account | LineItemKind::Metric => accounting_format(value),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn format_statement(statement: &Statement) -> String {
    let mut table = Table::new();
    let mut header = vec![Cell::new("Line Item")];
    header.extend(ALL_COLUMNS.iter().map(|c| Cell::new(column_label(*c))));
    table.set_header(header);

    for row in &statement.rows {
        let mut cells = vec![Cell::new(row_label(row))];
        cells.extend(ALL_COLUMNS.iter().map(|c| value_cell(row, *c)));
        table.add_row(cells);
    }

    let companies: Vec<&str> = statement.context.company_ids.iter().map(String::as_str).collect();
    format!(
        "{}\nCurrent {}  |  Prior {}  |  Next budget {}\n{table}",
        format!("Budget vs Actual: {}", companies.join(", ")).bold(),
        statement.columns.current_actual,
        statement.columns.prior_actual,
        statement.columns.next_budget,
    )
}
