use crate::error::Result;
use crate::period::ReportingPeriod;
use crate::settings::{load_settings, save_settings};

pub fn show() -> Result<()> {
    let period = load_settings().reporting_period()?;
    println!("{} (quarter starting period {})", period.label(), period.quarter_start());
    Ok(())
}

pub fn set(year: i32, month: u32) -> Result<()> {
    let period = ReportingPeriod::new(year, month)?;
    let mut settings = load_settings();
    settings.set_reporting_period(period);
    save_settings(&settings)?;
    println!("Reporting period set to {}", period.label());
    Ok(())
}

pub fn roll() -> Result<()> {
    let mut settings = load_settings();
    let previous = settings.reporting_period()?;
    let next = previous.roll();
    settings.set_reporting_period(next);
    save_settings(&settings)?;
    tracing::info!(from = %previous.label(), to = %next.label(), "rolled reporting period");
    println!("Rolled {} -> {}", previous.label(), next.label());
    Ok(())
}
