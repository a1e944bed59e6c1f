use anyhow::{bail, Result};
use chrono::NaiveDate;

/// Month key (`YYYY-MM`) of an event date as printed by EventLink (`6/10/2025`),
/// or given as `YYYY-MM-DD` / `YYYY-MM`.
pub fn report_month(event_date: &str) -> Result<String> {
    let s = event_date.trim();
    for fmt in ["%m/%d/%Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.format("%Y-%m").to_string());
        }
    }
    parse_month(s)
}

/// Validate a `YYYY-MM` month key.
pub fn parse_month(s: &str) -> Result<String> {
    match NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d") {
        Ok(d) if s.trim().len() == 7 => Ok(d.format("%Y-%m").to_string()),
        _ => bail!("unrecognized date '{}', expected M/D/YYYY, YYYY-MM-DD or YYYY-MM", s),
    }
}

/// League year ending in `year`: June of the previous year through May.
pub fn season(year: i32) -> (String, String) {
    (format!("{:04}-06", year - 1), format!("{:04}-05", year))
}

pub fn season_label(year: i32) -> String {
    format!("{}-{}", year - 1, year)
}

/// Search filter for events: a full day narrows to its month.
pub fn date_filter(s: &str) -> Result<String> {
    let s = s.trim();
    match s.len() {
        10 => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(d) => Ok(d.format("%Y-%m").to_string()),
            Err(_) => bail!("Please use YYYY-MM-DD or YYYY-MM format for the date."),
        },
        7 => parse_month(s),
        _ => bail!("Please use YYYY-MM-DD or YYYY-MM format for the date."),
    }
}
