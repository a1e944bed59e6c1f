pub mod extract;
pub mod normalize;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty text provided to parser")]
    EmptyInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_event_name: Option<String>,
}

impl EventInfo {
    pub fn is_empty(&self) -> bool {
        *self == EventInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub rank: u32,
    pub name: String,
    pub pod: u32,
    pub points: u32,
    /// Approximation: ceil(points / 3), not a column of the report.
    pub matches_played: u32,
    pub omw_percentage: u32,
    pub gw_percentage: u32,
    pub ogw_percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReport {
    pub event_info: EventInfo,
    pub players: Vec<PlayerResult>,
}

/// Two-stage pipeline: raw text → normalized text → (event info ∥ player rows) → format.
pub fn parse_report(text: &str) -> Result<ParsedReport, ParseError> {
    info!(len = text.len(), "parsing EventLink report");
    let normalized = normalize::normalize(text)?;
    let report = extract::extract_all(&normalized);

    info!(
        event_name = report.event_info.event_name.as_deref().unwrap_or("not found"),
        event_date = report.event_info.event_date.as_deref().unwrap_or("not found"),
        players = report.players.len(),
        "extraction summary"
    );
    if report.players.is_empty() {
        warn!("no player data was extracted from the report");
    }
    Ok(report)
}

// ── Tests ──
