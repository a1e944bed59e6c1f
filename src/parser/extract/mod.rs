pub mod event;
pub mod format;
pub mod players;

use super::ParsedReport;

/// Event fields and player rows are pulled from the same normalized text
/// independently; the format is derived from whatever event name was found.
pub fn extract_all(normalized: &str) -> ParsedReport {
    let mut event_info = event::extract(normalized);
    let players = players::extract(normalized);

    if let Some(name) = event_info.event_name.clone() {
        event_info.format = Some(format::classify(&name));
        event_info.original_event_name = Some(name);
    } else {
        tracing::warn!("no event name found, cannot detect format");
    }

    ParsedReport {
        event_info,
        players,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows_are_independent() {
        let r = extract_all("Event: Broken line without id\n1 Jane Doe 1 3 50 50 50\n");
        assert!(r.event_info.event_name.is_none());
        assert!(r.event_info.format.is_none());
        assert_eq!(r.players.len(), 1);

        let r = extract_all("Event: Legacy Open (77)\nEvent Date: 1/2/2025\nnothing else");
        assert!(r.players.is_empty());
        assert_eq!(r.event_info.format.as_deref(), Some("Legacy"));
        assert_eq!(r.event_info.original_event_name.as_deref(), Some("Legacy Open"));
    }

    #[test]
    fn no_event_name_means_no_format() {
        let r = extract_all("Event Date: 6/10/2025\nEvent Information: cash prizes");
        assert_eq!(r.event_info.event_date.as_deref(), Some("6/10/2025"));
        assert_eq!(r.event_info.additional_info.as_deref(), Some("cash prizes"));
        assert!(r.event_info.format.is_none());
        assert!(r.event_info.original_event_name.is_none());
    }
}
