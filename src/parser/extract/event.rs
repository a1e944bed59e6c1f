use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::parser::EventInfo;

static EVENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Event:\s+(.*?)\s+\(([0-9]+)\)").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Event Date:\s+(.*)").unwrap());
static INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Event Information:\s+(.*)").unwrap());

/// Scan non-blank lines for the event name/id, date and free-text info.
/// A line carrying several labels updates every matching field.
pub fn extract(text: &str) -> EventInfo {
    let mut info = EventInfo::default();

    for line in text.split('\n').filter(|l| !l.trim().is_empty()) {
        if line.contains("Event:") {
            debug!(line, "found Event line");
            match EVENT_RE.captures(line) {
                Some(caps) => {
                    info.event_name = Some(caps[1].trim().to_string());
                    info.event_id = Some(caps[2].to_string());
                }
                // A name without its numeric id is not kept.
                None => warn!(line, "Event line found but name/id could not be extracted"),
            }
        }

        if line.contains("Event Date:") {
            match DATE_RE.captures(line) {
                Some(caps) => info.event_date = Some(caps[1].trim().to_string()),
                None => warn!(line, "Event Date line found but date could not be extracted"),
            }
        }

        if line.contains("Event Information:") {
            if let Some(caps) = INFO_RE.captures(line) {
                info.additional_info = Some(caps[1].trim().to_string());
            }
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_and_id() {
        let info = extract("Event: Draft Final Fantasy (8993570)");
        assert_eq!(info.event_name.as_deref(), Some("Draft Final Fantasy"));
        assert_eq!(info.event_id.as_deref(), Some("8993570"));
    }

    #[test]
    fn event_without_id_sets_nothing() {
        let info = extract("Event: Draft Final Fantasy\nEvent: Modern Night (abc)");
        assert!(info.event_name.is_none());
        assert!(info.event_id.is_none());
    }

    #[test]
    fn later_event_line_wins() {
        let info = extract(
            "Event: Modern Night (100)\nEvent: Pioneer Cup (200)\nEvent: Legacy Open\nEvent Date: 1/1/2025\nEvent Date: 2/2/2025",
        );
        assert_eq!(info.event_name.as_deref(), Some("Pioneer Cup"));
        assert_eq!(info.event_id.as_deref(), Some("200"));
        assert_eq!(info.event_date.as_deref(), Some("2/2/2025"));
    }

    #[test]
    fn date_and_info_verbatim() {
        let info = extract("Event Date:   6/10/2025  \nEvent Information: membre 17 chf non membre 20 chf ");
        assert_eq!(info.event_date.as_deref(), Some("6/10/2025"));
        assert_eq!(
            info.additional_info.as_deref(),
            Some("membre 17 chf non membre 20 chf")
        );
    }

    #[test]
    fn date_label_does_not_trigger_event_match() {
        let info = extract("Event Date: 6/10/2025");
        assert!(info.event_name.is_none());
        assert_eq!(info.event_date.as_deref(), Some("6/10/2025"));
    }

    #[test]
    fn one_line_may_update_several_fields() {
        let info = extract("Event: Pioneer Cup (5) Event Date: 1/1/2025");
        assert_eq!(info.event_name.as_deref(), Some("Pioneer Cup"));
        assert_eq!(info.event_id.as_deref(), Some("5"));
        assert_eq!(info.event_date.as_deref(), Some("1/1/2025"));
    }

    #[test]
    fn blank_and_unrelated_lines() {
        assert_eq!(extract("\n\n   \nRandom text\n"), EventInfo::default());
    }
}
