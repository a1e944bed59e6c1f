use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::ParseError;

/// Below this many non-blank lines the report is assumed to have lost its line breaks.
const MIN_STRUCTURED_LINES: usize = 5;

const SEPARATOR: &str =
    "-------------------------------------------------------------------------------";
const COLUMN_HEADER: &str = "Rank   Name                    Pod    Points";

/// Section markers, applied in order. Each pair is (pattern, replacement).
static MARKERS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    let rules: [(&str, String); 10] = [
        (r"EventLink\s+", "\nEventLink ".into()),
        (r"Report:\s+", "\nReport: ".into()),
        (r"Event:\s+", "\nEvent: ".into()),
        (r"Event Date:\s+", "\nEvent Date: ".into()),
        (r"Event Information:\s+", "\nEvent Information: ".into()),
        (r"Opponents Match Win Percent", "\nOpponents Match Win Percent".into()),
        (r"Game Win Percent", "\nGame Win Percent".into()),
        (r"Opponents Game Win Percent", "\nOpponents Game Win Percent".into()),
        (r"Rank\s+Name\s+Pod\s+Points", format!("\n{}", COLUMN_HEADER)),
        (r"----+", format!("\n{}", SEPARATOR)),
    ];
    rules
        .into_iter()
        .map(|(pat, rep)| (Regex::new(pat).unwrap(), rep))
        .collect()
});

/// rank, name, pod, points, omw, gw, ogw run together on one line.
static COLLAPSED_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s+([A-Za-z\s]+?)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)")
        .unwrap()
});

/// Standardize line endings and, when the report looks collapsed onto a few
/// lines, re-insert breaks before known markers and player rows.
pub fn normalize(raw: &str) -> Result<String, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let text = raw.replace("\r\n", "\n");
    let lines = count_non_blank(&text);
    if lines >= MIN_STRUCTURED_LINES {
        return Ok(text);
    }

    info!(lines, "few line breaks detected, reconstructing");
    let text = reconstruct(text);
    debug!(lines = count_non_blank(&text), "after reconstruction");
    Ok(text)
}

// Markers must be split out before the row pass, or its lazy name capture
// can swallow header labels.
fn reconstruct(mut text: String) -> String {
    for (re, rep) in MARKERS.iter() {
        text = re.replace_all(&text, rep.as_str()).into_owned();
    }
    COLLAPSED_ROW_RE
        .replace_all(
            &text,
            "\n${1}      ${2}           ${3}      ${4}      ${5}     ${6}     ${7}",
        )
        .into_owned()
}

pub fn count_non_blank(text: &str) -> usize {
    text.split('\n').filter(|l| !l.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_rejected() {
        assert_eq!(normalize(""), Err(ParseError::EmptyInput));
    }

    #[test]
    fn structured_text_untouched() {
        let text = "a\nb\nc\nd\ne Event: x";
        assert_eq!(normalize(text).unwrap(), text);
    }

    #[test]
    fn crlf_converted() {
        let text = "a\r\nb\r\nc\r\nd\r\ne\r\n";
        assert_eq!(normalize(text).unwrap(), "a\nb\nc\nd\ne\n");
    }

    #[test]
    fn idempotent_once_structured() {
        let text = std::fs::read_to_string("tests/fixtures/standings.txt").unwrap();
        let once = normalize(&text).unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn markers_get_their_own_lines() {
        let text = "EventLink 6/12/2025 Report: Standings by Rank Event: Modern Monday (1) Event Date: 6/10/2025";
        let out = normalize(text).unwrap();
        let lines: Vec<&str> = out.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                "EventLink 6/12/2025",
                "Report: Standings by Rank",
                "Event: Modern Monday (1)",
                "Event Date: 6/10/2025",
            ]
        );
    }

    #[test]
    fn dashes_become_canonical_separator() {
        let out = normalize("Rank Name Pod Points OMW% ----- 1 Jane Doe 1 3 50 50 50").unwrap();
        assert!(out.contains(&format!("\n{}", COLUMN_HEADER)));
        assert!(out.contains(&format!("\n{}", SEPARATOR)));
        assert_eq!(SEPARATOR.len(), 79);
    }

    #[test]
    fn collapsed_rows_split() {
        let out = normalize("1 Jane Doe 1 9 44 85 44 2 John Smith 1 6 66 66 66").unwrap();
        let rows: Vec<&str> = out.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("1      Jane Doe"));
        assert!(rows[1].starts_with("2      John Smith"));
    }

    #[test]
    fn absent_markers_are_noops() {
        assert_eq!(normalize("hello world").unwrap(), "hello world");
    }
}
