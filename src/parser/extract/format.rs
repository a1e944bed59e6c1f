use tracing::debug;

/// Known formats, in priority order. Earlier keywords shadow later ones, so
/// "duel commander" must come before "commander".
const FORMAT_RULES: &[(&[&str], &str)] = &[
    (&["draft", "sealed"], "Limited"),
    (&["duel commander"], "Duel Commander"),
    (&["commander"], "Commander"),
    (&["standard"], "Standard"),
    (&["modern"], "Modern"),
    (&["pioneer"], "Pioneer"),
    (&["legacy"], "Legacy"),
    (&["vintage"], "Vintage"),
];

/// Every label `classify` can produce from a keyword.
pub const KNOWN_FORMATS: &[&str] = &[
    "Limited",
    "Standard",
    "Modern",
    "Pioneer",
    "Commander",
    "Duel Commander",
    "Legacy",
    "Vintage",
];

/// Derive the format label from an event name. Falls back to the first word
/// of the name, in its original casing.
pub fn classify(event_name: &str) -> String {
    let lower = event_name.to_lowercase();

    for (keywords, label) in FORMAT_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            debug!(event_name, format = label, "format detected");
            return label.to_string();
        }
    }

    let fallback = event_name.split_whitespace().next().unwrap_or("").to_string();
    debug!(event_name, format = %fallback, "no known format, using first word");
    fallback
}

/// Case-insensitive lookup into `KNOWN_FORMATS`, returning the canonical label.
pub fn canonical(label: &str) -> Option<&'static str> {
    KNOWN_FORMATS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(label.trim()))
}
