use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use crate::db::ScoreRow;

pub const HEADERS: [&str; 6] = ["Username", "Month", "Score", "EventID", "Format", "EventCount"];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, ",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Distinct non-empty event ids per player; a player with none counts as one event.
fn event_counts(rows: &[ScoreRow]) -> HashMap<&str, usize> {
    let mut events: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in rows {
        let set = events.entry(r.username.as_str()).or_default();
        if !r.event_id.is_empty() {
            set.insert(r.event_id.as_str());
        }
    }
    events
        .into_iter()
        .map(|(user, ids)| (user, ids.len().max(1)))
        .collect()
}

/// Season export: one line per stored score row, header first.
pub fn scores_to_csv<W: Write>(mut w: W, rows: &[ScoreRow]) -> io::Result<()> {
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    write_row(&mut w, &header)?;

    let counts = event_counts(rows);
    for r in rows {
        let count = counts.get(r.username.as_str()).copied().unwrap_or(1);
        write_row(
            &mut w,
            &[
                r.username.clone(),
                r.month.clone(),
                r.score.to_string(),
                r.event_id.clone(),
                r.format.clone(),
                count.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// `Duel_Commander_scores_2024-2025.csv`
pub fn default_filename(format: &str, season: &str) -> String {
    format!("{}_scores_{}.csv", format.replace(' ', "_"), season)
}
