use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::parser::ParsedReport;

pub const DEFAULT_DB_PATH: &str = "data/league.sqlite";

/// Stored in place of a missing format / event id so the unique key stays usable.
pub const UNKNOWN_FORMAT: &str = "Unknown";
const NO_EVENT_ID: &str = "";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scores (
            id          INTEGER PRIMARY KEY,
            user_id     TEXT NOT NULL,
            username    TEXT NOT NULL,
            month       TEXT NOT NULL,
            format      TEXT NOT NULL DEFAULT 'Unknown',
            event_id    TEXT NOT NULL DEFAULT '',
            event_name  TEXT,
            score       INTEGER NOT NULL DEFAULT 0,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, month, format, event_id)
        );
        CREATE INDEX IF NOT EXISTS idx_scores_month ON scores(month);
        CREATE INDEX IF NOT EXISTS idx_scores_event ON scores(event_id);
        CREATE INDEX IF NOT EXISTS idx_scores_format_month ON scores(format, month);
        ",
    )?;
    Ok(())
}

// ── Writing ──

pub struct ScoreEntry<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub month: &'a str,
    pub points: i64,
    pub format: Option<&'a str>,
    pub event_id: Option<&'a str>,
    pub event_name: Option<&'a str>,
}

const UPSERT_SQL: &str = "
    INSERT INTO scores (user_id, username, month, format, event_id, event_name, score)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(user_id, month, format, event_id) DO UPDATE SET
        score      = score + excluded.score,
        username   = excluded.username,
        event_name = excluded.event_name,
        updated_at = datetime('now')";

/// Add points to a player's tally for (month, format, event), creating the row if needed.
pub fn add_score(conn: &Connection, e: &ScoreEntry) -> Result<()> {
    let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
    stmt.execute(rusqlite::params![
        e.user_id,
        e.username,
        e.month,
        e.format.unwrap_or(UNKNOWN_FORMAT),
        e.event_id.unwrap_or(NO_EVENT_ID),
        e.event_name,
        e.points,
    ])?;
    Ok(())
}

/// Record every player of a report under `month`. The player name is the identity.
pub fn record_report(conn: &Connection, report: &ParsedReport, month: &str) -> Result<usize> {
    let info = &report.event_info;
    let tx = conn.unchecked_transaction()?;
    for p in &report.players {
        add_score(
            &tx,
            &ScoreEntry {
                user_id: &p.name,
                username: &p.name,
                month,
                points: i64::from(p.points),
                format: info.format.as_deref(),
                event_id: info.event_id.as_deref(),
                event_name: info.event_name.as_deref(),
            },
        )?;
    }
    tx.commit()?;
    Ok(report.players.len())
}

pub fn delete_event(conn: &Connection, event_id: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM scores WHERE event_id = ?1", [event_id])?;
    Ok(n)
}

// ── Reading ──

#[derive(Debug, Clone)]
pub struct ScoreRow {
    pub username: String,
    pub month: String,
    pub format: String,
    pub event_id: String,
    pub event_name: Option<String>,
    pub score: i64,
}

const SCORE_COLUMNS: &str = "username, month, format, event_id, event_name, score";

fn score_row(row: &rusqlite::Row) -> rusqlite::Result<ScoreRow> {
    Ok(ScoreRow {
        username: row.get(0)?,
        month: row.get(1)?,
        format: row.get(2)?,
        event_id: row.get(3)?,
        event_name: row.get(4)?,
        score: row.get(5)?,
    })
}

/// Top scores of a single month.
pub fn month_scores(conn: &Connection, month: &str, limit: usize) -> Result<Vec<ScoreRow>> {
    let sql = format!(
        "SELECT {} FROM scores WHERE month = ?1 ORDER BY score DESC, username LIMIT {}",
        SCORE_COLUMNS, limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([month], score_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn event_scores(conn: &Connection, event_id: &str) -> Result<Vec<ScoreRow>> {
    let sql = format!(
        "SELECT {} FROM scores WHERE event_id = ?1 ORDER BY score DESC, username",
        SCORE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([event_id], score_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every row of a format within an inclusive month range, for export.
pub fn format_scores(
    conn: &Connection,
    format: &str,
    start_month: &str,
    end_month: &str,
) -> Result<Vec<ScoreRow>> {
    let sql = format!(
        "SELECT {} FROM scores
         WHERE format = ?1 AND month >= ?2 AND month <= ?3
         ORDER BY month, username",
        SCORE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([format, start_month, end_month], score_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct LeaderRow {
    pub username: String,
    pub score: i64,
    pub event_count: usize,
}

/// Season totals per player for one format, best first.
pub fn format_leaders(
    conn: &Connection,
    format: &str,
    start_month: &str,
    end_month: &str,
    limit: usize,
) -> Result<Vec<LeaderRow>> {
    let sql = format!(
        "SELECT username, SUM(score) AS total, COUNT(*)
         FROM scores
         WHERE format = ?1 AND month >= ?2 AND month <= ?3
         GROUP BY username
         ORDER BY total DESC, username
         LIMIT {}",
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([format, start_month, end_month], |row| {
            Ok(LeaderRow {
                username: row.get(0)?,
                score: row.get(1)?,
                event_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct EventRow {
    pub event_id: String,
    pub month: String,
    pub format: String,
    pub event_name: Option<String>,
    pub player_count: usize,
}

/// Distinct events, newest month first, optionally filtered by format and month.
pub fn find_events(
    conn: &Connection,
    format: Option<&str>,
    month: Option<&str>,
) -> Result<Vec<EventRow>> {
    let mut conditions = vec!["event_id != ''".to_string()];
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(f) = format {
        conditions.push(format!("format = ?{}", params.len() + 1));
        params.push(Box::new(f.to_string()));
    }
    if let Some(m) = month {
        conditions.push(format!("month = ?{}", params.len() + 1));
        params.push(Box::new(m.to_string()));
    }

    let sql = format!(
        "SELECT event_id, MIN(month), MIN(format), MIN(event_name), COUNT(*)
         FROM scores
         WHERE {}
         GROUP BY event_id
         ORDER BY MIN(month) DESC, event_id",
        conditions.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(EventRow {
                event_id: row.get(0)?,
                month: row.get(1)?,
                format: row.get(2)?,
                event_name: row.get(3)?,
                player_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub rows: usize,
    pub players: usize,
    pub events: usize,
    pub months: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let rows: usize = conn.query_row("SELECT COUNT(*) FROM scores", [], |r| r.get(0))?;
    let players: usize =
        conn.query_row("SELECT COUNT(DISTINCT user_id) FROM scores", [], |r| r.get(0))?;
    let events: usize = conn.query_row(
        "SELECT COUNT(DISTINCT event_id) FROM scores WHERE event_id != ''",
        [],
        |r| r.get(0),
    )?;
    let months: usize =
        conn.query_row("SELECT COUNT(DISTINCT month) FROM scores", [], |r| r.get(0))?;
    Ok(Stats {
        rows,
        players,
        events,
        months,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_report;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn entry<'a>(name: &'a str, month: &'a str, points: i64, event: &'a str) -> ScoreEntry<'a> {
        ScoreEntry {
            user_id: name,
            username: name,
            month,
            points,
            format: Some("Modern"),
            event_id: Some(event),
            event_name: Some("Modern Monday"),
        }
    }

    #[test]
    fn upsert_accumulates() {
        let conn = memory_db();
        add_score(&conn, &entry("Jane", "2025-06", 3, "1")).unwrap();
        add_score(&conn, &entry("Jane", "2025-06", 6, "1")).unwrap();
        add_score(&conn, &entry("Jane", "2025-06", 1, "2")).unwrap();

        let rows = event_scores(&conn, "1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 9);
        assert_eq!(get_stats(&conn).unwrap().rows, 2);
    }

    #[test]
    fn missing_format_and_event_id_still_dedupe() {
        let conn = memory_db();
        let e = ScoreEntry {
            user_id: "Bob",
            username: "Bob",
            month: "2025-06",
            points: 3,
            format: None,
            event_id: None,
            event_name: None,
        };
        add_score(&conn, &e).unwrap();
        add_score(&conn, &e).unwrap();
        let rows = month_scores(&conn, "2025-06", 20).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 6);
        assert_eq!(rows[0].format, UNKNOWN_FORMAT);
    }

    #[test]
    fn record_parsed_report() {
        let conn = memory_db();
        let md = std::fs::read_to_string("tests/fixtures/standings.txt").unwrap();
        let report = parse_report(&md).unwrap();
        assert_eq!(record_report(&conn, &report, "2025-06").unwrap(), 8);

        let rows = event_scores(&conn, "8993570").unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].username, "Alexey Paulot");
        assert_eq!(rows[0].format, "Limited");
        assert_eq!(rows[0].event_name.as_deref(), Some("Draft Final Fantasy"));

        let events = find_events(&conn, Some("Limited"), None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].player_count, 8);
        assert!(find_events(&conn, Some("Modern"), None).unwrap().is_empty());
        assert_eq!(find_events(&conn, None, Some("2025-06")).unwrap().len(), 1);
    }

    #[test]
    fn leaders_within_season() {
        let conn = memory_db();
        add_score(&conn, &entry("Jane", "2024-06", 9, "1")).unwrap();
        add_score(&conn, &entry("Jane", "2025-05", 3, "2")).unwrap();
        add_score(&conn, &entry("John", "2025-01", 10, "3")).unwrap();
        add_score(&conn, &entry("John", "2025-06", 50, "4")).unwrap();

        let leaders = format_leaders(&conn, "Modern", "2024-06", "2025-05", 10).unwrap();
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].username, "Jane");
        assert_eq!(leaders[0].score, 12);
        assert_eq!(leaders[0].event_count, 2);
        assert_eq!(leaders[1].score, 10);

        let all = format_scores(&conn, "Modern", "2024-06", "2025-05").unwrap();
        let months: Vec<&str> = all.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-06", "2025-01", "2025-05"]);
    }

    #[test]
    fn delete_removes_whole_event() {
        let conn = memory_db();
        add_score(&conn, &entry("Jane", "2025-06", 9, "1")).unwrap();
        add_score(&conn, &entry("John", "2025-06", 6, "1")).unwrap();
        add_score(&conn, &entry("John", "2025-06", 6, "2")).unwrap();

        assert_eq!(delete_event(&conn, "1").unwrap(), 2);
        assert_eq!(delete_event(&conn, "1").unwrap(), 0);
        assert!(event_scores(&conn, "1").unwrap().is_empty());
        assert_eq!(get_stats(&conn).unwrap().events, 1);
    }
}
