mod db;
mod export;
mod fetch;
mod league;
mod parser;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use parser::extract::format;
use parser::ParsedReport;

#[derive(Parser)]
#[command(name = "eventlink_league", about = "EventLink standings parser and league scoreboard")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "LEAGUE_DB", default_value = db::DEFAULT_DB_PATH)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a standings report and print what was found (nothing is stored)
    Parse {
        /// Report file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Print the parsed report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse standings reports and add every player's points to the scoreboard
    Import {
        /// One or more .txt standings reports
        files: Vec<PathBuf>,
        /// Download the report from a URL instead
        #[arg(long, conflicts_with = "files")]
        url: Option<String>,
        /// Month to record under (YYYY-MM); defaults to the report's event date
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Top scores of one month
    Scoreboard {
        /// Month (YYYY-MM)
        month: String,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show scores for a specific tournament
    Tournament {
        /// The tournament event ID
        event_id: String,
    },
    /// Top players for a format over a league year (June YEAR-1 to May YEAR)
    Leaders {
        #[arg(value_parser = parse_format)]
        format: String,
        year: i32,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Export a format's league-year scores as CSV
    Export {
        #[arg(value_parser = parse_format)]
        format: String,
        year: i32,
        /// Output path (default: <Format>_scores_<season>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Find events by format and/or date
    Events {
        #[arg(short, long, value_parser = parse_format)]
        format: Option<String>,
        /// Date (YYYY-MM-DD) or month (YYYY-MM)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Delete an event and all its scores
    Delete {
        event_id: String,
        /// Required to actually delete
        #[arg(long)]
        confirm: bool,
    },
    /// Show scoreboard statistics
    Stats,
}

fn parse_format(s: &str) -> Result<String, String> {
    format::canonical(s).map(str::to_string).ok_or_else(|| {
        format!(
            "unknown format '{}', expected one of: {}",
            s,
            format::KNOWN_FORMATS.join(", ")
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { file, json } => {
            let text = match &file {
                Some(path) => read_report(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let report = parser::parse_report(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Commands::Import { files, url, month } => {
            let month = month.as_deref().map(league::parse_month).transpose()?;
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;

            let counts = if let Some(url) = url {
                fetch::ensure_txt_url(&url)?;
                let text = fetch::fetch_report(&url).await?;
                let report = parser::parse_report(&text)?;
                let mut counts = ImportCounts::default();
                counts.add(import_report(&conn, &url, &report, month.as_deref())?);
                counts
            } else if files.is_empty() {
                bail!("Nothing to import. Pass one or more .txt reports or --url.");
            } else {
                import_files(&conn, &files, month.as_deref())?
            };
            counts.print();
            Ok(())
        }
        Commands::Scoreboard { month, limit } => {
            let month = league::parse_month(&month)?;
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let rows = db::month_scores(&conn, &month, limit)?;
            if rows.is_empty() {
                println!("No scores recorded for {}.", month);
                return Ok(());
            }
            println!("Scoreboard {}", month);
            println!("{:>3} | {:<24} | {:<14} | {:>10} | {:>5}", "#", "Player", "Format", "Event", "Pts");
            println!("{}", "-".repeat(70));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<24} | {:<14} | {:>10} | {:>5}",
                    i + 1,
                    truncate(&r.username, 24),
                    truncate(&r.format, 14),
                    r.event_id,
                    r.score
                );
            }
            Ok(())
        }
        Commands::Tournament { event_id } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let rows = db::event_scores(&conn, &event_id)?;
            let Some(first) = rows.first() else {
                println!("No scores found for tournament ID {}.", event_id);
                return Ok(());
            };
            println!(
                "Tournament Results: {}",
                first.event_name.as_deref().unwrap_or("Unknown Tournament")
            );
            println!("Date:     {}", first.month);
            println!("Format:   {}", first.format);
            println!("Event ID: {}\n", event_id);
            for (i, r) in rows.iter().enumerate() {
                println!("{:>3}. {} – {} pts", i + 1, r.username, r.score);
            }
            Ok(())
        }
        Commands::Leaders { format, year, limit } => {
            let (start, end) = league::season(year);
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let leaders = db::format_leaders(&conn, &format, &start, &end, limit)?;
            if leaders.is_empty() {
                println!("No scores found for {} from June {} to May {}.", format, year - 1, year);
                return Ok(());
            }
            println!("Top {} {} Players: {} Season", limit, format, league::season_label(year));
            for (i, p) in leaders.iter().enumerate() {
                println!("{:>3}. {} – {} pts ({} events)", i + 1, p.username, p.score, p.event_count);
            }
            println!("\nSeason period: June {} to May {}", year - 1, year);
            Ok(())
        }
        Commands::Export { format, year, output } => {
            let (start, end) = league::season(year);
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let rows = db::format_scores(&conn, &format, &start, &end)?;
            if rows.is_empty() {
                println!("No scores found for {} from June {} to May {}.", format, year - 1, year);
                return Ok(());
            }
            let path = output.unwrap_or_else(|| {
                PathBuf::from(export::default_filename(&format, &league::season_label(year)))
            });
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            export::scores_to_csv(std::io::BufWriter::new(file), &rows)?;
            println!("Wrote {} {} score rows to {}", rows.len(), format, path.display());
            Ok(())
        }
        Commands::Events { format, date } => {
            if format.is_none() && date.is_none() {
                bail!("Please provide at least a format or date to search for events.");
            }
            let month = date.as_deref().map(league::date_filter).transpose()?;
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let events = db::find_events(&conn, format.as_deref(), month.as_deref())?;
            if events.is_empty() {
                let mut msg = "No events found".to_string();
                if let Some(f) = &format {
                    msg.push_str(&format!(" for format \"{}\"", f));
                }
                if let Some(d) = &date {
                    msg.push_str(&format!(" on or during {}", d));
                }
                println!("{}.", msg);
                return Ok(());
            }
            println!(
                "{:>3} | {:<10} | {:<14} | {:<7} | {:>7} | {}",
                "#", "Event ID", "Format", "Month", "Players", "Name"
            );
            println!("{}", "-".repeat(80));
            for (i, e) in events.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<14} | {:<7} | {:>7} | {}",
                    i + 1,
                    e.event_id,
                    truncate(&e.format, 14),
                    e.month,
                    e.player_count,
                    e.event_name.as_deref().unwrap_or("-")
                );
            }
            println!("\nUse `tournament <EVENT_ID>` to see detailed results");
            Ok(())
        }
        Commands::Delete { event_id, confirm } => {
            if !confirm {
                println!("Deletion cancelled. Pass --confirm to delete this event.");
                return Ok(());
            }
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let rows = db::event_scores(&conn, &event_id)?;
            let Some(first) = rows.first() else {
                println!("No event found with ID {}.", event_id);
                return Ok(());
            };
            let name = first
                .event_name
                .clone()
                .unwrap_or_else(|| "Unknown Tournament".into());
            let deleted = db::delete_event(&conn, &event_id)?;
            info!("Deleted event {} ({}) with {} players", event_id, name, deleted);
            println!("Tournament Deleted");
            println!("Event:    {}", name);
            println!("Date:     {}", first.month);
            println!("Format:   {}", first.format);
            println!("Event ID: {}", event_id);
            println!("Players:  {}", deleted);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Score rows: {}", s.rows);
            println!("Players:    {}", s.players);
            println!("Events:     {}", s.events);
            println!("Months:     {}", s.months);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_report(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Record one parsed report. Reports with no players are skipped, not errors.
fn import_report(
    conn: &rusqlite::Connection,
    source: &str,
    report: &ParsedReport,
    month: Option<&str>,
) -> anyhow::Result<usize> {
    let info = &report.event_info;
    if report.players.is_empty() {
        warn!("{}: no player data found", source);
        println!("{}: couldn't find any player data. Make sure it's an EventLink standings report.", source);
        return Ok(0);
    }

    let month = match month {
        Some(m) => m.to_string(),
        None => {
            let date = info
                .event_date
                .as_deref()
                .with_context(|| format!("{}: no event date in report, pass --month", source))?;
            league::report_month(date).with_context(|| format!("{}: bad event date", source))?
        }
    };

    let written = db::record_report(conn, report, &month)?;
    info!("{}: processed {}/{} players", source, written, report.players.len());
    println!(
        "Added {} results: {} ({}) | {} | {} | {}",
        written,
        info.event_name.as_deref().unwrap_or("Unknown event"),
        info.event_id.as_deref().unwrap_or("no id"),
        info.event_date.as_deref().unwrap_or("no date"),
        info.format.as_deref().unwrap_or(db::UNKNOWN_FORMAT),
        month,
    );
    Ok(written)
}

#[derive(Default)]
struct ImportCounts {
    reports: usize,
    skipped: usize,
    failed: usize,
    players: usize,
}

impl ImportCounts {
    fn add(&mut self, players: usize) {
        if players == 0 {
            self.skipped += 1;
        } else {
            self.reports += 1;
            self.players += players;
        }
    }

    fn print(&self) {
        println!(
            "Imported {} reports ({} players), {} without players, {} failed.",
            self.reports, self.players, self.skipped, self.failed,
        );
    }
}

fn import_files(
    conn: &rusqlite::Connection,
    files: &[PathBuf],
    month: Option<&str>,
) -> anyhow::Result<ImportCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut counts = ImportCounts::default();

    for chunk in files.chunks(100) {
        let parsed: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let report = fetch::ensure_txt(path)
                    .and_then(|()| read_report(path))
                    .and_then(|text| parser::parse_report(&text).map_err(anyhow::Error::from));
                (path, report)
            })
            .collect();

        for (path, report) in parsed {
            let source = path.display().to_string();
            let outcome = report.and_then(|r| pb.suspend(|| import_report(conn, &source, &r, month)));
            match outcome {
                Ok(n) => counts.add(n),
                Err(e) => {
                    error!("{:#}", e);
                    counts.failed += 1;
                }
            }
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn print_report(report: &ParsedReport) {
    let info = &report.event_info;
    if info.is_empty() {
        println!("No event header found in the report.");
    }
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".into());
    println!("Event:    {}", or_unknown(&info.event_name));
    println!("Event ID: {}", or_unknown(&info.event_id));
    println!("Date:     {}", or_unknown(&info.event_date));
    println!("Format:   {}", or_unknown(&info.format));
    if let Some(notes) = &info.additional_info {
        println!("Info:     {}", notes);
    }
    println!("Players:  {}", report.players.len());

    if report.players.is_empty() {
        println!("\nI couldn't find any player data in the report. Make sure it's in the correct format.");
        return;
    }

    println!(
        "\n{:>4} | {:<24} | {:>3} | {:>6} | {:>7} | {:>4} | {:>4} | {:>4}",
        "Rank", "Name", "Pod", "Points", "Matches", "OMW%", "GW%", "OGW%"
    );
    println!("{}", "-".repeat(82));
    for p in &report.players {
        println!(
            "{:>4} | {:<24} | {:>3} | {:>6} | {:>7} | {:>4} | {:>4} | {:>4}",
            p.rank,
            truncate(&p.name, 24),
            p.pod,
            p.points,
            p.matches_played,
            p.omw_percentage,
            p.gw_percentage,
            p.ogw_percentage
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
