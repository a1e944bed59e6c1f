use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::parser::PlayerResult;

// rank, name, pod, points, OMW%, GW%, OGW%. The name is lazy so the six
// trailing integers stay out of it; \s lets a row straddle a bad line break.
static PLAYER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([0-9]+)\s+([A-Za-zÀ-ÿ\s.']+?)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)\s+([0-9]+)",
    )
    .unwrap()
});

/// Scan the whole text (not line by line) for player rows, in order of appearance.
pub fn extract(text: &str) -> Vec<PlayerResult> {
    let players: Vec<PlayerResult> = PLAYER_RE
        .captures_iter(text)
        .filter(|caps| !is_header(&caps[2]))
        .filter_map(|caps| to_player(&caps))
        .collect();

    info!(count = players.len(), "extracted players");
    players
}

/// The reconstructed column header can reappear as a row.
fn is_header(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case("name")
}

fn to_player(caps: &Captures) -> Option<PlayerResult> {
    let num = |i: usize| -> Option<u32> {
        let raw = &caps[i];
        match raw.parse::<u32>() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(value = raw, error = %e, "numeric column out of range, skipping row");
                None
            }
        }
    };

    let name = caps[2].trim().to_string();
    let points = num(4)?;
    let player = PlayerResult {
        rank: num(1)?,
        pod: num(3)?,
        points,
        matches_played: matches_played(points),
        omw_percentage: num(5)?,
        gw_percentage: num(6)?,
        ogw_percentage: num(7)?,
        name,
    };
    debug!(rank = player.rank, name = %player.name, pod = player.pod, points, "matched player row");
    Some(player)
}

/// Three points per match win; the report has no matches column.
pub fn matches_played(points: u32) -> u32 {
    points.div_ceil(3)
}
