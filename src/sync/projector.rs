//! Read-side projection: merges the selected match's events and ticker
//! entries into one line feed, newest first, plus a stats panel. Pure
//! functions over the store so the projection is trivially testable.

use crate::sync::store::Store;
use std::collections::{HashMap, HashSet};
use ticker_api::{
    EntryMode, EventKind, LineupEntry, Match, MatchEvent, MatchStats, PlayerStats, TickerEntry,
};

/// How the operator works the ticker. Auto shows the feed as-is, review
/// surfaces drafts and generation offers, manual is hand-written entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickerMode {
    #[default]
    Auto,
    Review,
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchHeader {
    pub home: String,
    pub away: String,
    pub score_home: u8,
    pub score_away: u8,
    pub status: String,
    pub minute: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerLine {
    pub minute: u8,
    pub icon: Option<String>,
    pub body: LineBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineBody {
    /// Published commentary, shown verbatim.
    Text(String),
    /// A draft entry awaiting review before publication.
    Draft { entry_id: i64, text: String },
    /// An event with no entry yet: fallback rendering, optionally with a
    /// generation offer in review mode.
    Event {
        event_id: i64,
        text: String,
        offer_generation: bool,
    },
    /// Commentary generation is in flight for this event.
    Generating { event_id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatRow {
    pub label: &'static str,
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatsPanel {
    pub rows: Vec<StatRow>,
    /// Five best-rated players across both teams.
    pub top_rated: Vec<PlayerStats>,
    pub home_starters: Vec<LineupEntry>,
    pub away_starters: Vec<LineupEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct TickerView {
    pub header: Option<MatchHeader>,
    pub prematch: Vec<String>,
    pub lines: Vec<TickerLine>,
    pub stats: StatsPanel,
}

/// Build the feed for `match_id` from whatever the store currently holds.
/// `generating` is the set of event ids with a generation in flight.
pub fn project(
    store: &Store,
    match_id: i64,
    mode: TickerMode,
    generating: &HashSet<i64>,
) -> TickerView {
    let detail = store
        .match_detail
        .as_ref()
        .filter(|m| m.id == match_id);
    let events = store.events.get(&match_id).unwrap_or_default();
    let ticker = store.ticker.get(&match_id).unwrap_or_default();
    let prematch = store.prematch.get(&match_id).unwrap_or_default();

    TickerView {
        header: detail.map(header),
        prematch: prematch
            .iter()
            .filter(|e| e.is_prematch())
            .map(|e| e.text.clone())
            .collect(),
        lines: lines(events, ticker, mode, generating),
        stats: stats_panel(detail, store, match_id),
    }
}

fn header(m: &Match) -> MatchHeader {
    MatchHeader {
        home: m.home_team.name.clone(),
        away: m.away_team.name.clone(),
        score_home: m.score_home,
        score_away: m.score_away,
        status: m.status.label().to_owned(),
        minute: m.minute,
    }
}

fn lines(
    events: &[MatchEvent],
    ticker: &[TickerEntry],
    mode: TickerMode,
    generating: &HashSet<i64>,
) -> Vec<TickerLine> {
    let by_event: HashMap<i64, &TickerEntry> = ticker
        .iter()
        .filter_map(|e| e.event_id.map(|id| (id, e)))
        .collect();

    let mut lines: Vec<TickerLine> = Vec::with_capacity(events.len());
    for event in events {
        let line = match by_event.get(&event.id) {
            Some(entry) if entry.published_at.is_some() || mode == TickerMode::Auto => TickerLine {
                minute: entry.minute,
                icon: entry.icon.clone(),
                body: LineBody::Text(entry.text.clone()),
            },
            Some(entry) => TickerLine {
                minute: entry.minute,
                icon: entry.icon.clone(),
                body: LineBody::Draft {
                    entry_id: entry.id,
                    text: entry.text.clone(),
                },
            },
            None if generating.contains(&event.id) => TickerLine {
                minute: event.minute,
                icon: None,
                body: LineBody::Generating { event_id: event.id },
            },
            None => TickerLine {
                minute: event.minute,
                icon: None,
                body: LineBody::Event {
                    event_id: event.id,
                    text: fallback_text(event),
                    offer_generation: mode == TickerMode::Review,
                },
            },
        };
        lines.push(line);
    }

    // Manual entries have no backing event but belong in the feed.
    for entry in ticker {
        if entry.event_id.is_none() && entry.mode == EntryMode::Manual {
            lines.push(TickerLine {
                minute: entry.minute,
                icon: entry.icon.clone(),
                body: LineBody::Text(entry.text.clone()),
            });
        }
    }

    // Newest first, stable so same-minute lines keep feed order.
    lines.sort_by_key(|l| std::cmp::Reverse(l.minute));
    lines
}

/// Readable fallback when an event has no commentary yet.
fn fallback_text(event: &MatchEvent) -> String {
    let player = event.player_name.as_deref().unwrap_or("Unknown");
    match event.kind {
        EventKind::Goal => match event.assist_name.as_deref() {
            Some(assist) => format!("Goal! {player} (assist: {assist})"),
            None => format!("Goal! {player}"),
        },
        EventKind::Card => {
            let card = event.detail.as_deref().unwrap_or("Card");
            format!("{card}: {player}")
        }
        EventKind::Substitution => match event.assist_name.as_deref() {
            Some(incoming) => format!("Substitution: {incoming} for {player}"),
            None => format!("Substitution: {player} off"),
        },
        EventKind::Other => event
            .detail
            .clone()
            .unwrap_or_else(|| format!("{}' event", event.minute)),
    }
}

fn stats_panel(detail: Option<&Match>, store: &Store, match_id: i64) -> StatsPanel {
    let match_stats = store.match_stats.get(&match_id).unwrap_or_default();
    let player_stats = store.player_stats.get(&match_id).unwrap_or_default();
    let lineups = store.lineups.get(&match_id).unwrap_or_default();

    let (home_id, away_id) = match detail {
        Some(m) => (m.home_team_id, m.away_team_id),
        None => (0, 0),
    };
    let home = match_stats.iter().find(|s| s.team_id == home_id);
    let away = match_stats.iter().find(|s| s.team_id == away_id);

    let mut top_rated: Vec<PlayerStats> = player_stats
        .iter()
        .filter(|p| p.rating.is_some())
        .cloned()
        .collect();
    top_rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_rated.truncate(5);

    StatsPanel {
        rows: stat_rows(home, away),
        top_rated,
        home_starters: starters(lineups, home_id),
        away_starters: starters(lineups, away_id),
    }
}

fn starters(lineups: &[LineupEntry], team_id: i64) -> Vec<LineupEntry> {
    lineups
        .iter()
        .filter(|l| l.team_id == team_id && l.starter)
        .cloned()
        .collect()
}

fn stat_rows(home: Option<&MatchStats>, away: Option<&MatchStats>) -> Vec<StatRow> {
    fn row<T: std::fmt::Display>(
        label: &'static str,
        home: Option<T>,
        away: Option<T>,
        suffix: &str,
    ) -> Option<StatRow> {
        if home.is_none() && away.is_none() {
            return None;
        }
        let fmt = |v: Option<T>| match v {
            Some(v) => format!("{v}{suffix}"),
            None => "–".to_owned(),
        };
        Some(StatRow {
            label,
            home: fmt(home),
            away: fmt(away),
        })
    }

    [
        row(
            "Possession",
            home.and_then(|s| s.ball_possession),
            away.and_then(|s| s.ball_possession),
            "%",
        ),
        row(
            "Shots",
            home.and_then(|s| s.total_shots),
            away.and_then(|s| s.total_shots),
            "",
        ),
        row(
            "Shots on goal",
            home.and_then(|s| s.shots_on_goal),
            away.and_then(|s| s.shots_on_goal),
            "",
        ),
        row(
            "Pass accuracy",
            home.and_then(|s| s.passes_percentage),
            away.and_then(|s| s.passes_percentage),
            "%",
        ),
        row(
            "Corners",
            home.and_then(|s| s.corner_kicks),
            away.and_then(|s| s.corner_kicks),
            "",
        ),
        row(
            "Fouls",
            home.and_then(|s| s.fouls),
            away.and_then(|s| s.fouls),
            "",
        ),
        row(
            "Offsides",
            home.and_then(|s| s.offsides),
            away.and_then(|s| s.offsides),
            "",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
