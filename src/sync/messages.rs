//! Channel message types between the operator surface, the engine loop
//! and the gateway worker.

use crate::sync::error::SyncError;
use crate::sync::projector::TickerMode;
use crate::sync::store::{ActiveView, MatchListKey};
use ticker_api::{
    Favorite, League, LeagueSeason, LineupEntry, Match, MatchEvent, MatchStats, PlayerStats,
    TickerEntry, TickerStyle,
};

/// Operator-driven commands into the engine loop.
#[derive(Debug, Clone)]
pub enum Command {
    /// Initial load: leagues plus the favorite set.
    Start,
    SelectLeague(i64),
    SelectSeason(i64),
    SelectRound(String),
    SelectMatch(i64),
    SwitchView(ActiveView),
    SetMode(TickerMode),
    ToggleFavorite { team_id: i64 },
    GenerateTicker { event_id: i64, style: TickerStyle },
    PublishTicker { entry_id: i64, text: String },
    SubmitManualEntry {
        text: String,
        icon: Option<String>,
        minute: String,
    },
    /// Operator retry after an exhausted auto-import.
    RetryImport {
        league_season_id: i64,
        round: String,
    },
    Shutdown,
}

/// Everything a fetch result can belong to. The key is compared against
/// the live selection when the response arrives; mismatches are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Leagues,
    Seasons { league_id: i64 },
    Rounds { league_season_id: i64 },
    Matches(MatchListKey),
    MatchDetail { match_id: i64 },
    Events { match_id: i64 },
    Ticker { match_id: i64 },
    Prematch { match_id: i64 },
    Lineups { match_id: i64 },
    MatchStats { match_id: i64 },
    PlayerStats { match_id: i64 },
    Favorites,
}

#[derive(Debug)]
pub enum Payload {
    Leagues(Vec<League>),
    Seasons(Vec<LeagueSeason>),
    Rounds(Vec<String>),
    Matches(Vec<Match>),
    MatchDetail(Match),
    Events(Vec<MatchEvent>),
    Ticker(Vec<TickerEntry>),
    Prematch(Vec<TickerEntry>),
    Lineups(Vec<LineupEntry>),
    MatchStats(Vec<MatchStats>),
    PlayerStats(Vec<PlayerStats>),
    Favorites(Vec<Favorite>),
}

/// Identifies one auto-import loop. Equality is the whole tuple, but the
/// league-season id + round pair is what makes the loop unique: the
/// external id and season year are carried along for the ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub league_season_id: i64,
    pub round: String,
    pub league_external_id: i64,
    pub season_year: u16,
}

/// Mutations sent through the gateway worker. Confirm-then-refresh: the
/// engine re-reads the affected collection after a success instead of
/// patching it locally.
#[derive(Debug, Clone)]
pub enum MutationRequest {
    AddFavorite { team_id: i64 },
    RemoveFavorite { team_id: i64 },
    Generate { event_id: i64, style: TickerStyle },
    Publish { entry_id: i64, text: String },
    ManualEntry {
        match_id: i64,
        text: String,
        icon: Option<String>,
        minute: u8,
    },
}

/// Work for the gateway worker.
#[derive(Debug, Clone)]
pub enum GatewayJob {
    Fetch(ResourceKey),
    Mutate(MutationRequest),
    /// Fire the ingestion service for a round. The response is swallowed:
    /// an import may already be running server-side from an earlier
    /// attempt, so failure here never blocks the verify step.
    Import(ImportKey),
}

/// Answers from the gateway worker back into the engine loop.
#[derive(Debug)]
pub enum GatewayEvent {
    FetchDone {
        key: ResourceKey,
        result: Result<Payload, SyncError>,
    },
    MutationDone {
        request: MutationRequest,
        result: Result<(), SyncError>,
    },
    /// The import request settled (successfully or not); time to verify.
    ImportDone { key: ImportKey },
}

/// Internal timer wakeups.
#[derive(Debug)]
pub enum TimerEvent {
    ImportRetryDue(ImportKey),
}
