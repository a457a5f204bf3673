pub mod client;
pub mod wire;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the backend wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct League {
    pub id: i64,
    pub external_id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Season {
    pub id: i64,
    pub year: u16,
    pub current: bool,
}

/// A league playing a specific season — the unit the round and match
/// endpoints are keyed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueSeason {
    pub id: i64,
    pub league: League,
    pub season: Season,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub id: i64,
    pub external_id: Option<i64>,
    pub name: String,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    Finished,
    FinishedAfterExtraTime,
    FinishedOnPenalties,
}

impl MatchStatus {
    pub fn is_live(self) -> bool {
        matches!(
            self,
            MatchStatus::FirstHalf
                | MatchStatus::HalfTime
                | MatchStatus::SecondHalf
                | MatchStatus::ExtraTime
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(
            self,
            MatchStatus::Finished
                | MatchStatus::FinishedAfterExtraTime
                | MatchStatus::FinishedOnPenalties
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::FirstHalf => "1st half",
            MatchStatus::HalfTime => "half-time",
            MatchStatus::SecondHalf => "2nd half",
            MatchStatus::ExtraTime => "extra time",
            MatchStatus::Finished => "finished",
            MatchStatus::FinishedAfterExtraTime => "finished (aet)",
            MatchStatus::FinishedOnPenalties => "finished (pen)",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Match {
    pub id: i64,
    pub external_id: Option<i64>,
    pub league_season_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_team: Team,
    pub away_team: Team,
    pub score_home: u8,
    pub score_away: u8,
    pub status: MatchStatus,
    pub minute: Option<u8>,
    pub round: Option<String>,
    pub kickoff: Option<DateTime<Utc>>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventKind {
    Goal,
    Card,
    Substitution,
    #[default]
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct MatchEvent {
    pub id: i64,
    pub match_id: i64,
    pub minute: u8,
    pub kind: EventKind,
    pub player_name: Option<String>,
    /// Assist for goals, the incoming player for substitutions.
    pub assist_name: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryMode {
    #[default]
    Auto,
    Hybrid,
    Manual,
}

/// Commentary style offered to the generation service. The backend keeps
/// the original German wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickerStyle {
    Neutral,
    Enthusiastic,
    Critical,
}

impl TickerStyle {
    pub fn wire_value(self) -> &'static str {
        match self {
            TickerStyle::Neutral => "neutral",
            TickerStyle::Enthusiastic => "euphorisch",
            TickerStyle::Critical => "kritisch",
        }
    }

    pub const ALL: [TickerStyle; 3] = [
        TickerStyle::Neutral,
        TickerStyle::Enthusiastic,
        TickerStyle::Critical,
    ];
}

/// One ticker line: generated, reviewed or manually authored commentary.
/// `event_id == None` means the entry is not tied to a discrete match
/// event — it is either a prematch report or a manual editor entry.
#[derive(Debug, Clone, Default)]
pub struct TickerEntry {
    pub id: i64,
    pub match_id: i64,
    pub event_id: Option<i64>,
    pub minute: u8,
    pub text: String,
    pub icon: Option<String>,
    pub mode: EntryMode,
    pub style: Option<String>,
    pub llm_model: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl TickerEntry {
    /// Prematch reports are unattached auto entries filed at minute 0.
    pub fn is_prematch(&self) -> bool {
        self.event_id.is_none() && self.mode != EntryMode::Manual && self.minute == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineupEntry {
    pub id: i64,
    pub match_id: i64,
    pub team_id: i64,
    pub player_name: String,
    pub number: Option<u8>,
    pub position: Option<String>,
    pub grid: Option<String>,
    pub starter: bool,
    pub formation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchStats {
    pub team_id: i64,
    pub ball_possession: Option<u8>,
    pub total_shots: Option<u16>,
    pub shots_on_goal: Option<u16>,
    pub passes_percentage: Option<u8>,
    pub corner_kicks: Option<u16>,
    pub fouls: Option<u16>,
    pub offsides: Option<u16>,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerStats {
    pub id: i64,
    pub team_id: i64,
    pub player_name: String,
    pub rating: Option<f32>,
    pub position: Option<String>,
    pub number: Option<u8>,
    pub minutes_played: Option<u8>,
    pub captain: bool,
}

/// Set semantics: a (user, team) pair is either present or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Favorite {
    pub user_id: i64,
    pub team_id: i64,
}
