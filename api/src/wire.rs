/// Backend raw wire types — serde shapes for deserializing ticker-backend
/// responses. These map to the clean domain types via the mapping fns in
/// client.rs.
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Leagues / seasons
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireLeague {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub name: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireSeason {
    pub id: Option<i64>,
    pub year: Option<u16>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireLeagueSeason {
    pub id: Option<i64>,
    pub league: Option<WireLeague>,
    pub season: Option<WireSeason>,
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireTeam {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireMatch {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub league_season_id: Option<i64>,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub home_team: Option<WireTeam>,
    pub away_team: Option<WireTeam>,
    pub score_home: Option<u8>,
    pub score_away: Option<u8>,
    pub status: Option<String>,
    pub minute: Option<u8>,
    pub round: Option<String>,
    pub match_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Events / ticker entries
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireEvent {
    pub id: Option<i64>,
    pub match_id: Option<i64>,
    pub minute: Option<u8>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub player_name: Option<String>,
    /// Assist for goals, incoming player for substitutions. Older rows
    /// carry the literal string "null".
    pub assist_name: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireTickerEntry {
    /// The prematch endpoint names this field ticker_entry_id.
    #[serde(alias = "ticker_entry_id")]
    pub id: Option<i64>,
    pub match_id: Option<i64>,
    pub event_id: Option<i64>,
    pub minute: Option<u8>,
    pub text: Option<String>,
    pub icon: Option<String>,
    pub mode: Option<String>,
    pub style: Option<String>,
    pub llm_model: Option<String>,
    pub published_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Lineups / statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireLineup {
    pub id: Option<i64>,
    pub match_id: Option<i64>,
    pub team_id: Option<i64>,
    pub player_name: Option<String>,
    pub number: Option<u8>,
    pub position: Option<String>,
    pub grid: Option<String>,
    /// Newer backend rows carry `starter`; older ones `is_substitute`.
    pub starter: Option<bool>,
    pub is_substitute: Option<bool>,
    pub formation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireMatchStats {
    pub team_id: Option<i64>,
    pub ball_possession: Option<u8>,
    pub total_shots: Option<u16>,
    pub shots_on_goal: Option<u16>,
    pub passes_percentage: Option<u8>,
    pub corner_kicks: Option<u16>,
    pub fouls: Option<u16>,
    pub offsides: Option<u16>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WirePlayerStats {
    pub id: Option<i64>,
    pub team_id: Option<i64>,
    pub player_name: Option<String>,
    /// Upstream provider serializes ratings as strings ("7.2").
    pub rating: Option<serde_json::Value>,
    pub position: Option<String>,
    pub number: Option<u8>,
    pub minutes_played: Option<u8>,
    #[serde(default)]
    pub captain: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireFavorite {
    pub user_id: Option<i64>,
    pub team_id: Option<i64>,
}
