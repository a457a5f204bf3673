use crate::wire::{
    WireEvent, WireFavorite, WireLeague, WireLeagueSeason, WireLineup, WireMatch, WireMatchStats,
    WirePlayerStats, WireTeam, WireTickerEntry,
};
use crate::{
    EntryMode, EventKind, Favorite, League, LeagueSeason, LineupEntry, Match, MatchEvent,
    MatchStats, MatchStatus, PlayerStats, Season, Team, TickerEntry, TickerStyle,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

/// Ticker backend client. One instance per process; cheap to clone
/// (reqwest::Client is an Arc internally).
#[derive(Debug, Clone)]
pub struct TickerApi {
    client: Client,
    base: String,
    ingest_base: String,
    timeout: Duration,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Rejected(StatusCode, String),
    Parsing(reqwest::Error, String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Rejected(status, url) => write!(f, "Backend rejected {url}: {status}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl TickerApi {
    pub fn new(base: impl Into<String>, ingest_base: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("tickerdesk/0.1 (live-ticker operator console)")
                .build()
                .unwrap_or_default(),
            base: trim_slash(base.into()),
            ingest_base: trim_slash(ingest_base.into()),
            timeout: Duration::from_secs(10),
        }
    }

    // -----------------------------------------------------------------------
    // Selection hierarchy reads
    // -----------------------------------------------------------------------

    pub async fn list_leagues(&self) -> ApiResult<Vec<League>> {
        let url = format!("{}/leagues/", self.base);
        let raw: Vec<WireLeague> = self.get(&url).await?;
        Ok(raw.iter().map(map_league).collect())
    }

    pub async fn list_seasons(&self, league_id: i64) -> ApiResult<Vec<LeagueSeason>> {
        let url = format!("{}/leagues/{league_id}/seasons", self.base);
        let raw: Vec<WireLeagueSeason> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_league_season).collect())
    }

    pub async fn list_rounds(&self, league_season_id: i64) -> ApiResult<Vec<String>> {
        let url = format!("{}/league-seasons/{league_season_id}/rounds", self.base);
        self.get(&url).await
    }

    pub async fn list_matches(&self, league_season_id: i64, round: &str) -> ApiResult<Vec<Match>> {
        let url = format!("{}/matches/", self.base);
        let raw: Vec<WireMatch> = self
            .get_query(
                &url,
                &[
                    ("league_season_id", league_season_id.to_string()),
                    ("round", round.to_owned()),
                ],
            )
            .await?;
        Ok(raw.into_iter().map(map_match).collect())
    }

    pub async fn get_match(&self, match_id: i64) -> ApiResult<Match> {
        let url = format!("{}/matches/{match_id}", self.base);
        let raw: WireMatch = self.get(&url).await?;
        Ok(map_match(raw))
    }

    pub async fn list_today_matches(&self) -> ApiResult<Vec<Match>> {
        let url = format!("{}/matches/today", self.base);
        let raw: Vec<WireMatch> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_match).collect())
    }

    pub async fn list_live_matches(&self) -> ApiResult<Vec<Match>> {
        let url = format!("{}/matches/live", self.base);
        let raw: Vec<WireMatch> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_match).collect())
    }

    pub async fn list_favorite_matches(&self, user_id: i64) -> ApiResult<Vec<Match>> {
        let url = format!("{}/favorites/matches", self.base);
        let raw: Vec<WireMatch> = self
            .get_query(&url, &[("user_id", user_id.to_string())])
            .await?;
        Ok(raw.into_iter().map(map_match).collect())
    }

    // -----------------------------------------------------------------------
    // Match-scoped reads
    // -----------------------------------------------------------------------

    pub async fn list_events(&self, match_id: i64) -> ApiResult<Vec<MatchEvent>> {
        let url = format!("{}/events/", self.base);
        let raw: Vec<WireEvent> = self
            .get_query(&url, &[("match_id", match_id.to_string())])
            .await?;
        Ok(raw.iter().map(map_event).collect())
    }

    pub async fn list_ticker(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>> {
        let url = format!("{}/ticker/match/{match_id}", self.base);
        let raw: Vec<WireTickerEntry> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_ticker_entry).collect())
    }

    pub async fn list_prematch(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>> {
        let url = format!("{}/ticker/match/{match_id}/prematch", self.base);
        let raw: Vec<WireTickerEntry> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_ticker_entry).collect())
    }

    pub async fn list_lineups(&self, match_id: i64) -> ApiResult<Vec<LineupEntry>> {
        let url = format!("{}/lineups/match/{match_id}", self.base);
        let raw: Vec<WireLineup> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_lineup).collect())
    }

    pub async fn list_match_stats(&self, match_id: i64) -> ApiResult<Vec<MatchStats>> {
        let url = format!("{}/match-statistics/match/{match_id}", self.base);
        let raw: Vec<WireMatchStats> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_match_stats).collect())
    }

    pub async fn list_player_stats(&self, match_id: i64) -> ApiResult<Vec<PlayerStats>> {
        let url = format!("{}/player-statistics/match/{match_id}", self.base);
        let raw: Vec<WirePlayerStats> = self.get(&url).await?;
        Ok(raw.into_iter().map(map_player_stats).collect())
    }

    pub async fn list_favorites(&self, user_id: i64) -> ApiResult<Vec<Favorite>> {
        let url = format!("{}/favorites/", self.base);
        let raw: Vec<WireFavorite> = self
            .get_query(&url, &[("user_id", user_id.to_string())])
            .await?;
        Ok(raw
            .iter()
            .map(|f| Favorite {
                user_id: f.user_id.unwrap_or(user_id),
                team_id: f.team_id.unwrap_or_default(),
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Adding an already-present favorite is not a hard error; the backend
    /// answers 409 and the pair is present either way.
    pub async fn add_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()> {
        let url = format!("{}/favorites", self.base);
        let body = json!({ "user_id": user_id, "team_id": team_id });
        match self.send_json(self.client.post(&url), &url, &body).await {
            Err(ApiError::Rejected(StatusCode::CONFLICT, _)) => Ok(()),
            other => other,
        }
    }

    /// Removing an absent favorite answers 404; the pair is absent either way.
    pub async fn remove_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()> {
        let url = format!("{}/favorites/{team_id}", self.base);
        let request = self
            .client
            .delete(&url)
            .query(&[("user_id", user_id.to_string())]);
        match self.send_empty(request, &url).await {
            Err(ApiError::Rejected(StatusCode::NOT_FOUND, _)) => Ok(()),
            other => other,
        }
    }

    pub async fn generate_ticker(&self, event_id: i64, style: TickerStyle) -> ApiResult<()> {
        let url = format!("{}/ticker/generate/{event_id}", self.base);
        let request = self
            .client
            .post(&url)
            .query(&[("style", style.wire_value())]);
        self.send_empty(request, &url).await
    }

    /// Publishing persists the (possibly edited) text along with the
    /// publication timestamp.
    pub async fn publish_ticker(&self, entry_id: i64, text: &str) -> ApiResult<()> {
        let url = format!("{}/ticker/{entry_id}", self.base);
        let body = json!({ "text": text, "published_at": Utc::now().to_rfc3339() });
        self.send_json(self.client.patch(&url), &url, &body).await
    }

    pub async fn submit_manual_ticker(
        &self,
        match_id: i64,
        text: &str,
        icon: Option<&str>,
        minute: Option<u8>,
    ) -> ApiResult<()> {
        let url = format!("{}/ticker/manual", self.base);
        let body = json!({
            "match_id": match_id,
            "text": text,
            "icon": icon,
            "minute": minute,
        });
        self.send_json(self.client.post(&url), &url, &body).await
    }

    /// Ask the ingestion service to import matches for a round. Safe to
    /// call repeatedly for the same key; the server dedups.
    pub async fn trigger_import(
        &self,
        league_external_id: i64,
        season_year: u16,
        round: &str,
    ) -> ApiResult<()> {
        let url = format!("{}/import-matches", self.ingest_base);
        let body = json!({
            "league_id": league_external_id,
            "season": season_year,
            "round": round,
        });
        self.send_json(self.client.post(&url), &url, &body).await
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        self.get_query(url, &[]).await
    }

    async fn get_query<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected(status, url.to_owned()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        body: &serde_json::Value,
    ) -> ApiResult<()> {
        self.send_empty(request.json(body), url).await
    }

    async fn send_empty(&self, request: reqwest::RequestBuilder, url: &str) -> ApiResult<()> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected(status, url.to_owned()));
        }
        Ok(())
    }
}

fn trim_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

// ---------------------------------------------------------------------------
// Mapping: backend wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_league(raw: &WireLeague) -> League {
    League {
        id: raw.id.unwrap_or_default(),
        external_id: raw.external_id,
        name: raw.name.clone().unwrap_or_default(),
        country: raw.country.clone(),
    }
}

fn map_league_season(raw: WireLeagueSeason) -> LeagueSeason {
    let league = raw.league.map(|l| map_league(&l)).unwrap_or_default();
    let season = raw
        .season
        .map(|s| Season {
            id: s.id.unwrap_or_default(),
            year: s.year.unwrap_or_default(),
            current: s.current,
        })
        .unwrap_or_default();
    LeagueSeason {
        id: raw.id.unwrap_or_default(),
        league,
        season,
    }
}

fn map_team(raw: Option<WireTeam>) -> Team {
    let raw = raw.unwrap_or_default();
    Team {
        id: raw.id.unwrap_or_default(),
        external_id: raw.external_id,
        name: raw.name.unwrap_or_default(),
        short_name: raw.short_name,
        logo_url: raw.logo_url,
    }
}

fn map_match(raw: WireMatch) -> Match {
    let kickoff = raw
        .match_date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Match {
        id: raw.id.unwrap_or_default(),
        external_id: raw.external_id,
        league_season_id: raw.league_season_id.unwrap_or_default(),
        home_team_id: raw.home_team_id.unwrap_or_default(),
        away_team_id: raw.away_team_id.unwrap_or_default(),
        home_team: map_team(raw.home_team),
        away_team: map_team(raw.away_team),
        score_home: raw.score_home.unwrap_or_default(),
        score_away: raw.score_away.unwrap_or_default(),
        status: parse_status(raw.status.as_deref().unwrap_or_default()),
        minute: raw.minute,
        round: raw.round,
        kickoff,
    }
}

fn parse_status(s: &str) -> MatchStatus {
    match s {
        "1H" => MatchStatus::FirstHalf,
        "HT" => MatchStatus::HalfTime,
        "2H" => MatchStatus::SecondHalf,
        "ET" => MatchStatus::ExtraTime,
        "FT" | "finished" => MatchStatus::Finished,
        "AET" => MatchStatus::FinishedAfterExtraTime,
        "PEN" => MatchStatus::FinishedOnPenalties,
        // Coarse status from rows imported before sub-states existed.
        "live" => MatchStatus::FirstHalf,
        _ => MatchStatus::Scheduled,
    }
}

fn map_event(raw: &WireEvent) -> MatchEvent {
    let kind = match raw.kind.as_deref().unwrap_or_default() {
        "Goal" => EventKind::Goal,
        "Card" => EventKind::Card,
        "subst" => EventKind::Substitution,
        _ => EventKind::Other,
    };
    MatchEvent {
        id: raw.id.unwrap_or_default(),
        match_id: raw.match_id.unwrap_or_default(),
        minute: raw.minute.unwrap_or_default(),
        kind,
        player_name: clean_name(raw.player_name.as_deref()),
        assist_name: clean_name(raw.assist_name.as_deref()),
        detail: raw.detail.clone(),
    }
}

/// Provider rows carry the literal string "null" for absent names.
fn clean_name(name: Option<&str>) -> Option<String> {
    match name {
        None | Some("") | Some("null") => None,
        Some(n) => Some(n.to_owned()),
    }
}

fn map_ticker_entry(raw: WireTickerEntry) -> TickerEntry {
    let mode = match raw.mode.as_deref().unwrap_or_default() {
        "manual" => EntryMode::Manual,
        "hybrid" => EntryMode::Hybrid,
        _ => EntryMode::Auto,
    };
    let published_at = raw
        .published_at
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|dt| dt.with_timezone(&Utc));

    TickerEntry {
        id: raw.id.unwrap_or_default(),
        match_id: raw.match_id.unwrap_or_default(),
        event_id: raw.event_id,
        minute: raw.minute.unwrap_or_default(),
        text: raw.text.unwrap_or_default(),
        icon: raw.icon,
        mode,
        style: raw.style,
        llm_model: raw.llm_model,
        published_at,
    }
}

fn map_lineup(raw: WireLineup) -> LineupEntry {
    let starter = raw
        .starter
        .unwrap_or_else(|| !raw.is_substitute.unwrap_or(false));
    LineupEntry {
        id: raw.id.unwrap_or_default(),
        match_id: raw.match_id.unwrap_or_default(),
        team_id: raw.team_id.unwrap_or_default(),
        player_name: raw.player_name.unwrap_or_default(),
        number: raw.number,
        position: raw.position,
        grid: raw.grid,
        starter,
        formation: raw.formation,
    }
}

fn map_match_stats(raw: WireMatchStats) -> MatchStats {
    MatchStats {
        team_id: raw.team_id.unwrap_or_default(),
        ball_possession: raw.ball_possession,
        total_shots: raw.total_shots,
        shots_on_goal: raw.shots_on_goal,
        passes_percentage: raw.passes_percentage,
        corner_kicks: raw.corner_kicks,
        fouls: raw.fouls,
        offsides: raw.offsides,
    }
}

fn map_player_stats(raw: WirePlayerStats) -> PlayerStats {
    let rating = raw.rating.as_ref().and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
        serde_json::Value::String(s) => s.parse::<f32>().ok(),
        _ => None,
    });
    PlayerStats {
        id: raw.id.unwrap_or_default(),
        team_id: raw.team_id.unwrap_or_default(),
        player_name: raw.player_name.unwrap_or_default(),
        rating,
        position: raw.position,
        number: raw.number,
        minutes_played: raw.minutes_played,
        captain: raw.captain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_sub_states() {
        assert_eq!(parse_status("NS"), MatchStatus::Scheduled);
        assert_eq!(parse_status("1H"), MatchStatus::FirstHalf);
        assert_eq!(parse_status("HT"), MatchStatus::HalfTime);
        assert_eq!(parse_status("2H"), MatchStatus::SecondHalf);
        assert_eq!(parse_status("ET"), MatchStatus::ExtraTime);
        assert_eq!(parse_status("FT"), MatchStatus::Finished);
        assert_eq!(parse_status("AET"), MatchStatus::FinishedAfterExtraTime);
        assert_eq!(parse_status("PEN"), MatchStatus::FinishedOnPenalties);
    }

    #[test]
    fn coarse_live_status_counts_as_live() {
        assert!(parse_status("live").is_live());
        assert!(!parse_status("scheduled").is_live());
        assert!(!parse_status("finished").is_live());
    }

    #[test]
    fn team_mapping_tolerates_sparse_payloads() {
        let full = map_team(Some(WireTeam {
            id: Some(12),
            external_id: Some(157),
            name: Some("FC Bayern München".into()),
            short_name: Some("FCB".into()),
            logo_url: None,
        }));
        assert_eq!(full.id, 12);
        assert_eq!(full.name, "FC Bayern München");
        assert_eq!(full.short_name.as_deref(), Some("FCB"));

        let absent = map_team(None);
        assert_eq!(absent.id, 0);
        assert!(absent.name.is_empty());
    }

    #[test]
    fn event_with_literal_null_assist_maps_to_none() {
        let raw = WireEvent {
            id: Some(7),
            match_id: Some(3),
            minute: Some(23),
            kind: Some("Goal".into()),
            player_name: Some("Musiala".into()),
            assist_name: Some("null".into()),
            detail: None,
        };
        let ev = map_event(&raw);
        assert_eq!(ev.kind, EventKind::Goal);
        assert_eq!(ev.player_name.as_deref(), Some("Musiala"));
        assert!(ev.assist_name.is_none());
    }

    #[test]
    fn lineup_starter_falls_back_to_inverted_is_substitute() {
        let old_row = WireLineup {
            is_substitute: Some(true),
            ..Default::default()
        };
        assert!(!map_lineup(old_row).starter);

        let new_row = WireLineup {
            starter: Some(true),
            is_substitute: Some(true), // starter wins when both present
            ..Default::default()
        };
        assert!(map_lineup(new_row).starter);
    }

    #[test]
    fn player_rating_parses_from_string_and_number() {
        let from_string = WirePlayerStats {
            rating: Some(serde_json::Value::String("7.2".into())),
            ..Default::default()
        };
        assert_eq!(map_player_stats(from_string).rating, Some(7.2));

        let from_number = WirePlayerStats {
            rating: Some(serde_json::json!(6.9)),
            ..Default::default()
        };
        assert_eq!(map_player_stats(from_number).rating, Some(6.9));

        let absent = WirePlayerStats::default();
        assert_eq!(map_player_stats(absent).rating, None);
    }

    #[test]
    fn prematch_classification() {
        let prematch = TickerEntry {
            minute: 0,
            event_id: None,
            mode: EntryMode::Auto,
            ..Default::default()
        };
        assert!(prematch.is_prematch());

        let manual = TickerEntry {
            minute: 0,
            event_id: None,
            mode: EntryMode::Manual,
            ..Default::default()
        };
        assert!(!manual.is_prematch());

        let attached = TickerEntry {
            minute: 12,
            event_id: Some(4),
            mode: EntryMode::Auto,
            ..Default::default()
        };
        assert!(!attached.is_prematch());
    }

    // -----------------------------------------------------------------------
    // HTTP round trips against a local mock server
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_leagues_maps_wire_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/leagues/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":1,"external_id":78,"name":"Bundesliga","country":"Germany"},
                    {"id":2,"name":"Premier League"}]"#,
            )
            .create_async()
            .await;

        let api = TickerApi::new(server.url(), server.url());
        let leagues = api.list_leagues().await.expect("leagues should parse");
        mock.assert_async().await;

        assert_eq!(leagues.len(), 2);
        assert_eq!(leagues[0].name, "Bundesliga");
        assert_eq!(leagues[0].external_id, Some(78));
        assert_eq!(leagues[1].country, None);
    }

    #[tokio::test]
    async fn list_matches_sends_selection_key_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/matches/")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("league_season_id".into(), "9".into()),
                mockito::Matcher::UrlEncoded("round".into(), "Regular Season - 3".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":41,"league_season_id":9,"status":"1H","minute":17}]"#)
            .create_async()
            .await;

        let api = TickerApi::new(server.url(), server.url());
        let matches = api
            .list_matches(9, "Regular Season - 3")
            .await
            .expect("matches should parse");
        mock.assert_async().await;

        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_live());
        assert_eq!(matches[0].minute, Some(17));
    }

    #[tokio::test]
    async fn server_error_surfaces_as_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leagues/")
            .with_status(503)
            .create_async()
            .await;

        let api = TickerApi::new(server.url(), server.url());
        match api.list_leagues().await {
            Err(ApiError::Rejected(status, _)) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remove_absent_favorite_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/favorites/55")
            .match_query(mockito::Matcher::UrlEncoded("user_id".into(), "1".into()))
            .with_status(404)
            .create_async()
            .await;

        let api = TickerApi::new(server.url(), server.url());
        api.remove_favorite(1, 55)
            .await
            .expect("404 on delete should be treated as success");
    }

    #[tokio::test]
    async fn generate_ticker_sends_style_wire_value() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ticker/generate/42")
            .match_query(mockito::Matcher::UrlEncoded(
                "style".into(),
                "kritisch".into(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let api = TickerApi::new(server.url(), server.url());
        api.generate_ticker(42, TickerStyle::Critical)
            .await
            .expect("generate should succeed");
        mock.assert_async().await;
    }
}
