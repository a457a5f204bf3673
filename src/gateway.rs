//! Trait seam over the remote data service and the ingestion service.
//! The worker owns the gateway as a trait object, so anything that can
//! answer these calls can stand in for the HTTP client.

use async_trait::async_trait;
use ticker_api::client::{ApiResult, TickerApi};
use ticker_api::{
    Favorite, League, LeagueSeason, LineupEntry, Match, MatchEvent, MatchStats, PlayerStats,
    TickerEntry, TickerStyle,
};

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_leagues(&self) -> ApiResult<Vec<League>>;
    async fn list_seasons(&self, league_id: i64) -> ApiResult<Vec<LeagueSeason>>;
    async fn list_rounds(&self, league_season_id: i64) -> ApiResult<Vec<String>>;
    async fn list_matches(&self, league_season_id: i64, round: &str) -> ApiResult<Vec<Match>>;
    async fn get_match(&self, match_id: i64) -> ApiResult<Match>;
    async fn list_today_matches(&self) -> ApiResult<Vec<Match>>;
    async fn list_live_matches(&self) -> ApiResult<Vec<Match>>;
    async fn list_favorite_matches(&self, user_id: i64) -> ApiResult<Vec<Match>>;
    async fn list_events(&self, match_id: i64) -> ApiResult<Vec<MatchEvent>>;
    async fn list_ticker(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>>;
    async fn list_prematch(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>>;
    async fn list_lineups(&self, match_id: i64) -> ApiResult<Vec<LineupEntry>>;
    async fn list_match_stats(&self, match_id: i64) -> ApiResult<Vec<MatchStats>>;
    async fn list_player_stats(&self, match_id: i64) -> ApiResult<Vec<PlayerStats>>;
    async fn list_favorites(&self, user_id: i64) -> ApiResult<Vec<Favorite>>;
    async fn add_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()>;
    async fn remove_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()>;
    async fn generate_ticker(&self, event_id: i64, style: TickerStyle) -> ApiResult<()>;
    async fn publish_ticker(&self, entry_id: i64, text: &str) -> ApiResult<()>;
    async fn submit_manual_ticker(
        &self,
        match_id: i64,
        text: &str,
        icon: Option<&str>,
        minute: Option<u8>,
    ) -> ApiResult<()>;
    async fn trigger_import(
        &self,
        league_external_id: i64,
        season_year: u16,
        round: &str,
    ) -> ApiResult<()>;
}

#[async_trait]
impl Gateway for TickerApi {
    async fn list_leagues(&self) -> ApiResult<Vec<League>> {
        TickerApi::list_leagues(self).await
    }

    async fn list_seasons(&self, league_id: i64) -> ApiResult<Vec<LeagueSeason>> {
        TickerApi::list_seasons(self, league_id).await
    }

    async fn list_rounds(&self, league_season_id: i64) -> ApiResult<Vec<String>> {
        TickerApi::list_rounds(self, league_season_id).await
    }

    async fn list_matches(&self, league_season_id: i64, round: &str) -> ApiResult<Vec<Match>> {
        TickerApi::list_matches(self, league_season_id, round).await
    }

    async fn get_match(&self, match_id: i64) -> ApiResult<Match> {
        TickerApi::get_match(self, match_id).await
    }

    async fn list_today_matches(&self) -> ApiResult<Vec<Match>> {
        TickerApi::list_today_matches(self).await
    }

    async fn list_live_matches(&self) -> ApiResult<Vec<Match>> {
        TickerApi::list_live_matches(self).await
    }

    async fn list_favorite_matches(&self, user_id: i64) -> ApiResult<Vec<Match>> {
        TickerApi::list_favorite_matches(self, user_id).await
    }

    async fn list_events(&self, match_id: i64) -> ApiResult<Vec<MatchEvent>> {
        TickerApi::list_events(self, match_id).await
    }

    async fn list_ticker(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>> {
        TickerApi::list_ticker(self, match_id).await
    }

    async fn list_prematch(&self, match_id: i64) -> ApiResult<Vec<TickerEntry>> {
        TickerApi::list_prematch(self, match_id).await
    }

    async fn list_lineups(&self, match_id: i64) -> ApiResult<Vec<LineupEntry>> {
        TickerApi::list_lineups(self, match_id).await
    }

    async fn list_match_stats(&self, match_id: i64) -> ApiResult<Vec<MatchStats>> {
        TickerApi::list_match_stats(self, match_id).await
    }

    async fn list_player_stats(&self, match_id: i64) -> ApiResult<Vec<PlayerStats>> {
        TickerApi::list_player_stats(self, match_id).await
    }

    async fn list_favorites(&self, user_id: i64) -> ApiResult<Vec<Favorite>> {
        TickerApi::list_favorites(self, user_id).await
    }

    async fn add_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()> {
        TickerApi::add_favorite(self, user_id, team_id).await
    }

    async fn remove_favorite(&self, user_id: i64, team_id: i64) -> ApiResult<()> {
        TickerApi::remove_favorite(self, user_id, team_id).await
    }

    async fn generate_ticker(&self, event_id: i64, style: TickerStyle) -> ApiResult<()> {
        TickerApi::generate_ticker(self, event_id, style).await
    }

    async fn publish_ticker(&self, entry_id: i64, text: &str) -> ApiResult<()> {
        TickerApi::publish_ticker(self, entry_id, text).await
    }

    async fn submit_manual_ticker(
        &self,
        match_id: i64,
        text: &str,
        icon: Option<&str>,
        minute: Option<u8>,
    ) -> ApiResult<()> {
        TickerApi::submit_manual_ticker(self, match_id, text, icon, minute).await
    }

    async fn trigger_import(
        &self,
        league_external_id: i64,
        season_year: u16,
        round: &str,
    ) -> ApiResult<()> {
        TickerApi::trigger_import(self, league_external_id, season_year, round).await
    }
}
