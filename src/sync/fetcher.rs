//! Gateway worker: executes tagged jobs against the remote services and
//! answers on the event channel. One task is spawned per job so responses
//! may arrive out of order — the engine's key comparison decides which
//! responses still matter.

use crate::gateway::Gateway;
use crate::sync::error::SyncError;
use crate::sync::messages::{GatewayEvent, GatewayJob, MutationRequest, Payload, ResourceKey};
use crate::sync::store::MatchListKey;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct GatewayWorker {
    gateway: Arc<dyn Gateway>,
    user_id: i64,
    jobs: mpsc::Receiver<GatewayJob>,
    events: mpsc::Sender<GatewayEvent>,
}

impl GatewayWorker {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        user_id: i64,
        jobs: mpsc::Receiver<GatewayJob>,
        events: mpsc::Sender<GatewayEvent>,
    ) -> Self {
        Self {
            gateway,
            user_id,
            jobs,
            events,
        }
    }

    pub async fn run(mut self) {
        while let Some(job) = self.jobs.recv().await {
            let gateway = Arc::clone(&self.gateway);
            let events = self.events.clone();
            let user_id = self.user_id;
            tokio::spawn(async move {
                let event = execute(gateway.as_ref(), user_id, job).await;
                if events.send(event).await.is_err() {
                    debug!("engine gone; dropping gateway event");
                }
            });
        }
    }
}

async fn execute(gateway: &dyn Gateway, user_id: i64, job: GatewayJob) -> GatewayEvent {
    match job {
        GatewayJob::Fetch(key) => {
            let result = fetch(gateway, user_id, &key).await;
            GatewayEvent::FetchDone { key, result }
        }
        GatewayJob::Mutate(request) => {
            let result = mutate(gateway, user_id, &request).await;
            GatewayEvent::MutationDone { request, result }
        }
        GatewayJob::Import(key) => {
            // The import may already be running server-side from an earlier
            // attempt; a failed trigger must not block verification.
            if let Err(e) = gateway
                .trigger_import(key.league_external_id, key.season_year, &key.round)
                .await
            {
                warn!(round = %key.round, "import trigger failed, verifying anyway: {e}");
            }
            GatewayEvent::ImportDone { key }
        }
    }
}

async fn fetch(
    gateway: &dyn Gateway,
    user_id: i64,
    key: &ResourceKey,
) -> Result<Payload, SyncError> {
    let payload = match key {
        ResourceKey::Leagues => Payload::Leagues(gateway.list_leagues().await?),
        ResourceKey::Seasons { league_id } => {
            Payload::Seasons(gateway.list_seasons(*league_id).await?)
        }
        ResourceKey::Rounds { league_season_id } => {
            Payload::Rounds(gateway.list_rounds(*league_season_id).await?)
        }
        ResourceKey::Matches(MatchListKey::Round {
            league_season_id,
            round,
        }) => Payload::Matches(gateway.list_matches(*league_season_id, round).await?),
        ResourceKey::Matches(MatchListKey::Today) => {
            Payload::Matches(gateway.list_today_matches().await?)
        }
        ResourceKey::Matches(MatchListKey::Live) => {
            Payload::Matches(gateway.list_live_matches().await?)
        }
        ResourceKey::Matches(MatchListKey::Favorites) => {
            Payload::Matches(gateway.list_favorite_matches(user_id).await?)
        }
        ResourceKey::MatchDetail { match_id } => {
            Payload::MatchDetail(gateway.get_match(*match_id).await?)
        }
        ResourceKey::Events { match_id } => Payload::Events(gateway.list_events(*match_id).await?),
        ResourceKey::Ticker { match_id } => Payload::Ticker(gateway.list_ticker(*match_id).await?),
        ResourceKey::Prematch { match_id } => {
            Payload::Prematch(gateway.list_prematch(*match_id).await?)
        }
        ResourceKey::Lineups { match_id } => {
            Payload::Lineups(gateway.list_lineups(*match_id).await?)
        }
        ResourceKey::MatchStats { match_id } => {
            Payload::MatchStats(gateway.list_match_stats(*match_id).await?)
        }
        ResourceKey::PlayerStats { match_id } => {
            Payload::PlayerStats(gateway.list_player_stats(*match_id).await?)
        }
        ResourceKey::Favorites => Payload::Favorites(gateway.list_favorites(user_id).await?),
    };
    Ok(payload)
}

async fn mutate(
    gateway: &dyn Gateway,
    user_id: i64,
    request: &MutationRequest,
) -> Result<(), SyncError> {
    match request {
        MutationRequest::AddFavorite { team_id } => {
            gateway.add_favorite(user_id, *team_id).await?
        }
        MutationRequest::RemoveFavorite { team_id } => {
            gateway.remove_favorite(user_id, *team_id).await?
        }
        MutationRequest::Generate { event_id, style } => {
            gateway.generate_ticker(*event_id, *style).await?
        }
        MutationRequest::Publish { entry_id, text } => {
            gateway.publish_ticker(*entry_id, text).await?
        }
        MutationRequest::ManualEntry {
            match_id,
            text,
            icon,
            minute,
        } => {
            gateway
                .submit_manual_ticker(*match_id, text, icon.as_deref(), Some(*minute))
                .await?
        }
    }
    Ok(())
}
