//! The orchestrator loop. Owns the store and the selection path, reacts to
//! operator commands, applies gateway responses, and keeps the poll loops
//! and the auto-import state machine in step with the live selection.
//!
//! Staleness rule: every fetch response carries the key it was issued for;
//! a response is applied only if that key still matches the current
//! selection and view at arrival time. Everything else is dropped without
//! touching the store.

use crate::settings::EngineSettings;
use crate::sync::error::SyncError;
use crate::sync::importer::{EmptyOutcome, Importer};
use crate::sync::messages::{
    Command, GatewayEvent, GatewayJob, ImportKey, Payload, ResourceKey, TimerEvent,
};
use crate::sync::mutations::ManualForm;
use crate::sync::poller::{PollSlot, Poller};
use crate::sync::projector::TickerMode;
use crate::sync::selection::{Depth, SelectionPath, SelectionValue};
use crate::sync::store::{ActiveView, ErrorScope, MatchListKey, Store};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct Engine {
    pub(crate) settings: EngineSettings,
    pub(crate) store: Store,
    pub(crate) path: SelectionPath,
    pub(crate) view: ActiveView,
    pub(crate) mode: TickerMode,
    pub(crate) poller: Poller,
    pub(crate) importer: Importer,
    /// Fetch keys currently in flight, to avoid issuing duplicates.
    pub(crate) pending: HashSet<ResourceKey>,
    /// The match the match-scoped poll loops are running for.
    pub(crate) polling_match: Option<i64>,
    /// Event ids with a generation request in flight.
    pub(crate) generating: HashSet<i64>,
    /// Entry ids with a publish request in flight.
    pub(crate) publishing: HashSet<i64>,
    pub(crate) manual_form: ManualForm,
    pub(crate) jobs: mpsc::Sender<GatewayJob>,
}

impl Engine {
    pub fn new(
        jobs: mpsc::Sender<GatewayJob>,
        timers: mpsc::Sender<TimerEvent>,
        settings: EngineSettings,
    ) -> Self {
        let importer = Importer::new(
            jobs.clone(),
            timers,
            settings.import_max_attempts,
            settings.import_retry_delay,
        );
        Self {
            poller: Poller::new(jobs.clone()),
            importer,
            settings,
            store: Store::default(),
            path: SelectionPath::default(),
            view: ActiveView::default(),
            mode: TickerMode::default(),
            pending: HashSet::new(),
            polling_match: None,
            generating: HashSet::new(),
            publishing: HashSet::new(),
            manual_form: ManualForm::default(),
            jobs,
        }
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::Receiver<GatewayEvent>,
        mut timers: mpsc::Receiver<TimerEvent>,
    ) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(event) = events.recv() => self.handle_event(event).await,
                Some(timer) = timers.recv() => {
                    let TimerEvent::ImportRetryDue(key) = timer;
                    self.importer.on_timer(key).await;
                }
            }
        }
        self.poller.shutdown();
        self.importer.abandon_all();
        info!("engine stopped");
    }

    pub(crate) async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                self.spawn_fetch(ResourceKey::Leagues).await;
                self.spawn_fetch(ResourceKey::Favorites).await;
            }
            Command::SelectLeague(id) => self.select(Depth::League, SelectionValue::Id(id)).await,
            Command::SelectSeason(id) => self.select(Depth::Season, SelectionValue::Id(id)).await,
            Command::SelectRound(label) => {
                self.select(Depth::Round, SelectionValue::Label(label)).await
            }
            Command::SelectMatch(id) => self.select(Depth::Match, SelectionValue::Id(id)).await,
            Command::SwitchView(view) => self.switch_view(view).await,
            Command::SetMode(mode) => self.mode = mode,
            Command::ToggleFavorite { team_id } => self.toggle_favorite(team_id).await,
            Command::GenerateTicker { event_id, style } => self.generate(event_id, style).await,
            Command::PublishTicker { entry_id, text } => self.publish(entry_id, text).await,
            Command::SubmitManualEntry { text, icon, minute } => {
                self.submit_manual_entry(text, icon, minute).await
            }
            Command::RetryImport {
                league_season_id,
                round,
            } => {
                self.store.clear_error(&ErrorScope::Import {
                    league_season_id,
                    round: round.clone(),
                });
                self.importer.retry(league_season_id, &round).await;
            }
            Command::Shutdown => {}
        }
    }

    pub(crate) async fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::FetchDone { key, result } => self.apply_fetch(key, result).await,
            GatewayEvent::MutationDone { request, result } => {
                self.on_mutation_done(request, result).await
            }
            GatewayEvent::ImportDone { key } => self.importer.on_import_done(key).await,
        }
    }

    // ---- read-side surface -----------------------------------------------

    /// Projection of the selected match's feed in the current mode.
    pub fn ticker_view(&self) -> Option<crate::sync::projector::TickerView> {
        let match_id = self.path.match_id?;
        Some(crate::sync::projector::project(
            &self.store,
            match_id,
            self.mode,
            &self.generating,
        ))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn selection(&self) -> &SelectionPath {
        &self.path
    }

    pub fn active_view(&self) -> ActiveView {
        self.view
    }

    pub fn mode(&self) -> TickerMode {
        self.mode
    }

    pub fn manual_form(&self) -> &ManualForm {
        &self.manual_form
    }

    // ---- selection -------------------------------------------------------

    async fn select(&mut self, depth: Depth, value: SelectionValue) {
        // Cascade selections above the match level only make sense in the
        // league view; selecting there pulls the session back to it.
        if depth < Depth::Match && self.view != ActiveView::Leagues {
            self.poller.stop(PollSlot::LiveMatches);
            self.view = ActiveView::Leagues;
        }
        self.path.set(depth, Some(value));
        // Picking a round whose import budget is already spent counts as a
        // fresh operator trigger: drop the cached empty list so the fetch
        // runs again and restarts the import.
        if depth == Depth::Round {
            if let (Some(ls), Some(round)) =
                (self.path.league_season_id, self.path.round.as_deref())
            {
                if self.importer.is_failed(ls, round) {
                    self.store.matches.clear();
                }
            }
        }
        self.after_selection_change(depth).await;
    }

    async fn after_selection_change(&mut self, depth: Depth) {
        // Errors and import loops scoped to the abandoned selection are
        // dropped; their late responses will fail the key comparison.
        let ls = self.path.league_season_id;
        let round = self.path.round.clone();
        self.store.errors.retain(|scope, _| match scope {
            ErrorScope::Depth(d) => *d < depth,
            ErrorScope::Import {
                league_season_id,
                round: r,
            }
            | ErrorScope::View(MatchListKey::Round {
                league_season_id,
                round: r,
            }) => ls == Some(*league_season_id) && round.as_deref() == Some(r),
            _ => true,
        });
        self.importer.retain_current(ls, round.as_deref());
        if self.path.match_id != self.polling_match {
            self.poller.stop_match_scoped();
            self.polling_match = None;
            self.manual_form = ManualForm::default();
        }
        self.reconcile().await;
    }

    async fn switch_view(&mut self, view: ActiveView) {
        if self.view == view {
            return;
        }
        if self.view == ActiveView::Live {
            self.poller.stop(PollSlot::LiveMatches);
        }
        self.view = view;
        if view == ActiveView::Live {
            self.poller.start(
                PollSlot::LiveMatches,
                ResourceKey::Matches(MatchListKey::Live),
                self.settings.live_poll_interval,
            );
        }
        if let Some(list) = view.list_key() {
            // Entering a view always refreshes its list, even if the store
            // still holds rows from a previous visit.
            self.spawn_fetch(ResourceKey::Matches(list)).await;
        }
        self.reconcile().await;
    }

    // ---- fetch plumbing --------------------------------------------------

    /// Issue every fetch the current selection needs and does not have.
    /// Idempotent: data that is already loaded or in flight is skipped, and
    /// a missing parent stops the walk (its apply hook resumes it).
    async fn reconcile(&mut self) {
        if self.view == ActiveView::Leagues {
            let Some(league_id) = self.path.league_id else {
                return;
            };
            if !self.store.seasons.is_for(&league_id) {
                self.spawn_fetch(ResourceKey::Seasons { league_id }).await;
                return;
            }
            let Some(league_season_id) = self.path.league_season_id else {
                return;
            };
            if !self.store.rounds.is_for(&league_season_id) {
                self.spawn_fetch(ResourceKey::Rounds { league_season_id }).await;
                return;
            }
            let Some(round) = self.path.round.clone() else {
                return;
            };
            let key = MatchListKey::Round {
                league_season_id,
                round,
            };
            if !self.store.matches.is_for(&key) {
                self.spawn_fetch(ResourceKey::Matches(key)).await;
                return;
            }
        } else if let Some(list) = self.view.list_key() {
            if !self.store.matches.is_for(&list) {
                self.spawn_fetch(ResourceKey::Matches(list)).await;
            }
        }
        if let Some(match_id) = self.path.match_id {
            self.ensure_match_resources(match_id).await;
        }
    }

    async fn ensure_match_resources(&mut self, match_id: i64) {
        if self.polling_match != Some(match_id) {
            self.poller.stop_match_scoped();
            self.poller.start(
                PollSlot::MatchEvents,
                ResourceKey::Events { match_id },
                self.settings.match_poll_interval,
            );
            self.poller.start(
                PollSlot::MatchTicker,
                ResourceKey::Ticker { match_id },
                self.settings.match_poll_interval,
            );
            self.polling_match = Some(match_id);
        }
        let detail_loaded = self
            .store
            .match_detail
            .as_ref()
            .is_some_and(|m| m.id == match_id);
        if !detail_loaded {
            self.spawn_fetch(ResourceKey::MatchDetail { match_id }).await;
        }
        if !self.store.events.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::Events { match_id }).await;
        }
        if !self.store.ticker.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::Ticker { match_id }).await;
        }
        if !self.store.prematch.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::Prematch { match_id }).await;
        }
        if !self.store.lineups.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::Lineups { match_id }).await;
        }
        if !self.store.match_stats.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::MatchStats { match_id }).await;
        }
        if !self.store.player_stats.is_for(&match_id) {
            self.spawn_fetch(ResourceKey::PlayerStats { match_id }).await;
        }
    }

    pub(crate) async fn spawn_fetch(&mut self, key: ResourceKey) {
        if !self.pending.insert(key.clone()) {
            return;
        }
        let _ = self.jobs.send(GatewayJob::Fetch(key)).await;
    }

    // ---- response application -------------------------------------------

    async fn apply_fetch(&mut self, key: ResourceKey, result: Result<Payload, SyncError>) {
        self.pending.remove(&key);
        if !self.is_current(&key) {
            debug!(?key, "dropping stale response");
            return;
        }
        match result {
            Err(e) => {
                warn!(?key, "fetch failed: {e}");
                self.store.set_error(scope_for(&key), e);
            }
            Ok(payload) => {
                self.store.clear_error(&scope_for(&key));
                self.apply_payload(key, payload).await;
            }
        }
    }

    async fn apply_payload(&mut self, key: ResourceKey, payload: Payload) {
        match (key, payload) {
            (ResourceKey::Leagues, Payload::Leagues(items)) => {
                self.store.leagues = items;
            }
            (ResourceKey::Seasons { league_id }, Payload::Seasons(mut items)) => {
                // Put the running season first so deterministic first-pick
                // prefers it; order is otherwise preserved.
                items.sort_by_key(|ls| !ls.season.current);
                let candidates: Vec<SelectionValue> =
                    items.iter().map(|ls| SelectionValue::Id(ls.id)).collect();
                self.store.seasons.set(league_id, items);
                self.path.auto_select_first(Depth::Season, &candidates);
                self.reconcile().await;
            }
            (ResourceKey::Rounds { league_season_id }, Payload::Rounds(items)) => {
                let candidates: Vec<SelectionValue> = items
                    .iter()
                    .map(|r| SelectionValue::Label(r.clone()))
                    .collect();
                self.store.rounds.set(league_season_id, items);
                self.path.auto_select_first(Depth::Round, &candidates);
                self.reconcile().await;
            }
            (ResourceKey::Matches(list_key), Payload::Matches(items)) => {
                self.apply_match_list(list_key, items).await;
            }
            (ResourceKey::MatchDetail { .. }, Payload::MatchDetail(m)) => {
                self.store.match_detail = Some(m);
            }
            (ResourceKey::Events { match_id }, Payload::Events(items)) => {
                self.store.events.set(match_id, items);
            }
            (ResourceKey::Ticker { match_id }, Payload::Ticker(items)) => {
                self.store.ticker.set(match_id, items);
            }
            (ResourceKey::Prematch { match_id }, Payload::Prematch(items)) => {
                self.store.prematch.set(match_id, items);
            }
            (ResourceKey::Lineups { match_id }, Payload::Lineups(items)) => {
                self.store.lineups.set(match_id, items);
            }
            (ResourceKey::MatchStats { match_id }, Payload::MatchStats(items)) => {
                self.store.match_stats.set(match_id, items);
            }
            (ResourceKey::PlayerStats { match_id }, Payload::PlayerStats(items)) => {
                self.store.player_stats.set(match_id, items);
            }
            (ResourceKey::Favorites, Payload::Favorites(items)) => {
                self.store.favorites = items;
            }
            (key, _) => warn!(?key, "payload shape does not match its key"),
        }
    }

    async fn apply_match_list(&mut self, list_key: MatchListKey, items: Vec<ticker_api::Match>) {
        let ids: Vec<i64> = items.iter().map(|m| m.id).collect();
        self.store.matches.set(list_key.clone(), items);

        if let MatchListKey::Round {
            league_season_id,
            ref round,
        } = list_key
        {
            if ids.is_empty() {
                self.handle_empty_round(league_season_id, round.clone()).await;
            } else {
                self.importer.on_satisfied(league_season_id, round);
                self.store.clear_error(&ErrorScope::Import {
                    league_season_id,
                    round: round.clone(),
                });
            }
        }

        // Keep the selected match if it survived the refresh, otherwise
        // fall back to the first row (or none for an empty list).
        let selected = self.path.match_id;
        if selected.is_none_or(|id| !ids.contains(&id)) {
            self.path.match_id = ids.first().copied();
            if self.path.match_id.is_none() && self.polling_match.is_some() {
                self.poller.stop_match_scoped();
                self.polling_match = None;
            }
        }
        self.reconcile().await;
    }

    async fn handle_empty_round(&mut self, league_season_id: i64, round: String) {
        let Some(ls) = self.store.league_season(league_season_id) else {
            warn!(league_season_id, "empty round for an unknown league-season");
            return;
        };
        let Some(league_external_id) = ls.league.external_id else {
            warn!(
                league = %ls.league.name,
                "league has no upstream id, cannot trigger import"
            );
            return;
        };
        let key = ImportKey {
            league_season_id,
            round: round.clone(),
            league_external_id,
            season_year: ls.season.year,
        };
        if self.importer.handle_empty(key).await == EmptyOutcome::Exhausted {
            self.store.set_error(
                ErrorScope::Import {
                    league_season_id,
                    round: round.clone(),
                },
                SyncError::ImportExhausted { round },
            );
        } else {
            // An attempt cycle is running again; any exhaustion banner from
            // an earlier run of this round is stale.
            self.store.clear_error(&ErrorScope::Import {
                league_season_id,
                round,
            });
        }
    }

    /// Does this response key still match the live selection and view?
    fn is_current(&self, key: &ResourceKey) -> bool {
        match key {
            ResourceKey::Leagues | ResourceKey::Favorites => true,
            ResourceKey::Seasons { league_id } => {
                self.view == ActiveView::Leagues && self.path.league_id == Some(*league_id)
            }
            ResourceKey::Rounds { league_season_id } => {
                self.view == ActiveView::Leagues
                    && self.path.league_season_id == Some(*league_season_id)
            }
            ResourceKey::Matches(MatchListKey::Round {
                league_season_id,
                round,
            }) => {
                self.view == ActiveView::Leagues
                    && self.path.league_season_id == Some(*league_season_id)
                    && self.path.round.as_deref() == Some(round)
            }
            ResourceKey::Matches(list) => self.view.list_key().as_ref() == Some(list),
            ResourceKey::MatchDetail { match_id }
            | ResourceKey::Events { match_id }
            | ResourceKey::Ticker { match_id }
            | ResourceKey::Prematch { match_id }
            | ResourceKey::Lineups { match_id }
            | ResourceKey::MatchStats { match_id }
            | ResourceKey::PlayerStats { match_id } => self.path.match_id == Some(*match_id),
        }
    }
}

fn scope_for(key: &ResourceKey) -> ErrorScope {
    match key {
        ResourceKey::Leagues => ErrorScope::Depth(Depth::League),
        ResourceKey::Seasons { .. } => ErrorScope::Depth(Depth::Season),
        ResourceKey::Rounds { .. } => ErrorScope::Depth(Depth::Round),
        ResourceKey::Matches(list) => ErrorScope::View(list.clone()),
        ResourceKey::Favorites => ErrorScope::Favorites,
        ResourceKey::MatchDetail { .. }
        | ResourceKey::Events { .. }
        | ResourceKey::Ticker { .. }
        | ResourceKey::Prematch { .. }
        | ResourceKey::Lineups { .. }
        | ResourceKey::MatchStats { .. }
        | ResourceKey::PlayerStats { .. } => ErrorScope::Depth(Depth::Match),
    }
}
