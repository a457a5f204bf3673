//! Operator mutations. All writes are confirm-then-refresh: the store is
//! never patched optimistically, the engine waits for the backend to
//! confirm and then re-reads the affected collection.

use crate::sync::engine::Engine;
use crate::sync::error::SyncError;
use crate::sync::messages::{GatewayJob, MutationRequest, ResourceKey};
use crate::sync::store::ErrorScope;
use ticker_api::TickerStyle;
use tracing::{debug, warn};

/// The manual entry form. Kept across a failed submit so the operator's
/// input is not lost; cleared only on confirmed success.
#[derive(Debug, Clone, Default)]
pub struct ManualForm {
    pub text: String,
    pub icon: Option<String>,
    pub minute: String,
}

impl Engine {
    pub(crate) async fn toggle_favorite(&mut self, team_id: i64) {
        let request = if self.store.is_favorite(team_id) {
            MutationRequest::RemoveFavorite { team_id }
        } else {
            MutationRequest::AddFavorite { team_id }
        };
        self.store.clear_error(&ErrorScope::Favorites);
        self.send_mutation(request).await;
    }

    pub(crate) async fn generate(&mut self, event_id: i64, style: TickerStyle) {
        if !self.generating.insert(event_id) {
            debug!(event_id, "generation already in flight, ignoring");
            return;
        }
        self.store.clear_error(&ErrorScope::Generate(event_id));
        self.send_mutation(MutationRequest::Generate { event_id, style })
            .await;
    }

    pub(crate) async fn publish(&mut self, entry_id: i64, text: String) {
        if text.trim().is_empty() {
            self.store.set_error(
                ErrorScope::Publish(entry_id),
                SyncError::Validation {
                    field: "text",
                    message: "entry text must not be empty".into(),
                },
            );
            return;
        }
        if !self.publishing.insert(entry_id) {
            return;
        }
        self.store.clear_error(&ErrorScope::Publish(entry_id));
        self.send_mutation(MutationRequest::Publish { entry_id, text })
            .await;
    }

    pub(crate) async fn submit_manual_entry(
        &mut self,
        text: String,
        icon: Option<String>,
        minute: String,
    ) {
        self.manual_form = ManualForm {
            text: text.clone(),
            icon: icon.clone(),
            minute: minute.clone(),
        };
        let Some(match_id) = self.path.match_id else {
            self.store.set_error(
                ErrorScope::ManualEntry,
                SyncError::Validation {
                    field: "match",
                    message: "no match selected".into(),
                },
            );
            return;
        };
        if text.trim().is_empty() {
            self.store.set_error(
                ErrorScope::ManualEntry,
                SyncError::Validation {
                    field: "text",
                    message: "entry text must not be empty".into(),
                },
            );
            return;
        }
        let minute = match validate_minute(&minute) {
            Ok(m) => m,
            Err(e) => {
                self.store.set_error(ErrorScope::ManualEntry, e);
                return;
            }
        };
        self.store.clear_error(&ErrorScope::ManualEntry);
        self.send_mutation(MutationRequest::ManualEntry {
            match_id,
            text,
            icon,
            minute,
        })
        .await;
    }

    pub(crate) async fn on_mutation_done(
        &mut self,
        request: MutationRequest,
        result: Result<(), SyncError>,
    ) {
        match request {
            MutationRequest::AddFavorite { .. } | MutationRequest::RemoveFavorite { .. } => {
                match result {
                    Ok(()) => self.spawn_fetch(ResourceKey::Favorites).await,
                    Err(e) => {
                        warn!("favorite toggle failed: {e}");
                        self.store.set_error(ErrorScope::Favorites, e);
                    }
                }
            }
            MutationRequest::Generate { event_id, .. } => {
                self.generating.remove(&event_id);
                match result {
                    Ok(()) => self.refresh_ticker().await,
                    Err(e) => {
                        warn!(event_id, "generation failed: {e}");
                        self.store.set_error(ErrorScope::Generate(event_id), e);
                    }
                }
            }
            MutationRequest::Publish { entry_id, .. } => {
                self.publishing.remove(&entry_id);
                match result {
                    Ok(()) => self.refresh_ticker().await,
                    Err(e) => {
                        warn!(entry_id, "publish failed: {e}");
                        self.store.set_error(ErrorScope::Publish(entry_id), e);
                    }
                }
            }
            MutationRequest::ManualEntry { match_id, .. } => match result {
                Ok(()) => {
                    self.manual_form = ManualForm::default();
                    if self.path.match_id == Some(match_id) {
                        self.refresh_ticker().await;
                    }
                }
                Err(e) => {
                    warn!(match_id, "manual entry failed: {e}");
                    self.store.set_error(ErrorScope::ManualEntry, e);
                }
            },
        }
    }

    async fn refresh_ticker(&mut self) {
        if let Some(match_id) = self.path.match_id {
            self.spawn_fetch(ResourceKey::Ticker { match_id }).await;
        }
    }

    async fn send_mutation(&mut self, request: MutationRequest) {
        let _ = self.jobs.send(GatewayJob::Mutate(request)).await;
    }
}

fn validate_minute(raw: &str) -> Result<u8, SyncError> {
    let trimmed = raw.trim();
    let value: u8 = trimmed.parse().map_err(|_| SyncError::Validation {
        field: "minute",
        message: format!("'{trimmed}' is not a number"),
    })?;
    if !(1..=120).contains(&value) {
        return Err(SyncError::Validation {
            field: "minute",
            message: "minute must be between 1 and 120".into(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;
    use crate::sync::messages::Command;
    use ticker_api::Favorite;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::error::TryRecvError;

    fn harness() -> (Engine, mpsc::Receiver<GatewayJob>) {
        let (jobs_tx, jobs_rx) = mpsc::channel(64);
        let (timers_tx, timers_rx) = mpsc::channel(16);
        drop(timers_rx);
        let engine = Engine::new(jobs_tx, timers_tx, EngineSettings::default());
        (engine, jobs_rx)
    }

    fn drain(rx: &mut mpsc::Receiver<GatewayJob>) -> Vec<GatewayJob> {
        let mut jobs = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(job) => jobs.push(job),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        jobs
    }

    #[tokio::test]
    async fn favorite_toggle_follows_current_membership() {
        let (mut engine, mut jobs) = harness();
        engine
            .handle_command(Command::ToggleFavorite { team_id: 3 })
            .await;
        assert!(matches!(
            &drain(&mut jobs)[..],
            [GatewayJob::Mutate(MutationRequest::AddFavorite { team_id: 3 })]
        ));

        engine.store.favorites = vec![Favorite {
            user_id: 1,
            team_id: 3,
        }];
        engine
            .handle_command(Command::ToggleFavorite { team_id: 3 })
            .await;
        assert!(matches!(
            &drain(&mut jobs)[..],
            [GatewayJob::Mutate(MutationRequest::RemoveFavorite {
                team_id: 3
            })]
        ));
    }

    #[tokio::test]
    async fn favorite_success_refetches_the_set() {
        let (mut engine, mut jobs) = harness();
        engine
            .on_mutation_done(MutationRequest::AddFavorite { team_id: 3 }, Ok(()))
            .await;
        assert!(matches!(
            &drain(&mut jobs)[..],
            [GatewayJob::Fetch(ResourceKey::Favorites)]
        ));

        engine
            .on_mutation_done(
                MutationRequest::RemoveFavorite { team_id: 3 },
                Err(SyncError::Transport("down".into())),
            )
            .await;
        assert!(engine.store.errors.contains_key(&ErrorScope::Favorites));
    }

    #[tokio::test]
    async fn duplicate_generation_request_is_ignored() {
        let (mut engine, mut jobs) = harness();
        engine.generate(9, TickerStyle::Critical).await;
        engine.generate(9, TickerStyle::Neutral).await;
        assert_eq!(drain(&mut jobs).len(), 1);

        // Once the first settles, the event can be generated again.
        engine
            .on_mutation_done(
                MutationRequest::Generate {
                    event_id: 9,
                    style: TickerStyle::Critical,
                },
                Err(SyncError::Transport("llm timeout".into())),
            )
            .await;
        assert!(engine.store.errors.contains_key(&ErrorScope::Generate(9)));
        engine.generate(9, TickerStyle::Critical).await;
        assert_eq!(drain(&mut jobs).len(), 1);
    }

    #[tokio::test]
    async fn generation_success_refreshes_the_ticker() {
        let (mut engine, mut jobs) = harness();
        engine.path.match_id = Some(41);
        engine.generate(9, TickerStyle::Neutral).await;
        drain(&mut jobs);

        engine
            .on_mutation_done(
                MutationRequest::Generate {
                    event_id: 9,
                    style: TickerStyle::Neutral,
                },
                Ok(()),
            )
            .await;
        assert!(matches!(
            &drain(&mut jobs)[..],
            [GatewayJob::Fetch(ResourceKey::Ticker { match_id: 41 })]
        ));
    }

    #[tokio::test]
    async fn manual_entry_minute_is_validated_locally() {
        let (mut engine, mut jobs) = harness();
        engine.path.match_id = Some(41);

        for minute in ["0", "121", "abc", ""] {
            engine
                .submit_manual_entry("Tor!".into(), None, minute.into())
                .await;
            assert!(
                engine.store.errors.contains_key(&ErrorScope::ManualEntry),
                "minute {minute:?} should be rejected"
            );
            assert!(drain(&mut jobs).is_empty(), "minute {minute:?} hit the network");
        }

        engine
            .submit_manual_entry("   ".into(), None, "45".into())
            .await;
        assert!(engine.store.errors.contains_key(&ErrorScope::ManualEntry));
        assert!(drain(&mut jobs).is_empty());

        // The range bounds themselves are valid.
        for minute in ["1", "120"] {
            engine
                .submit_manual_entry("Tor!".into(), None, minute.into())
                .await;
            assert!(
                !engine.store.errors.contains_key(&ErrorScope::ManualEntry),
                "minute {minute:?} should be accepted"
            );
            assert_eq!(drain(&mut jobs).len(), 1);
        }

        engine
            .submit_manual_entry("Tor!".into(), Some("goal".into()), "45".into())
            .await;
        assert!(!engine.store.errors.contains_key(&ErrorScope::ManualEntry));
        match &drain(&mut jobs)[..] {
            [GatewayJob::Mutate(MutationRequest::ManualEntry {
                match_id,
                text,
                icon,
                minute,
            })] => {
                assert_eq!(*match_id, 41);
                assert_eq!(text, "Tor!");
                assert_eq!(icon.as_deref(), Some("goal"));
                assert_eq!(*minute, 45);
            }
            other => panic!("expected a manual entry mutation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manual_entry_without_match_is_rejected() {
        let (mut engine, mut jobs) = harness();
        engine
            .submit_manual_entry("Tor!".into(), None, "45".into())
            .await;
        assert!(engine.store.errors.contains_key(&ErrorScope::ManualEntry));
        assert!(drain(&mut jobs).is_empty());
    }

    #[tokio::test]
    async fn failed_manual_entry_keeps_the_operator_input() {
        let (mut engine, mut jobs) = harness();
        engine.path.match_id = Some(41);
        engine
            .submit_manual_entry("Abpfiff".into(), None, "90".into())
            .await;
        drain(&mut jobs);

        engine
            .on_mutation_done(
                MutationRequest::ManualEntry {
                    match_id: 41,
                    text: "Abpfiff".into(),
                    icon: None,
                    minute: 90,
                },
                Err(SyncError::Rejected {
                    status: 500,
                    message: "/ticker/manual".into(),
                }),
            )
            .await;
        assert_eq!(engine.manual_form.text, "Abpfiff");
        assert_eq!(engine.manual_form.minute, "90");
        assert!(engine.store.errors.contains_key(&ErrorScope::ManualEntry));

        // A confirmed success clears the form and re-reads the ticker.
        engine
            .on_mutation_done(
                MutationRequest::ManualEntry {
                    match_id: 41,
                    text: "Abpfiff".into(),
                    icon: None,
                    minute: 90,
                },
                Ok(()),
            )
            .await;
        assert!(engine.manual_form.text.is_empty());
        assert!(matches!(
            &drain(&mut jobs)[..],
            [GatewayJob::Fetch(ResourceKey::Ticker { match_id: 41 })]
        ));
    }

    #[tokio::test]
    async fn failed_publish_leaves_the_entry_editable() {
        let (mut engine, mut jobs) = harness();
        engine.path.match_id = Some(41);
        engine.publish(77, "Korrigierter Text".into()).await;
        assert_eq!(drain(&mut jobs).len(), 1);

        engine
            .on_mutation_done(
                MutationRequest::Publish {
                    entry_id: 77,
                    text: "Korrigierter Text".into(),
                },
                Err(SyncError::Transport("timeout".into())),
            )
            .await;
        assert!(engine.store.errors.contains_key(&ErrorScope::Publish(77)));

        // The retry is not blocked by the in-flight guard.
        engine.publish(77, "Korrigierter Text".into()).await;
        assert_eq!(drain(&mut jobs).len(), 1);
    }
}
