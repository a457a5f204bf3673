//! Auto-import trigger. When a round's match list comes back empty, the
//! upstream ingest pipeline is asked to import that round, then the list is
//! re-fetched to verify. Attempts are bounded; a round that stays empty
//! after the budget is marked failed until the operator retries.

use crate::sync::messages::{GatewayJob, ImportKey, ResourceKey, TimerEvent};
use crate::sync::store::MatchListKey;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Trigger sent, waiting for the ingest call to come back.
    Importing,
    /// Trigger acknowledged, waiting for the verification fetch.
    Verifying,
    /// Retry delay running, waiting for the timer.
    Waiting,
    /// Attempt budget exhausted.
    Failed,
}

#[derive(Debug)]
struct ImportRecord {
    phase: Phase,
    attempts: u32,
}

/// What an empty round means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyOutcome {
    /// An import attempt is running or was just started.
    InProgress,
    /// The attempt budget is spent; surface an error.
    Exhausted,
}

pub struct Importer {
    records: HashMap<ImportKey, ImportRecord>,
    jobs: mpsc::Sender<GatewayJob>,
    timers: mpsc::Sender<TimerEvent>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Importer {
    pub fn new(
        jobs: mpsc::Sender<GatewayJob>,
        timers: mpsc::Sender<TimerEvent>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            records: HashMap::new(),
            jobs,
            timers,
            max_attempts,
            retry_delay,
        }
    }

    /// A fetch for this round's match list applied and was empty.
    pub async fn handle_empty(&mut self, key: ImportKey) -> EmptyOutcome {
        match self.records.get_mut(&key) {
            None => {
                info!(round = %key.round, "round has no matches, triggering import");
                self.records.insert(
                    key.clone(),
                    ImportRecord {
                        phase: Phase::Importing,
                        attempts: 1,
                    },
                );
                self.send_import(key).await;
                EmptyOutcome::InProgress
            }
            Some(record) => match record.phase {
                Phase::Verifying => {
                    if record.attempts >= self.max_attempts {
                        warn!(
                            round = %key.round,
                            attempts = record.attempts,
                            "import attempts exhausted, round still empty"
                        );
                        record.phase = Phase::Failed;
                        EmptyOutcome::Exhausted
                    } else {
                        debug!(round = %key.round, "round still empty, scheduling retry");
                        record.phase = Phase::Waiting;
                        self.schedule_retry(key);
                        EmptyOutcome::InProgress
                    }
                }
                // A repeat fetch (user re-selected, poller overlap) while an
                // attempt is pending changes nothing.
                Phase::Importing | Phase::Waiting => EmptyOutcome::InProgress,
                // A fresh fetch after failure is a new operator-driven start.
                Phase::Failed => {
                    info!(round = %key.round, "restarting import after earlier failure");
                    record.phase = Phase::Importing;
                    record.attempts = 1;
                    self.send_import(key).await;
                    EmptyOutcome::InProgress
                }
            },
        }
    }

    /// The ingest trigger finished; verify by re-fetching the match list.
    pub async fn on_import_done(&mut self, key: ImportKey) {
        let Some(record) = self.records.get_mut(&key) else {
            debug!(round = %key.round, "ignoring import completion for abandoned round");
            return;
        };
        if record.phase != Phase::Importing {
            return;
        }
        record.phase = Phase::Verifying;
        let fetch = ResourceKey::Matches(MatchListKey::Round {
            league_season_id: key.league_season_id,
            round: key.round,
        });
        let _ = self.jobs.send(GatewayJob::Fetch(fetch)).await;
    }

    /// The retry delay elapsed; start the next attempt.
    pub async fn on_timer(&mut self, key: ImportKey) {
        let Some(record) = self.records.get_mut(&key) else {
            debug!(round = %key.round, "ignoring stale retry timer");
            return;
        };
        if record.phase != Phase::Waiting {
            return;
        }
        record.attempts += 1;
        record.phase = Phase::Importing;
        self.send_import(key).await;
    }

    /// Explicit operator retry of a failed round.
    pub async fn retry(&mut self, league_season_id: i64, round: &str) {
        let key = self
            .records
            .keys()
            .find(|k| k.league_season_id == league_season_id && k.round == round)
            .cloned();
        let Some(key) = key else {
            return;
        };
        let Some(record) = self.records.get_mut(&key) else {
            return;
        };
        if record.phase != Phase::Failed {
            return;
        }
        record.phase = Phase::Importing;
        record.attempts = 1;
        self.send_import(key).await;
    }

    /// The round's match list now has rows; the import goal is met.
    pub fn on_satisfied(&mut self, league_season_id: i64, round: &str) {
        self.records
            .retain(|k, _| !(k.league_season_id == league_season_id && k.round == round));
    }

    /// Drop records for rounds the selection has moved away from. Their
    /// in-flight timers and completions become stale and are ignored.
    pub fn retain_current(&mut self, league_season_id: Option<i64>, round: Option<&str>) {
        self.records.retain(|k, _| {
            Some(k.league_season_id) == league_season_id && Some(k.round.as_str()) == round
        });
    }

    pub fn abandon_all(&mut self) {
        self.records.clear();
    }

    pub fn is_failed(&self, league_season_id: i64, round: &str) -> bool {
        self.records
            .iter()
            .any(|(k, r)| {
                k.league_season_id == league_season_id
                    && k.round == round
                    && r.phase == Phase::Failed
            })
    }

    async fn send_import(&self, key: ImportKey) {
        let _ = self.jobs.send(GatewayJob::Import(key)).await;
    }

    fn schedule_retry(&self, key: ImportKey) {
        let timers = self.timers.clone();
        let delay = self.retry_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timers.send(TimerEvent::ImportRetryDue(key)).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn key() -> ImportKey {
        ImportKey {
            league_season_id: 3,
            round: "Spieltag 12".into(),
            league_external_id: 78,
            season_year: 2025,
        }
    }

    fn importer() -> (
        Importer,
        mpsc::Receiver<GatewayJob>,
        mpsc::Receiver<TimerEvent>,
    ) {
        let (jobs_tx, jobs_rx) = mpsc::channel(16);
        let (timers_tx, timers_rx) = mpsc::channel(16);
        (
            Importer::new(jobs_tx, timers_tx, 3, Duration::from_secs(2)),
            jobs_rx,
            timers_rx,
        )
    }

    #[tokio::test]
    async fn first_empty_triggers_one_import() {
        let (mut imp, mut jobs, _timers) = importer();
        assert_eq!(imp.handle_empty(key()).await, EmptyOutcome::InProgress);
        assert!(matches!(jobs.try_recv(), Ok(GatewayJob::Import(_))));

        // Repeated empties while importing are no-ops.
        assert_eq!(imp.handle_empty(key()).await, EmptyOutcome::InProgress);
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn import_done_issues_verification_fetch() {
        let (mut imp, mut jobs, _timers) = importer();
        imp.handle_empty(key()).await;
        jobs.try_recv().ok();

        imp.on_import_done(key()).await;
        match jobs.try_recv() {
            Ok(GatewayJob::Fetch(ResourceKey::Matches(MatchListKey::Round {
                league_season_id,
                round,
            }))) => {
                assert_eq!(league_season_id, 3);
                assert_eq!(round, "Spieltag 12");
            }
            other => panic!("expected verification fetch, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_three_attempts() {
        let (mut imp, mut jobs, mut timers) = importer();
        let mut imports = 0u32;

        // Attempt 1.
        imp.handle_empty(key()).await;
        while let Ok(job) = jobs.try_recv() {
            if matches!(job, GatewayJob::Import(_)) {
                imports += 1;
            }
        }
        imp.on_import_done(key()).await;
        jobs.try_recv().ok();

        // Attempts 2 and 3 via the retry timer.
        for _ in 0..2 {
            assert_eq!(imp.handle_empty(key()).await, EmptyOutcome::InProgress);
            advance(Duration::from_secs(2)).await;
            let TimerEvent::ImportRetryDue(k) =
                timers.recv().await.unwrap();
            imp.on_timer(k).await;
            while let Ok(job) = jobs.try_recv() {
                if matches!(job, GatewayJob::Import(_)) {
                    imports += 1;
                }
            }
            imp.on_import_done(key()).await;
            jobs.try_recv().ok();
        }

        assert_eq!(imp.handle_empty(key()).await, EmptyOutcome::Exhausted);
        assert_eq!(imports, 3);
        assert!(imp.is_failed(3, "Spieltag 12"));
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn satisfied_round_forgets_record() {
        let (mut imp, mut jobs, _timers) = importer();
        imp.handle_empty(key()).await;
        jobs.try_recv().ok();

        imp.on_satisfied(3, "Spieltag 12");
        // Stale completion after the round filled is ignored.
        imp.on_import_done(key()).await;
        assert!(jobs.try_recv().is_err());

        // A later empty starts from scratch.
        imp.handle_empty(key()).await;
        assert!(matches!(jobs.try_recv(), Ok(GatewayJob::Import(_))));
    }

    #[tokio::test]
    async fn abandoned_round_ignores_stale_timer() {
        let (mut imp, mut jobs, _timers) = importer();
        imp.handle_empty(key()).await;
        jobs.try_recv().ok();

        imp.retain_current(Some(9), Some("Spieltag 1"));
        imp.on_timer(key()).await;
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn explicit_retry_restarts_failed_round() {
        let (mut imp, mut jobs, _timers) = importer();
        imp.handle_empty(key()).await;
        jobs.try_recv().ok();
        imp.on_import_done(key()).await;
        jobs.try_recv().ok();
        // Force exhaustion with a budget of one remaining verify.
        imp.max_attempts = 1;
        assert_eq!(imp.handle_empty(key()).await, EmptyOutcome::Exhausted);

        imp.retry(3, "Spieltag 12").await;
        assert!(matches!(jobs.try_recv(), Ok(GatewayJob::Import(_))));
        assert!(!imp.is_failed(3, "Spieltag 12"));
    }
}
