//! Periodic refresh loops. Each poll slot owns one spawned task that sends
//! the same fetch job on a fixed cadence; the engine starts and stops slots
//! as the selection and active view change, so a task's captured key is
//! always the key it was started for.

use crate::sync::messages::{GatewayJob, ResourceKey};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// Which refresh loop a task belongs to. Match-scoped slots are stopped
/// together when the selected match changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollSlot {
    MatchEvents,
    MatchTicker,
    LiveMatches,
}

pub struct Poller {
    jobs: mpsc::Sender<GatewayJob>,
    tasks: HashMap<PollSlot, JoinHandle<()>>,
}

impl Poller {
    pub fn new(jobs: mpsc::Sender<GatewayJob>) -> Self {
        Self {
            jobs,
            tasks: HashMap::new(),
        }
    }

    /// Starts (or restarts) a poll slot for `key`. The immediate first tick
    /// is skipped; the engine issues the initial fetch itself when the
    /// selection changes.
    pub fn start(&mut self, slot: PollSlot, key: ResourceKey, period: Duration) {
        self.stop(slot);
        debug!(?slot, ?period, "starting poll loop");
        let jobs = self.jobs.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if jobs.send(GatewayJob::Fetch(key.clone())).await.is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(slot, handle);
    }

    pub fn stop(&mut self, slot: PollSlot) {
        if let Some(handle) = self.tasks.remove(&slot) {
            debug!(?slot, "stopping poll loop");
            handle.abort();
        }
    }

    pub fn stop_match_scoped(&mut self) {
        self.stop(PollSlot::MatchEvents);
        self.stop(PollSlot::MatchTicker);
    }

    pub fn shutdown(&mut self) {
        let slots: Vec<PollSlot> = self.tasks.keys().copied().collect();
        for slot in slots {
            self.stop(slot);
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, slot: PollSlot) -> bool {
        self.tasks.contains_key(&slot)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
