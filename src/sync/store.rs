//! In-memory data store populated by the orchestrator. Every collection
//! remembers the key of the fetch that produced it; a collection is only
//! readable under its current key, which is what makes the stale-response
//! discard rule a plain key comparison.

use crate::sync::error::SyncError;
use crate::sync::selection::Depth;
use std::collections::HashMap;
use ticker_api::{
    Favorite, League, LeagueSeason, LineupEntry, Match, MatchEvent, MatchStats, PlayerStats,
    TickerEntry,
};

/// A collection tagged with the key of the fetch that filled it.
#[derive(Debug)]
pub struct Keyed<K: PartialEq, T> {
    key: Option<K>,
    items: Vec<T>,
}

impl<K: PartialEq, T> Default for Keyed<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            items: Vec::new(),
        }
    }
}

impl<K: PartialEq, T> Keyed<K, T> {
    pub fn set(&mut self, key: K, items: Vec<T>) {
        self.key = Some(key);
        self.items = items;
    }

    /// True when the collection was produced by a fetch for `key`.
    pub fn is_for(&self, key: &K) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// The items, but only under the key that produced them.
    pub fn get(&self, key: &K) -> Option<&[T]> {
        if self.is_for(key) {
            Some(&self.items)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.items.clear();
    }

    pub fn key_ref(&self) -> Option<&K> {
        self.key.as_ref()
    }
}

/// Which match list the matches collection currently holds: one round of
/// the league cascade, or one of the flat view lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchListKey {
    Round {
        league_season_id: i64,
        round: String,
    },
    Today,
    Live,
    Favorites,
}

/// The active top-level view. Non-league views source their match list
/// from a dedicated endpoint instead of the selection cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveView {
    #[default]
    Leagues,
    Today,
    Live,
    Favorites,
}

impl ActiveView {
    /// The match-list key this view reads, if it is not cascade-driven.
    pub fn list_key(self) -> Option<MatchListKey> {
        match self {
            ActiveView::Leagues => None,
            ActiveView::Today => Some(MatchListKey::Today),
            ActiveView::Live => Some(MatchListKey::Live),
            ActiveView::Favorites => Some(MatchListKey::Favorites),
        }
    }
}

/// Scope of a surfaced error. Errors at one scope never clobber data or
/// errors at another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorScope {
    Depth(Depth),
    View(MatchListKey),
    Import {
        league_season_id: i64,
        round: String,
    },
    Favorites,
    Generate(i64),
    Publish(i64),
    ManualEntry,
}

#[derive(Debug, Default)]
pub struct Store {
    pub leagues: Vec<League>,
    /// Keyed by league id.
    pub seasons: Keyed<i64, LeagueSeason>,
    /// Keyed by league-season id.
    pub rounds: Keyed<i64, String>,
    pub matches: Keyed<MatchListKey, Match>,
    pub match_detail: Option<Match>,
    /// The remaining collections are keyed by match id.
    pub events: Keyed<i64, MatchEvent>,
    pub ticker: Keyed<i64, TickerEntry>,
    pub prematch: Keyed<i64, TickerEntry>,
    pub lineups: Keyed<i64, LineupEntry>,
    pub match_stats: Keyed<i64, MatchStats>,
    pub player_stats: Keyed<i64, PlayerStats>,
    pub favorites: Vec<Favorite>,
    pub errors: HashMap<ErrorScope, SyncError>,
}

impl Store {
    /// Look up a league-season row from the currently loaded seasons.
    pub fn league_season(&self, league_season_id: i64) -> Option<&LeagueSeason> {
        // Only meaningful while the seasons collection is for the selected
        // league; a mismatch simply finds nothing.
        self.seasons_items().iter().find(|ls| ls.id == league_season_id)
    }

    fn seasons_items(&self) -> &[LeagueSeason] {
        // Internal: raw items regardless of key, for id lookups.
        match self.seasons.key_ref() {
            Some(k) => self.seasons.get(k).unwrap_or_default(),
            None => &[],
        }
    }

    pub fn is_favorite(&self, team_id: i64) -> bool {
        self.favorites.iter().any(|f| f.team_id == team_id)
    }

    pub fn set_error(&mut self, scope: ErrorScope, error: SyncError) {
        self.errors.insert(scope, error);
    }

    pub fn clear_error(&mut self, scope: &ErrorScope) {
        self.errors.remove(scope);
    }
}
