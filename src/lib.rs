//! Synchronization engine for a live-ticker operator console: selection
//! cascade over country/league, season, round and match, independent poll
//! loops for live data, auto-import of missing rounds, and confirmed
//! write-backs for favorites, commentary generation and manual entries.

pub mod gateway;
pub mod settings;
pub mod sync;
