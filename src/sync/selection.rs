//! Selection hierarchy: country/league → season → round → match.
//!
//! Pure state transitions — no network calls happen here. The staleness
//! handling for fetches that were in flight when a selection changed lives
//! in the orchestrator, which compares response keys against this path.

/// Depth in the selection hierarchy, shallowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Depth {
    League,
    Season,
    Round,
    Match,
}

/// Identifier at one depth. Rounds are labels ("Regular Season - 3"),
/// everything else is a backend id.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionValue {
    Id(i64),
    Label(String),
}

impl SelectionValue {
    pub fn id(&self) -> Option<i64> {
        match self {
            SelectionValue::Id(id) => Some(*id),
            SelectionValue::Label(_) => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            SelectionValue::Id(_) => None,
            SelectionValue::Label(l) => Some(l),
        }
    }
}

/// The live selection path. Invariant: selecting at depth d clears every
/// deeper depth, so a stale deep identifier never outlives its parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionPath {
    pub league_id: Option<i64>,
    pub league_season_id: Option<i64>,
    pub round: Option<String>,
    pub match_id: Option<i64>,
}

impl SelectionPath {
    pub fn get(&self, depth: Depth) -> Option<SelectionValue> {
        match depth {
            Depth::League => self.league_id.map(SelectionValue::Id),
            Depth::Season => self.league_season_id.map(SelectionValue::Id),
            Depth::Round => self.round.clone().map(SelectionValue::Label),
            Depth::Match => self.match_id.map(SelectionValue::Id),
        }
    }

    /// Set the identifier at `depth` and clear everything deeper.
    pub fn set(&mut self, depth: Depth, value: Option<SelectionValue>) {
        match depth {
            Depth::League => self.league_id = value.and_then(|v| v.id()),
            Depth::Season => self.league_season_id = value.and_then(|v| v.id()),
            Depth::Round => self.round = value.and_then(|v| v.label().map(str::to_owned)),
            Depth::Match => self.match_id = value.and_then(|v| v.id()),
        }
        self.clear_below(depth);
    }

    pub fn clear_below(&mut self, depth: Depth) {
        if depth < Depth::Season {
            self.league_season_id = None;
        }
        if depth < Depth::Round {
            self.round = None;
        }
        if depth < Depth::Match {
            self.match_id = None;
        }
    }

    /// Deterministic auto-selection: if `depth` is currently unset and
    /// `candidates` is non-empty, select the first candidate (first in the
    /// order given, not arbitrary). Returns whether a selection was made.
    pub fn auto_select_first(&mut self, depth: Depth, candidates: &[SelectionValue]) -> bool {
        if self.get(depth).is_some() {
            return false;
        }
        match candidates.first() {
            Some(first) => {
                self.set(depth, Some(first.clone()));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_path() -> SelectionPath {
        SelectionPath {
            league_id: Some(1),
            league_season_id: Some(9),
            round: Some("Regular Season - 3".into()),
            match_id: Some(41),
        }
    }

    #[test]
    fn setting_a_depth_clears_everything_deeper() {
        let mut path = full_path();
        path.set(Depth::Season, Some(SelectionValue::Id(10)));
        assert_eq!(path.league_id, Some(1));
        assert_eq!(path.league_season_id, Some(10));
        assert_eq!(path.round, None);
        assert_eq!(path.match_id, None);

        let mut path = full_path();
        path.set(Depth::League, Some(SelectionValue::Id(2)));
        assert_eq!(
            path,
            SelectionPath {
                league_id: Some(2),
                ..Default::default()
            }
        );
    }

    #[test]
    fn setting_round_keeps_shallower_clears_match() {
        let mut path = full_path();
        path.set(Depth::Round, Some(SelectionValue::Label("Round 4".into())));
        assert_eq!(path.league_season_id, Some(9));
        assert_eq!(path.round.as_deref(), Some("Round 4"));
        assert_eq!(path.match_id, None);
    }

    #[test]
    fn clearing_a_depth_clears_deeper_too() {
        let mut path = full_path();
        path.set(Depth::Season, None);
        assert_eq!(path.league_id, Some(1));
        assert_eq!(path.league_season_id, None);
        assert_eq!(path.round, None);
        assert_eq!(path.match_id, None);
    }

    #[test]
    fn auto_select_takes_first_candidate_only_when_unset() {
        let mut path = SelectionPath {
            league_id: Some(1),
            ..Default::default()
        };
        let candidates = [SelectionValue::Id(9), SelectionValue::Id(10)];
        assert!(path.auto_select_first(Depth::Season, &candidates));
        assert_eq!(path.league_season_id, Some(9));

        // Already set — a second auto-select is a no-op.
        assert!(!path.auto_select_first(Depth::Season, &[SelectionValue::Id(10)]));
        assert_eq!(path.league_season_id, Some(9));

        // Empty candidates select nothing.
        let mut empty = SelectionPath::default();
        assert!(!empty.auto_select_first(Depth::League, &[]));
        assert_eq!(empty.league_id, None);
    }
}
