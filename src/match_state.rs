use serde::Serialize;

use crate::constants::STAGNATION_TOLERANCE;
use crate::error::DataFault;
use crate::types::{Agent, ArenaSnapshot};

/// Counters carried from one tick to the next for the length of a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchState {
    #[serde(rename = "previousScore")]
    pub previous_score: i64,
    #[serde(rename = "scoreStagnantCount")]
    pub score_stagnant_count: u32,
    #[serde(rename = "consecutiveHitsCount")]
    pub consecutive_hits_count: u32,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_score(&mut self, score: i64) {
        if score > self.previous_score {
            self.score_stagnant_count = 0;
        }
        self.previous_score = score;
    }

    /// Returns the updated run of consecutive hit ticks.
    pub fn record_hit(&mut self, was_hit: bool) -> u32 {
        self.consecutive_hits_count = if was_hit {
            self.consecutive_hits_count.saturating_add(1)
        } else {
            0
        };
        self.consecutive_hits_count
    }

    pub fn is_stagnant(&self, score: i64) -> bool {
        score == self.previous_score && self.score_stagnant_count <= STAGNATION_TOLERANCE
    }

    pub fn note_stagnant_turn(&mut self) {
        self.score_stagnant_count = self.score_stagnant_count.saturating_add(1);
    }
}

/// A snapshot split into the agent being steered and everyone else.
#[derive(Clone, Debug)]
pub struct TickView<'a> {
    pub me: &'a Agent,
    pub opponents: Vec<&'a Agent>,
}

pub fn split_snapshot(snapshot: &ArenaSnapshot) -> Result<TickView<'_>, DataFault> {
    let mut me = None;
    let mut self_count = 0usize;
    let mut opponents = Vec::with_capacity(snapshot.agents.len().saturating_sub(1));

    for agent in &snapshot.agents {
        if agent.id == snapshot.self_id {
            self_count += 1;
            me.get_or_insert(agent);
        } else {
            opponents.push(agent);
        }
    }

    match (me, self_count) {
        (Some(me), 1) => Ok(TickView { me, opponents }),
        (None, _) => Err(DataFault::SelfNotFound(snapshot.self_id.clone())),
        (Some(_), count) => Err(DataFault::AmbiguousSelf {
            id: snapshot.self_id.clone(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Facing, Position};

    fn agent(id: &str, x: i32, y: i32) -> Agent {
        Agent {
            id: id.to_string(),
            position: Position::new(x, y),
            facing: Facing::North,
            score: 0,
            was_hit: false,
        }
    }

    #[test]
    fn score_increase_resets_stagnation() {
        let mut state = MatchState {
            previous_score: 3,
            score_stagnant_count: 4,
            consecutive_hits_count: 0,
        };
        state.record_score(5);
        assert_eq!(state.previous_score, 5);
        assert_eq!(state.score_stagnant_count, 0);
    }

    #[test]
    fn score_drop_keeps_stagnation_count() {
        let mut state = MatchState {
            previous_score: 8,
            score_stagnant_count: 2,
            consecutive_hits_count: 0,
        };
        state.record_score(6);
        assert_eq!(state.previous_score, 6);
        assert_eq!(state.score_stagnant_count, 2);
    }

    #[test]
    fn hit_run_resets_on_clean_tick() {
        let mut state = MatchState::new();
        assert_eq!(state.record_hit(true), 1);
        assert_eq!(state.record_hit(true), 2);
        assert_eq!(state.record_hit(false), 0);
        assert_eq!(state.record_hit(true), 1);
    }

    #[test]
    fn stagnation_window_closes_after_tolerance() {
        let mut state = MatchState::new();
        for _ in 0..=STAGNATION_TOLERANCE {
            assert!(state.is_stagnant(0));
            state.note_stagnant_turn();
        }
        assert!(!state.is_stagnant(0));
        assert_eq!(state.score_stagnant_count, STAGNATION_TOLERANCE + 1);
    }

    #[test]
    fn split_keeps_opponent_order() {
        let snapshot = ArenaSnapshot::new(
            "me",
            vec![agent("z", 0, 0), agent("me", 1, 1), agent("a", 2, 2)],
        );
        let view = split_snapshot(&snapshot).expect("self is present");
        assert_eq!(view.me.position, Position::new(1, 1));
        let ids: Vec<&str> = view.opponents.iter().map(|agent| agent.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn split_rejects_missing_self() {
        let snapshot = ArenaSnapshot::new("ghost", vec![agent("a", 0, 0)]);
        assert_eq!(
            split_snapshot(&snapshot).unwrap_err(),
            DataFault::SelfNotFound("ghost".to_string())
        );
    }

    #[test]
    fn split_rejects_duplicate_self() {
        let snapshot = ArenaSnapshot::new("me", vec![agent("me", 0, 0), agent("me", 1, 0)]);
        assert_eq!(
            split_snapshot(&snapshot).unwrap_err(),
            DataFault::AmbiguousSelf {
                id: "me".to_string(),
                count: 2,
            }
        );
    }
}
