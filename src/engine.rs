use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::constants::{
    ATTACK_RANGE, ESCAPE_ATTACK_WEIGHT, HIT_SOURCE_RADIUS, PURSUIT_LEFT_WEIGHT,
    STAGNATION_FORWARD_WEIGHT,
};
use crate::error::DataFault;
use crate::geometry::{distance, is_in_lane, offset_along, rotation_between, Rotation};
use crate::match_state::{split_snapshot, MatchState, TickView};
use crate::move_mapper::{map_action, ActionCode};
use crate::rng::Rng;
use crate::threat::rank_threats;
use crate::types::{Action, Agent, ArenaSnapshot, Facing};

/// Which priority rule produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Escape,
    Attack,
    BreakStagnation,
    Pursue,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub rule: Rule,
    pub action: Action,
    pub code: ActionCode,
}

/// Tactical policy for one agent over one match. Owns the match counters and
/// the random source; callers serialise ticks through `&mut self`.
#[derive(Clone, Debug)]
pub struct TacticalEngine {
    config: EngineConfig,
    state: MatchState,
    rng: Rng,
}

impl TacticalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_state(config, MatchState::new())
    }

    pub fn with_state(config: EngineConfig, state: MatchState) -> Self {
        let rng = Rng::new(config.seed);
        Self { config, state, rng }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Starts a new match with cleared counters. The random stream carries on.
    pub fn reset(&mut self) {
        self.state = MatchState::new();
    }

    pub fn decide(&mut self, snapshot: &ArenaSnapshot) -> Result<ActionCode, DataFault> {
        self.evaluate(snapshot).map(|decision| decision.code)
    }

    /// Runs one tick. Counters are only committed when the tick succeeds.
    pub fn evaluate(&mut self, snapshot: &ArenaSnapshot) -> Result<Decision, DataFault> {
        let view = split_snapshot(snapshot)?;
        let mut next = self.state.clone();
        let (rule, action) = self.choose(&mut next, &view);
        self.state = next;

        debug!(
            rule = ?rule,
            action = ?action,
            x = view.me.position.x,
            y = view.me.position.y,
            facing = view.me.facing.as_str(),
            score = view.me.score,
            opponents = view.opponents.len(),
            "tick decided"
        );

        Ok(Decision {
            rule,
            action,
            code: map_action(action),
        })
    }

    fn choose(&mut self, state: &mut MatchState, view: &TickView<'_>) -> (Rule, Action) {
        let me = view.me;
        state.record_score(me.score);

        let hits = state.record_hit(me.was_hit);
        if hits >= self.config.escape_hit_threshold {
            let hit_from = self.last_hit_direction(me, &view.opponents);
            return (Rule::Escape, self.escape_action(me.facing, hit_from));
        }

        let target_in_lane = view.opponents.iter().any(|opponent| {
            is_in_lane(
                me.position,
                me.facing,
                opponent.position,
                ATTACK_RANGE,
                self.config.lane_policy,
            )
        });
        if target_in_lane {
            return (Rule::Attack, Action::Attack);
        }

        if state.is_stagnant(me.score) {
            state.note_stagnant_turn();
            let action = self.rng.either(
                Action::MoveForward,
                STAGNATION_FORWARD_WEIGHT,
                Action::TurnRight,
            );
            return (Rule::BreakStagnation, action);
        }

        if let Some(target) = rank_threats(me, &view.opponents).first() {
            let ahead = offset_along(me.position, me.facing, target.opponent.position);
            if ahead > 0 {
                return (Rule::Pursue, Action::MoveForward);
            }
            if ahead < 0 {
                let action =
                    self.rng
                        .either(Action::TurnLeft, PURSUIT_LEFT_WEIGHT, Action::TurnRight);
                return (Rule::Pursue, action);
            }
        }

        (Rule::Fallback, Action::MoveForward)
    }

    /// Facing of the nearest opponent close enough to have landed the hit,
    /// or a random facing when nobody is.
    fn last_hit_direction(&mut self, me: &Agent, opponents: &[&Agent]) -> Facing {
        let mut nearest: Option<(f64, Facing)> = None;
        for opponent in opponents {
            let range = distance(me.position, opponent.position);
            if range > HIT_SOURCE_RADIUS {
                continue;
            }
            if nearest.map_or(true, |(best, _)| range < best) {
                nearest = Some((range, opponent.facing));
            }
        }

        match nearest {
            Some((_, facing)) => facing,
            None => Facing::ALL[self.rng.pick_index(Facing::ALL.len())],
        }
    }

    fn escape_action(&mut self, facing: Facing, hit_from: Facing) -> Action {
        match rotation_between(facing, hit_from) {
            Rotation::Aligned => {
                self.rng
                    .either(Action::Attack, ESCAPE_ATTACK_WEIGHT, Action::TurnRight)
            }
            Rotation::CounterClockwise => Action::TurnLeft,
            // An about-face starts with a right turn.
            Rotation::Clockwise | Rotation::Opposite => Action::TurnRight,
        }
    }
}
