use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::config::EngineConfig;
use crate::constants::{
    get_arena_dims_by_agent_count, ATTACK_RANGE, MAX_SIM_OPPONENTS, SIM_HIT_PENALTY,
    SIM_THROW_REWARD,
};
use crate::engine::TacticalEngine;
use crate::geometry::{
    direction_to, is_in_lane, offset_along, rotation_between, LanePolicy, Rotation,
};
use crate::match_state::split_snapshot;
use crate::move_mapper::ActionCode;
use crate::rng::Rng;
use crate::types::{Action, Agent, ArenaSnapshot, Facing, Position};

#[derive(Clone, Debug)]
pub struct SimOptions {
    pub ticks: u64,
    pub opponents: usize,
    pub seed: u32,
    pub engine: EngineConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainKind {
    Tactician,
    Brawler,
}

#[derive(Clone, Debug)]
enum Brain {
    Tactician(Box<TacticalEngine>),
    Brawler,
}

impl Brain {
    fn kind(&self) -> BrainKind {
        match self {
            Self::Tactician(_) => BrainKind::Tactician,
            Self::Brawler => BrainKind::Brawler,
        }
    }
}

#[derive(Clone, Debug)]
struct SimAgent {
    agent: Agent,
    brain: Brain,
    hits_dealt: u32,
    hits_taken: u32,
    faults: u32,
}

impl SimAgent {
    fn new(agent: Agent, brain: Brain) -> Self {
        Self {
            agent,
            brain,
            hits_dealt: 0,
            hits_taken: 0,
            faults: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentReport {
    pub id: String,
    pub brain: BrainKind,
    pub score: i64,
    #[serde(rename = "hitsDealt")]
    pub hits_dealt: u32,
    #[serde(rename = "hitsTaken")]
    pub hits_taken: u32,
    pub faults: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimReport {
    pub seed: u32,
    pub ticks: u64,
    pub dims: (i32, i32),
    #[serde(rename = "tacticianRank")]
    pub tactician_rank: usize,
    pub agents: Vec<AgentReport>,
}

/// Small bounded arena that replays the turn rules locally: every agent sees
/// the same world, then moves resolve in agent order.
#[derive(Clone, Debug)]
pub struct Arena {
    seed: u32,
    dims: (i32, i32),
    agents: Vec<SimAgent>,
    rng: Rng,
    tick: u64,
}

impl Arena {
    /// Agent 0 is driven by the tactical engine, the rest by brawlers. The
    /// opponent count is clamped to `1..=MAX_SIM_OPPONENTS`.
    pub fn new(options: &SimOptions) -> Self {
        let agent_count = options.opponents.clamp(1, MAX_SIM_OPPONENTS) + 1;
        let dims = get_arena_dims_by_agent_count(agent_count);
        let mut rng = Rng::new(options.seed);
        let mut taken = HashSet::new();
        let mut agents = Vec::with_capacity(agent_count);

        for idx in 0..agent_count {
            let position = loop {
                let candidate = Position::new(rng.int(0, dims.0 - 1), rng.int(0, dims.1 - 1));
                if taken.insert(candidate) {
                    break candidate;
                }
            };
            let facing = Facing::ALL[rng.pick_index(Facing::ALL.len())];
            let brain = if idx == 0 {
                Brain::Tactician(Box::new(TacticalEngine::new(options.engine.clone())))
            } else {
                Brain::Brawler
            };
            agents.push(SimAgent::new(
                Agent {
                    id: format!("http://arena.local/agent-{idx}"),
                    position,
                    facing,
                    score: 0,
                    was_hit: false,
                },
                brain,
            ));
        }

        Self {
            seed: options.seed,
            dims,
            agents,
            rng,
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn snapshot_for(&self, idx: usize) -> ArenaSnapshot {
        ArenaSnapshot::new(
            self.agents[idx].agent.id.clone(),
            self.agents.iter().map(|entry| entry.agent.clone()).collect(),
        )
    }

    pub fn step(&mut self) {
        let mut moves = Vec::with_capacity(self.agents.len());
        for idx in 0..self.agents.len() {
            moves.push(self.choose_move(idx));
        }

        let mut hit_now = vec![false; self.agents.len()];
        for (idx, code) in moves.into_iter().enumerate() {
            self.resolve(idx, code, &mut hit_now);
        }
        for (entry, hit) in self.agents.iter_mut().zip(hit_now) {
            entry.agent.was_hit = hit;
        }
        self.tick += 1;
    }

    pub fn run(mut self, ticks: u64) -> SimReport {
        for _ in 0..ticks {
            self.step();
        }
        self.report()
    }

    pub fn report(&self) -> SimReport {
        let tactician_score = self
            .agents
            .iter()
            .find(|entry| entry.brain.kind() == BrainKind::Tactician)
            .map(|entry| entry.agent.score)
            .unwrap_or(0);
        let tactician_rank = 1 + self
            .agents
            .iter()
            .filter(|entry| entry.agent.score > tactician_score)
            .count();

        SimReport {
            seed: self.seed,
            ticks: self.tick,
            dims: self.dims,
            tactician_rank,
            agents: self
                .agents
                .iter()
                .map(|entry| AgentReport {
                    id: entry.agent.id.clone(),
                    brain: entry.brain.kind(),
                    score: entry.agent.score,
                    hits_dealt: entry.hits_dealt,
                    hits_taken: entry.hits_taken,
                    faults: entry.faults,
                })
                .collect(),
        }
    }

    fn choose_move(&mut self, idx: usize) -> ActionCode {
        let snapshot = self.snapshot_for(idx);
        let decided = match &mut self.agents[idx].brain {
            Brain::Tactician(engine) => Some(engine.decide(&snapshot)),
            Brain::Brawler => None,
        };

        match decided {
            Some(Ok(code)) => code,
            Some(Err(fault)) => {
                warn!(tick = self.tick, agent = idx, %fault, "tactician fault, moving forward");
                self.agents[idx].faults += 1;
                ActionCode::F
            }
            None => brawler_move(&snapshot, &mut self.rng),
        }
    }

    fn resolve(&mut self, idx: usize, code: ActionCode, hit_now: &mut [bool]) {
        match code.action() {
            Action::MoveForward => {
                let current = &self.agents[idx].agent;
                let next = current.position.advanced(current.facing);
                let occupied = self.agents.iter().any(|entry| entry.agent.position == next);
                if self.in_bounds(next) && !occupied {
                    self.agents[idx].agent.position = next;
                }
            }
            Action::TurnLeft => {
                let agent = &mut self.agents[idx].agent;
                agent.facing = agent.facing.left();
            }
            Action::TurnRight => {
                let agent = &mut self.agents[idx].agent;
                agent.facing = agent.facing.right();
            }
            Action::Attack => {
                let Some(victim) = self.throw_target(idx) else {
                    return;
                };
                self.agents[idx].agent.score += SIM_THROW_REWARD;
                self.agents[idx].hits_dealt += 1;

                let struck = &mut self.agents[victim];
                struck.agent.score = (struck.agent.score - SIM_HIT_PENALTY).max(0);
                struck.hits_taken += 1;
                hit_now[victim] = true;
            }
        }
    }

    /// Nearest agent in the thrower's lane.
    fn throw_target(&self, idx: usize) -> Option<usize> {
        let thrower = &self.agents[idx].agent;
        self.agents
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != idx)
            .filter(|(_, entry)| {
                is_in_lane(
                    thrower.position,
                    thrower.facing,
                    entry.agent.position,
                    ATTACK_RANGE,
                    LanePolicy::AxisExact,
                )
            })
            .min_by_key(|(_, entry)| {
                offset_along(thrower.position, thrower.facing, entry.agent.position)
            })
            .map(|(other, _)| other)
    }

    fn in_bounds(&self, position: Position) -> bool {
        (0..self.dims.0).contains(&position.x) && (0..self.dims.1).contains(&position.y)
    }
}

/// Scripted opponent: throw when someone is lined up, swing toward anyone on
/// a shared row or column, otherwise wander.
fn brawler_move(snapshot: &ArenaSnapshot, rng: &mut Rng) -> ActionCode {
    let Ok(view) = split_snapshot(snapshot) else {
        return ActionCode::F;
    };
    let me = view.me;

    let lined_up = view.opponents.iter().any(|opponent| {
        is_in_lane(
            me.position,
            me.facing,
            opponent.position,
            ATTACK_RANGE,
            LanePolicy::AxisExact,
        )
    });
    if lined_up {
        return ActionCode::T;
    }

    let sighted = view
        .opponents
        .iter()
        .find_map(|opponent| direction_to(me.position, opponent.position));
    if let Some(direction) = sighted {
        return match rotation_between(me.facing, direction) {
            Rotation::Aligned => ActionCode::F,
            Rotation::CounterClockwise => ActionCode::L,
            Rotation::Clockwise | Rotation::Opposite => ActionCode::R,
        };
    }

    match rng.pick_index(4) {
        0 | 1 => ActionCode::F,
        2 => ActionCode::L,
        _ => ActionCode::R,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: u32, opponents: usize) -> SimOptions {
        SimOptions {
            ticks: 50,
            opponents,
            seed,
            engine: EngineConfig {
                seed: seed.wrapping_add(1),
                ..EngineConfig::default()
            },
        }
    }

    fn agent(idx: usize, x: i32, y: i32, facing: Facing, score: i64) -> Agent {
        Agent {
            id: format!("agent-{idx}"),
            position: Position::new(x, y),
            facing,
            score,
            was_hit: false,
        }
    }

    fn brawler_arena(dims: (i32, i32), agents: Vec<Agent>) -> Arena {
        Arena {
            seed: 1,
            dims,
            agents: agents
                .into_iter()
                .map(|agent| SimAgent::new(agent, Brain::Brawler))
                .collect(),
            rng: Rng::new(1),
            tick: 0,
        }
    }

    #[test]
    fn same_seed_produces_same_match() {
        let a = Arena::new(&options(42, 3)).run(80);
        let b = Arena::new(&options(42, 3)).run(80);
        assert_eq!(
            serde_json::to_string(&a).expect("report serializes"),
            serde_json::to_string(&b).expect("report serializes")
        );
        assert_eq!(a.ticks, 80);
        assert_eq!(a.agents.len(), 4);
        assert_eq!(a.agents[0].brain, BrainKind::Tactician);
    }

    #[test]
    fn spawns_do_not_overlap() {
        for seed in 1..=50u32 {
            let arena = Arena::new(&options(seed, 7));
            let cells: HashSet<Position> = arena
                .agents
                .iter()
                .map(|entry| entry.agent.position)
                .collect();
            assert_eq!(cells.len(), 8);
            assert!(cells.iter().all(|cell| arena.in_bounds(*cell)));
        }
    }

    #[test]
    fn opponent_count_is_clamped_to_arena_capacity() {
        let crowded = Arena::new(&options(9, 500));
        assert_eq!(crowded.agents.len(), MAX_SIM_OPPONENTS + 1);
        let (width, height) = crowded.dims;
        assert!(crowded.agents.len() <= (width * height) as usize);

        let empty = Arena::new(&options(9, 0));
        assert_eq!(empty.agents.len(), 2);
    }

    #[test]
    fn tactician_never_faults_over_a_long_match() {
        let report = Arena::new(&options(7, 5)).run(300);
        assert!(report.agents.iter().all(|agent| agent.faults == 0));
        assert!((1..=6).contains(&report.tactician_rank));
    }

    #[test]
    fn throw_hits_nearest_agent_in_lane() {
        let mut arena = brawler_arena(
            (10, 10),
            vec![
                agent(0, 0, 5, Facing::East, 0),
                agent(1, 3, 5, Facing::North, 4),
                agent(2, 2, 5, Facing::North, 0),
                agent(3, 1, 6, Facing::North, 0),
            ],
        );
        let mut hit_now = vec![false; 4];
        arena.resolve(0, ActionCode::T, &mut hit_now);

        assert_eq!(hit_now, vec![false, false, true, false]);
        assert_eq!(arena.agents[0].agent.score, 1);
        assert_eq!(arena.agents[2].agent.score, 0);
        assert_eq!(arena.agents[2].hits_taken, 1);
        assert_eq!(arena.agents[1].agent.score, 4);
    }

    #[test]
    fn forward_is_blocked_by_walls_and_agents() {
        let mut arena = brawler_arena(
            (5, 5),
            vec![
                agent(0, 0, 0, Facing::North, 0),
                agent(1, 2, 2, Facing::East, 0),
                agent(2, 3, 2, Facing::West, 0),
            ],
        );
        let mut hit_now = vec![false; 3];
        arena.resolve(0, ActionCode::F, &mut hit_now);
        arena.resolve(1, ActionCode::F, &mut hit_now);
        assert_eq!(arena.agents[0].agent.position, Position::new(0, 0));
        assert_eq!(arena.agents[1].agent.position, Position::new(2, 2));

        arena.resolve(0, ActionCode::R, &mut hit_now);
        arena.resolve(0, ActionCode::F, &mut hit_now);
        assert_eq!(arena.agents[0].agent.facing, Facing::East);
        assert_eq!(arena.agents[0].agent.position, Position::new(1, 0));
    }

    #[test]
    fn hit_flag_is_visible_for_exactly_one_tick() {
        let mut arena = brawler_arena(
            (6, 1),
            vec![agent(0, 0, 0, Facing::East, 0), agent(1, 2, 0, Facing::East, 0)],
        );
        arena.step();
        assert!(arena.agents[1].agent.was_hit);
        assert!(arena.snapshot_for(1).agents[1].was_hit);

        arena.agents[0].agent.facing = Facing::West;
        arena.step();
        assert!(!arena.agents[1].agent.was_hit);
        assert_eq!(arena.tick(), 2);
    }

    #[test]
    fn brawler_swings_toward_sighted_agent() {
        let snapshot = ArenaSnapshot::new(
            "agent-0",
            vec![
                agent(0, 0, 0, Facing::North, 0),
                agent(1, 6, 0, Facing::North, 0),
            ],
        );
        assert_eq!(brawler_move(&snapshot, &mut Rng::new(3)), ActionCode::R);

        let snapshot = ArenaSnapshot::new(
            "agent-0",
            vec![
                agent(0, 0, 0, Facing::East, 0),
                agent(1, 2, 0, Facing::North, 0),
            ],
        );
        assert_eq!(brawler_move(&snapshot, &mut Rng::new(3)), ActionCode::T);
    }
}
