pub const ATTACK_RANGE: i32 = 3;
pub const HIT_SOURCE_RADIUS: f64 = 3.0;
pub const DEFAULT_ESCAPE_HIT_THRESHOLD: u32 = 2;
pub const MAX_ESCAPE_HIT_THRESHOLD: u32 = 5;
pub const STAGNATION_TOLERANCE: u32 = 4;

pub const ESCAPE_ATTACK_WEIGHT: f32 = 0.7;
pub const STAGNATION_FORWARD_WEIGHT: f32 = 0.7;
pub const PURSUIT_LEFT_WEIGHT: f32 = 0.7;

pub const SCORE_GAP_DIVISOR: f64 = 10.0;
pub const CHASE_BONUS: f64 = 0.2;
pub const BLOWOUT_MARGIN: i64 = 200;
pub const BLOWOUT_BONUS: f64 = 0.4;

pub const DEFAULT_PORT: u16 = 8080;

pub const MAX_SIM_OPPONENTS: usize = 63;
pub const SIM_THROW_REWARD: i64 = 1;
pub const SIM_HIT_PENALTY: i64 = 1;

pub fn get_arena_dims_by_agent_count(agent_count: usize) -> (i32, i32) {
    if agent_count <= 2 {
        return (7, 5);
    }
    if agent_count <= 4 {
        return (9, 7);
    }
    if agent_count <= 8 {
        return (13, 9);
    }
    if agent_count <= 16 {
        return (17, 13);
    }
    (25, 17)
}
