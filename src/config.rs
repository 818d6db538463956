use serde::Serialize;

use crate::constants::{DEFAULT_ESCAPE_HIT_THRESHOLD, DEFAULT_PORT, MAX_ESCAPE_HIT_THRESHOLD};
use crate::geometry::LanePolicy;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    #[serde(rename = "lanePolicy")]
    pub lane_policy: LanePolicy,
    #[serde(rename = "escapeHitThreshold")]
    pub escape_hit_threshold: u32,
    pub seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lane_policy: LanePolicy::AxisExact,
            escape_hit_threshold: DEFAULT_ESCAPE_HIT_THRESHOLD,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Builds a config from `LANE_POLICY`, `ESCAPE_HIT_THRESHOLD` and
    /// `ENGINE_SEED` as returned by `lookup`. Unset or unparsable values fall
    /// back to defaults; a missing seed uses `fallback_seed`.
    pub fn from_lookup<F>(lookup: F, fallback_seed: u32) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            lane_policy: parse_lane_policy(lookup("LANE_POLICY").as_deref()),
            escape_hit_threshold: normalize_hit_threshold(parse_integer(
                lookup("ESCAPE_HIT_THRESHOLD").as_deref(),
            )),
            seed: parse_seed(lookup("ENGINE_SEED").as_deref()).unwrap_or(fallback_seed),
        }
    }

    pub fn from_env(fallback_seed: u32) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), fallback_seed)
    }
}

pub fn parse_lane_policy(raw: Option<&str>) -> LanePolicy {
    raw.and_then(|value| LanePolicy::parse(&value.trim().to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn normalize_hit_threshold(value: Option<i64>) -> u32 {
    value
        .unwrap_or(DEFAULT_ESCAPE_HIT_THRESHOLD as i64)
        .clamp(1, MAX_ESCAPE_HIT_THRESHOLD as i64) as u32
}

pub fn parse_seed(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn parse_integer(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}
