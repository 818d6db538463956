use crate::constants::{BLOWOUT_BONUS, BLOWOUT_MARGIN, CHASE_BONUS, SCORE_GAP_DIVISOR};
use crate::geometry::{distance, offset_along};
use crate::types::Agent;

#[derive(Clone, Copy, Debug)]
pub struct ThreatEntry<'a> {
    pub opponent: &'a Agent,
    pub threat_score: f64,
}

/// Danger posed by `opponent` to `me`.
///
/// Closeness contributes `1 / distance`, the score gap contributes a tenth of
/// a point per point of lead, and two flat bonuses apply: one when the
/// opponent heads the same way as `me` from behind (it is chasing), one when
/// its lead exceeds [`BLOWOUT_MARGIN`]. An opponent on the same cell is an
/// unbounded threat.
pub fn threat_score(me: &Agent, opponent: &Agent) -> f64 {
    let gap = opponent.score.saturating_sub(me.score);
    let range = distance(me.position, opponent.position);
    let closeness = if range == 0.0 {
        f64::INFINITY
    } else {
        1.0 / range
    };

    let mut score = closeness + gap as f64 / SCORE_GAP_DIVISOR;
    if is_chasing(me, opponent) {
        score += CHASE_BONUS;
    }
    if gap > BLOWOUT_MARGIN {
        score += BLOWOUT_BONUS;
    }
    score
}

fn is_chasing(me: &Agent, opponent: &Agent) -> bool {
    opponent.facing == me.facing && offset_along(opponent.position, opponent.facing, me.position) > 0
}

/// Opponents ordered from most to least dangerous. Equal scores keep the
/// order they were given in.
pub fn rank_threats<'a>(me: &Agent, opponents: &[&'a Agent]) -> Vec<ThreatEntry<'a>> {
    let mut entries: Vec<ThreatEntry<'a>> = opponents
        .iter()
        .map(|&opponent| ThreatEntry {
            opponent,
            threat_score: threat_score(me, opponent),
        })
        .collect();
    entries.sort_by(|a, b| b.threat_score.total_cmp(&a.threat_score));
    entries
}
