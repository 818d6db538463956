use serde::Serialize;

use crate::types::{Facing, Position};

/// How strictly a target must line up before it counts as being in lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
    /// Same row or column, ahead, within range.
    #[default]
    AxisExact,
    /// Anywhere in front of the facing line, within Euclidean range.
    HalfPlane,
}

impl LanePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "axis" | "axis_exact" => Some(Self::AxisExact),
            "half_plane" | "halfplane" => Some(Self::HalfPlane),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Aligned,
    Clockwise,
    CounterClockwise,
    Opposite,
}

pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Signed number of steps `target` lies in front of `origin` along `facing`.
pub fn offset_along(origin: Position, facing: Facing, target: Position) -> i64 {
    let (dx, dy) = facing.step();
    let (delta_x, delta_y) = delta(origin, target);
    delta_x * dx as i64 + delta_y * dy as i64
}

/// `target - origin`, computed in `i64` so any pair of grid positions fits.
fn delta(origin: Position, target: Position) -> (i64, i64) {
    (
        target.x as i64 - origin.x as i64,
        target.y as i64 - origin.y as i64,
    )
}

fn lateral_offset(origin: Position, facing: Facing, target: Position) -> i64 {
    match facing {
        Facing::North | Facing::South => delta(origin, target).0,
        Facing::East | Facing::West => delta(origin, target).1,
    }
}

pub fn is_in_lane(
    origin: Position,
    facing: Facing,
    target: Position,
    max_range: i32,
    policy: LanePolicy,
) -> bool {
    let ahead = offset_along(origin, facing, target);
    if ahead < 0 {
        return false;
    }
    match policy {
        LanePolicy::AxisExact => {
            lateral_offset(origin, facing, target) == 0 && ahead <= max_range as i64
        }
        LanePolicy::HalfPlane => distance(origin, target) <= max_range as f64,
    }
}

/// Facing that points from `origin` straight at `target`, if they share a row
/// or column.
pub fn direction_to(origin: Position, target: Position) -> Option<Facing> {
    match delta(origin, target) {
        (0, 0) => None,
        (0, dy) if dy < 0 => Some(Facing::North),
        (0, _) => Some(Facing::South),
        (dx, 0) if dx > 0 => Some(Facing::East),
        (_, 0) => Some(Facing::West),
        _ => None,
    }
}

pub fn rotation_between(from: Facing, to: Facing) -> Rotation {
    if from == to {
        Rotation::Aligned
    } else if from.right() == to {
        Rotation::Clockwise
    } else if from.left() == to {
        Rotation::CounterClockwise
    } else {
        Rotation::Opposite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_is_euclidean() {
        assert!(approx_eq(
            distance(Position::new(0, 0), Position::new(3, 4)),
            5.0
        ));
        assert!(approx_eq(
            distance(Position::new(1, 1), Position::new(2, 2)),
            2f64.sqrt()
        ));
        assert!(approx_eq(
            distance(Position::new(-2, 7), Position::new(-2, 7)),
            0.0
        ));
    }

    #[test]
    fn axis_lane_requires_shared_row_and_range() {
        let origin = Position::new(0, 0);
        let policy = LanePolicy::AxisExact;
        assert!(is_in_lane(origin, Facing::East, Position::new(3, 0), 3, policy));
        assert!(!is_in_lane(origin, Facing::East, Position::new(3, 1), 3, policy));
        assert!(!is_in_lane(origin, Facing::East, Position::new(4, 0), 3, policy));
        assert!(!is_in_lane(origin, Facing::East, Position::new(-1, 0), 3, policy));
        assert!(is_in_lane(origin, Facing::North, Position::new(0, -2), 3, policy));
        assert!(!is_in_lane(origin, Facing::North, Position::new(0, 2), 3, policy));
    }

    #[test]
    fn half_plane_lane_accepts_diagonal_targets_in_front() {
        let origin = Position::new(0, 0);
        let policy = LanePolicy::HalfPlane;
        assert!(is_in_lane(origin, Facing::East, Position::new(2, 2), 3, policy));
        assert!(is_in_lane(origin, Facing::East, Position::new(0, 3), 3, policy));
        assert!(!is_in_lane(origin, Facing::East, Position::new(-1, 1), 3, policy));
        assert!(!is_in_lane(origin, Facing::East, Position::new(3, 1), 3, policy));
    }

    #[test]
    fn shared_cell_is_immediate_lane_contact() {
        let origin = Position::new(4, 4);
        for facing in Facing::ALL {
            assert!(is_in_lane(origin, facing, origin, 3, LanePolicy::AxisExact));
            assert!(is_in_lane(origin, facing, origin, 3, LanePolicy::HalfPlane));
        }
    }

    #[test]
    fn direction_to_only_resolves_on_axis() {
        let origin = Position::new(5, 5);
        assert_eq!(direction_to(origin, Position::new(5, 2)), Some(Facing::North));
        assert_eq!(direction_to(origin, Position::new(5, 9)), Some(Facing::South));
        assert_eq!(direction_to(origin, Position::new(8, 5)), Some(Facing::East));
        assert_eq!(direction_to(origin, Position::new(0, 5)), Some(Facing::West));
        assert_eq!(direction_to(origin, Position::new(6, 6)), None);
        assert_eq!(direction_to(origin, origin), None);
    }

    #[test]
    fn rotation_between_classifies_quarter_turns() {
        assert_eq!(rotation_between(Facing::North, Facing::North), Rotation::Aligned);
        assert_eq!(rotation_between(Facing::North, Facing::East), Rotation::Clockwise);
        assert_eq!(
            rotation_between(Facing::North, Facing::West),
            Rotation::CounterClockwise
        );
        assert_eq!(rotation_between(Facing::North, Facing::South), Rotation::Opposite);
        assert_eq!(rotation_between(Facing::West, Facing::North), Rotation::Clockwise);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let west_edge = Position::new(i32::MIN, 0);
        let east_edge = Position::new(i32::MAX, 0);
        let span = i32::MAX as i64 - i32::MIN as i64;

        assert_eq!(offset_along(west_edge, Facing::East, east_edge), span);
        assert_eq!(offset_along(east_edge, Facing::East, west_edge), -span);
        assert!(approx_eq(distance(west_edge, east_edge), span as f64));
        assert_eq!(direction_to(west_edge, east_edge), Some(Facing::East));
        assert_eq!(
            direction_to(Position::new(0, i32::MAX), Position::new(0, i32::MIN)),
            Some(Facing::North)
        );
        assert!(!is_in_lane(west_edge, Facing::East, east_edge, 3, LanePolicy::AxisExact));
        assert!(!is_in_lane(
            Position::new(0, i32::MIN),
            Facing::North,
            Position::new(0, i32::MAX),
            3,
            LanePolicy::HalfPlane
        ));
    }

    #[test]
    fn lane_policy_parse_is_strict() {
        assert_eq!(LanePolicy::parse("axis"), Some(LanePolicy::AxisExact));
        assert_eq!(LanePolicy::parse("half_plane"), Some(LanePolicy::HalfPlane));
        assert_eq!(LanePolicy::parse("diagonal"), None);
    }
}
