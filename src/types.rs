use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Facing {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl Facing {
    /// Clockwise order starting from north.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "N" => Some(Self::North),
            "E" => Some(Self::East),
            "S" => Some(Self::South),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::East => "E",
            Self::South => "S",
            Self::West => "W",
        }
    }

    /// Unit step on a grid whose y axis grows southwards.
    pub fn step(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
        }
    }

    pub fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    pub fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    pub fn opposite(self) -> Self {
        self.right().right()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn advanced(self, facing: Facing) -> Self {
        let (dx, dy) = facing.step();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Agent {
    pub id: String,
    pub position: Position,
    pub facing: Facing,
    pub score: i64,
    #[serde(rename = "wasHit")]
    pub was_hit: bool,
}

/// One tick of arena state, normalised so that agents keep the order in which
/// the arena listed them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArenaSnapshot {
    #[serde(rename = "selfId")]
    pub self_id: String,
    pub agents: Vec<Agent>,
}

impl ArenaSnapshot {
    pub fn new(self_id: impl Into<String>, agents: Vec<Agent>) -> Self {
        Self {
            self_id: self_id.into(),
            agents,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveForward,
    TurnLeft,
    TurnRight,
    Attack,
}
