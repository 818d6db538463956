use std::fmt;

use serde::Serialize;

use crate::types::Action;

/// Single-letter move the arena understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActionCode {
    F,
    L,
    R,
    T,
}

impl ActionCode {
    pub const ALL: [ActionCode; 4] = [ActionCode::F, ActionCode::T, ActionCode::L, ActionCode::R];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::F => "F",
            Self::L => "L",
            Self::R => "R",
            Self::T => "T",
        }
    }

    pub fn action(self) -> Action {
        match self {
            Self::F => Action::MoveForward,
            Self::L => Action::TurnLeft,
            Self::R => Action::TurnRight,
            Self::T => Action::Attack,
        }
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn map_action(action: Action) -> ActionCode {
    match action {
        Action::MoveForward => ActionCode::F,
        Action::TurnLeft => ActionCode::L,
        Action::TurnRight => ActionCode::R,
        Action::Attack => ActionCode::T,
    }
}
