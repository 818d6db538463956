use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::{Decision, TacticalEngine};
use crate::error::{DataFault, TickError};
use crate::types::{Agent, ArenaSnapshot, Facing, Position};

/// Id given to the steered agent when the payload carries flat player fields.
pub const FLAT_SELF_ID: &str = "self";

/// Which of the two understood payload layouts a tick arrived in. Replies
/// follow the same layout's conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    Arena,
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TickAnswer {
    pub shape: PayloadShape,
    pub decision: Decision,
}

/// Parses one tick payload into a snapshot.
///
/// Two shapes are understood. The arena shape keys every agent by its URL
/// under `arena.state` and names ours in `_links.self.href`. The flat shape
/// carries `playerX`/`playerY`/`wasHit` for us and an `opponents` array whose
/// entries give either a `position` pair or separate `x`/`y`.
pub fn parse_arena_payload(raw: &str) -> Result<ArenaSnapshot, TickError> {
    parse_payload(raw).map(|(_, snapshot)| snapshot)
}

/// Parses a payload and runs it through `engine` as one tick.
pub fn answer_tick(engine: &mut TacticalEngine, raw: &str) -> Result<TickAnswer, TickError> {
    let (shape, snapshot) = parse_payload(raw)?;
    let decision = engine.evaluate(&snapshot)?;
    Ok(TickAnswer { shape, decision })
}

fn parse_payload(raw: &str) -> Result<(PayloadShape, ArenaSnapshot), TickError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| TickError::malformed("payload is not an object"))?;

    if object.contains_key("arena") {
        Ok((PayloadShape::Arena, parse_arena_shape(object)?))
    } else if object.contains_key("playerX") {
        Ok((PayloadShape::Flat, parse_flat_shape(object)?))
    } else {
        Err(TickError::malformed("unrecognised payload shape"))
    }
}

fn parse_arena_shape(object: &Map<String, Value>) -> Result<ArenaSnapshot, TickError> {
    let self_id = object
        .get("_links")
        .and_then(|links| links.get("self"))
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
        .ok_or_else(|| TickError::malformed("missing `_links.self.href`"))?;

    let state = object
        .get("arena")
        .and_then(|arena| arena.get("state"))
        .and_then(Value::as_object)
        .ok_or_else(|| TickError::malformed("missing `arena.state` object"))?;

    let mut agents = Vec::with_capacity(state.len());
    for (id, entry) in state {
        let entry = entry
            .as_object()
            .ok_or_else(|| TickError::malformed(format!("state entry `{id}` is not an object")))?;
        agents.push(Agent {
            id: id.clone(),
            position: Position::new(
                required_i32(entry, "x", id)?,
                required_i32(entry, "y", id)?,
            ),
            facing: parse_facing(required_str(entry, "direction", id)?)?,
            score: required_integer(entry, "score", id)?,
            was_hit: required_bool(entry, "wasHit", id)?,
        });
    }

    Ok(ArenaSnapshot::new(self_id, agents))
}

fn parse_flat_shape(object: &Map<String, Value>) -> Result<ArenaSnapshot, TickError> {
    let me = Agent {
        id: FLAT_SELF_ID.to_string(),
        position: Position::new(
            required_i32(object, "playerX", FLAT_SELF_ID)?,
            required_i32(object, "playerY", FLAT_SELF_ID)?,
        ),
        facing: match optional_str(object, "playerDirection", FLAT_SELF_ID)? {
            Some(raw) => parse_facing(raw)?,
            None => Facing::North,
        },
        score: optional_integer(object, "playerScore", FLAT_SELF_ID)?.unwrap_or(0),
        was_hit: required_bool(object, "wasHit", FLAT_SELF_ID)?,
    };

    let opponents = object
        .get("opponents")
        .and_then(Value::as_array)
        .ok_or_else(|| TickError::malformed("missing `opponents` array"))?;

    let mut agents = Vec::with_capacity(opponents.len() + 1);
    agents.push(me);
    for (idx, entry) in opponents.iter().enumerate() {
        let label = format!("opponents[{idx}]");
        let entry = entry
            .as_object()
            .ok_or_else(|| TickError::malformed(format!("`{label}` is not an object")))?;
        // The steered agent owns FLAT_SELF_ID; an opponent claiming it is renamed.
        let id = match optional_str(entry, "id", &label)? {
            Some(id) if id != FLAT_SELF_ID => id.to_string(),
            _ => format!("opponent-{idx}"),
        };
        agents.push(Agent {
            position: parse_flat_position(entry, &label)?,
            facing: parse_facing(required_str(entry, "direction", &label)?)?,
            score: optional_integer(entry, "score", &label)?.unwrap_or(0),
            was_hit: optional_bool(entry, "wasHit", &label)?.unwrap_or(false),
            id,
        });
    }

    Ok(ArenaSnapshot::new(FLAT_SELF_ID, agents))
}

fn parse_flat_position(entry: &Map<String, Value>, label: &str) -> Result<Position, TickError> {
    let Some(position) = entry.get("position") else {
        return Ok(Position::new(
            required_i32(entry, "x", label)?,
            required_i32(entry, "y", label)?,
        ));
    };
    let pair = position
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| TickError::malformed(format!("`{label}.position` is not an [x, y] pair")))?;
    let coordinate = |value: &Value| {
        parse_integer(value)
            .and_then(|number| i32::try_from(number).ok())
            .ok_or_else(|| {
                TickError::malformed(format!("`{label}.position` holds a non-integer coordinate"))
            })
    };
    Ok(Position::new(coordinate(&pair[0])?, coordinate(&pair[1])?))
}

fn parse_facing(raw: &str) -> Result<Facing, TickError> {
    Facing::parse(raw).ok_or_else(|| DataFault::UnknownFacing(raw.to_string()).into())
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<&'a Value, TickError> {
    object
        .get(key)
        .ok_or_else(|| TickError::malformed(format!("`{owner}` is missing `{key}`")))
}

fn wrong_type(owner: &str, key: &str, expected: &str) -> TickError {
    TickError::malformed(format!("`{owner}.{key}` is not {expected}"))
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<&'a str, TickError> {
    required(object, key, owner)?
        .as_str()
        .ok_or_else(|| wrong_type(owner, key, "a string"))
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Option<&'a str>, TickError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| wrong_type(owner, key, "a string")),
    }
}

fn required_bool(object: &Map<String, Value>, key: &str, owner: &str) -> Result<bool, TickError> {
    required(object, key, owner)?
        .as_bool()
        .ok_or_else(|| wrong_type(owner, key, "a boolean"))
}

fn optional_bool(
    object: &Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Option<bool>, TickError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| wrong_type(owner, key, "a boolean")),
    }
}

fn required_integer(object: &Map<String, Value>, key: &str, owner: &str) -> Result<i64, TickError> {
    parse_integer(required(object, key, owner)?).ok_or_else(|| wrong_type(owner, key, "an integer"))
}

fn optional_integer(
    object: &Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Option<i64>, TickError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_integer(value)
            .map(Some)
            .ok_or_else(|| wrong_type(owner, key, "an integer")),
    }
}

fn required_i32(object: &Map<String, Value>, key: &str, owner: &str) -> Result<i32, TickError> {
    let number = required_integer(object, key, owner)?;
    i32::try_from(number).map_err(|_| wrong_type(owner, key, "a grid coordinate"))
}

/// Accepts integral JSON numbers, including floats such as `4.0` that stay
/// within the exactly representable integer range. Fractional values are
/// rejected.
fn parse_integer(value: &Value) -> Option<i64> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok();
    }
    let number = value.as_f64()?;
    if !number.is_finite() {
        return None;
    }
    if number.fract() != 0.0 || number.abs() > MAX_SAFE_INTEGER_F64 {
        return None;
    }
    Some(number as i64)
}
