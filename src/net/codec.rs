use crate::game::state::GameState;
use crate::net::messages::Intent;

pub fn encode_snapshot(state: &GameState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

/// A payload that parses but breaks the data model (empty snake,
/// non-positive grid) counts as malformed and is rejected here, so callers
/// only ever see usable snapshots.
pub fn decode_snapshot(bytes: &[u8]) -> Result<GameState, serde_json::Error> {
    let state: GameState = serde_json::from_slice(bytes)?;
    if state.snake.is_empty() || state.grid_width <= 0 || state.grid_height <= 0 {
        return Err(serde::de::Error::custom("snapshot violates grid invariants"));
    }
    Ok(state)
}

pub fn encode_intent(intent: &Intent) -> Result<String, serde_json::Error> {
    serde_json::to_string(intent)
}

pub fn decode_intent(bytes: &[u8]) -> Result<Intent, serde_json::Error> {
    serde_json::from_slice(bytes)
}
