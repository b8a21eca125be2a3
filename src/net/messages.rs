use serde::{Deserialize, Serialize};

use crate::game::state::Direction;

/// Client -> server intent. The server -> client payload is a plain
/// [`GameState`](crate::game::state::GameState) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Intent {
    Direction { direction: Direction },
    Reset,
}
