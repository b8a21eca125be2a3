use serde::{Deserialize, Serialize};

/// Grid cell, serialized on the wire as a `[x, y]` pair.
pub type Cell = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// One complete game state, replaced wholesale each tick or snapshot.
///
/// Field names map 1:1 onto the wire format (camelCase keys): this struct
/// *is* the server snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Head-first, tail-last. Length >= 1; no duplicates while running.
    pub snake: Vec<Cell>,
    pub food: Cell,
    pub direction: Direction,
    pub next_direction: Direction,
    pub score: u32,
    pub game_over: bool,
    pub speed_ms: u64,
}

impl GameState {
    pub fn head(&self) -> Cell {
        self.snake[0]
    }
}
