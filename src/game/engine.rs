use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{
    FOOD_REWARD, GRID_HEIGHT, GRID_WIDTH, MIN_SPEED_MS, SPEED_STEP_MS, START_SPEED_MS,
};
use crate::game::state::{Cell, Direction, GameState};

/// Fresh game: 3-segment snake centered on the grid (head first, body
/// extending left), heading right, score 0, food on a free cell.
pub fn initial_state<R: Rng>(rng: &mut R) -> GameState {
    let cx = GRID_WIDTH / 2;
    let cy = GRID_HEIGHT / 2;
    let snake = vec![(cx, cy), (cx - 1, cy), (cx - 2, cy)];
    let food = place_food(&snake, rng);
    GameState {
        grid_width: GRID_WIDTH,
        grid_height: GRID_HEIGHT,
        snake,
        food,
        direction: Direction::Right,
        next_direction: Direction::Right,
        score: 0,
        game_over: false,
        speed_ms: START_SPEED_MS,
    }
}

/// Advance the game by exactly one tick.
///
/// The pending direction is committed here, once per tick boundary. The grid
/// is toroidal: the head wraps at the edges, only self-collision ends the
/// game. Terminal states pass through unchanged.
pub fn tick<R: Rng>(prev: &GameState, rng: &mut R) -> GameState {
    if prev.game_over {
        return prev.clone();
    }

    let dir = prev.next_direction;
    let (dx, dy) = dir.delta();
    let head = prev.head();
    let new_head = (
        (head.0 + dx).rem_euclid(prev.grid_width),
        (head.1 + dy).rem_euclid(prev.grid_height),
    );

    let mut next = prev.clone();
    if prev.snake.contains(&new_head) {
        // score and snake stay frozen at the moment of death
        next.game_over = true;
        return next;
    }

    next.snake.insert(0, new_head);
    if new_head == prev.food {
        next.score += FOOD_REWARD;
        next.speed_ms = next.speed_ms.saturating_sub(SPEED_STEP_MS).max(MIN_SPEED_MS);
        next.food = place_food(&next.snake, rng);
    } else {
        next.snake.pop();
    }
    next.direction = dir;
    next.next_direction = dir;
    next
}

/// Resolve a requested direction against the committed one. A direct
/// reversal is rejected and the prior pending direction is kept; otherwise
/// the request wins (last writer between ticks).
pub fn apply_direction(prev: &GameState, requested: Direction) -> Direction {
    if requested == prev.direction.opposite() {
        prev.next_direction
    } else {
        requested
    }
}

fn place_food<R: Rng>(snake: &[Cell], rng: &mut R) -> Cell {
    // Retries until a free cell turns up; the grid always outsizes the snake
    // in any reachable session.
    loop {
        let cell = (rng.gen_range(0..GRID_WIDTH), rng.gen_range(0..GRID_HEIGHT));
        if !snake.contains(&cell) {
            return cell;
        }
    }
}

/// Owned local simulation: state plus the RNG feeding food placement.
pub struct LocalEngine {
    state: GameState,
    rng: StdRng,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    pub fn seeded(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = initial_state(&mut rng);
        Self { state, rng }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tick(&mut self) {
        self.state = tick(&self.state, &mut self.rng);
    }

    pub fn apply_direction(&mut self, requested: Direction) {
        if self.state.game_over {
            return;
        }
        self.state.next_direction = apply_direction(&self.state, requested);
    }

    pub fn reset(&mut self) {
        self.state = initial_state(&mut self.rng);
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}
