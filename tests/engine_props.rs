//! Property-based tests for the simulation engine.
//!
//! Random direction sequences against seeded RNGs, checking the invariants
//! that must hold for every reachable state.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use snakeshift::config::{FOOD_REWARD, MIN_SPEED_MS, START_SPEED_MS};
use snakeshift::game::engine::{apply_direction, initial_state, tick};
use snakeshift::game::state::Direction;

fn direction(idx: u8) -> Direction {
    match idx % 4 {
        0 => Direction::Up,
        1 => Direction::Down,
        2 => Direction::Left,
        _ => Direction::Right,
    }
}

proptest! {
    /// While the game is running the snake never overlaps itself, stays in
    /// bounds, never sits on the food, and grows exactly with the score;
    /// score and speed stay inside their envelopes throughout.
    #[test]
    fn running_states_stay_well_formed(
        seed in any::<u64>(),
        moves in proptest::collection::vec(0u8..4, 0..200),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = initial_state(&mut rng);
        let mut prev_score = state.score;

        for idx in moves {
            state.next_direction = apply_direction(&state, direction(idx));
            state = tick(&state, &mut rng);

            prop_assert!(state.score >= prev_score);
            prev_score = state.score;
            prop_assert!(state.speed_ms >= MIN_SPEED_MS);
            prop_assert!(state.speed_ms <= START_SPEED_MS);

            if state.game_over {
                break;
            }
            for (i, a) in state.snake.iter().enumerate() {
                for b in state.snake.iter().skip(i + 1) {
                    prop_assert_ne!(a, b);
                }
            }
            for &(x, y) in &state.snake {
                prop_assert!(x >= 0 && x < state.grid_width);
                prop_assert!(y >= 0 && y < state.grid_height);
            }
            prop_assert!(!state.snake.contains(&state.food));
            prop_assert_eq!(state.snake.len() as u32, 3 + state.score / FOOD_REWARD);
        }
    }

    /// The same seed and the same intents always produce the same game.
    #[test]
    fn simulation_is_deterministic(
        seed in any::<u64>(),
        moves in proptest::collection::vec(0u8..4, 0..100),
    ) {
        let run = || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = initial_state(&mut rng);
            for &idx in &moves {
                state.next_direction = apply_direction(&state, direction(idx));
                state = tick(&state, &mut rng);
            }
            state
        };
        prop_assert_eq!(run(), run());
    }

    /// Once over, a game is a fixed point of `tick`.
    #[test]
    fn terminal_states_are_fixed_points(
        seed in any::<u64>(),
        moves in proptest::collection::vec(0u8..4, 0..300),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = initial_state(&mut rng);
        for idx in moves {
            state.next_direction = apply_direction(&state, direction(idx));
            state = tick(&state, &mut rng);
            if state.game_over {
                let frozen = tick(&state, &mut rng);
                prop_assert_eq!(&frozen, &state);
                break;
            }
        }
    }

    /// The pending direction can never end up opposite the committed one.
    #[test]
    fn reversals_never_survive(
        seed in any::<u64>(),
        moves in proptest::collection::vec(0u8..4, 1..100),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = initial_state(&mut rng);
        for idx in moves {
            state.next_direction = apply_direction(&state, direction(idx));
            prop_assert_ne!(state.next_direction, state.direction.opposite());
            state = tick(&state, &mut rng);
        }
    }
}
