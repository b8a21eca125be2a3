// Grid and speed curve. Fixed engine parameters, not runtime configuration.
pub const GRID_WIDTH: i32 = 20;
pub const GRID_HEIGHT: i32 = 16;
pub const START_SPEED_MS: u64 = 150;
pub const MIN_SPEED_MS: u64 = 60;
pub const SPEED_STEP_MS: u64 = 5;
pub const FOOD_REWARD: u32 = 10;

// Reconnect backoff: 1s, 2s, 4s, 8s, then capped at 10s.
pub const BACKOFF_BASE_MS: u64 = 1_000;
pub const BACKOFF_CAP_MS: u64 = 10_000;

// How long the authoritative feed may stay silent before the local
// simulation takes over. Only the trip away from remote is debounced;
// recovery is immediate.
pub const GRACE_PERIOD_MS: u64 = 2_500;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9001";
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:9001/ws";
