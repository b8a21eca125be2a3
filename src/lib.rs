//! Grid snake with two interchangeable state sources: an authoritative
//! WebSocket server and an in-process simulation the game falls back to
//! whenever the server stays unreachable.

pub mod arbiter;
pub mod config;
pub mod error;
pub mod game;
pub mod net;
pub mod ui;
