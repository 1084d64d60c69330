//! Terminal input module (session-facing).
//!
//! Maps `crossterm` key events onto [`crate::types::Command`] for human player slots.
//! Both players share one keyboard; Tab chooses which slot the keys control.

pub mod map;

pub use duo_tetris_types as types;

pub use map::{handle_key_event, should_quit, KeyAction, KeyInput, KeyRouter};
