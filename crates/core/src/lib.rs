//! Core game logic - the board/piece state machine of a two-player session
//!
//! This crate contains the rules and nothing else: no timers, sockets or terminal.
//! The control layer drives it through [`SharedSession`].
//!
//! # Module Structure
//!
//! - [`pieces`]: piece catalog (7 standard + 6 extended shapes), rotation, random spawn
//! - [`board`]: flat-array grid with placement, power-up clearing and line clearing
//! - [`game_state`]: session rules (ticks, locking, power-ups, scoring, turns)
//! - [`snapshot`]: detached copies for the search and the remote protocol
//! - [`shared`]: the lock-serialized session handle shared by every driver
//!
//! # Game Rules
//!
//! - **Gravity**: each tick moves the active piece one row down, or locks it
//! - **Rotation**: clockwise at the same anchor, rejected on collision (no kicks)
//! - **Power-ups**: extended pieces may carry BOMB, CLEAR_ROW, CLEAR_COL, GRAVITY,
//!   FREEZE or MULTIPLIER, applied when the piece locks
//! - **Scoring**: `lines x 100 x level x multiplier`, credited to the player on turn
//! - **Turns**: the turn passes to the other player after every lock
//!
//! # Example
//!
//! ```
//! use duo_tetris_core::GameState;
//! use duo_tetris_types::{Command, SessionConfig};
//!
//! let mut game = GameState::with_seed(SessionConfig::default(), 12345);
//!
//! game.apply(Command::MoveRight);
//! game.apply(Command::Rotate);
//! assert!(game.apply(Command::Drop));
//!
//! // The next tick locks the dropped piece and hands the turn over
//! game.tick();
//! assert_eq!(game.current_player().number(), 2);
//! ```

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod shared;
pub mod snapshot;

pub use duo_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use game_state::{GameState, LockEvent, PlayerScore, TickOutcome};
pub use pieces::{color_for, rotate_cw, shape_for, spawn, Piece, Shape};
pub use shared::SharedSession;
pub use snapshot::{ActiveSnapshot, GameSnapshot};
