//! Adapter module - remote control of a player slot via TCP socket
//!
//! This crate lets an external program drive the session through a plain text
//! protocol, one command per line.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: Client connects to the TCP socket (default: 127.0.0.1:12345)
//! 2. **Banner**: Server sends five lines listing the supported commands
//! 3. **Commanding**: Client sends commands; the server replies per command
//!
//! Only one client is served at a time; the next connection is accepted when the
//! current one closes.
//!
//! # Commands
//!
//! - **Movement**: `LEFT`, `RIGHT`, `DOWN`, `UP` (rotate), `DROP`. Acknowledged with
//!   `OK: ...` while the game runs, silently ignored while paused or over
//! - **Game**: `PAUSE` (toggle), `RESET`, `STATUS`
//! - **Info**: `GET_SCORE`, `GET_BOARD`, `GET_CURRENT_PIECE`, `GET_POWERUPS`
//!
//! Anything else gets `ERROR: Unknown command: <TEXT>`. Input is trimmed and
//! upper-cased first; blank lines are ignored.
//!
//! # Ordering
//!
//! Lines are tagged with the session's episode id when read and executed in order by
//! a dispatcher task. A line whose episode was ended by another driver's reset before
//! it ran is dropped without a reply. The connection's own `RESET` does not drop the
//! lines it pipelined after it.
//!
//! # Environment Variables
//!
//! - `TETRIS_REMOTE_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRIS_REMOTE_PORT`: Port number (default: 12345)
//! - `TETRIS_REMOTE_DISABLED`: Set to "1" or "true" to disable the listener entirely
//!
//! # Example Session
//!
//! ```text
//! Server -> Client: Connected to Tetris game. Commands:
//! Server -> Client: MOVEMENT: LEFT, RIGHT, DOWN, UP, DROP
//! Server -> Client: GAME: PAUSE, RESET, STATUS
//! Server -> Client: INFO: GET_SCORE, GET_BOARD, GET_CURRENT_PIECE
//! Server -> Client: EXTENDED: GET_POWERUPS
//! Client -> Server: left
//! Server -> Client: OK: Moved left
//! Client -> Server: STATUS
//! Server -> Client: GAME_STATUS:
//! Server -> Client: Game Over: false
//! Server -> Client: Paused: false
//! Server -> Client: Current Player: 1
//! Server -> Client: Level: 1
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 12345
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use duo_tetris_core as core;
pub use duo_tetris_types as types;

// Re-export protocol types for convenience
pub use protocol::{parse_command, ProtocolError, RemoteCommand, BANNER};
pub use runtime::{run_dispatcher, DispatchStats, EpisodeGuard, QueuedCommand};
pub use server::{check_tcp_listen_available, run_server, ServerConfig, DEFAULT_PORT};
