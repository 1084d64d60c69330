//! Two-player falling-block puzzle (workspace facade crate).
//!
//! The rules, the search agents, the remote protocol and the keyboard mapping live in
//! dedicated crates under `crates/`; this package re-exports them as
//! `duo_tetris::{core,engine,adapter,input,types}` and adds the [`controller`] that
//! runs them against one shared session.

pub mod controller;

pub use duo_tetris_adapter as adapter;
pub use duo_tetris_core as core;
pub use duo_tetris_engine as engine;
pub use duo_tetris_input as input;
pub use duo_tetris_types as types;

pub use controller::{Controller, ControllerOptions, GameSummary};
