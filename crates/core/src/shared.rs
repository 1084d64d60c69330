//! Serialized access to one live session
//!
//! Every driver (tick loop, agents, remote dispatcher, keyboard) holds a clone of
//! [`SharedSession`]. Each method takes the lock exactly once, so callers observe a
//! total order of whole operations and never a half-applied move or lock.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::game_state::{GameState, TickOutcome};
use crate::snapshot::GameSnapshot;
use crate::types::{Command, SessionConfig, SessionStatus};

#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<GameState>>,
}

impl SharedSession {
    pub fn new(state: GameState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` inside one critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let mut state = self.inner.lock();
        f(&mut state)
    }

    /// Read-only access inside one critical section
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        let state = self.inner.lock();
        f(&state)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.inner.lock().snapshot_into(out);
    }

    pub fn tick(&self) -> TickOutcome {
        self.inner.lock().tick()
    }

    pub fn apply(&self, command: Command) -> bool {
        self.inner.lock().apply(command)
    }

    pub fn move_left(&self) -> bool {
        self.apply(Command::MoveLeft)
    }

    pub fn move_right(&self) -> bool {
        self.apply(Command::MoveRight)
    }

    pub fn move_down(&self) -> bool {
        self.apply(Command::MoveDown)
    }

    pub fn rotate(&self) -> bool {
        self.apply(Command::Rotate)
    }

    pub fn drop(&self) -> bool {
        self.apply(Command::Drop)
    }

    pub fn toggle_pause(&self) -> bool {
        self.apply(Command::TogglePause)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn reset_with(&self, config: SessionConfig) {
        self.inner.lock().reset_with(config);
    }

    pub fn forfeit(&self) -> bool {
        self.inner.lock().forfeit()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status()
    }

    pub fn episode_id(&self) -> u32 {
        self.inner.lock().episode_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    #[test]
    fn test_clones_share_state() {
        let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 3));
        let other = session.clone();
        assert!(other.toggle_pause());
        assert_eq!(session.status(), SessionStatus::Paused);
        session.reset();
        assert_eq!(other.episode_id(), 1);
        assert_eq!(other.status(), SessionStatus::Running);
    }

    #[test]
    fn test_with_runs_in_one_section() {
        let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 3));
        let (player, moved) = session.with(|game| (game.current_player(), game.move_down()));
        assert_eq!(player, Player::One);
        assert!(moved);
        assert_eq!(session.snapshot().active.unwrap().row, 1);
    }
}
