use crate::board::Board;
use crate::game_state::PlayerScore;
use crate::pieces::{Piece, Shape};
use crate::types::{Cell, Player, PowerUp, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: Cell,
    pub shape: Shape,
    pub row: i32,
    pub col: i32,
    pub special: bool,
    pub power_up: Option<PowerUp>,
}

impl From<&Piece> for ActiveSnapshot {
    fn from(value: &Piece) -> Self {
        Self {
            kind: value.kind,
            shape: value.shape.clone(),
            row: value.row,
            col: value.col,
            special: value.special,
            power_up: value.power_up,
        }
    }
}

/// Detached copy of the session, taken under the session lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: Board,
    pub active: Option<ActiveSnapshot>,
    pub status: SessionStatus,
    pub scores: [PlayerScore; 2],
    pub current_player: Player,
    pub level: u32,
    pub score_multiplier: u32,
    pub gravity_mode: bool,
    pub freeze_time: u32,
    pub episode_id: u32,
}

impl GameSnapshot {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            board: Board::new(width, height),
            active: None,
            status: SessionStatus::Running,
            scores: [PlayerScore::default(); 2],
            current_player: Player::One,
            level: 1,
            score_multiplier: 1,
            gravity_mode: false,
            freeze_time: 0,
            episode_id: 0,
        }
    }

    pub fn score(&self, player: Player) -> PlayerScore {
        self.scores[player.index()]
    }

    pub fn playable(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn game_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    pub fn paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }
}
