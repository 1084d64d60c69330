//! Game state module - manages the shared two-player session
//!
//! This module ties together the board, the piece catalog and the session rules:
//! gravity ticks, locking, power-up effects, per-player scoring and turn alternation.
//! Every method is a single synchronous step; the control layer decides when to call
//! them and serializes access through [`crate::shared::SharedSession`].

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::pieces::{self, Piece};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::{
    Cell, Command, Player, PowerUp, SessionConfig, SessionStatus, FREEZE_TICKS, LINE_SCORE,
    MAX_SCORE_MULTIPLIER,
};

/// Score and cleared lines for one player slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlayerScore {
    pub score: u32,
    pub lines: u32,
}

/// What happened when a piece locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    /// Player whose turn it was at lock time (credited with the points)
    pub player: Player,
    pub kind: Cell,
    pub power_up: Option<PowerUp>,
    pub lines_cleared: u32,
    pub points: u32,
    /// The follow-up spawn collided and the session ended
    pub game_over: bool,
}

/// Result of one gravity step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or nothing to move
    Idle,
    /// A freeze tick was consumed
    Frozen,
    /// The active piece moved down one row
    Fell,
    /// The active piece could not fall and was locked
    Locked(LockEvent),
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    config: SessionConfig,
    board: Board,
    active: Option<Piece>,
    rng: StdRng,
    status: SessionStatus,
    scores: [PlayerScore; 2],
    current_player: Player,
    score_multiplier: u32,
    gravity_mode: bool,
    /// Remaining ticks to skip
    freeze_time: u32,
    /// Monotonic episode id (increments on reset).
    episode_id: u32,
}

impl GameState {
    /// Create a running session with an entropy-seeded RNG
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a running session with a fixed seed (tests and benches)
    pub fn with_seed(config: SessionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SessionConfig, rng: StdRng) -> Self {
        let board = Board::new(
            usize::from(config.field_width),
            usize::from(config.field_height),
        );
        let mut state = Self {
            config,
            board,
            active: None,
            rng,
            status: SessionStatus::Running,
            scores: [PlayerScore::default(); 2],
            current_player: Player::One,
            score_multiplier: 1,
            gravity_mode: false,
            freeze_time: 0,
            episode_id: 0,
        };
        state.spawn_piece();
        state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    pub fn score(&self, player: Player) -> PlayerScore {
        self.scores[player.index()]
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn level(&self) -> u32 {
        self.config.level
    }

    pub fn score_multiplier(&self) -> u32 {
        self.score_multiplier
    }

    pub fn gravity_mode(&self) -> bool {
        self.gravity_mode
    }

    pub fn freeze_time(&self) -> u32 {
        self.freeze_time
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    /// Replace the active piece (tests and tooling)
    pub fn set_active(&mut self, piece: Piece) {
        self.active = Some(piece);
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.board.clone_from(&self.board);
        out.active = self.active.as_ref().map(ActiveSnapshot::from);
        out.status = self.status;
        out.scores = self.scores;
        out.current_player = self.current_player;
        out.level = self.config.level;
        out.score_multiplier = self.score_multiplier;
        out.gravity_mode = self.gravity_mode;
        out.freeze_time = self.freeze_time;
        out.episode_id = self.episode_id;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::empty(self.board.width(), self.board.height());
        self.snapshot_into(&mut s);
        s
    }

    /// Spawn a new random piece.
    ///
    /// On collision the piece stays visible as the active piece and the session ends.
    fn spawn_piece(&mut self) -> bool {
        let piece = pieces::spawn(
            self.board.width(),
            self.config.extended_mode,
            &mut self.rng,
        );
        let fits = self.board.can_place(&piece.shape, piece.row, piece.col);
        if !fits {
            tracing::debug!(kind = piece.kind, col = piece.col, "spawn blocked");
            self.status = SessionStatus::Over;
        }
        self.active = Some(piece);
        fits
    }

    /// Try to move the active piece by (drow, dcol)
    fn try_shift(&mut self, drow: i32, dcol: i32) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        if self
            .board
            .can_place(&piece.shape, piece.row + drow, piece.col + dcol)
        {
            piece.row += drow;
            piece.col += dcol;
            return true;
        }
        false
    }

    pub fn move_left(&mut self) -> bool {
        self.try_shift(0, -1)
    }

    pub fn move_right(&mut self) -> bool {
        self.try_shift(0, 1)
    }

    /// One row down; never locks
    pub fn move_down(&mut self) -> bool {
        self.try_shift(1, 0)
    }

    /// Rotate clockwise at the same anchor (no wall kicks)
    pub fn rotate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        let rotated = piece.shape.rotate_cw();
        if self.board.can_place(&rotated, piece.row, piece.col) {
            piece.shape = rotated;
            return true;
        }
        false
    }

    /// Move the active piece to its resting row; the next tick locks it
    pub fn drop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        while self
            .board
            .can_place(&piece.shape, piece.row + 1, piece.col)
        {
            piece.row += 1;
        }
        true
    }

    /// Running <-> Paused; false once over
    pub fn toggle_pause(&mut self) -> bool {
        self.status = match self.status {
            SessionStatus::Running => SessionStatus::Paused,
            SessionStatus::Paused => SessionStatus::Running,
            SessionStatus::Over => return false,
        };
        true
    }

    /// End the session early
    pub fn forfeit(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.status = SessionStatus::Over;
        true
    }

    /// Start over with the current configuration
    pub fn reset(&mut self) {
        let config = self.config.clone();
        self.reset_with(config);
    }

    /// Start over with a new configuration (board dimensions, level, mode)
    pub fn reset_with(&mut self, config: SessionConfig) {
        self.board = Board::new(
            usize::from(config.field_width),
            usize::from(config.field_height),
        );
        self.config = config;
        self.active = None;
        self.status = SessionStatus::Running;
        self.scores = [PlayerScore::default(); 2];
        self.current_player = Player::One;
        self.score_multiplier = 1;
        self.gravity_mode = false;
        self.freeze_time = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.spawn_piece();
    }

    /// Apply a shared command
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::MoveDown => self.move_down(),
            Command::Rotate => self.rotate(),
            Command::Drop => self.drop(),
            Command::TogglePause => self.toggle_pause(),
            Command::Reset => {
                self.reset();
                true
            }
        }
    }

    /// Gravity step
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }

        if self.freeze_time > 0 {
            self.freeze_time -= 1;
            return TickOutcome::Frozen;
        }

        let Some(piece) = self.active.as_mut() else {
            return TickOutcome::Idle;
        };

        if self
            .board
            .can_place(&piece.shape, piece.row + 1, piece.col)
        {
            piece.row += 1;
            return TickOutcome::Fell;
        }

        match self.lock_piece() {
            Some(event) => TickOutcome::Locked(event),
            None => TickOutcome::Idle,
        }
    }

    /// Lock the active piece, apply its power-up, clear lines and score them
    fn lock_piece(&mut self) -> Option<LockEvent> {
        let piece = self.active.take()?;

        self.board
            .place(&piece.shape, piece.kind, piece.row, piece.col);
        if let Some(power_up) = piece.power_up {
            self.apply_power_up(power_up, &piece);
        }

        let lines = self.board.clear_full_rows() as u32;
        let player = self.current_player;
        let mut points = 0;
        if lines > 0 {
            points = lines
                .saturating_mul(LINE_SCORE)
                .saturating_mul(self.config.level)
                .saturating_mul(self.score_multiplier);
            let slot = &mut self.scores[player.index()];
            slot.score = slot.score.saturating_add(points);
            slot.lines = slot.lines.saturating_add(lines);
            self.score_multiplier = self.score_multiplier.saturating_sub(1).max(1);
        }

        self.current_player = player.other();
        let spawned = self.spawn_piece();

        Some(LockEvent {
            player,
            kind: piece.kind,
            power_up: piece.power_up,
            lines_cleared: lines,
            points,
            game_over: !spawned,
        })
    }

    fn apply_power_up(&mut self, power_up: PowerUp, piece: &Piece) {
        match power_up {
            PowerUp::Bomb => {
                let (row, col) = piece.center();
                self.board.clear_bomb_area(row, col);
            }
            PowerUp::ClearRow => self.board.clear_row(piece.row),
            PowerUp::ClearCol => self.board.clear_column(piece.col),
            PowerUp::Gravity => self.gravity_mode = true,
            PowerUp::Freeze => self.freeze_time = FREEZE_TICKS,
            PowerUp::Multiplier => {
                self.score_multiplier = (self.score_multiplier * 2).min(MAX_SCORE_MULTIPLIER);
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
