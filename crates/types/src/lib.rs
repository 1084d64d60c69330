//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! Everything here is plain data: the board engine, the move search, the remote
//! protocol and the keyboard mapping all agree on these definitions.
//!
//! # Cell Tags
//!
//! A board cell is a small integer tag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | 0 | empty |
//! | 1..=7 | standard pieces (I, O, T, S, Z, J, L) |
//! | 8..=13 | extended pieces (only spawned in extended mode) |
//!
//! # Timing
//!
//! The gravity tick interval depends on the configured level:
//!
//! | Level | Interval |
//! |-------|----------|
//! | 1 | 500ms |
//! | 2 | 460ms |
//! | 5 | 340ms |
//! | 10 | 140ms |
//!
//! Floor: 100ms.
//!
//! # Examples
//!
//! ```
//! use duo_tetris_types::{Command, Player, PowerUp, SessionConfig};
//!
//! let config = SessionConfig::default();
//! assert_eq!(config.field_width, 10);
//! assert_eq!(config.tick_interval().as_millis(), 500);
//!
//! assert_eq!(PowerUp::from_str("clear_row"), Some(PowerUp::ClearRow));
//! assert_eq!(Player::One.other(), Player::Two);
//! assert_eq!(Command::Drop.as_str(), "drop");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell on the game board (0 = empty, otherwise a piece tag)
pub type Cell = u8;

/// The empty cell value
pub const EMPTY: Cell = 0;

/// Number of standard pieces (tags 1..=7)
pub const STANDARD_PIECE_COUNT: usize = 7;

/// Number of extended-only pieces (tags 8..=13)
pub const EXTENDED_PIECE_COUNT: usize = 6;

/// Highest valid cell tag
pub const MAX_TAG: Cell = (STANDARD_PIECE_COUNT + EXTENDED_PIECE_COUNT) as Cell;

/// Default board width in cells
pub const DEFAULT_WIDTH: u8 = 10;

/// Default board height in cells
pub const DEFAULT_HEIGHT: u8 = 20;

/// Allowed board widths
pub const WIDTH_RANGE: std::ops::RangeInclusive<u8> = 5..=20;

/// Allowed board heights
pub const HEIGHT_RANGE: std::ops::RangeInclusive<u8> = 10..=30;

/// Allowed levels
pub const LEVEL_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Tick interval at level 1
pub const BASE_TICK_MS: u64 = 500;

/// Tick interval reduction per level above 1
pub const TICK_STEP_MS: u64 = 40;

/// Fastest tick interval
pub const MIN_TICK_MS: u64 = 100;

/// Points per cleared line before level and multiplier
pub const LINE_SCORE: u32 = 100;

/// Upper bound for the score multiplier power-up
pub const MAX_SCORE_MULTIPLIER: u32 = 8;

/// Ticks skipped after a FREEZE power-up locks
pub const FREEZE_TICKS: u32 = 5;

/// Probability that an extended piece carries a power-up
pub const POWER_UP_CHANCE: f64 = 0.3;

/// Tick interval for a level: `max(100, 500 - (level - 1) * 40)` milliseconds.
///
/// ```
/// use duo_tetris_types::tick_interval_for_level;
///
/// assert_eq!(tick_interval_for_level(1).as_millis(), 500);
/// assert_eq!(tick_interval_for_level(10).as_millis(), 140);
/// assert_eq!(tick_interval_for_level(50).as_millis(), 100);
/// ```
pub fn tick_interval_for_level(level: u32) -> Duration {
    let steps = u64::from(level.saturating_sub(1));
    let ms = BASE_TICK_MS
        .saturating_sub(steps.saturating_mul(TICK_STEP_MS))
        .max(MIN_TICK_MS);
    Duration::from_millis(ms)
}

/// One-shot effects attached to extended pieces, applied when the piece locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUp {
    /// Clear the 3x3 area around the piece centre
    Bomb,
    /// Clear the piece's anchor row
    ClearRow,
    /// Clear the piece's anchor column
    ClearCol,
    /// Switch on gravity mode
    Gravity,
    /// Skip the next few ticks
    Freeze,
    /// Double the score multiplier (capped)
    Multiplier,
}

impl PowerUp {
    /// All power-ups in protocol order
    pub const ALL: [PowerUp; 6] = [
        PowerUp::Bomb,
        PowerUp::ClearRow,
        PowerUp::ClearCol,
        PowerUp::Gravity,
        PowerUp::Freeze,
        PowerUp::Multiplier,
    ];

    /// Parse from the wire name (case-insensitive)
    ///
    /// ```
    /// use duo_tetris_types::PowerUp;
    ///
    /// assert_eq!(PowerUp::from_str("BOMB"), Some(PowerUp::Bomb));
    /// assert_eq!(PowerUp::from_str("freeze"), Some(PowerUp::Freeze));
    /// assert_eq!(PowerUp::from_str("laser"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOMB" => Some(PowerUp::Bomb),
            "CLEAR_ROW" => Some(PowerUp::ClearRow),
            "CLEAR_COL" => Some(PowerUp::ClearCol),
            "GRAVITY" => Some(PowerUp::Gravity),
            "FREEZE" => Some(PowerUp::Freeze),
            "MULTIPLIER" => Some(PowerUp::Multiplier),
            _ => None,
        }
    }

    /// Wire name used by the remote protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUp::Bomb => "BOMB",
            PowerUp::ClearRow => "CLEAR_ROW",
            PowerUp::ClearCol => "CLEAR_COL",
            PowerUp::Gravity => "GRAVITY",
            PowerUp::Freeze => "FREEZE",
            PowerUp::Multiplier => "MULTIPLIER",
        }
    }
}

impl fmt::Display for PowerUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two player slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    #[default]
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    /// 1 or 2
    pub fn number(&self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Zero-based slot index
    pub fn index(&self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Player::from_number(value).ok_or(ConfigError::ControlledPlayer(value))
    }
}

impl From<Player> for u8 {
    fn from(value: Player) -> Self {
        value.number()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Which driver is attached to a player slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerType {
    /// Keyboard input
    #[default]
    Human,
    /// Heuristic search agent
    Ai,
    /// Remote text-protocol client
    External,
}

impl PlayerType {
    /// Parse player type (case-insensitive)
    ///
    /// ```
    /// use duo_tetris_types::PlayerType;
    ///
    /// assert_eq!(PlayerType::from_str("ai"), Some(PlayerType::Ai));
    /// assert_eq!(PlayerType::from_str("EXTERNAL"), Some(PlayerType::External));
    /// assert_eq!(PlayerType::from_str("robot"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HUMAN" => Some(PlayerType::Human),
            "AI" => Some(PlayerType::Ai),
            "EXTERNAL" => Some(PlayerType::External),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerType::Human => "HUMAN",
            PlayerType::Ai => "AI",
            PlayerType::External => "EXTERNAL",
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Running,
    Paused,
    /// Terminal until an explicit reset
    Over,
}

/// Player-facing mutations shared by every driver
///
/// Keyboard input, the heuristic agent and the remote protocol all reduce to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Shift the active piece one column left
    MoveLeft,
    /// Shift the active piece one column right
    MoveRight,
    /// Move the active piece one row down without locking
    MoveDown,
    /// Rotate the active piece 90° clockwise in place
    Rotate,
    /// Move the active piece to its resting row
    Drop,
    /// Toggle pause
    TogglePause,
    /// Start a fresh session
    Reset,
}

impl Command {
    /// Name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "moveLeft",
            Command::MoveRight => "moveRight",
            Command::MoveDown => "moveDown",
            Command::Rotate => "rotate",
            Command::Drop => "drop",
            Command::TogglePause => "togglePause",
            Command::Reset => "reset",
        }
    }
}

/// Simple RGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Invalid session configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field width {0} outside {min}..={max}", min = WIDTH_RANGE.start(), max = WIDTH_RANGE.end())]
    Width(u8),
    #[error("field height {0} outside {min}..={max}", min = HEIGHT_RANGE.start(), max = HEIGHT_RANGE.end())]
    Height(u8),
    #[error("level {0} outside {min}..={max}", min = LEVEL_RANGE.start(), max = LEVEL_RANGE.end())]
    Level(u32),
    #[error("controlled player must be 1 or 2, got {0}")]
    ControlledPlayer(u8),
}

/// Session configuration, read at construction and reset
///
/// Missing fields fall back to defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub field_width: u8,
    pub field_height: u8,
    pub level: u32,
    pub player1: PlayerType,
    pub player2: PlayerType,
    pub extended_mode: bool,
    pub controlled_player: Player,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            field_width: DEFAULT_WIDTH,
            field_height: DEFAULT_HEIGHT,
            level: 1,
            player1: PlayerType::Human,
            player2: PlayerType::Human,
            extended_mode: false,
            controlled_player: Player::One,
        }
    }
}

impl SessionConfig {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !WIDTH_RANGE.contains(&self.field_width) {
            return Err(ConfigError::Width(self.field_width));
        }
        if !HEIGHT_RANGE.contains(&self.field_height) {
            return Err(ConfigError::Height(self.field_height));
        }
        if !LEVEL_RANGE.contains(&self.level) {
            return Err(ConfigError::Level(self.level));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        tick_interval_for_level(self.level)
    }

    pub fn player_type(&self, player: Player) -> PlayerType {
        match player {
            Player::One => self.player1,
            Player::Two => self.player2,
        }
    }

    pub fn set_player_type(&mut self, player: Player, kind: PlayerType) {
        match player {
            Player::One => self.player1 = kind,
            Player::Two => self.player2 = kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_follows_level_formula() {
        for level in 1..=10u32 {
            let expected = (500i64 - (level as i64 - 1) * 40).max(100) as u128;
            assert_eq!(tick_interval_for_level(level).as_millis(), expected);
        }
        assert_eq!(tick_interval_for_level(0).as_millis(), 500);
        assert_eq!(tick_interval_for_level(u32::MAX).as_millis(), 100);
    }

    #[test]
    fn default_config_is_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.player_type(Player::One), PlayerType::Human);
        assert_eq!(config.controlled_player, Player::One);
    }

    #[test]
    fn config_validation_rejects_out_of_range() {
        let mut config = SessionConfig {
            field_width: 4,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Width(4)));

        config.field_width = 20;
        config.field_height = 31;
        assert_eq!(config.validate(), Err(ConfigError::Height(31)));

        config.field_height = 10;
        config.level = 11;
        assert_eq!(config.validate(), Err(ConfigError::Level(11)));

        config.level = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"field_width":12,"player2":"AI","controlled_player":2}"#)
                .unwrap();
        assert_eq!(config.field_width, 12);
        assert_eq!(config.field_height, DEFAULT_HEIGHT);
        assert_eq!(config.player2, PlayerType::Ai);
        assert_eq!(config.controlled_player, Player::Two);

        let bad = serde_json::from_str::<SessionConfig>(r#"{"controlled_player":3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn player_helpers() {
        assert_eq!(Player::One.other(), Player::Two);
        assert_eq!(Player::Two.other(), Player::One);
        assert_eq!(Player::Two.number(), 2);
        assert_eq!(Player::Two.index(), 1);
        assert_eq!(Player::from_number(3), None);
    }

    #[test]
    fn power_up_names_round_trip() {
        for p in PowerUp::ALL {
            assert_eq!(PowerUp::from_str(p.as_str()), Some(p));
        }
    }
}
