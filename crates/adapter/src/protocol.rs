//! Protocol module - line-oriented text commands for remote control
//!
//! Each inbound line is one upper-case command word. Replies are one or more lines;
//! multi-line replies start with a header ending in `:`. Booleans are `true`/`false`.

use std::fmt::Write as _;

use thiserror::Error;

use crate::core::GameSnapshot;
use crate::types::{Player, PowerUp};

/// Banner sent once on connect
pub const BANNER: [&str; 5] = [
    "Connected to Tetris game. Commands:",
    "MOVEMENT: LEFT, RIGHT, DOWN, UP, DROP",
    "GAME: PAUSE, RESET, STATUS",
    "INFO: GET_SCORE, GET_BOARD, GET_CURRENT_PIECE",
    "EXTENDED: GET_POWERUPS",
];

/// Parsed remote command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    Left,
    Right,
    Down,
    /// Rotate
    Up,
    Drop,
    Pause,
    Reset,
    Status,
    GetScore,
    GetBoard,
    GetCurrentPiece,
    GetPowerUps,
}

impl RemoteCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCommand::Left => "LEFT",
            RemoteCommand::Right => "RIGHT",
            RemoteCommand::Down => "DOWN",
            RemoteCommand::Up => "UP",
            RemoteCommand::Drop => "DROP",
            RemoteCommand::Pause => "PAUSE",
            RemoteCommand::Reset => "RESET",
            RemoteCommand::Status => "STATUS",
            RemoteCommand::GetScore => "GET_SCORE",
            RemoteCommand::GetBoard => "GET_BOARD",
            RemoteCommand::GetCurrentPiece => "GET_CURRENT_PIECE",
            RemoteCommand::GetPowerUps => "GET_POWERUPS",
        }
    }

    /// Movement commands only take effect while the session is running
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            RemoteCommand::Left
                | RemoteCommand::Right
                | RemoteCommand::Down
                | RemoteCommand::Up
                | RemoteCommand::Drop
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl ProtocolError {
    /// Wire form of the error
    pub fn reply(&self) -> String {
        format!("ERROR: {self}")
    }
}

/// Normalize a raw inbound line: trim and upper-case
pub fn normalize_line(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Parse one normalized command line
pub fn parse_command(line: &str) -> Result<RemoteCommand, ProtocolError> {
    let command = match line {
        "LEFT" => RemoteCommand::Left,
        "RIGHT" => RemoteCommand::Right,
        "DOWN" => RemoteCommand::Down,
        "UP" => RemoteCommand::Up,
        "DROP" => RemoteCommand::Drop,
        "PAUSE" => RemoteCommand::Pause,
        "RESET" => RemoteCommand::Reset,
        "STATUS" => RemoteCommand::Status,
        "GET_SCORE" => RemoteCommand::GetScore,
        "GET_BOARD" => RemoteCommand::GetBoard,
        "GET_CURRENT_PIECE" => RemoteCommand::GetCurrentPiece,
        "GET_POWERUPS" => RemoteCommand::GetPowerUps,
        other => return Err(ProtocolError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// Acknowledgement for a movement or control command
pub fn create_ack(command: RemoteCommand) -> Option<&'static str> {
    let reply = match command {
        RemoteCommand::Left => "OK: Moved left",
        RemoteCommand::Right => "OK: Moved right",
        RemoteCommand::Down => "OK: Moved down",
        RemoteCommand::Up => "OK: Rotated",
        RemoteCommand::Drop => "OK: Dropped",
        RemoteCommand::Pause => "OK: Pause toggled",
        RemoteCommand::Reset => "OK: Game reset",
        _ => return None,
    };
    Some(reply)
}

pub fn create_status(snapshot: &GameSnapshot) -> String {
    format!(
        "GAME_STATUS:\nGame Over: {}\nPaused: {}\nCurrent Player: {}\nLevel: {}",
        snapshot.game_over(),
        snapshot.paused(),
        snapshot.current_player.number(),
        snapshot.level
    )
}

pub fn create_scores(snapshot: &GameSnapshot) -> String {
    let mut out = String::from("SCORES:");
    for player in Player::BOTH {
        let slot = snapshot.score(player);
        let n = player.number();
        let _ = write!(out, "\nPlayer {n} Score: {}\nPlayer {n} Lines: {}", slot.score, slot.lines);
    }
    out
}

pub fn create_board(snapshot: &GameSnapshot) -> String {
    let board = &snapshot.board;
    let mut out = String::with_capacity(8 + board.height() * (board.width() * 3 + 1));
    out.push_str("BOARD:");
    for row in board.rows() {
        out.push('\n');
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{cell}");
        }
    }
    out
}

pub fn create_current_piece(snapshot: &GameSnapshot) -> String {
    let (kind, row, col, special, power_up) = match &snapshot.active {
        Some(a) => (a.kind, a.row, a.col, a.special, a.power_up),
        None => (0, 0, 0, false, None),
    };
    let mut out = format!(
        "CURRENT_PIECE:\nType: {kind}\nRow: {row}\nCol: {col}\nIs Special: {special}"
    );
    if let Some(power_up) = power_up {
        let _ = write!(out, "\nPower-up: {power_up}");
    }
    out
}

pub fn create_power_ups(snapshot: &GameSnapshot) -> String {
    let available = PowerUp::ALL.map(|p| p.as_str()).join(", ");
    format!(
        "POWERUPS:\nAvailable: {available}\nCurrent Multiplier: {}\nGravity Mode: {}\nFreeze Time: {}",
        snapshot.score_multiplier, snapshot.gravity_mode, snapshot.freeze_time
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameState, Piece};
    use crate::types::SessionConfig;

    fn snapshot() -> GameSnapshot {
        let config = SessionConfig {
            field_width: 5,
            field_height: 10,
            level: 4,
            ..SessionConfig::default()
        };
        GameState::with_seed(config, 1).snapshot()
    }

    #[test]
    fn test_parse_known_commands() {
        for cmd in [
            RemoteCommand::Left,
            RemoteCommand::Up,
            RemoteCommand::GetPowerUps,
            RemoteCommand::GetCurrentPiece,
        ] {
            assert_eq!(parse_command(cmd.as_str()), Ok(cmd));
        }
        assert_eq!(parse_command(&normalize_line("  drop \r")), Ok(RemoteCommand::Drop));
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_command("ACTIVATE_POWERUP").unwrap_err();
        assert_eq!(err.reply(), "ERROR: Unknown command: ACTIVATE_POWERUP");
        assert!(parse_command("left").is_err());
    }

    #[test]
    fn test_acks() {
        assert_eq!(create_ack(RemoteCommand::Up), Some("OK: Rotated"));
        assert_eq!(create_ack(RemoteCommand::Reset), Some("OK: Game reset"));
        assert_eq!(create_ack(RemoteCommand::Status), None);
        assert!(RemoteCommand::Drop.is_movement());
        assert!(!RemoteCommand::Pause.is_movement());
    }

    #[test]
    fn test_status_reply() {
        let reply = create_status(&snapshot());
        assert_eq!(
            reply,
            "GAME_STATUS:\nGame Over: false\nPaused: false\nCurrent Player: 1\nLevel: 4"
        );
    }

    #[test]
    fn test_scores_reply() {
        let reply = create_scores(&snapshot());
        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(
            lines,
            [
                "SCORES:",
                "Player 1 Score: 0",
                "Player 1 Lines: 0",
                "Player 2 Score: 0",
                "Player 2 Lines: 0",
            ]
        );
    }

    #[test]
    fn test_board_reply() {
        let mut snap = snapshot();
        snap.board.set(9, 0, 3);
        snap.board.set(9, 4, 12);
        let reply = create_board(&snap);
        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "BOARD:");
        assert_eq!(lines[1], "0 0 0 0 0");
        assert_eq!(lines[10], "3 0 0 0 12");
    }

    #[test]
    fn test_current_piece_reply() {
        let mut snap = snapshot();
        let piece = Piece::new(9, 5).unwrap().with_power_up(PowerUp::Freeze);
        snap.active = Some((&piece).into());
        assert_eq!(
            create_current_piece(&snap),
            "CURRENT_PIECE:\nType: 9\nRow: 0\nCol: 1\nIs Special: true\nPower-up: FREEZE"
        );

        snap.active = None;
        assert_eq!(
            create_current_piece(&snap),
            "CURRENT_PIECE:\nType: 0\nRow: 0\nCol: 0\nIs Special: false"
        );
    }

    #[test]
    fn test_power_ups_reply() {
        assert_eq!(
            create_power_ups(&snapshot()),
            "POWERUPS:\nAvailable: BOMB, CLEAR_ROW, CLEAR_COL, GRAVITY, FREEZE, MULTIPLIER\n\
             Current Multiplier: 1\nGravity Mode: false\nFreeze Time: 0"
        );
    }

    #[test]
    fn test_banner() {
        assert_eq!(BANNER[0], "Connected to Tetris game. Commands:");
        assert!(!BANNER.iter().any(|l| l.contains("ACTIVATE_POWERUP")));
    }
}
