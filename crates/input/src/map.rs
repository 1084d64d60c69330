//! Key mapping from terminal events to session commands.

use crate::types::{Command, Player, PlayerType, SessionConfig};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Decoded key before routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A movement key belonging to one player's key set
    Play(Player, Command),
    SwitchPlayer,
    Pause,
    NewGame,
    Quit,
}

/// What the runner should do with a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Command(Command),
    /// Tab moved keyboard control to this player
    SwitchedTo(Player),
    /// Start a new game (only honoured once the current one is over)
    NewGame,
    Quit,
}

/// Map keyboard input to a key set and command.
///
/// Player 1 plays with the arrow keys and Space, player 2 with W/A/S/D and E.
pub fn handle_key_event(key: KeyEvent) -> Option<KeyInput> {
    if should_quit(key) {
        return Some(KeyInput::Quit);
    }
    match key.code {
        // Player 1
        KeyCode::Left => Some(KeyInput::Play(Player::One, Command::MoveLeft)),
        KeyCode::Right => Some(KeyInput::Play(Player::One, Command::MoveRight)),
        KeyCode::Down => Some(KeyInput::Play(Player::One, Command::MoveDown)),
        KeyCode::Up => Some(KeyInput::Play(Player::One, Command::Rotate)),
        KeyCode::Char(' ') => Some(KeyInput::Play(Player::One, Command::Drop)),

        // Player 2
        KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(KeyInput::Play(Player::Two, Command::MoveLeft))
        }
        KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(KeyInput::Play(Player::Two, Command::MoveRight))
        }
        KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(KeyInput::Play(Player::Two, Command::MoveDown))
        }
        KeyCode::Char('w') | KeyCode::Char('W') => Some(KeyInput::Play(Player::Two, Command::Rotate)),
        KeyCode::Char('e') | KeyCode::Char('E') => Some(KeyInput::Play(Player::Two, Command::Drop)),

        // Session
        KeyCode::Tab => Some(KeyInput::SwitchPlayer),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(KeyInput::Pause),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(KeyInput::NewGame),

        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Routes key presses to the player slot currently under keyboard control.
///
/// Movement keys only act when they belong to the controlled player and that slot is
/// human; AI and remote slots drive themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRouter {
    controlled: Player,
    player_types: [PlayerType; 2],
}

impl KeyRouter {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            controlled: config.controlled_player,
            player_types: [config.player1, config.player2],
        }
    }

    pub fn controlled(&self) -> Player {
        self.controlled
    }

    /// True when any slot takes keyboard input
    pub fn has_human(&self) -> bool {
        self.player_types.contains(&PlayerType::Human)
    }

    pub fn route(&mut self, key: KeyEvent) -> Option<KeyAction> {
        match handle_key_event(key)? {
            KeyInput::Quit => Some(KeyAction::Quit),
            KeyInput::NewGame => Some(KeyAction::NewGame),
            KeyInput::Pause => Some(KeyAction::Command(Command::TogglePause)),
            KeyInput::SwitchPlayer => {
                self.controlled = self.controlled.other();
                Some(KeyAction::SwitchedTo(self.controlled))
            }
            KeyInput::Play(player, command) => {
                let human = self.player_types[player.index()] == PlayerType::Human;
                (player == self.controlled && human).then_some(KeyAction::Command(command))
            }
        }
    }
}
