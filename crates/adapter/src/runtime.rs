//! Remote command queue and dispatcher.
//!
//! The connection reader tags every line with the session's episode id at read time
//! and queues it. The dispatcher executes queued lines in order, one critical section
//! each, and drops lines whose episode was ended by someone else. Resets sent by the
//! connection itself do not invalidate the lines it queued after them.

use tokio::sync::{mpsc, watch};

use crate::core::{GameState, SharedSession};
use crate::protocol::{
    create_ack, create_board, create_current_piece, create_power_ups, create_scores,
    create_status, parse_command, RemoteCommand,
};

/// One inbound line waiting for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub episode_id: u32,
    /// Trimmed, upper-cased command text
    pub line: String,
}

/// Counters reported when a dispatcher finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub executed: usize,
    pub stale: usize,
}

/// Execute one command against the locked session and build its reply.
///
/// Movement commands are silently ignored (no reply) unless the session is running.
pub fn execute(game: &mut GameState, command: RemoteCommand) -> Option<String> {
    if command.is_movement() && !game.is_running() {
        return None;
    }
    match command {
        RemoteCommand::Left => {
            game.move_left();
        }
        RemoteCommand::Right => {
            game.move_right();
        }
        RemoteCommand::Down => {
            game.move_down();
        }
        RemoteCommand::Up => {
            game.rotate();
        }
        RemoteCommand::Drop => {
            game.drop();
        }
        RemoteCommand::Pause => {
            game.toggle_pause();
        }
        RemoteCommand::Reset => game.reset(),
        RemoteCommand::Status => return Some(create_status(&game.snapshot())),
        RemoteCommand::GetScore => return Some(create_scores(&game.snapshot())),
        RemoteCommand::GetBoard => return Some(create_board(&game.snapshot())),
        RemoteCommand::GetCurrentPiece => return Some(create_current_piece(&game.snapshot())),
        RemoteCommand::GetPowerUps => return Some(create_power_ups(&game.snapshot())),
    }
    create_ack(command).map(str::to_string)
}

/// Episodes this connection moved into with its own RESETs.
///
/// Holds `since..=head`: every episode change from `since` up to `head` came from a
/// RESET run by this dispatcher. A line tagged inside that range is still current as
/// long as nobody else has reset the session after `head`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeGuard {
    own: Option<(u32, u32)>,
}

impl EpisodeGuard {
    /// Whether a line tagged `tagged` may run while the session is on `current`
    pub fn accepts(&self, tagged: u32, current: u32) -> bool {
        if tagged == current {
            return true;
        }
        match self.own {
            Some((since, head)) => head == current && since <= tagged && tagged <= head,
            None => false,
        }
    }

    fn record_reset(&mut self, before: u32, after: u32) {
        self.own = match self.own {
            Some((since, head)) if head == before => Some((since, after)),
            _ => Some((before, after)),
        };
    }
}

/// Run one queued line in a single critical section.
///
/// `Err` carries the current episode id when the line is stale.
pub fn dispatch(
    session: &SharedSession,
    guard: &mut EpisodeGuard,
    queued: &QueuedCommand,
) -> Result<Option<String>, u32> {
    let command = parse_command(&queued.line);
    session.with(|game| {
        let current = game.episode_id();
        if !guard.accepts(queued.episode_id, current) {
            return Err(current);
        }
        Ok(match command {
            Ok(command) => {
                let reply = execute(game, command);
                if command == RemoteCommand::Reset {
                    guard.record_reset(current, game.episode_id());
                }
                reply
            }
            Err(err) => Some(err.reply()),
        })
    })
}

/// Resolves once shutdown is signalled or its sender is gone
pub async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Drain `queue` until it closes or shutdown is signalled.
///
/// On shutdown everything still queued is discarded.
pub async fn run_dispatcher(
    session: SharedSession,
    mut queue: mpsc::UnboundedReceiver<QueuedCommand>,
    replies: mpsc::UnboundedSender<String>,
    mut shutdown: watch::Receiver<bool>,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    let mut guard = EpisodeGuard::default();

    loop {
        let queued = tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break,
            next = queue.recv() => match next {
                Some(queued) => queued,
                None => break,
            },
        };

        match dispatch(&session, &mut guard, &queued) {
            Ok(reply) => {
                stats.executed += 1;
                if let Some(reply) = reply {
                    if replies.send(reply).is_err() {
                        break;
                    }
                }
            }
            Err(current) => {
                stats.stale += 1;
                tracing::debug!(
                    line = %queued.line,
                    queued_episode = queued.episode_id,
                    current_episode = current,
                    "discarding stale remote command"
                );
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Piece;
    use crate::types::SessionConfig;

    fn session() -> SharedSession {
        let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 2));
        session.with(|game| game.set_active(Piece::new(2, 10).unwrap()));
        session
    }

    fn queued(episode_id: u32, line: &str) -> QueuedCommand {
        QueuedCommand {
            episode_id,
            line: line.to_string(),
        }
    }

    fn run_one(session: &SharedSession, episode_id: u32, line: &str) -> Result<Option<String>, u32> {
        dispatch(session, &mut EpisodeGuard::default(), &queued(episode_id, line))
    }

    #[test]
    fn execute_movement_and_replies() {
        let session = session();
        assert_eq!(
            run_one(&session, 0, "LEFT"),
            Ok(Some("OK: Moved left".to_string()))
        );
        assert_eq!(session.snapshot().active.unwrap().col, 3);

        assert_eq!(
            run_one(&session, 0, "JUMP"),
            Ok(Some("ERROR: Unknown command: JUMP".to_string()))
        );
    }

    #[test]
    fn blocked_move_still_acknowledged() {
        let session = session();
        session.with(|game| {
            let mut piece = Piece::new(2, 10).unwrap();
            piece.col = 0;
            game.set_active(piece);
        });
        assert_eq!(
            run_one(&session, 0, "LEFT"),
            Ok(Some("OK: Moved left".to_string()))
        );
        assert_eq!(session.snapshot().active.unwrap().col, 0);
    }

    #[test]
    fn movement_silent_while_paused() {
        let session = session();
        assert_eq!(
            run_one(&session, 0, "PAUSE"),
            Ok(Some("OK: Pause toggled".to_string()))
        );
        assert_eq!(run_one(&session, 0, "DROP"), Ok(None));
        let status = run_one(&session, 0, "STATUS").unwrap().unwrap();
        assert!(status.contains("Paused: true"));
    }

    #[test]
    fn lines_after_own_reset_still_run() {
        let session = session();
        let mut guard = EpisodeGuard::default();
        assert_eq!(
            dispatch(&session, &mut guard, &queued(0, "RESET")),
            Ok(Some("OK: Game reset".to_string()))
        );
        assert_eq!(
            dispatch(&session, &mut guard, &queued(0, "RESET")),
            Ok(Some("OK: Game reset".to_string()))
        );
        assert_eq!(session.episode_id(), 2);

        // Tagged before either reset ran, and between them
        let status = dispatch(&session, &mut guard, &queued(0, "STATUS")).unwrap();
        assert!(status.unwrap().starts_with("GAME_STATUS:"));
        assert!(dispatch(&session, &mut guard, &queued(1, "GET_SCORE")).is_ok());
    }

    #[test]
    fn reset_by_another_driver_makes_lines_stale() {
        let session = session();
        session.reset();
        assert_eq!(run_one(&session, 0, "LEFT"), Err(1));

        // An own reset followed by a foreign one: the old range no longer counts
        let mut guard = EpisodeGuard::default();
        assert!(dispatch(&session, &mut guard, &queued(1, "RESET")).is_ok());
        session.reset();
        assert_eq!(dispatch(&session, &mut guard, &queued(1, "LEFT")), Err(3));
        assert_eq!(dispatch(&session, &mut guard, &queued(2, "LEFT")), Err(3));
        assert!(dispatch(&session, &mut guard, &queued(3, "LEFT")).is_ok());
    }

    #[test]
    fn guard_accepts_only_own_range() {
        let mut guard = EpisodeGuard::default();
        assert!(guard.accepts(4, 4));
        assert!(!guard.accepts(3, 4));

        guard.record_reset(3, 4);
        guard.record_reset(4, 5);
        assert!(guard.accepts(3, 5));
        assert!(guard.accepts(4, 5));
        assert!(!guard.accepts(2, 5));
        assert!(!guard.accepts(3, 6));

        // Chain broken by a foreign reset (5 -> 6)
        guard.record_reset(6, 7);
        assert!(!guard.accepts(5, 7));
        assert!(guard.accepts(6, 7));
    }

    #[tokio::test]
    async fn dispatcher_keeps_pipelined_lines_after_reset() {
        let session = session();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        queue_tx.send(queued(0, "RIGHT")).unwrap();
        queue_tx.send(queued(0, "RESET")).unwrap();
        // Read before the reset ran
        queue_tx.send(queued(0, "GET_SCORE")).unwrap();
        drop(queue_tx);

        let stats = run_dispatcher(session.clone(), queue_rx, reply_tx, shutdown_rx).await;
        assert_eq!(stats, DispatchStats { executed: 3, stale: 0 });

        assert_eq!(reply_rx.recv().await.as_deref(), Some("OK: Moved right"));
        assert_eq!(reply_rx.recv().await.as_deref(), Some("OK: Game reset"));
        let scores = reply_rx.recv().await.unwrap();
        assert!(scores.starts_with("SCORES:"));
        assert_eq!(reply_rx.recv().await, None);
    }

    #[tokio::test]
    async fn dispatcher_drops_lines_from_a_foreign_reset() {
        let session = session();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        queue_tx.send(queued(0, "LEFT")).unwrap();
        queue_tx.send(queued(1, "STATUS")).unwrap();
        drop(queue_tx);
        session.reset();

        let stats = run_dispatcher(session.clone(), queue_rx, reply_tx, shutdown_rx).await;
        assert_eq!(stats, DispatchStats { executed: 1, stale: 1 });
        assert!(reply_rx.recv().await.unwrap().starts_with("GAME_STATUS:"));
        assert_eq!(reply_rx.recv().await, None);
    }

    #[tokio::test]
    async fn dispatcher_discards_queue_on_shutdown() {
        let session = session();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        queue_tx.send(queued(0, "DROP")).unwrap();
        shutdown_tx.send(true).unwrap();

        let stats = run_dispatcher(session.clone(), queue_rx, reply_tx, shutdown_rx).await;
        assert_eq!(stats, DispatchStats::default());
        assert_eq!(reply_rx.recv().await, None);
        assert_eq!(session.snapshot().active.unwrap().row, 0);
    }
}
