use arrayvec::ArrayVec;

use duo_tetris_core::SharedSession;
use duo_tetris_types::{Command, Player};

use crate::search::MoveCandidate;

/// Longest plan: three rotations, a full board width of shifts, one drop
pub const MAX_PLAN_LEN: usize = 32;

pub type Plan = ArrayVec<Command, MAX_PLAN_LEN>;

/// Key sequence that brings a piece anchored at `current_col` to `target`:
/// rotations first, then horizontal moves, then one drop.
pub fn plan_moves(current_col: i32, target: &MoveCandidate) -> Plan {
    let mut plan = Plan::new();

    for _ in 0..(target.rotation % 4) {
        plan.push(Command::Rotate);
    }

    let delta = target.col - current_col;
    let step = if delta < 0 {
        Command::MoveLeft
    } else {
        Command::MoveRight
    };
    let shifts = (delta.unsigned_abs() as usize).min(MAX_PLAN_LEN - plan.len() - 1);
    plan.extend(std::iter::repeat(step).take(shifts));

    plan.push(Command::Drop);
    plan
}

/// Why a plan stopped before its last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAbort {
    NotPlayable,
    TurnChanged,
    EpisodeChanged,
}

/// Execute `plan` one session call per step.
///
/// Each step re-checks, inside its own critical section, that the session is still
/// running, on the same episode, and still on `player`'s turn. Returns the number of
/// steps applied, or why execution stopped.
pub fn execute_plan(
    session: &SharedSession,
    player: Player,
    episode_id: u32,
    plan: &[Command],
) -> Result<usize, PlanAbort> {
    for (applied, &command) in plan.iter().enumerate() {
        session.with(|game| {
            if !game.is_running() {
                return Err(PlanAbort::NotPlayable);
            }
            if game.episode_id() != episode_id {
                return Err(PlanAbort::EpisodeChanged);
            }
            if game.current_player() != player {
                return Err(PlanAbort::TurnChanged);
            }
            game.apply(command);
            Ok(())
        })
        .map_err(|abort| {
            tracing::trace!(
                player = player.number(),
                applied,
                next = command.as_str(),
                ?abort,
                "plan aborted"
            );
            abort
        })?;
    }
    Ok(plan.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duo_tetris_core::{GameState, Piece};
    use duo_tetris_types::SessionConfig;

    fn candidate(rotation: u8, col: i32) -> MoveCandidate {
        MoveCandidate {
            rotation,
            col,
            row: 0,
            lines_cleared: 0,
            score: 0,
        }
    }

    #[test]
    fn plan_rotates_then_shifts_then_drops() {
        let plan = plan_moves(4, &candidate(2, 1));
        assert_eq!(
            plan.as_slice(),
            &[
                Command::Rotate,
                Command::Rotate,
                Command::MoveLeft,
                Command::MoveLeft,
                Command::MoveLeft,
                Command::Drop,
            ]
        );

        let plan = plan_moves(3, &candidate(0, 7));
        assert_eq!(plan.iter().filter(|c| **c == Command::MoveRight).count(), 4);
        assert_eq!(plan.last(), Some(&Command::Drop));

        assert_eq!(plan_moves(5, &candidate(0, 5)).as_slice(), &[Command::Drop]);
    }

    #[test]
    fn plan_stays_within_capacity() {
        let plan = plan_moves(0, &candidate(3, 100));
        assert_eq!(plan.len(), MAX_PLAN_LEN);
        assert_eq!(plan.last(), Some(&Command::Drop));
    }

    #[test]
    fn execute_plan_moves_piece() {
        let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 9));
        session.with(|game| game.set_active(Piece::new(2, 10).unwrap()));
        let episode = session.episode_id();

        let plan = plan_moves(4, &candidate(0, 0));
        assert_eq!(execute_plan(&session, Player::One, episode, &plan), Ok(plan.len()));

        let active = session.snapshot().active.unwrap();
        assert_eq!((active.row, active.col), (18, 0));
    }

    #[test]
    fn execute_plan_respects_turn_pause_and_episode() {
        let session = SharedSession::new(GameState::with_seed(SessionConfig::default(), 9));
        let plan = plan_moves(4, &candidate(0, 0));
        let episode = session.episode_id();

        assert_eq!(
            execute_plan(&session, Player::Two, episode, &plan),
            Err(PlanAbort::TurnChanged)
        );
        assert_eq!(
            execute_plan(&session, Player::One, episode + 1, &plan),
            Err(PlanAbort::EpisodeChanged)
        );
        session.toggle_pause();
        assert_eq!(
            execute_plan(&session, Player::One, episode, &plan),
            Err(PlanAbort::NotPlayable)
        );
    }
}
