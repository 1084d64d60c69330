//! Automated play: heuristic placement search and the agent scheduler
//!
//! - [`search`]: single-ply search over every rotation and column
//! - [`place`]: turns a chosen placement into a key sequence and replays it
//! - [`agent`]: timer-driven driver for player slots configured as AI

pub mod agent;
pub mod place;
pub mod search;

pub use agent::{agent_step, run_agent, AgentConfig};
pub use place::{execute_plan, plan_moves, Plan, PlanAbort, MAX_PLAN_LEN};
pub use search::{find_best_move, find_best_move_with, BoardFeatures, MoveCandidate, SearchWeights};
