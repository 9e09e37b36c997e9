//! Without-replacement assignment solvers.
//!
//! Two policies are provided:
//!
//! 1. Greedy sequential: treated records processed in a fixed (optionally
//!    seed-shuffled) order, each taking its nearest still-available control.
//! 2. Global optimal: total assignment distance minimized with a shortest
//!    augmenting path solver.
//!
//! Both consume the control pool by value and return the residual pool next
//! to the assignment, so pool state never leaks through shared mutation.

pub mod greedy;
pub mod optimal;
pub mod pool;
pub mod types;

pub use greedy::solve_greedy;
pub use optimal::solve_optimal;
pub use pool::ControlPool;
pub use types::{Assignment, MatchedPair, MatchingResult, UnmatchedTreated};
