//! Greedy sequential assignment.
//!
//! Treated records are processed in input order, or in a seed-shuffled order
//! when the configuration carries a random seed. Each record takes its
//! nearest still-available control; ties fall to the lowest control id
//! because the pool is id-sorted and the scan uses strict less-than. The run
//! is fully deterministic for a fixed order and seed.

use log::info;
use rand::prelude::*;
use rand::seq::SliceRandom;

use crate::config::MatchingConfig;
use crate::error::{MatchError, Result};
use crate::solver::pool::ControlPool;
use crate::solver::types::{Assignment, MatchedPair, UnmatchedTreated};

/// Assign controls greedily, without replacement
///
/// `distances` is the treated-by-control matrix with columns in pool order.
/// Ownership of the pool is taken and the residual pool returned, so the
/// without-replacement state never escapes the call.
///
/// # Errors
///
/// Returns `EmptyControlPool` if the pool is empty at start. Running out of
/// controls mid-run is not an error; the remaining treated records are
/// reported unmatched.
pub fn solve_greedy(
    treated_ids: &[String],
    distances: &[Vec<f64>],
    mut pool: ControlPool,
    config: &MatchingConfig,
) -> Result<(Assignment, ControlPool)> {
    if pool.is_empty() {
        return Err(MatchError::EmptyControlPool);
    }

    let mut order: Vec<usize> = (0..treated_ids.len()).collect();
    if let Some(seed) = config.random_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        info!("Greedy processing order shuffled with seed {seed}");
    }

    let mut assignment = Assignment::default();

    for &treated_row in &order {
        let row = &distances[treated_row];

        let mut best: Option<(usize, f64)> = None;
        for ctrl_idx in 0..pool.len() {
            if !pool.is_available(ctrl_idx) {
                continue;
            }
            let d = row[ctrl_idx];
            // Strict less-than keeps the lowest-id control on ties
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((ctrl_idx, d));
            }
        }

        match best {
            Some((ctrl_idx, distance)) => {
                pool.mark_used(ctrl_idx);
                assignment.pairs.push(MatchedPair {
                    treated_id: treated_ids[treated_row].clone(),
                    treated_row,
                    control_id: pool.ids[ctrl_idx].clone(),
                    control_row: pool.rows[ctrl_idx],
                    distance,
                });
            }
            None => {
                assignment.unmatched.push(UnmatchedTreated {
                    treated_id: treated_ids[treated_row].clone(),
                    treated_row,
                });
            }
        }
    }

    // Report pairs in treated row order regardless of processing order
    assignment.pairs.sort_by_key(|p| p.treated_row);
    assignment.unmatched.sort_by_key(|u| u.treated_row);

    info!(
        "Greedy assignment: {} matched, {} unmatched, {} controls left",
        assignment.pairs.len(),
        assignment.unmatched.len(),
        pool.available_count()
    );

    Ok((assignment, pool))
}
