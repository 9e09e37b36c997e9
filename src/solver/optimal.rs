//! Global-optimal assignment.
//!
//! Minimizes total assignment distance with a shortest augmenting path
//! solver over row and column potentials (Jonker-Volgenant style). When the
//! treated group outnumbers the pool the matrix is solved transposed, so the
//! assignment still has maximum cardinality and the leftover treated records
//! are reported unmatched.

use log::info;

use crate::config::MatchingConfig;
use crate::error::{MatchError, Result};
use crate::solver::pool::ControlPool;
use crate::solver::types::{Assignment, MatchedPair, UnmatchedTreated};

/// Assign controls optimally, without replacement
///
/// `distances` is the treated-by-control matrix with columns in pool order.
/// The pool is consumed and the residual pool returned alongside the
/// assignment.
///
/// # Errors
///
/// Returns `EmptyControlPool` if the pool is empty at start, and
/// `SolverLimitExceeded` if the configured iteration budget runs out.
pub fn solve_optimal(
    treated_ids: &[String],
    distances: &[Vec<f64>],
    mut pool: ControlPool,
    config: &MatchingConfig,
) -> Result<(Assignment, ControlPool)> {
    if pool.is_empty() {
        return Err(MatchError::EmptyControlPool);
    }

    let t = treated_ids.len();
    let c = pool.len();

    // The augmenting path solver needs rows <= columns; with more treated
    // than controls we assign a treated record to every control instead.
    let row_to_col = if t <= c {
        shortest_augmenting_path(&|i, j| distances[i][j], t, c, config.solver_iteration_limit)?
    } else {
        let col_to_row =
            shortest_augmenting_path(&|i, j| distances[j][i], c, t, config.solver_iteration_limit)?;
        let mut inverted = vec![None; t];
        for (ctrl_idx, treated_row) in col_to_row.iter().enumerate() {
            if let Some(row) = treated_row {
                inverted[*row] = Some(ctrl_idx);
            }
        }
        inverted
    };

    let mut assignment = Assignment::default();

    for (treated_row, assigned) in row_to_col.iter().enumerate() {
        match assigned {
            Some(ctrl_idx) => {
                pool.mark_used(*ctrl_idx);
                assignment.pairs.push(MatchedPair {
                    treated_id: treated_ids[treated_row].clone(),
                    treated_row,
                    control_id: pool.ids[*ctrl_idx].clone(),
                    control_row: pool.rows[*ctrl_idx],
                    distance: distances[treated_row][*ctrl_idx],
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

    info!(
        "Optimal assignment: {} matched, {} unmatched, total distance {:.4}",
        assignment.pairs.len(),
        assignment.unmatched.len(),
        assignment.total_distance()
    );

    Ok((assignment, pool))
}

/// Minimum-cost assignment of `n` rows to `m` columns, `n <= m`
///
/// Classic potentials formulation: rows are inserted one at a time and the
/// cheapest augmenting path to a free column is found by repeated relaxation.
/// Every row ends up assigned, which is exactly maximum cardinality when
/// `n <= m`. Returns the assigned column per row.
fn shortest_augmenting_path(
    cost: &dyn Fn(usize, usize) -> f64,
    n: usize,
    m: usize,
    iteration_limit: Option<u64>,
) -> Result<Vec<Option<usize>>> {
    debug_assert!(n <= m);

    const NONE: usize = usize::MAX;

    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    // Row assigned to each column; index 0 is the virtual starting column
    let mut assigned_row = vec![NONE; m + 1];
    let mut way = vec![0usize; m + 1];
    let mut iterations: u64 = 0;

    for i in 1..=n {
        assigned_row[0] = i;
        let mut j0 = 0usize;
        let mut min_to = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            iterations += 1;
            if let Some(limit) = iteration_limit {
                if iterations > limit {
                    return Err(MatchError::SolverLimitExceeded(limit));
                }
            }

            used[j0] = true;
            let i0 = assigned_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < min_to[j] {
                    min_to[j] = cur;
                    way[j] = j0;
                }
                if min_to[j] < delta {
                    delta = min_to[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
                if used[j] {
                    u[assigned_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_to[j] -= delta;
                }
            }

            j0 = j1;
            if assigned_row[j0] == NONE {
                break;
            }
        }

        // Walk the augmenting path back, flipping assignments
        while j0 != 0 {
            let j1 = way[j0];
            assigned_row[j0] = assigned_row[j1];
            j0 = j1;
        }
    }

    let mut result = vec![None; n];
    for j in 1..=m {
        if assigned_row[j] != NONE && assigned_row[j] != 0 {
            result[assigned_row[j] - 1] = Some(j - 1);
        }
    }

    Ok(result)
}
