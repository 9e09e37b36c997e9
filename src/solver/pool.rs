//! Control pool for the assignment solvers.
//!
//! Struct-of-arrays layout, sorted by control identifier at construction.
//! The id-sorted order is what gives nearest-neighbor scans their documented
//! tie-break: under strict less-than comparison the first of two equidistant
//! controls encountered is the one with the lowest id.

use rustc_hash::FxHashSet;

use crate::encode::encoder::CovariateVector;

/// Pool of control records available for matching
#[derive(Debug)]
pub struct ControlPool {
    /// Control identifiers, ascending
    pub ids: Vec<String>,
    /// Covariate vectors, aligned with `ids`
    pub vectors: Vec<CovariateVector>,
    /// Original batch row per control, aligned with `ids`
    pub rows: Vec<usize>,
    /// Pool indices already consumed by a match
    used: FxHashSet<usize>,
}

impl ControlPool {
    /// Build a pool from extracted control attributes, sorting by id
    #[must_use]
    pub fn new(ids: Vec<String>, vectors: Vec<CovariateVector>, rows: Vec<usize>) -> Self {
        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_unstable_by(|&a, &b| ids[a].cmp(&ids[b]));

        let mut sorted_ids = Vec::with_capacity(ids.len());
        let mut sorted_vectors = Vec::with_capacity(vectors.len());
        let mut sorted_rows = Vec::with_capacity(rows.len());

        for &i in &order {
            sorted_ids.push(ids[i].clone());
            sorted_vectors.push(vectors[i].clone());
            sorted_rows.push(rows[i]);
        }

        Self {
            ids: sorted_ids,
            vectors: sorted_vectors,
            rows: sorted_rows,
            used: FxHashSet::default(),
        }
    }

    /// Total number of controls in the pool
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the pool holds no controls at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of controls not yet consumed
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.ids.len() - self.used.len()
    }

    /// Whether the control at a pool index is still available
    #[must_use]
    pub fn is_available(&self, index: usize) -> bool {
        !self.used.contains(&index)
    }

    /// Consume the control at a pool index
    pub fn mark_used(&mut self, index: usize) {
        self.used.insert(index);
    }

    /// Ids of the controls left unconsumed, in pool order
    #[must_use]
    pub fn residual_ids(&self) -> Vec<&str> {
        (0..self.ids.len())
            .filter(|i| self.is_available(*i))
            .map(|i| self.ids[i].as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn pool() -> ControlPool {
        ControlPool::new(
            vec!["c3".to_string(), "c1".to_string(), "c2".to_string()],
            vec![smallvec![3.0], smallvec![1.0], smallvec![2.0]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_pool_sorts_by_id() {
        let pool = pool();
        assert_eq!(pool.ids, vec!["c1", "c2", "c3"]);
        assert_eq!(pool.vectors[0].as_slice(), &[1.0]);
        // Original batch rows follow their ids through the sort
        assert_eq!(pool.rows, vec![1, 2, 0]);
    }

    #[test]
    fn test_availability_tracking() {
        let mut pool = pool();
        assert_eq!(pool.available_count(), 3);
        assert!(pool.is_available(1));

        pool.mark_used(1);
        assert!(!pool.is_available(1));
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.residual_ids(), vec!["c1", "c3"]);
    }
}
