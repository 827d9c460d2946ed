use crate::{Queries, Query, POWERS_OF_THREE};
use std::ops::Index;

/// The total mass selected by every ternary [`Query`] of a frame, indexed by query id.
///
/// Built once from a mass array of length `2^n` by a subset-sum transform over ternary digits: a query
/// without free events selects exactly one subset and takes its mass, and any other query is the sum
/// of the two queries obtained by resolving its lowest free event to included and to excluded. Both of
/// those have smaller ids, so a single pass in id order fills the `3^n` entries.
#[derive(Debug, Clone)]
pub struct CumulativeTable {
    values: Vec<f64>,
}

impl CumulativeTable {
    /// Derives the table for a mass array over an `n`-event frame.
    ///
    /// # Arguments
    ///
    /// * `masses` - The mass of every subset, indexed by subset bitmask. Must have length `2^n`.
    /// * `n` - The number of events in the frame.
    pub fn new(masses: &[f64], n: usize) -> Self {
        debug_assert_eq!(masses.len(), 1 << n);
        let mut values = Vec::with_capacity(POWERS_OF_THREE[n]);
        for query in Queries::new(n) {
            let value = match query.first_free() {
                None => masses[query.intersection()],
                Some(k) => {
                    let p = POWERS_OF_THREE[k];
                    values[query.id() - p] + values[query.id() - 2 * p]
                }
            };
            values.push(value);
        }
        Self { values }
    }

    /// The total mass selected by a query.
    pub fn get(&self, query: Query) -> f64 {
        self.values[query.id()]
    }

    /// The number of entries, `3^n`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<usize> for CumulativeTable {
    type Output = f64;

    fn index(&self, id: usize) -> &f64 {
        &self.values[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums masses by checking every subset against the query directly.
    fn brute_force(masses: &[f64], query: Query, n: usize) -> f64 {
        let excluded = query.free_complement(n) & !query.intersection();
        (0..1usize << n)
            .filter(|subset| {
                subset & query.intersection() == query.intersection() && subset & excluded == 0
            })
            .map(|subset| masses[subset])
            .sum()
    }

    #[test]
    fn table_matches_brute_force() {
        let n = 4;
        let masses: Vec<f64> = (0..1usize << n)
            .map(|subset| if subset == 0 { 0.0 } else { (subset * 7 % 11) as f64 })
            .collect();
        let table = CumulativeTable::new(&masses, n);
        assert_eq!(table.len(), POWERS_OF_THREE[n]);
        for query in Queries::new(n) {
            assert_relative_eq!(
                table.get(query),
                brute_force(&masses, query, n),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn table_special_queries() {
        // masses over {A, B}: {A} = 0.1, {B} = 0.8, {A, B} = 0.1
        let masses = [0.0, 0.1, 0.8, 0.1];
        let table = CumulativeTable::new(&masses, 2);

        // everything free selects every subset
        assert_relative_eq!(table[POWERS_OF_THREE[2] - 1], 1.0, epsilon = 1e-12);
        // A free, B excluded: subsets of {A}
        assert_relative_eq!(table.get(Query::encode(0, 0b01)), 0.1, epsilon = 1e-12);
        // A included, B free: supersets of {A}
        assert_relative_eq!(table.get(Query::encode(0b01, 0b10)), 0.2, epsilon = 1e-12);
        // both included: exactly {A, B}
        assert_relative_eq!(table.get(Query::encode(0b11, 0)), 0.1, epsilon = 1e-12);
        // all excluded: the empty set
        assert_relative_eq!(table[0], 0.0);
    }

    #[test]
    fn table_empty_frame() {
        let table = CumulativeTable::new(&[0.0], 0);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert_relative_eq!(table[0], 0.0);
    }
}
