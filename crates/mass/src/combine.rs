use crate::{CombineError, MassAssignment, Queries};
use std::hash::Hash;
use tracing::debug;

impl<E> MassAssignment<E>
where
    E: Eq + Hash + Clone,
{
    /// Combines two mass assignments with Dempster's rule of combination.
    ///
    /// Returns [`CombineError::FrameMismatch`] unless both assignments are defined over the same frame,
    /// with the same event order, and [`CombineError::TotalConflict`] if no pair of focal elements
    /// intersects. Neither operand is modified.
    ///
    /// Running time: O(3^n)
    ///
    /// # Arguments
    ///
    /// * `left` - The first mass assignment of the pair.
    /// * `right` - The second mass assignment of the pair.
    pub fn combine(left: &Self, right: &Self) -> Result<Self, CombineError> {
        Self::combine_with_conflict(left, right).map(|(combined, _)| combined)
    }

    /// Combines two mass assignments with Dempster's rule of combination, also returning the conflict:
    /// the mass that the unnormalized combination assigns to the empty set.
    ///
    /// See [`combine`](MassAssignment::combine).
    pub fn combine_with_conflict(left: &Self, right: &Self) -> Result<(Self, f64), CombineError> {
        if left.frame() != right.frame() {
            return Err(CombineError::FrameMismatch);
        }
        let n = left.frame().len();
        let table = left.table();
        let masses = right.masses();

        // Each query pairs one subset B of the right operand, the constrained events, with the class of
        // left subsets A whose intersection with B is exactly the included events. Summed over all
        // queries this is the sum of m1(A) * m2(B) over every pair, grouped by A ∩ B.
        let mut raw = vec![0.0; 1 << n];
        let mut conflict = 0.0;
        let mut sum = 0.0;
        for query in Queries::new(n) {
            let product = table.get(query) * masses[query.free_complement(n)];
            if product == 0.0 {
                continue;
            }
            let intersection = query.intersection();
            raw[intersection] += product;
            if intersection == 0 {
                conflict += product;
            } else {
                sum += product;
            }
        }

        debug!(
            message = "combined mass assignments",
            events = n,
            conflict = conflict
        );
        if sum == 0.0 {
            return Err(CombineError::TotalConflict);
        }
        raw[0] = 0.0;
        for mass in raw.iter_mut().skip(1) {
            *mass /= sum;
        }
        Ok((Self::from_masses(left.frame().clone(), raw), conflict))
    }

    /// Calculates the Dempster combination of a sequence of mass assignments, returning a new
    /// [`MassAssignment`] as the result.
    ///
    /// A single assignment is returned unchanged. Returns [`CombineError::Empty`] for an empty sequence,
    /// otherwise fails as soon as any pairwise combination does.
    ///
    /// # Arguments
    ///
    /// * `assignments` - The `MassAssignment`s to be combined.
    pub fn combine_all<'a, I>(assignments: I) -> Result<Self, CombineError>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        let mut assignments = assignments.into_iter();
        let first = assignments.next().ok_or(CombineError::Empty)?;
        assignments.try_fold(first.clone(), |combined, m| Self::combine(&combined, m))
    }

    /// Calculates the Murphy average of a sequence of mass assignments, returning a new
    /// [`MassAssignment`] as the result.
    ///
    /// The Murphy average rule[^1] takes the mean mass of each subset across all mass assignments to
    /// create a new mass assignment. This new assignment is then combined with itself N times where N is
    /// the total number of assignments that were averaged together. Unlike
    /// [`combine_all`](MassAssignment::combine_all) it cannot end in total conflict.
    ///
    /// # Arguments
    ///
    /// * `assignments` - The `MassAssignment`s to be combined.
    ///
    /// [^1]: Catherine K. Murphy. 2000. Combining belief functions when evidence conflicts.
    ///     Decision Support Systems 29, 1 (2000), 1-9. DOI:<https://doi.org/10.1016/s0167-9236(99)00084-6>
    pub fn combine_murphy<'a, I>(assignments: I) -> Result<Self, CombineError>
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        let assignments: Vec<&Self> = assignments.into_iter().collect();
        let first = assignments.first().ok_or(CombineError::Empty)?;
        if assignments.iter().any(|m| m.frame() != first.frame()) {
            return Err(CombineError::FrameMismatch);
        }

        let mut average = vec![0.0; first.masses().len()];
        for m in &assignments {
            for (total, mass) in average.iter_mut().zip(m.masses()) {
                *total += mass;
            }
        }
        let length = assignments.len() as f64;
        for mass in average.iter_mut() {
            *mass /= length;
        }
        let average = Self::from_masses(first.frame().clone(), average);

        let mut combined = average.clone();
        for _ in 1..assignments.len() {
            combined = Self::combine(&combined, &average)?;
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    /// Dempster's rule by enumerating every pair of subsets.
    fn brute_force(left: &[f64], right: &[f64]) -> Vec<f64> {
        let mut raw = vec![0.0; left.len()];
        for (a, ma) in left.iter().enumerate() {
            for (b, mb) in right.iter().enumerate() {
                raw[a & b] += ma * mb;
            }
        }
        let sum: f64 = raw.iter().skip(1).sum();
        raw[0] = 0.0;
        raw.iter().map(|mass| mass / sum).collect()
    }

    /// A deterministic spread of weights over a frame, varied by `seed`.
    fn spread(events: &[&'static str], seed: usize) -> MassAssignment<&'static str> {
        let frame = crate::Frame::new(events.iter().copied()).unwrap();
        let weights: Vec<(Vec<&str>, f64)> = (1..=frame.full_id())
            .filter(|subset| (subset * 31 + seed * 17) % 5 < 2)
            .map(|subset| (frame.subset(subset), ((subset * 13 + seed) % 7 + 1) as f64))
            .collect();
        MassAssignment::with_frame(frame, weights)
    }

    fn first() -> MassAssignment<&'static str> {
        MassAssignment::new(
            ["A", "B"],
            [(vec!["A", "B"], 0.1), (vec!["A"], 0.1), (vec!["B"], 0.8)],
        )
        .unwrap()
    }

    fn second() -> MassAssignment<&'static str> {
        MassAssignment::new(
            ["A", "B"],
            [(vec!["A", "B"], 0.2), (vec!["A"], 0.6), (vec!["B"], 0.2)],
        )
        .unwrap()
    }

    #[test]
    fn combine_regression() -> Result<(), Box<dyn std::error::Error>> {
        let (combined, conflict) = MassAssignment::combine_with_conflict(&first(), &second())?;
        assert_relative_eq!(conflict, 0.5, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["A"]), 0.28, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["B"]), 0.68, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["A", "B"]), 0.04, epsilon = 1e-12);
        assert_eq!(combined.belief_assignment(["X"]), 0.0);

        let expected = brute_force(first().masses(), second().masses());
        for (mass, expected) in combined.masses().iter().zip(&expected) {
            assert_relative_eq!(*mass, *expected, epsilon = 1e-12);
        }
        assert!(combined.validate().is_ok());
        Ok(())
    }

    #[test]
    fn combine_matches_brute_force() -> Result<(), Box<dyn std::error::Error>> {
        let events = ["A", "B", "C", "D", "E"];
        for seed in 0..6 {
            let left = spread(&events, seed);
            let right = spread(&events, seed + 3);
            let combined = MassAssignment::combine(&left, &right)?;
            let expected = brute_force(left.masses(), right.masses());
            for (mass, expected) in combined.masses().iter().zip(&expected) {
                assert_relative_eq!(*mass, *expected, epsilon = 1e-12);
            }
            assert!(combined.validate().is_ok());
        }
        Ok(())
    }

    #[test]
    fn combine_is_commutative() -> Result<(), Box<dyn std::error::Error>> {
        let events = ["A", "B", "C", "D"];
        for seed in 0..5 {
            let left = spread(&events, seed);
            let right = spread(&events, seed * 2 + 1);
            assert_relative_eq!(
                MassAssignment::combine(&left, &right)?,
                MassAssignment::combine(&right, &left)?,
                epsilon = 1e-12
            );
        }
        Ok(())
    }

    #[test]
    fn combine_vacuous_is_neutral() -> Result<(), Box<dyn std::error::Error>> {
        let vacuous = MassAssignment::vacuous(["A", "B"])?;
        let combined = MassAssignment::combine(&vacuous, &vacuous)?;
        assert_eq!(combined, vacuous);
        assert_eq!(combined.belief_assignment(["A", "B"]), 1.0);

        let combined = MassAssignment::combine(&first(), &vacuous)?;
        assert_relative_eq!(combined, first(), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn combine_two_state_frame() -> Result<(), Box<dyn std::error::Error>> {
        let left = MassAssignment::new(
            ["accept", "restrict"],
            [
                (vec!["accept"], 0.25),
                (vec!["restrict"], 0.5),
                (vec!["accept", "restrict"], 0.25),
            ],
        )?;
        let right = MassAssignment::new(
            ["accept", "restrict"],
            [
                (vec!["accept"], 0.25),
                (vec!["restrict"], 0.1),
                (vec!["accept", "restrict"], 0.65),
            ],
        )?;
        let combined = MassAssignment::combine(&left, &right)?;
        assert_relative_eq!(
            combined.belief_assignment(["accept"]),
            0.338235294117647,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            combined.belief_assignment(["restrict"]),
            0.4705882352941177,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            combined.belief_assignment(["accept", "restrict"]),
            0.1911764705882353,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn combine_nested_focal_elements() -> Result<(), Box<dyn std::error::Error>> {
        let left = MassAssignment::new(
            ["A", "B", "C", "D"],
            [(vec!["B", "C", "D"], 3.0), (vec!["A", "B", "C", "D"], 1.0)],
        )?;
        let right = MassAssignment::new(
            ["A", "B", "C", "D"],
            [(vec!["B"], 2.0), (vec!["D"], 2.0), (vec!["A", "B", "C", "D"], 1.0)],
        )?;
        let (combined, conflict) = MassAssignment::combine_with_conflict(&left, &right)?;
        assert_eq!(conflict, 0.0);
        assert_relative_eq!(combined.belief_assignment(["B"]), 0.4, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["D"]), 0.4, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["B", "C", "D"]), 0.15, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["A", "B", "C", "D"]), 0.05, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn combine_frame_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let ab = MassAssignment::vacuous(["A", "B"])?;
        let ba = MassAssignment::vacuous(["B", "A"])?;
        let abc = MassAssignment::vacuous(["A", "B", "C"])?;
        assert_eq!(
            MassAssignment::combine(&ab, &ba).unwrap_err(),
            CombineError::FrameMismatch
        );
        assert_eq!(
            MassAssignment::combine(&ab, &abc).unwrap_err(),
            CombineError::FrameMismatch
        );
        Ok(())
    }

    #[test]
    fn combine_total_conflict() -> Result<(), Box<dyn std::error::Error>> {
        let a = MassAssignment::new(["A", "B"], [(vec!["A"], 1.0)])?;
        let b = MassAssignment::new(["A", "B"], [(vec!["B"], 1.0)])?;
        assert_eq!(
            MassAssignment::combine(&a, &b).unwrap_err(),
            CombineError::TotalConflict
        );
        assert_eq!(
            MassAssignment::combine_all([&a, &b]).unwrap_err(),
            CombineError::TotalConflict
        );
        Ok(())
    }

    #[test]
    fn combine_all_folds() -> Result<(), Box<dyn std::error::Error>> {
        let events = ["A", "B", "C"];
        let assignments: Vec<_> = (0..4).map(|seed| spread(&events, seed)).collect();
        let mut expected = assignments[0].clone();
        for m in &assignments[1..] {
            expected = MassAssignment::combine(&expected, m)?;
        }
        assert_relative_eq!(
            MassAssignment::combine_all(&assignments)?,
            expected,
            epsilon = 1e-12
        );
        assert_eq!(
            MassAssignment::combine_all(&assignments[..1])?,
            assignments[0]
        );
        assert_eq!(
            MassAssignment::<&str>::combine_all(&[]).unwrap_err(),
            CombineError::Empty
        );
        Ok(())
    }

    #[test]
    fn combine_murphy_high_conflict() -> Result<(), Box<dyn std::error::Error>> {
        let a = MassAssignment::new(["A", "B"], [(vec!["A"], 1.0)])?;
        let b = MassAssignment::new(["A", "B"], [(vec!["B"], 1.0)])?;
        let combined = MassAssignment::combine_murphy([&a, &b])?;
        assert_relative_eq!(combined.belief_assignment(["A"]), 0.5, epsilon = 1e-12);
        assert_relative_eq!(combined.belief_assignment(["B"]), 0.5, epsilon = 1e-12);
        assert_eq!(combined.belief_assignment(["A", "B"]), 0.0);
        Ok(())
    }

    #[test]
    fn combine_murphy_with_vacuous() -> Result<(), Box<dyn std::error::Error>> {
        let a = MassAssignment::new(
            ["A", "B"],
            [(vec!["A"], 0.35), (vec!["B"], 0.2), (vec!["A", "B"], 0.45)],
        )?;
        let vacuous = MassAssignment::vacuous(["A", "B"])?;
        let combined = MassAssignment::combine_murphy([&a, &vacuous])?;
        assert_relative_eq!(
            combined.belief_assignment(["A"]),
            0.2946891191709844,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            combined.belief_assignment(["B"]),
            0.16062176165803108,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            combined.belief_assignment(["A", "B"]),
            0.5446891191709845,
            epsilon = 1e-12
        );
        assert_eq!(
            MassAssignment::combine_murphy([&a, &MassAssignment::vacuous(["B", "A"])?])
                .unwrap_err(),
            CombineError::FrameMismatch
        );
        Ok(())
    }

    #[test]
    fn combine_leaves_operands_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let left = first();
        let right = second();
        MassAssignment::combine(&left, &right)?;
        assert_eq!(left, first());
        assert_eq!(right, second());
        Ok(())
    }
}
