use crate::{CumulativeTable, Frame, FrameError, Query};
use approx::{AbsDiffEq, RelativeEq};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

/// An immutable [Dempster-Shafer](https://en.wikipedia.org/wiki/Dempster%E2%80%93Shafer_theory) basic
/// belief assignment over a frame of discernment.
///
/// Mass is stored for every subset of the frame, indexed by subset bitmask. The empty set always has no
/// mass and the remaining masses sum to one. On construction a [`CumulativeTable`] is derived so that
/// belief, plausibility, commonality and other cumulative queries are single lookups.
///
/// Frames are kept small: the table has `3^n` entries for an `n`-event frame, so construction and
/// combination are practical up to roughly 18 events.
#[derive(Debug, Clone)]
pub struct MassAssignment<E> {
    frame: Frame<E>,
    masses: Vec<f64>,
    table: CumulativeTable,
}

impl<E> MassAssignment<E>
where
    E: Eq + Hash + Clone,
{
    /// Creates a mass assignment from weighted subsets of a frame.
    ///
    /// Subsets may contain events outside the frame; those events are ignored. Entries whose subset ends
    /// up empty and entries without a positive, finite weight are discarded. Weights of entries that
    /// resolve to the same subset are added up. The remaining weights are normalized to sum to one. If
    /// nothing remains, the result is the [`vacuous`](MassAssignment::vacuous) assignment.
    ///
    /// Running time is O(3^n) for an `n`-event frame.
    ///
    /// # Arguments
    ///
    /// * `events` - The frame of discernment. Duplicates collapse.
    /// * `weights` - Pairs of a subset and the weight assigned to it.
    pub fn new<F, W, S>(events: F, weights: W) -> Result<Self, FrameError>
    where
        F: IntoIterator<Item = E>,
        W: IntoIterator<Item = (S, f64)>,
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        Ok(Self::with_frame(Frame::new(events)?, weights))
    }

    /// Creates the vacuous mass assignment, placing all mass on the whole frame.
    ///
    /// This is the assignment of total ignorance and the neutral element of Dempster's rule.
    pub fn vacuous<F>(events: F) -> Result<Self, FrameError>
    where
        F: IntoIterator<Item = E>,
    {
        Ok(Self::vacuous_with_frame(Frame::new(events)?))
    }

    /// Creates a mass assignment from weighted subsets of an already indexed frame.
    ///
    /// See [`new`](MassAssignment::new).
    pub fn with_frame<W, S>(frame: Frame<E>, weights: W) -> Self
    where
        W: IntoIterator<Item = (S, f64)>,
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        let entries: Vec<(usize, f64)> = weights
            .into_iter()
            .map(|(subset, weight)| (frame.subset_id(subset), weight))
            .filter(|&(subset_id, weight)| {
                subset_id != 0 && weight.is_finite() && weight > 0.0
            })
            .collect();
        // Weights are scaled by the largest one so the running sum stays finite.
        let largest = entries
            .iter()
            .map(|&(_, weight)| weight)
            .fold(0.0, f64::max);
        if largest == 0.0 {
            debug!(
                message = "no usable weights, falling back to vacuous assignment",
                events = frame.len()
            );
            return Self::vacuous_with_frame(frame);
        }
        let mut masses = vec![0.0; 1 << frame.len()];
        let mut sum = 0.0;
        for (subset_id, weight) in entries {
            let scaled = weight / largest;
            masses[subset_id] += scaled;
            sum += scaled;
        }
        for mass in masses.iter_mut() {
            *mass /= sum;
        }
        masses[0] = 0.0;
        Self::from_masses(frame, masses)
    }

    /// Creates the vacuous mass assignment over an already indexed frame.
    pub fn vacuous_with_frame(frame: Frame<E>) -> Self {
        let mut masses = vec![0.0; 1 << frame.len()];
        masses[frame.full_id()] = 1.0;
        Self::from_masses(frame, masses)
    }

    /// Wraps an already normalized mass array and derives its table.
    pub(crate) fn from_masses(frame: Frame<E>, masses: Vec<f64>) -> Self {
        let table = CumulativeTable::new(&masses, frame.len());
        debug!(
            message = "derived cumulative table",
            events = frame.len(),
            queries = table.len()
        );
        Self {
            frame,
            masses,
            table,
        }
    }

    /// The frame of discernment.
    pub fn frame(&self) -> &Frame<E> {
        &self.frame
    }

    /// A copy of the events of the frame, in id order.
    pub fn event_space(&self) -> Vec<E> {
        self.frame.events().to_vec()
    }

    /// The mass of every subset, indexed by subset bitmask.
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// The cumulative table derived from the masses.
    pub fn table(&self) -> &CumulativeTable {
        &self.table
    }

    /// The mass assigned to exactly the given subset.
    ///
    /// Events outside the frame are ignored. Running time: O(|subset|)
    pub fn belief_assignment<S>(&self, subset: S) -> f64
    where
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        self.masses[self.frame.subset_id(subset)]
    }

    /// The belief in a subset: the total mass of all of its subsets.
    ///
    /// Events outside the frame are ignored. Running time: O(|subset|)
    pub fn belief<S>(&self, subset: S) -> f64
    where
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        let subset_id = self.frame.subset_id(subset);
        self.table.get(Query::encode(0, subset_id))
    }

    /// The plausibility of a subset: the total mass of all subsets that intersect it.
    ///
    /// Equal to one minus the belief in the complement. Events outside the frame are ignored.
    pub fn plausibility<S>(&self, subset: S) -> f64
    where
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        let full_id = self.frame.full_id();
        let complement = full_id ^ self.frame.subset_id(subset);
        self.table.get(Query::encode(0, full_id)) - self.table.get(Query::encode(0, complement))
    }

    /// The commonality of a subset: the total mass of all of its supersets.
    ///
    /// Events outside the frame are ignored.
    pub fn commonality<S>(&self, subset: S) -> f64
    where
        S: IntoIterator,
        S::Item: Borrow<E>,
    {
        let subset_id = self.frame.subset_id(subset);
        self.table
            .get(Query::constrain(subset_id, 0, self.frame.len()))
    }

    /// The total mass of all subsets that contain every event of `yes` and no event of `no`.
    ///
    /// Returns 0 if `yes` and `no` share an event, including an event outside the frame, since no subset
    /// can satisfy both. Otherwise events outside the frame are ignored in both arguments.
    /// Running time: O(|yes| + |no|)
    ///
    /// # Arguments
    ///
    /// * `yes` - The events every counted subset must contain.
    /// * `no` - The events no counted subset may contain.
    pub fn cumulative_belief_assignment<Y, N>(&self, yes: Y, no: N) -> f64
    where
        Y: IntoIterator,
        Y::Item: Borrow<E>,
        N: IntoIterator,
        N::Item: Borrow<E>,
    {
        let no: Vec<N::Item> = no.into_iter().collect();
        let excluded: HashSet<&E> = no.iter().map(Borrow::<E>::borrow).collect();
        let yes: Vec<Y::Item> = yes.into_iter().collect();
        if yes
            .iter()
            .any(|event| excluded.contains(Borrow::<E>::borrow(event)))
        {
            return 0.0;
        }
        let yes_id = self.frame.subset_id(yes.iter().map(Borrow::<E>::borrow));
        let no_id = self.frame.subset_id(no.iter().map(Borrow::<E>::borrow));
        self.table
            .get(Query::constrain(yes_id, no_id, self.frame.len()))
    }

    /// The pignistic probability of every event, in frame order.
    ///
    /// Reassigns the mass of each subset evenly to its events.
    pub fn pignistic(&self) -> Vec<(E, f64)> {
        let mut probabilities = vec![0.0; self.frame.len()];
        for (subset_id, &mass) in self.masses.iter().enumerate().skip(1) {
            if mass == 0.0 {
                continue;
            }
            let share = mass / subset_id.count_ones() as f64;
            for (id, probability) in probabilities.iter_mut().enumerate() {
                if subset_id & (1 << id) != 0 {
                    *probability += share;
                }
            }
        }
        self.frame
            .events()
            .iter()
            .cloned()
            .zip(probabilities)
            .collect()
    }

    /// The subsets with non-zero mass, in bitmask order, each paired with its mass.
    pub fn focal_elements(&self) -> impl Iterator<Item = (Vec<E>, f64)> + '_ {
        self.masses
            .iter()
            .enumerate()
            .filter(|&(_, &mass)| mass != 0.0)
            .map(|(subset_id, &mass)| (self.frame.subset(subset_id), mass))
    }
}

/// Validates that a mass array is a proper basic belief assignment.
fn validate_masses(masses: &[f64]) -> Result<(), ValidationError> {
    if masses.first().copied().unwrap_or(0.0) != 0.0 {
        return Err(ValidationError::new("empty set cannot have mass"));
    }
    if masses.iter().any(|mass| !(0.0..=1.0).contains(mass)) {
        return Err(ValidationError::new("masses must be between zero and one"));
    }
    let sum: f64 = masses.iter().sum();
    let tolerance = 2.0 * f64::EPSILON * masses.len() as f64;
    if !(sum > 1.0 - tolerance && sum < 1.0 + tolerance) {
        return Err(ValidationError::new("sum should be equal to one"));
    }
    Ok(())
}

impl<E> Validate for MassAssignment<E> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_masses(&self.masses).map_err(|error| {
            let mut errors = ValidationErrors::new();
            errors.add("masses", error);
            errors
        })
    }
}

impl<E: PartialEq> PartialEq for MassAssignment<E> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.masses == other.masses
    }
}

impl<E: PartialEq> AbsDiffEq for MassAssignment<E> {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.frame == other.frame
            && self
                .masses
                .iter()
                .zip(&other.masses)
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<E: PartialEq> RelativeEq for MassAssignment<E> {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.frame == other.frame
            && self
                .masses
                .iter()
                .zip(&other.masses)
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
