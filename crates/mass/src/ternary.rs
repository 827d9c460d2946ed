//! Ternary queries over a frame of discernment.
//!
//! A query constrains every event of an `n`-event frame with one base-3 digit: `0` excludes the event,
//! `1` includes it, and `2` leaves it free. Read as a base-3 number, the digits give the query id, so the
//! `3^n` possible queries are numbered `0..3^n`. A query selects every subset that contains all included
//! events and none of the excluded ones.
//!
//! The free digit is the largest so that resolving it to either of the other two digits yields a
//! strictly smaller id: `id - 3^k` includes event `k` and `id - 2 * 3^k` excludes it.

/// The largest supported frame size. Table ids for larger frames no longer fit the precomputed powers.
pub const MAX_FRAME_SIZE: usize = 19;

/// `3^k` for every `k` in `0..=MAX_FRAME_SIZE`.
pub const POWERS_OF_THREE: [usize; MAX_FRAME_SIZE + 1] = powers_of_three();

const fn powers_of_three() -> [usize; MAX_FRAME_SIZE + 1] {
    let mut powers = [1; MAX_FRAME_SIZE + 1];
    let mut i = 1;
    while i < powers.len() {
        powers[i] = powers[i - 1] * 3;
        i += 1;
    }
    powers
}

/// The sum of `3^k` over every event `k` in `mask`.
fn place_values(mut mask: usize) -> usize {
    let mut sum = 0;
    while mask != 0 {
        sum += POWERS_OF_THREE[mask.trailing_zeros() as usize];
        mask &= mask - 1;
    }
    sum
}

/// A single ternary query, carrying its id together with the masks of included and free events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Query {
    id: usize,
    include: usize,
    free: usize,
}

impl Query {
    /// Decodes a query id by expanding its base-3 digits.
    ///
    /// # Arguments
    ///
    /// * `id` - The query id, expected to be below `3^n`.
    /// * `n` - The number of events in the frame.
    pub fn from_id(id: usize, n: usize) -> Self {
        let mut include = 0;
        let mut free = 0;
        let mut rest = id;
        for k in 0..n {
            match rest % 3 {
                1 => include |= 1 << k,
                2 => free |= 1 << k,
                _ => {}
            }
            rest /= 3;
        }
        Self { id, include, free }
    }

    /// Builds the query that includes the events in `include`, leaves the events in `free` unconstrained
    /// and excludes everything else.
    ///
    /// The two masks must be disjoint. Running time is linear in the number of included and free events.
    pub fn encode(include: usize, free: usize) -> Self {
        debug_assert_eq!(include & free, 0, "included and free events overlap");
        Self {
            id: place_values(include) + 2 * place_values(free),
            include,
            free,
        }
    }

    /// Builds the query that includes the events in `include`, excludes the events in `exclude` and
    /// leaves every other event of an `n`-event frame free.
    ///
    /// The two masks must be disjoint. Running time is linear in the number of constrained events.
    pub fn constrain(include: usize, exclude: usize, n: usize) -> Self {
        debug_assert_eq!(include & exclude, 0, "included and excluded events overlap");
        Self {
            id: POWERS_OF_THREE[n] - 1 - place_values(include) - 2 * place_values(exclude),
            include,
            free: ((1 << n) - 1) & !(include | exclude),
        }
    }

    /// The query id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The mask of included events.
    ///
    /// This is the smallest subset the query selects, and the subset it collapses to once every free
    /// event is excluded.
    pub fn intersection(&self) -> usize {
        self.include
    }

    /// The mask of free events.
    pub fn free(&self) -> usize {
        self.free
    }

    /// The mask of every constrained event, included or excluded.
    pub fn free_complement(&self, n: usize) -> usize {
        ((1 << n) - 1) ^ self.free
    }

    /// The lowest free event, if any.
    pub fn first_free(&self) -> Option<usize> {
        if self.free == 0 {
            None
        } else {
            Some(self.free.trailing_zeros() as usize)
        }
    }

    /// Advances to the query with the next id.
    ///
    /// Trailing free digits roll over to excluded and carry into the next digit, which then moves from
    /// excluded to included or from included to free. Amortized over a full walk this is O(1) per step.
    fn step(mut self) -> Self {
        self.id += 1;
        let mut bit = 1;
        while self.free & bit != 0 {
            self.free ^= bit;
            bit <<= 1;
        }
        if self.include & bit != 0 {
            self.include ^= bit;
            self.free |= bit;
        } else {
            self.include |= bit;
        }
        self
    }
}

/// Walks every query of an `n`-event frame in increasing id order.
#[derive(Debug, Clone)]
pub struct Queries {
    next: Option<Query>,
    end: usize,
}

impl Queries {
    /// All `3^n` queries of an `n`-event frame.
    ///
    /// `n` must not exceed [`MAX_FRAME_SIZE`].
    pub fn new(n: usize) -> Self {
        Self {
            next: Some(Query {
                id: 0,
                include: 0,
                free: 0,
            }),
            end: POWERS_OF_THREE[n],
        }
    }
}

impl Iterator for Queries {
    type Item = Query;

    fn next(&mut self) -> Option<Query> {
        let current = self.next?;
        self.next = if current.id + 1 < self.end {
            Some(current.step())
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.next.map_or(0, |query| self.end - query.id);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Queries {}
