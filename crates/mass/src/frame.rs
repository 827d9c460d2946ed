use crate::{FrameError, MAX_FRAME_SIZE};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A frame of discernment: the ordered, duplicate-free set of outcomes a mass assignment is defined over.
///
/// Each event is given a dense id in `0..n` by its position. Subsets of the frame are represented as
/// `n`-bit masks where bit `i` is set if and only if event `i` belongs to the subset, so `0` is the empty
/// set and `2^n - 1` is the whole frame.
#[derive(Debug, Clone)]
pub struct Frame<E> {
    events: Vec<E>,
    ids: HashMap<E, usize>,
}

impl<E> Frame<E>
where
    E: Eq + Hash + Clone,
{
    /// Indexes a collection of events.
    ///
    /// Duplicate events collapse onto the id of their first occurrence. Returns [`FrameError::Empty`] if
    /// there are no events and [`FrameError::TooLarge`] if more than [`MAX_FRAME_SIZE`] distinct events
    /// remain.
    ///
    /// # Arguments
    ///
    /// * `events` - The possible outcomes, in the order that determines their ids.
    pub fn new<I>(events: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = E>,
    {
        let mut ordered = Vec::new();
        let mut ids = HashMap::new();
        for event in events {
            if !ids.contains_key(&event) {
                ids.insert(event.clone(), ordered.len());
                ordered.push(event);
            }
        }
        if ordered.is_empty() {
            return Err(FrameError::Empty);
        }
        if ordered.len() > MAX_FRAME_SIZE {
            return Err(FrameError::TooLarge(ordered.len()));
        }
        Ok(Self {
            events: ordered,
            ids,
        })
    }

    /// The dense id of an event, or `None` if the event is not part of the frame.
    pub fn id<Q>(&self, event: &Q) -> Option<usize>
    where
        E: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.ids.get(event).copied()
    }

    /// Converts a collection of events into a subset bitmask.
    ///
    /// Events that are not part of the frame are silently ignored, as are repeated events.
    pub fn subset_id<I>(&self, subset: I) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        subset
            .into_iter()
            .filter_map(|event| self.ids.get(Borrow::<E>::borrow(&event)))
            .fold(0, |mask, &id| mask | (1usize << id))
    }

    /// Decodes a subset bitmask back into its events, in frame order.
    ///
    /// Bits at or above the frame size are ignored.
    pub fn subset(&self, mask: usize) -> Vec<E> {
        self.events
            .iter()
            .enumerate()
            .filter(|(id, _)| mask & (1usize << id) != 0)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// The bitmask of the whole frame.
    pub fn full_id(&self) -> usize {
        (1 << self.events.len()) - 1
    }

    /// The events of the frame, in id order.
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// The number of events in the frame.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false for a constructed frame.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// Equality is order-sensitive: ids, and with them every subset mask, follow event order.
impl<E: PartialEq> PartialEq for Frame<E> {
    fn eq(&self, other: &Self) -> bool {
        self.events == other.events
    }
}

impl<E: Eq> Eq for Frame<E> {}
