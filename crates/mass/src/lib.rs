//! This crate provides [`MassAssignment`], a Dempster-Shafer basic belief assignment over a small
//! finite frame of discernment, together with belief queries and Dempster's rule of combination.
//!
//! Every assignment precomputes a table of 3^n cumulative values, one per ternary query that
//! constrains each event to be excluded, included, or free. Belief, plausibility, commonality and
//! generalized cumulative lookups are then a single table read, and combination runs in O(3^n)
//! rather than enumerating all 4^n pairs of subsets.

mod combine;
mod cumulative;
mod errors;
mod frame;
mod mass;
mod ternary;

pub use cumulative::CumulativeTable;
pub use errors::*;
pub use frame::*;
pub use mass::*;
pub use ternary::{Queries, Query, MAX_FRAME_SIZE, POWERS_OF_THREE};

#[allow(unused_imports)]
#[macro_use]
extern crate approx;
