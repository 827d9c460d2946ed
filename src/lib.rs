//! Evaluates bodies of evidence and their combinations from a configuration file and renders the
//! resulting mass, belief and plausibility tables.

pub mod demo;
pub mod errors;
pub mod evaluate;
pub mod report;

#[cfg(test)]
#[macro_use]
extern crate approx;
