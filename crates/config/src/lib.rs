//! Provides the configuration for frames, bodies of evidence and their combinations.

mod config;
mod errors;
pub mod toml;

pub use crate::config::*;
pub use crate::errors::*;

#[macro_use]
extern crate lazy_static;
