//! Core types and utilities for the ecosim predator/prey simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod event;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use event::*;
