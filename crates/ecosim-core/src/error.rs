//! Error types for the simulation.

use crate::types::Coordinate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every variant except `Io`, `Config` and `Validation` is recoverable per
/// entity and per turn; the engine never halts on them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No empty cell found after {attempts} attempts")]
    NoEmptyCell { attempts: usize },

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Cell {0} is occupied")]
    OccupiedCell(Coordinate),

    #[error("Coordinate {0} is outside the grid")]
    OutOfBounds(Coordinate),

    #[error("Pathfinder '{0}' cannot compute paths")]
    PathfinderUnsupported(&'static str),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
