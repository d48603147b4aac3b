//! Grid world and turn engine.
//!
//! Herbivores graze, predators hunt herbivores, everything living gets hungry,
//! and grass slowly grows back on empty cells.

pub mod behavior;
pub mod engine;
pub mod entity;
pub mod grid;
pub mod pathfinding;
pub mod simulation;

pub use behavior::{behavior_for, Behavior, Interaction};
pub use engine::{TurnEngine, TurnOutcome, TurnReport};
pub use entity::{Creature, Entity, EntityFactory, Prop};
pub use grid::Grid;
pub use pathfinding::{AStarPathFinder, BfsPathFinder, Path, PathFinder, PathFinders};
pub use simulation::{Census, Outcome, Simulation, SimulationResult};
