//! 2D grid for the world.

use crate::entity::Entity;
use ecosim_core::{Coordinate, Direction, EntityKind, Error, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// A bounded grid holding at most one entity per cell.
///
/// Occupants are kept in row-major order, so every iteration over the grid
/// (snapshots, kind queries, rendering) is deterministic.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: BTreeMap<Coordinate, Entity>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        (0..self.width).contains(&coord.x) && (0..self.height).contains(&coord.y)
    }

    pub fn get(&self, coord: Coordinate) -> Option<&Entity> {
        self.cells.get(&coord)
    }

    pub fn get_mut(&mut self, coord: Coordinate) -> Option<&mut Entity> {
        self.cells.get_mut(&coord)
    }

    /// Kind of the occupant at `coord`, if any
    pub fn kind_at(&self, coord: Coordinate) -> Option<EntityKind> {
        self.cells.get(&coord).map(Entity::kind)
    }

    /// Place an entity, returning whatever occupied the cell before
    pub fn set(&mut self, coord: Coordinate, entity: Entity) -> Result<Option<Entity>> {
        if !self.contains(coord) {
            return Err(Error::OutOfBounds(coord));
        }
        Ok(self.cells.insert(coord, entity))
    }

    pub fn remove(&mut self, coord: Coordinate) -> Option<Entity> {
        self.cells.remove(&coord)
    }

    /// True when `coord` lies on the grid and nothing occupies it
    pub fn is_empty(&self, coord: Coordinate) -> bool {
        self.contains(coord) && !self.cells.contains_key(&coord)
    }

    /// Cardinal neighbors inside the grid, in `Direction::all()` order
    pub fn neighbors4(&self, coord: Coordinate) -> Vec<Coordinate> {
        Direction::all()
            .into_iter()
            .map(|direction| coord.step(direction))
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }

    /// Pick a random empty cell by rejection sampling.
    ///
    /// Gives up after `width * height` draws even if empty cells remain.
    pub fn find_random_empty_cell<R: Rng>(&self, rng: &mut R) -> Result<Coordinate> {
        let attempts = (self.width.max(0) as usize) * (self.height.max(0) as usize);
        for _ in 0..attempts {
            let coord = Coordinate::new(
                rng.gen_range(0..self.width),
                rng.gen_range(0..self.height),
            );
            if self.is_empty(coord) {
                return Ok(coord);
            }
        }

        Err(Error::NoEmptyCell { attempts })
    }

    /// Move the occupant of `from` to `to`.
    ///
    /// Returns `Ok(false)` when `from` is empty. An occupied destination is
    /// refused with `Error::OccupiedCell` and leaves both cells untouched.
    pub fn move_entity(&mut self, from: Coordinate, to: Coordinate) -> Result<bool> {
        if !self.contains(to) {
            return Err(Error::OutOfBounds(to));
        }
        if !self.cells.contains_key(&from) {
            return Ok(false);
        }
        if from == to || self.cells.contains_key(&to) {
            return Err(Error::OccupiedCell(to));
        }

        if let Some(entity) = self.cells.remove(&from) {
            self.cells.insert(to, entity);
        }
        Ok(true)
    }

    /// Coordinates holding an entity of the given kind, in row-major order
    pub fn coords_of_kind(&self, kind: EntityKind) -> Vec<Coordinate> {
        self.cells
            .iter()
            .filter(|(_, entity)| entity.kind() == kind)
            .map(|(coord, _)| *coord)
            .collect()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.cells.values().filter(|entity| entity.kind() == kind).count()
    }

    /// Copy of every occupied cell, safe to iterate while mutating the grid
    pub fn snapshot(&self) -> Vec<(Coordinate, Entity)> {
        self.cells
            .iter()
            .map(|(coord, entity)| (*coord, entity.clone()))
            .collect()
    }

    /// Iterator over occupied cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &Entity)> + '_ {
        self.cells.iter().map(|(coord, entity)| (*coord, entity))
    }

    /// Iterator over all coordinates in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coordinate::new(x, y)))
    }

    /// Unoccupied coordinates in row-major order
    pub fn empty_cells(&self) -> Vec<Coordinate> {
        self.positions().filter(|coord| self.is_empty(*coord)).collect()
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() == (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}
