//! Path search strategies.
//!
//! A strategy returns the shortest path from a start cell to the nearest of a
//! set of target cells. Target cells are always traversable, whatever
//! occupies them, so a herbivore can route onto a grass cell; every other
//! occupied cell blocks the search. Paths include both endpoints.

use crate::grid::Grid;
use ecosim_core::{Coordinate, EntityKind, PathStrategy, Result, SimulationConfig};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};

/// Ordered cells from start to target, inclusive
pub type Path = Vec<Coordinate>;

/// A pluggable path search strategy.
///
/// Implementations return `Ok(None)` when no target is reachable and
/// `Err(Error::PathfinderUnsupported)` when they cannot search at all; the
/// turn engine then retries with [`BfsPathFinder`].
pub trait PathFinder: Send + Sync {
    fn find_path(
        &self,
        start: Coordinate,
        grid: &Grid,
        targets: &BTreeSet<Coordinate>,
    ) -> Result<Option<Path>>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

fn is_passable(grid: &Grid, coord: Coordinate, targets: &BTreeSet<Coordinate>) -> bool {
    grid.is_empty(coord) || targets.contains(&coord)
}

fn reconstruct(parents: &HashMap<Coordinate, Coordinate>, end: Coordinate) -> Path {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&previous) = parents.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Breadth-first search.
///
/// Neighbors are expanded in `Direction::all()` order and the first target
/// dequeued (other than the start itself) wins, so among equally distant
/// targets the one discovered first through Up, Down, Left, Right expansion
/// is chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsPathFinder;

impl BfsPathFinder {
    pub fn search(start: Coordinate, grid: &Grid, targets: &BTreeSet<Coordinate>) -> Option<Path> {
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);
        let mut parents: HashMap<Coordinate, Coordinate> = HashMap::new();

        while let Some(current) = queue.pop_front() {
            if current != start && targets.contains(&current) {
                return Some(reconstruct(&parents, current));
            }

            for neighbor in grid.neighbors4(current) {
                if visited.contains(&neighbor) || !is_passable(grid, neighbor, targets) {
                    continue;
                }
                visited.insert(neighbor);
                parents.insert(neighbor, current);
                queue.push_back(neighbor);
            }
        }

        None
    }
}

impl PathFinder for BfsPathFinder {
    fn find_path(
        &self,
        start: Coordinate,
        grid: &Grid,
        targets: &BTreeSet<Coordinate>,
    ) -> Result<Option<Path>> {
        Ok(Self::search(start, grid, targets))
    }

    fn name(&self) -> &'static str {
        "bfs"
    }
}

#[derive(Debug, PartialEq, Eq)]
struct OpenNode {
    estimate: i32,
    cost: i32,
    seq: u64,
    coord: Coordinate,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; earlier insertions win ties
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search guided by the Manhattan distance to the nearest target
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarPathFinder;

impl AStarPathFinder {
    fn heuristic(coord: Coordinate, goals: &[Coordinate]) -> i32 {
        goals
            .iter()
            .map(|goal| coord.manhattan_distance(goal))
            .min()
            .unwrap_or(0)
    }
}

impl PathFinder for AStarPathFinder {
    fn find_path(
        &self,
        start: Coordinate,
        grid: &Grid,
        targets: &BTreeSet<Coordinate>,
    ) -> Result<Option<Path>> {
        let goals: Vec<Coordinate> = targets.iter().copied().filter(|t| *t != start).collect();
        if goals.is_empty() {
            return Ok(None);
        }

        let mut open = BinaryHeap::new();
        let mut best_cost: HashMap<Coordinate, i32> = HashMap::from([(start, 0)]);
        let mut parents: HashMap<Coordinate, Coordinate> = HashMap::new();
        let mut closed: HashSet<Coordinate> = HashSet::new();
        let mut seq = 0u64;

        open.push(OpenNode {
            estimate: Self::heuristic(start, &goals),
            cost: 0,
            seq,
            coord: start,
        });

        while let Some(node) = open.pop() {
            let current = node.coord;
            if !closed.insert(current) {
                continue;
            }
            if current != start && targets.contains(&current) {
                return Ok(Some(reconstruct(&parents, current)));
            }

            for neighbor in grid.neighbors4(current) {
                if closed.contains(&neighbor) || !is_passable(grid, neighbor, targets) {
                    continue;
                }

                let cost = node.cost + 1;
                if best_cost.get(&neighbor).map_or(true, |&known| cost < known) {
                    best_cost.insert(neighbor, cost);
                    parents.insert(neighbor, current);
                    seq += 1;
                    open.push(OpenNode {
                        estimate: cost + Self::heuristic(neighbor, &goals),
                        cost,
                        seq,
                        coord: neighbor,
                    });
                }
            }
        }

        Ok(None)
    }

    fn name(&self) -> &'static str {
        "astar"
    }
}

pub fn path_finder_for(strategy: PathStrategy) -> Box<dyn PathFinder> {
    match strategy {
        PathStrategy::Bfs => Box::new(BfsPathFinder),
        PathStrategy::AStar => Box::new(AStarPathFinder),
    }
}

/// Path finder per creature kind; kinds without an entry use BFS
pub struct PathFinders {
    by_kind: HashMap<EntityKind, Box<dyn PathFinder>>,
    fallback: BfsPathFinder,
}

impl PathFinders {
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback: BfsPathFinder,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut finders = Self::new();
        for kind in EntityKind::creatures() {
            if let Some(stats) = config.creature(kind) {
                finders.register(kind, path_finder_for(stats.pathfinder));
            }
        }
        finders
    }

    pub fn register(&mut self, kind: EntityKind, finder: Box<dyn PathFinder>) {
        self.by_kind.insert(kind, finder);
    }

    pub fn get(&self, kind: EntityKind) -> &dyn PathFinder {
        match self.by_kind.get(&kind) {
            Some(finder) => finder.as_ref(),
            None => &self.fallback,
        }
    }

    pub fn fallback(&self) -> &BfsPathFinder {
        &self.fallback
    }
}

impl Default for PathFinders {
    fn default() -> Self {
        Self::new()
    }
}
