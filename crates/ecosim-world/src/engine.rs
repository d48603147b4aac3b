//! Turn resolution.
//!
//! A turn runs three phases over the whole grid, always in this order:
//! creatures act or move, every surviving creature pays its hunger cost,
//! then empty cells may regrow grass. Each phase iterates a snapshot taken
//! when the phase starts, so entities added or removed mid-phase never change
//! which entities that phase visits.

use crate::behavior::behavior_for;
use crate::entity::{Entity, EntityFactory};
use crate::grid::Grid;
use crate::pathfinding::{Path, PathFinder, PathFinders};
use ecosim_core::{
    Coordinate, DeathCause, EntityKind, Error, Event, EventSink, MetabolismConfig,
    SimulationConfig,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

/// What a single creature did during the creature phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No longer on the grid when its snapshot entry came up
    Skipped,
    /// Ate or attacked an adjacent target
    Acted,
    Moved,
    /// Its chosen landing cell was occupied
    Blocked,
    /// Nowhere to go
    Stayed,
}

/// Tallies for one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u64,
    pub acted: usize,
    pub moved: usize,
    pub blocked: usize,
    pub stayed: usize,
    pub skipped: usize,
    pub starved: usize,
    pub regrown: usize,
}

impl TurnReport {
    fn record(&mut self, outcome: TurnOutcome) {
        match outcome {
            TurnOutcome::Skipped => self.skipped += 1,
            TurnOutcome::Acted => self.acted += 1,
            TurnOutcome::Moved => self.moved += 1,
            TurnOutcome::Blocked => self.blocked += 1,
            TurnOutcome::Stayed => self.stayed += 1,
        }
    }
}

pub struct TurnEngine {
    metabolism: MetabolismConfig,
    regrowth_rate: f64,
    pathfinders: PathFinders,
}

impl TurnEngine {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            metabolism: config.metabolism.clone(),
            regrowth_rate: config.world.grass_regrowth_rate,
            pathfinders: PathFinders::from_config(config),
        }
    }

    pub fn pathfinders_mut(&mut self) -> &mut PathFinders {
        &mut self.pathfinders
    }

    /// Run all three phases once
    pub fn run_turn<R: Rng>(
        &self,
        grid: &mut Grid,
        factory: &mut EntityFactory,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> TurnReport {
        let mut report = self.creature_phase(grid, rng, sink);
        report.starved = self.hunger_phase(grid, sink);
        report.regrown = self.regrowth_phase(grid, factory, rng, sink);
        report
    }

    /// Let every creature present at phase start act or move once
    pub fn creature_phase<R: Rng>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> TurnReport {
        let mut report = TurnReport::default();

        for (coord, entity) in grid.snapshot() {
            if !entity.is_creature() {
                continue;
            }
            if grid.get(coord).map(Entity::id) != Some(entity.id()) {
                trace!(entity = %entity.id(), x = coord.x, y = coord.y, "creature gone, skipping");
                report.record(TurnOutcome::Skipped);
                continue;
            }

            let outcome = self.take_turn(coord, grid, rng, sink);
            trace!(entity = %entity.id(), kind = %entity.kind(), ?outcome, "creature turn");
            report.record(outcome);
        }

        report
    }

    /// Resolve one creature's turn: act on an adjacent target if possible,
    /// otherwise head for the nearest candidate target, otherwise wander.
    pub fn take_turn<R: Rng>(
        &self,
        coord: Coordinate,
        grid: &mut Grid,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> TurnOutcome {
        let Some(creature) = grid.get(coord).and_then(Entity::as_creature) else {
            return TurnOutcome::Skipped;
        };
        let (kind, speed, symbol) = (creature.kind, creature.speed, creature.symbol.clone());
        let Some(behavior) = behavior_for(kind) else {
            return TurnOutcome::Skipped;
        };
        let target = behavior.target_kind();

        let adjacent = grid
            .neighbors4(coord)
            .into_iter()
            .find(|neighbor| grid.kind_at(*neighbor) == Some(target));
        if let Some(adjacent) = adjacent {
            match behavior.interact(coord, adjacent, grid, &self.metabolism, sink) {
                Ok(interaction) => {
                    trace!(x = coord.x, y = coord.y, ?interaction, "interaction");
                    return TurnOutcome::Acted;
                }
                Err(err) => {
                    debug!(x = coord.x, y = coord.y, error = %err, "interaction failed, moving instead");
                }
            }
        }

        let candidates = behavior.candidate_targets(grid, target);
        if !candidates.is_empty() {
            if let Some(path) = self.find_path(kind, coord, grid, &candidates) {
                if path.len() > 1 {
                    let last = path.len() - 1;
                    let mut steps = (speed as usize).min(last);
                    // An occupied target is reached by stopping beside it
                    if steps == last && !grid.is_empty(path[last]) {
                        steps -= 1;
                    }
                    if steps > 0 {
                        return self.step(&symbol, coord, path[steps], grid, sink);
                    }
                }
            }
        }

        self.wander(&symbol, coord, grid, rng, sink)
    }

    /// Path with the kind's strategy, retrying with BFS if the strategy
    /// cannot search
    fn find_path(
        &self,
        kind: EntityKind,
        start: Coordinate,
        grid: &Grid,
        targets: &BTreeSet<Coordinate>,
    ) -> Option<Path> {
        let finder = self.pathfinders.get(kind);
        match finder.find_path(start, grid, targets) {
            Ok(path) => path,
            Err(err) => {
                let fallback = self.pathfinders.fallback();
                debug!(
                    strategy = finder.name(),
                    fallback = fallback.name(),
                    error = %err,
                    "strategy failed, retrying"
                );
                fallback.find_path(start, grid, targets).ok().flatten()
            }
        }
    }

    fn step(
        &self,
        symbol: &str,
        from: Coordinate,
        to: Coordinate,
        grid: &mut Grid,
        sink: &mut dyn EventSink,
    ) -> TurnOutcome {
        match grid.move_entity(from, to) {
            Ok(true) => {
                sink.emit(Event::moved(symbol, from, to));
                TurnOutcome::Moved
            }
            Ok(false) => TurnOutcome::Skipped,
            Err(Error::OccupiedCell(_)) => {
                debug!(from = %from, to = %to, "landing cell occupied");
                sink.emit(Event::move_failed(symbol, from, to));
                TurnOutcome::Blocked
            }
            Err(err) => {
                warn!(from = %from, to = %to, error = %err, "move rejected");
                TurnOutcome::Stayed
            }
        }
    }

    /// Move to a uniformly random empty neighbor, or stay put
    fn wander<R: Rng>(
        &self,
        symbol: &str,
        from: Coordinate,
        grid: &mut Grid,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> TurnOutcome {
        let open: Vec<Coordinate> = grid
            .neighbors4(from)
            .into_iter()
            .filter(|neighbor| grid.is_empty(*neighbor))
            .collect();

        match open.choose(rng) {
            Some(&to) => self.step(symbol, from, to, grid, sink),
            None => TurnOutcome::Stayed,
        }
    }

    /// Every creature loses its hunger cost; those at zero hit points die.
    /// Returns the number of creatures that starved.
    pub fn hunger_phase(&self, grid: &mut Grid, sink: &mut dyn EventSink) -> usize {
        let loss = self.metabolism.hunger_hp_loss_per_turn;
        let mut starved = 0;

        for (coord, entity) in grid.snapshot() {
            if !entity.is_creature() {
                continue;
            }
            let Some(creature) = grid.get_mut(coord).and_then(Entity::as_creature_mut) else {
                continue;
            };

            creature.take_damage(loss);
            if !creature.is_alive() {
                let symbol = creature.symbol.clone();
                grid.remove(coord);
                sink.emit(Event::died(&symbol, coord, DeathCause::Starvation));
                debug!(entity = %entity.id(), x = coord.x, y = coord.y, "starved");
                starved += 1;
            }
        }

        starved
    }

    /// Each empty cell independently grows grass with the configured
    /// probability. Returns the number of cells that regrew.
    pub fn regrowth_phase<R: Rng>(
        &self,
        grid: &mut Grid,
        factory: &mut EntityFactory,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> usize {
        let mut regrown = 0;

        for coord in grid.empty_cells() {
            if rng.gen::<f64>() >= self.regrowth_rate {
                continue;
            }

            let grass = factory.create(EntityKind::Grass);
            let symbol = grass.symbol().to_string();
            if let Err(err) = grid.set(coord, grass) {
                warn!(error = %err, "could not regrow grass");
                continue;
            }
            sink.emit(Event::added(&symbol, coord));
            regrown += 1;
        }

        regrown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosim_core::{EventKind, Result};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        grid: Grid,
        factory: EntityFactory,
        config: SimulationConfig,
        rng: ChaCha8Rng,
        events: Vec<Event>,
    }

    impl Fixture {
        fn new(width: i32, height: i32) -> Self {
            Self::with_config(width, height, SimulationConfig::default())
        }

        fn with_config(width: i32, height: i32, config: SimulationConfig) -> Self {
            Self {
                grid: Grid::new(width, height),
                factory: EntityFactory::new(config.clone()),
                config,
                rng: ChaCha8Rng::seed_from_u64(42),
                events: Vec::new(),
            }
        }

        fn engine(&self) -> TurnEngine {
            TurnEngine::new(&self.config)
        }

        fn place(&mut self, kind: EntityKind, x: i32, y: i32) -> Coordinate {
            let coord = Coordinate::new(x, y);
            self.grid.set(coord, self.factory.create(kind)).unwrap();
            coord
        }

        fn set_hp(&mut self, coord: Coordinate, hp: i32) {
            self.grid
                .get_mut(coord)
                .and_then(Entity::as_creature_mut)
                .unwrap()
                .set_hp(hp);
        }

        fn hp(&self, coord: Coordinate) -> i32 {
            self.grid.get(coord).and_then(Entity::as_creature).unwrap().hp()
        }

        fn take_turn(&mut self, engine: &TurnEngine, coord: Coordinate) -> TurnOutcome {
            engine.take_turn(coord, &mut self.grid, &mut self.rng, &mut self.events)
        }

        fn kinds(&self) -> Vec<EventKind> {
            self.events.iter().map(|e| e.kind).collect()
        }
    }

    struct UnsupportedPathFinder;

    impl PathFinder for UnsupportedPathFinder {
        fn find_path(
            &self,
            _start: Coordinate,
            _grid: &Grid,
            _targets: &BTreeSet<Coordinate>,
        ) -> Result<Option<Path>> {
            Err(Error::PathfinderUnsupported("unsupported"))
        }

        fn name(&self) -> &'static str {
            "unsupported"
        }
    }

    /// Always returns the same path, whatever the grid holds
    struct FixedPathFinder(Path);

    impl PathFinder for FixedPathFinder {
        fn find_path(
            &self,
            _start: Coordinate,
            _grid: &Grid,
            _targets: &BTreeSet<Coordinate>,
        ) -> Result<Option<Path>> {
            Ok(Some(self.0.clone()))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_herbivore_adjacent_to_grass_eats_in_place() {
        let mut fx = Fixture::new(3, 3);
        let herbivore = fx.place(EntityKind::Herbivore, 1, 1);
        let grass = fx.place(EntityKind::Grass, 1, 2);
        fx.set_hp(herbivore, 60);
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, herbivore);

        assert_eq!(outcome, TurnOutcome::Acted);
        assert_eq!(fx.grid.kind_at(herbivore), Some(EntityKind::Herbivore));
        assert!(fx.grid.is_empty(grass));
        assert_eq!(fx.hp(herbivore), 85);
        assert_eq!(fx.kinds(), vec![EventKind::Heal, EventKind::Eat]);
    }

    #[test]
    fn test_predator_steps_up_to_speed_along_path() {
        let mut fx = Fixture::new(6, 1);
        let predator = fx.place(EntityKind::Predator, 0, 0);
        fx.place(EntityKind::Herbivore, 5, 0);
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, predator);

        assert_eq!(outcome, TurnOutcome::Moved);
        assert_eq!(fx.grid.kind_at(Coordinate::new(2, 0)), Some(EntityKind::Predator));
        assert!(fx.grid.is_empty(predator));
        assert_eq!(
            fx.events,
            vec![Event::moved("🐺", predator, Coordinate::new(2, 0))]
        );
    }

    #[test]
    fn test_step_never_overshoots_short_path() {
        let mut fx = Fixture::new(4, 1);
        let predator = fx.place(EntityKind::Predator, 0, 0);
        fx.place(EntityKind::Herbivore, 3, 0);
        let engine = fx.engine();

        // Stalking cell (2, 0) is two steps away; speed 2 lands exactly there
        fx.take_turn(&engine, predator);
        assert_eq!(fx.grid.kind_at(Coordinate::new(2, 0)), Some(EntityKind::Predator));

        // Now adjacent: the next turn is an attack, not a move
        let outcome = fx.take_turn(&engine, Coordinate::new(2, 0));
        assert_eq!(outcome, TurnOutcome::Acted);
        assert_eq!(fx.hp(Coordinate::new(3, 0)), 50);
    }

    #[test]
    fn test_fast_herbivore_stops_beside_grass_then_eats() {
        let mut config = SimulationConfig::default();
        config.herbivore.speed = 2;
        config.world.grass_regrowth_rate = 0.0;
        let mut fx = Fixture::with_config(5, 1, config);
        fx.place(EntityKind::Herbivore, 0, 0);
        let grass = fx.place(EntityKind::Grass, 2, 0);
        let engine = fx.engine();

        let first = engine.creature_phase(&mut fx.grid, &mut fx.rng, &mut fx.events);
        assert_eq!(first.moved, 1);
        assert_eq!(first.blocked, 0);
        assert_eq!(fx.grid.kind_at(Coordinate::new(1, 0)), Some(EntityKind::Herbivore));

        let second = engine.creature_phase(&mut fx.grid, &mut fx.rng, &mut fx.events);
        assert_eq!(second.acted, 1);
        assert!(fx.grid.is_empty(grass));
        assert!(!fx.kinds().contains(&EventKind::MoveFail));
    }

    #[test]
    fn test_occupied_landing_cell_blocks_move() {
        let mut fx = Fixture::new(4, 1);
        let herbivore = fx.place(EntityKind::Herbivore, 0, 0);
        fx.place(EntityKind::Rock, 1, 0);
        fx.place(EntityKind::Grass, 3, 0);
        let mut engine = fx.engine();
        let through_rock = (0..4).map(|x| Coordinate::new(x, 0)).collect();
        engine
            .pathfinders_mut()
            .register(EntityKind::Herbivore, Box::new(FixedPathFinder(through_rock)));

        let outcome = fx.take_turn(&engine, herbivore);

        assert_eq!(outcome, TurnOutcome::Blocked);
        assert_eq!(fx.grid.kind_at(herbivore), Some(EntityKind::Herbivore));
        assert_eq!(fx.grid.kind_at(Coordinate::new(1, 0)), Some(EntityKind::Rock));
        assert_eq!(fx.kinds(), vec![EventKind::MoveFail]);
    }

    #[test]
    fn test_unreachable_targets_fall_back_to_wandering() {
        let mut fx = Fixture::new(3, 3);
        let herbivore = fx.place(EntityKind::Herbivore, 0, 0);
        fx.place(EntityKind::Rock, 1, 0);
        fx.place(EntityKind::Rock, 1, 1);
        fx.place(EntityKind::Rock, 1, 2);
        fx.place(EntityKind::Grass, 2, 2);
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, herbivore);

        // (0, 1) is the only empty neighbor
        assert_eq!(outcome, TurnOutcome::Moved);
        assert_eq!(fx.grid.kind_at(Coordinate::new(0, 1)), Some(EntityKind::Herbivore));
    }

    #[test]
    fn test_wander_without_targets() {
        let mut fx = Fixture::new(3, 3);
        let herbivore = fx.place(EntityKind::Herbivore, 1, 1);
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, herbivore);

        assert_eq!(outcome, TurnOutcome::Moved);
        assert!(fx.grid.is_empty(herbivore));
        let landed = fx.grid.coords_of_kind(EntityKind::Herbivore);
        assert_eq!(landed.len(), 1);
        assert_eq!(landed[0].manhattan_distance(&herbivore), 1);
    }

    #[test]
    fn test_boxed_in_creature_stays() {
        let mut fx = Fixture::new(3, 3);
        let herbivore = fx.place(EntityKind::Herbivore, 1, 1);
        for (x, y) in [(1, 0), (1, 2), (0, 1), (2, 1)] {
            fx.place(EntityKind::Tree, x, y);
        }
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, herbivore);

        assert_eq!(outcome, TurnOutcome::Stayed);
        assert!(fx.events.is_empty());
    }

    #[test]
    fn test_failed_interaction_falls_through_to_movement() {
        let mut fx = Fixture::new(3, 2);
        let predator = fx.place(EntityKind::Predator, 0, 0);
        let prey = fx.place(EntityKind::Herbivore, 1, 0);
        fx.set_hp(prey, 0);
        let engine = fx.engine();

        let outcome = fx.take_turn(&engine, predator);

        assert_eq!(outcome, TurnOutcome::Moved);
        assert_eq!(fx.grid.kind_at(Coordinate::new(1, 1)), Some(EntityKind::Predator));
        assert_eq!(fx.kinds(), vec![EventKind::Move]);
    }

    #[test]
    fn test_unsupported_pathfinder_falls_back_to_bfs() {
        let mut fx = Fixture::new(6, 1);
        let predator = fx.place(EntityKind::Predator, 0, 0);
        fx.place(EntityKind::Herbivore, 5, 0);
        let mut engine = fx.engine();
        engine
            .pathfinders_mut()
            .register(EntityKind::Predator, Box::new(UnsupportedPathFinder));

        let outcome = fx.take_turn(&engine, predator);

        assert_eq!(outcome, TurnOutcome::Moved);
        assert_eq!(fx.grid.kind_at(Coordinate::new(2, 0)), Some(EntityKind::Predator));
    }

    #[test]
    fn test_creature_killed_earlier_in_phase_is_skipped() {
        let mut fx = Fixture::new(3, 1);
        fx.place(EntityKind::Predator, 0, 0);
        let prey = fx.place(EntityKind::Herbivore, 1, 0);
        fx.set_hp(prey, 50);
        let engine = fx.engine();

        let report = engine.creature_phase(&mut fx.grid, &mut fx.rng, &mut fx.events);

        assert_eq!(report.acted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(fx.grid.count_of_kind(EntityKind::Herbivore), 0);
        assert_eq!(fx.kinds(), vec![EventKind::Attack, EventKind::Death]);
    }

    #[test]
    fn test_moved_creature_acts_once_per_phase() {
        let mut fx = Fixture::new(5, 1);
        fx.place(EntityKind::Herbivore, 0, 0);
        let engine = fx.engine();

        let report = engine.creature_phase(&mut fx.grid, &mut fx.rng, &mut fx.events);

        assert_eq!(report.moved, 1);
        assert_eq!(fx.events.len(), 1);
    }

    #[test]
    fn test_hunger_removes_creature_at_one_hp() {
        let mut fx = Fixture::new(3, 1);
        let weak = fx.place(EntityKind::Herbivore, 0, 0);
        let healthy = fx.place(EntityKind::Predator, 2, 0);
        fx.place(EntityKind::Grass, 1, 0);
        fx.set_hp(weak, 1);
        let engine = fx.engine();

        let starved = engine.hunger_phase(&mut fx.grid, &mut fx.events);

        assert_eq!(starved, 1);
        assert!(fx.grid.is_empty(weak));
        assert_eq!(fx.hp(healthy), 95);
        assert_eq!(fx.grid.kind_at(Coordinate::new(1, 0)), Some(EntityKind::Grass));
        assert_eq!(fx.events, vec![Event::died("🐰", weak, DeathCause::Starvation)]);
    }

    #[test]
    fn test_regrowth_with_certain_probability_fills_grid() {
        let mut config = SimulationConfig::default();
        config.world.grass_regrowth_rate = 1.0;
        let mut fx = Fixture::with_config(4, 3, config);
        fx.place(EntityKind::Rock, 0, 0);
        fx.place(EntityKind::Herbivore, 2, 1);
        let engine = fx.engine();

        let regrown = engine.regrowth_phase(&mut fx.grid, &mut fx.factory, &mut fx.rng, &mut fx.events);

        assert_eq!(regrown, 10);
        assert!(fx.grid.is_full());
        assert_eq!(fx.grid.count_of_kind(EntityKind::Grass), 10);
        assert!(fx.kinds().iter().all(|kind| *kind == EventKind::Add));
    }

    #[test]
    fn test_regrowth_with_zero_probability_changes_nothing() {
        let mut config = SimulationConfig::default();
        config.world.grass_regrowth_rate = 0.0;
        let mut fx = Fixture::with_config(4, 3, config);
        fx.place(EntityKind::Tree, 1, 1);
        let engine = fx.engine();

        let regrown = engine.regrowth_phase(&mut fx.grid, &mut fx.factory, &mut fx.rng, &mut fx.events);

        assert_eq!(regrown, 0);
        assert_eq!(fx.grid.len(), 1);
        assert!(fx.events.is_empty());
    }

    #[test]
    fn test_full_turn_on_two_cell_grid_eats_in_place() {
        let mut config = SimulationConfig::default();
        config.world.grass_regrowth_rate = 0.0;
        let mut fx = Fixture::with_config(1, 2, config);
        let herbivore = fx.place(EntityKind::Herbivore, 0, 0);
        let grass = fx.place(EntityKind::Grass, 0, 1);
        fx.set_hp(herbivore, 50);
        let engine = fx.engine();

        let report = engine.run_turn(&mut fx.grid, &mut fx.factory, &mut fx.rng, &mut fx.events);

        assert_eq!(report.acted, 1);
        assert_eq!(report.moved, 0);
        assert_eq!(fx.grid.kind_at(herbivore), Some(EntityKind::Herbivore));
        assert!(fx.grid.is_empty(grass));
        // +25 from grass, -5 hunger
        assert_eq!(fx.hp(herbivore), 70);
    }
}
