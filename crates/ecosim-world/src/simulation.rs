//! Simulation driver: owns the world and advances it one turn at a time.

use crate::engine::{TurnEngine, TurnReport};
use crate::entity::EntityFactory;
use crate::grid::Grid;
use ecosim_core::{Coordinate, EntityId, EntityKind, EventSink, Result, SimulationConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Population counts per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub herbivores: usize,
    pub predators: usize,
    pub grass: usize,
    pub rocks: usize,
    pub trees: usize,
}

impl Census {
    pub fn of(grid: &Grid) -> Self {
        Self {
            herbivores: grid.count_of_kind(EntityKind::Herbivore),
            predators: grid.count_of_kind(EntityKind::Predator),
            grass: grid.count_of_kind(EntityKind::Grass),
            rocks: grid.count_of_kind(EntityKind::Rock),
            trees: grid.count_of_kind(EntityKind::Tree),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PredatorsWon,
    HerbivoresSurvived,
    /// Both sides still alive, e.g. the turn limit was reached
    Completed,
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::PredatorsWon => "All herbivores were eaten. Predators won!",
            Outcome::HerbivoresSurvived => "All predators died. Herbivores survived!",
            Outcome::Completed => "Simulation completed.",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub turns: u64,
    pub outcome: Outcome,
    pub message: String,
    pub census: Census,
    pub reports: Vec<TurnReport>,
}

pub struct Simulation {
    grid: Grid,
    factory: EntityFactory,
    engine: TurnEngine,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    turn: u64,
}

impl Simulation {
    /// Validate the configuration, build the grid and populate it
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let grid = Grid::new(config.world.width, config.world.height);
        let mut sim = Self::with_grid(config, grid)?;
        sim.populate();
        Ok(sim)
    }

    /// Wrap an already laid out grid without populating it. New entities
    /// get ids above the highest id already on the grid.
    pub fn with_grid(config: SimulationConfig, grid: Grid) -> Result<Self> {
        config.validate()?;
        let next_id = grid
            .iter()
            .map(|(_, entity)| entity.id().0 + 1)
            .max()
            .unwrap_or_default();
        Ok(Self {
            grid,
            factory: EntityFactory::new(config.clone()).with_next_id(next_id),
            engine: TurnEngine::new(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            turn: 0,
        })
    }

    /// Place the configured static entities and creatures at random empty
    /// cells. A kind that runs out of room is cut short. Returns the number
    /// of entities placed.
    pub fn populate(&mut self) -> usize {
        let mut plan: Vec<(EntityKind, usize)> = self.config.world.static_counts().to_vec();
        plan.push((EntityKind::Herbivore, self.config.population.initial_herbivores));
        plan.push((EntityKind::Predator, self.config.population.initial_predators));

        let mut placed = 0;
        for (kind, count) in plan {
            for n in 0..count {
                let coord = match self.grid.find_random_empty_cell(&mut self.rng) {
                    Ok(coord) => coord,
                    Err(err) => {
                        warn!(
                            event = "placement_skipped",
                            kind = %kind,
                            placed = n,
                            requested = count,
                            error = %err,
                            "no room left"
                        );
                        break;
                    }
                };
                let entity = self.factory.create(kind);
                if let Err(err) = self.grid.set(coord, entity) {
                    warn!(event = "placement_skipped", kind = %kind, error = %err, "placement failed");
                    break;
                }
                placed += 1;
            }
        }

        debug!(event = "populated", placed, "world populated");
        placed
    }

    /// Create an entity of `kind` and place it at `coord`
    pub fn spawn(&mut self, kind: EntityKind, coord: Coordinate) -> Result<EntityId> {
        let entity = self.factory.create(kind);
        let id = entity.id();
        self.grid.set(coord, entity)?;
        Ok(id)
    }

    /// Run creature, hunger and regrowth phases once
    pub fn advance_one_turn(&mut self, sink: &mut dyn EventSink) -> TurnReport {
        self.turn += 1;
        let mut report = self
            .engine
            .run_turn(&mut self.grid, &mut self.factory, &mut self.rng, sink);
        report.turn = self.turn;

        debug!(
            event = "turn",
            turn = self.turn,
            acted = report.acted,
            moved = report.moved,
            blocked = report.blocked,
            starved = report.starved,
            regrown = report.regrown,
        );
        report
    }

    /// True while at least one herbivore and one predator remain
    pub fn is_ongoing(&self) -> bool {
        self.grid.count_of_kind(EntityKind::Herbivore) > 0
            && self.grid.count_of_kind(EntityKind::Predator) > 0
    }

    pub fn outcome(&self) -> Outcome {
        if self.grid.count_of_kind(EntityKind::Herbivore) == 0 {
            Outcome::PredatorsWon
        } else if self.grid.count_of_kind(EntityKind::Predator) == 0 {
            Outcome::HerbivoresSurvived
        } else {
            Outcome::Completed
        }
    }

    pub fn outcome_message(&self) -> &'static str {
        self.outcome().message()
    }

    pub fn census(&self) -> Census {
        Census::of(&self.grid)
    }

    /// Advance until one side dies out or `max_turns` turns have run
    #[instrument(skip(self, sink), fields(seed = self.config.seed))]
    pub fn run(&mut self, max_turns: Option<u64>, sink: &mut dyn EventSink) -> SimulationResult {
        info!(event = "run_started", ?max_turns, "starting simulation");

        let mut reports = Vec::new();
        while self.is_ongoing() && max_turns.map_or(true, |max| self.turn < max) {
            let report = self.advance_one_turn(sink);
            reports.push(report);

            if self.turn % 10 == 0 {
                let census = self.census();
                info!(
                    event = "population",
                    turn = self.turn,
                    herbivores = census.herbivores,
                    predators = census.predators,
                    grass = census.grass,
                );
            }
        }

        let result = SimulationResult {
            seed: self.config.seed,
            turns: self.turn,
            outcome: self.outcome(),
            message: self.outcome_message().to_string(),
            census: self.census(),
            reports,
        };

        info!(
            event = "episode_summary",
            turns = result.turns,
            outcome = ?result.outcome,
            herbivores = result.census.herbivores,
            predators = result.census.predators,
            "🏁 {}",
            result.message
        );
        result
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
