//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Share of cells seeded with grass (0.0 to 1.0)
    pub grass_density: f32,
    /// Share of cells seeded with rocks (0.0 to 1.0)
    pub rock_density: f32,
    /// Share of cells seeded with trees (0.0 to 1.0)
    pub tree_density: f32,
    /// Per-turn probability that an empty cell grows grass
    pub grass_regrowth_rate: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 10,
            grass_density: 0.1,
            rock_density: 0.1,
            tree_density: 0.1,
            grass_regrowth_rate: 0.01,
        }
    }
}

impl WorldConfig {
    pub fn total_cells(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Number of static entities of each kind placed at population time
    pub fn static_counts(&self) -> [(EntityKind, usize); 3] {
        let total = self.total_cells() as f32;
        [
            (EntityKind::Grass, (total * self.grass_density) as usize),
            (EntityKind::Rock, (total * self.rock_density) as usize),
            (EntityKind::Tree, (total * self.tree_density) as usize),
        ]
    }
}

/// Initial creature population
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub initial_herbivores: usize,
    pub initial_predators: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_herbivores: 6,
            initial_predators: 3,
        }
    }
}

/// Hit point gains and losses applied by the turn engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetabolismConfig {
    /// Hit points a herbivore recovers from one grass
    pub grass_recovery_hp: i32,
    /// Hit points a predator recovers from a kill
    pub predator_hp_gain_on_kill: i32,
    /// Hit points every creature loses per turn
    pub hunger_hp_loss_per_turn: i32,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            grass_recovery_hp: 25,
            predator_hp_gain_on_kill: 50,
            hunger_hp_loss_per_turn: 5,
        }
    }
}

/// Path search strategy used by a creature kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// Breadth-first search
    #[default]
    Bfs,
    /// A* with a Manhattan heuristic
    AStar,
}

/// Stats for one creature kind.
///
/// A creature table given in a config file must be complete; only
/// `pathfinder` may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureConfig {
    /// Starting and maximum hit points
    pub max_hp: i32,
    /// Cells traversable per turn
    pub speed: u32,
    /// Damage dealt per attack
    pub attack_power: i32,
    #[serde(default)]
    pub pathfinder: PathStrategy,
}

impl CreatureConfig {
    pub fn herbivore() -> Self {
        Self {
            max_hp: 100,
            speed: 1,
            attack_power: 0,
            pathfinder: PathStrategy::Bfs,
        }
    }

    pub fn predator() -> Self {
        Self {
            max_hp: 100,
            speed: 2,
            attack_power: 50,
            pathfinder: PathStrategy::Bfs,
        }
    }
}

/// Display symbols
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    pub herbivore: String,
    pub predator: String,
    pub grass: String,
    pub rock: String,
    pub tree: String,
    pub empty_cell: String,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            herbivore: "🐰".to_string(),
            predator: "🐺".to_string(),
            grass: "🌿".to_string(),
            rock: "🗿".to_string(),
            tree: "🌳".to_string(),
            empty_cell: "🟫".to_string(),
        }
    }
}

impl SymbolConfig {
    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Herbivore => &self.herbivore,
            EntityKind::Predator => &self.predator,
            EntityKind::Grass => &self.grass,
            EntityKind::Rock => &self.rock,
            EntityKind::Tree => &self.tree,
        }
    }
}

/// Console rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print column and row numbers around the map
    pub show_coordinates: bool,
    /// Maximum number of grouped event entries per printed line
    pub max_logs_per_line: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_coordinates: false,
            max_logs_per_line: 5,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Delay between turns in automatic mode (milliseconds)
    pub turn_delay_ms: u64,
    /// Stop after this many turns even if both sides survive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u64>,
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub metabolism: MetabolismConfig,
    pub herbivore: CreatureConfig,
    pub predator: CreatureConfig,
    pub symbols: SymbolConfig,
    pub display: DisplayConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            turn_delay_ms: 1800,
            max_turns: None,
            world: WorldConfig::default(),
            population: PopulationConfig::default(),
            metabolism: MetabolismConfig::default(),
            herbivore: CreatureConfig::herbivore(),
            predator: CreatureConfig::predator(),
            symbols: SymbolConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Stats for a creature kind, `None` for static kinds
    pub fn creature(&self, kind: EntityKind) -> Option<&CreatureConfig> {
        match kind {
            EntityKind::Herbivore => Some(&self.herbivore),
            EntityKind::Predator => Some(&self.predator),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.width <= 0 || world.height <= 0 {
            return Err(Error::Validation(format!(
                "grid must be at least 1x1, got {}x{}",
                world.width, world.height
            )));
        }

        for (name, density) in [
            ("grass_density", world.grass_density),
            ("rock_density", world.rock_density),
            ("tree_density", world.tree_density),
        ] {
            if !(0.0..=1.0).contains(&density) {
                return Err(Error::Validation(format!(
                    "{name} must be within [0, 1], got {density}"
                )));
            }
        }
        let seeded = world.grass_density + world.rock_density + world.tree_density;
        if seeded > 1.0 {
            return Err(Error::Validation(format!(
                "static densities add up to {seeded}, which exceeds 1"
            )));
        }
        if !(0.0..=1.0).contains(&world.grass_regrowth_rate) {
            return Err(Error::Validation(format!(
                "grass_regrowth_rate must be within [0, 1], got {}",
                world.grass_regrowth_rate
            )));
        }

        for (name, creature) in [("herbivore", &self.herbivore), ("predator", &self.predator)] {
            if creature.max_hp <= 0 {
                return Err(Error::Validation(format!("{name}.max_hp must be positive")));
            }
            if creature.speed == 0 {
                return Err(Error::Validation(format!("{name}.speed must be at least 1")));
            }
            if creature.attack_power < 0 {
                return Err(Error::Validation(format!(
                    "{name}.attack_power must not be negative"
                )));
            }
        }

        let metabolism = &self.metabolism;
        if metabolism.grass_recovery_hp < 0
            || metabolism.predator_hp_gain_on_kill < 0
            || metabolism.hunger_hp_loss_per_turn < 0
        {
            return Err(Error::Validation(
                "metabolism amounts must not be negative".to_string(),
            ));
        }

        if self.display.max_logs_per_line == 0 {
            return Err(Error::Validation(
                "display.max_logs_per_line must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
