//! Per-kind creature behavior.
//!
//! Each creature kind maps to a static [`Behavior`] that names what it seeks,
//! where it should head when nothing is adjacent, and what happens when it
//! reaches its target.

use crate::entity::Entity;
use crate::grid::Grid;
use ecosim_core::{
    Coordinate, DeathCause, EntityKind, Error, Event, EventSink, MetabolismConfig, Result,
};
use std::collections::BTreeSet;

/// Result of a successful interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Ate { healed: i32 },
    Attacked { damage: i32, killed: bool, healed: i32 },
}

pub trait Behavior: Send + Sync {
    /// Kind this creature interacts with
    fn target_kind(&self) -> EntityKind;

    /// Cells worth walking towards when no target is adjacent
    fn candidate_targets(&self, grid: &Grid, target: EntityKind) -> BTreeSet<Coordinate>;

    /// Act from `from` on the cell `to`.
    ///
    /// Fails with `Error::InvalidAction` and leaves the grid untouched when
    /// `to` does not hold a valid target.
    fn interact(
        &self,
        from: Coordinate,
        to: Coordinate,
        grid: &mut Grid,
        metabolism: &MetabolismConfig,
        sink: &mut dyn EventSink,
    ) -> Result<Interaction>;
}

/// Eats resources: herbivores
#[derive(Debug, Clone, Copy, Default)]
pub struct Grazer;

/// Hunts other creatures: predators
#[derive(Debug, Clone, Copy, Default)]
pub struct Hunter;

static GRAZER: Grazer = Grazer;
static HUNTER: Hunter = Hunter;

/// Behavior for a creature kind, `None` for static kinds
pub fn behavior_for(kind: EntityKind) -> Option<&'static dyn Behavior> {
    match kind {
        EntityKind::Herbivore => Some(&GRAZER),
        EntityKind::Predator => Some(&HUNTER),
        EntityKind::Grass | EntityKind::Rock | EntityKind::Tree => None,
    }
}

fn actor_symbol(grid: &Grid, from: Coordinate) -> Result<String> {
    grid.get(from)
        .and_then(Entity::as_creature)
        .map(|creature| creature.symbol.clone())
        .ok_or_else(|| Error::InvalidAction(format!("no creature at {from}")))
}

/// Heal the creature at `at` and report it when anything was restored
fn heal(grid: &mut Grid, at: Coordinate, amount: i32, sink: &mut dyn EventSink) -> i32 {
    let Some(creature) = grid.get_mut(at).and_then(Entity::as_creature_mut) else {
        return 0;
    };
    let healed = creature.restore_hp(amount);
    if healed > 0 {
        sink.emit(Event::healed(&creature.symbol, at, healed));
    }
    healed
}

impl Behavior for Grazer {
    fn target_kind(&self) -> EntityKind {
        EntityKind::Grass
    }

    fn candidate_targets(&self, grid: &Grid, target: EntityKind) -> BTreeSet<Coordinate> {
        grid.coords_of_kind(target).into_iter().collect()
    }

    fn interact(
        &self,
        from: Coordinate,
        to: Coordinate,
        grid: &mut Grid,
        metabolism: &MetabolismConfig,
        sink: &mut dyn EventSink,
    ) -> Result<Interaction> {
        let eater = actor_symbol(grid, from)?;
        let target = self.target_kind();
        if grid.kind_at(to) != Some(target) {
            return Err(Error::InvalidAction(format!("no {target} to eat at {to}")));
        }

        let food = grid.remove(to).map(|e| e.symbol().to_string()).unwrap_or_default();
        // HEAL is reported before the meal itself
        let healed = heal(grid, from, metabolism.grass_recovery_hp, sink);
        sink.emit(Event::ate(&eater, from, &food, to));

        Ok(Interaction::Ate { healed })
    }
}

impl Behavior for Hunter {
    fn target_kind(&self) -> EntityKind {
        EntityKind::Herbivore
    }

    /// Empty cells next to any prey, deduplicated
    fn candidate_targets(&self, grid: &Grid, target: EntityKind) -> BTreeSet<Coordinate> {
        grid.coords_of_kind(target)
            .into_iter()
            .flat_map(|prey| grid.neighbors4(prey))
            .filter(|cell| grid.is_empty(*cell))
            .collect()
    }

    fn interact(
        &self,
        from: Coordinate,
        to: Coordinate,
        grid: &mut Grid,
        metabolism: &MetabolismConfig,
        sink: &mut dyn EventSink,
    ) -> Result<Interaction> {
        let attacker = actor_symbol(grid, from)?;
        let damage = grid
            .get(from)
            .and_then(Entity::as_creature)
            .map(|creature| creature.attack_power)
            .unwrap_or_default();

        let target = self.target_kind();
        let Some(victim) = grid
            .get_mut(to)
            .and_then(Entity::as_creature_mut)
            .filter(|victim| victim.kind == target && victim.is_alive())
        else {
            return Err(Error::InvalidAction(format!("no live {target} to attack at {to}")));
        };

        victim.take_damage(damage);
        let victim_symbol = victim.symbol.clone();
        let killed = !victim.is_alive();
        sink.emit(Event::attacked(&attacker, from, &victim_symbol, to, damage));

        let mut healed = 0;
        if killed {
            grid.remove(to);
            sink.emit(Event::died(&victim_symbol, to, DeathCause::Battle));
            healed = heal(grid, from, metabolism.predator_hp_gain_on_kill, sink);
        }

        Ok(Interaction::Attacked {
            damage,
            killed,
            healed,
        })
    }
}
