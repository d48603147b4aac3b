//! Grid occupants and the factory that creates them.

use ecosim_core::{CreatureConfig, EntityId, EntityKind, SimulationConfig};
use serde::{Deserialize, Serialize};

/// A mobile creature with hit points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: EntityId,
    pub kind: EntityKind,
    pub symbol: String,
    pub speed: u32,
    pub attack_power: i32,
    hp: i32,
    max_hp: i32,
}

impl Creature {
    pub fn new(id: EntityId, kind: EntityKind, symbol: &str, stats: &CreatureConfig) -> Self {
        Self {
            id,
            kind,
            symbol: symbol.to_string(),
            speed: stats.speed,
            attack_power: stats.attack_power,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Lower hit points, never below zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let taken = amount.clamp(0, self.hp);
        self.hp -= taken;
        taken
    }

    /// Raise hit points, never above the maximum. Returns the amount healed.
    pub fn restore_hp(&mut self, amount: i32) -> i32 {
        let healed = amount.clamp(0, self.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    /// Set hit points directly, clamped to `[0, max_hp]`
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }
}

/// An occupant that never moves: grass, rocks and trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub id: EntityId,
    pub kind: EntityKind,
    pub symbol: String,
}

/// Anything that can occupy a grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Creature(Creature),
    Prop(Prop),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Creature(c) => c.id,
            Entity::Prop(p) => p.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Creature(c) => c.kind,
            Entity::Prop(p) => p.kind,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Entity::Creature(c) => &c.symbol,
            Entity::Prop(p) => &p.symbol,
        }
    }

    pub fn as_creature(&self) -> Option<&Creature> {
        match self {
            Entity::Creature(c) => Some(c),
            Entity::Prop(_) => None,
        }
    }

    pub fn as_creature_mut(&mut self) -> Option<&mut Creature> {
        match self {
            Entity::Creature(c) => Some(c),
            Entity::Prop(_) => None,
        }
    }

    pub fn is_creature(&self) -> bool {
        matches!(self, Entity::Creature(_))
    }
}

/// Creates entities by kind with monotonically increasing ids
#[derive(Debug, Clone)]
pub struct EntityFactory {
    config: SimulationConfig,
    next_id: u64,
}

impl EntityFactory {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config, next_id: 0 }
    }

    /// Continue numbering from `next_id`
    pub fn with_next_id(mut self, next_id: u64) -> Self {
        self.next_id = next_id;
        self
    }

    pub fn create(&mut self, kind: EntityKind) -> Entity {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let symbol = self.config.symbols.for_kind(kind);
        match self.config.creature(kind) {
            Some(stats) => Entity::Creature(Creature::new(id, kind, symbol, stats)),
            None => Entity::Prop(Prop {
                id,
                kind,
                symbol: symbol.to_string(),
            }),
        }
    }
}
