use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CreatureTemplate, CreatureTemplateId, ObjectId, PlantId, PlantTemplate, ResourceId,
};
use crate::geometry::Point;

/// Layer tiles of a freshly generated world sit on.
pub const GROUND_LAYER: u32 = 0;
/// Layer plant tiles sit on.
pub const PLANT_LAYER: u32 = 1;
/// Layer free-standing objects are placed on.
pub const OBJECT_LAYER: u32 = 2;
/// Layer creature tiles sit on.
pub const CREATURE_LAYER: u32 = 4;

/// Unique identifier for every entity in the world. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Set of capabilities an entity exposes to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// Has a position and a bounding box.
    pub const SPATIAL: Self = Self(1);
    /// Takes part in collision checks.
    pub const COLLIDABLE: Self = Self(1 << 1);
    /// Reacts to pointer hover.
    pub const POINTER_TRACKABLE: Self = Self(1 << 2);

    /// Union of two sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if every capability in `other` is present.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the two sets share at least one capability.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Collision class of a collidable tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collision {
    /// Blocks other main colliders.
    Main,
    /// Detects overlap but never blocks.
    Sensor,
}

/// A resource a tile currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessibleResource {
    /// Catalog id of the resource.
    pub resource_id: ResourceId,
    /// Amount left, never negative.
    pub amount: f32,
}

/// A placed, optionally occupied grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Top-left corner in world units.
    pub position: Point,
    /// Draw layer; higher layers sit on top.
    pub layer: u32,
    /// Occupying object, `0` when empty.
    pub object_id: ObjectId,
    /// Resource the occupant offers, if any.
    #[serde(default)]
    pub accessible_resource: Option<AccessibleResource>,
    /// Collision class, `None` when the tile does not collide.
    #[serde(default)]
    pub collision: Option<Collision>,
    /// Whether hover tracking applies.
    #[serde(default)]
    pub pointer_tracked: bool,
}

impl Tile {
    /// An empty tile at `position` on `layer`.
    pub fn new(position: Point, layer: u32) -> Self {
        Self {
            position,
            layer,
            object_id: 0,
            accessible_resource: None,
            collision: None,
            pointer_tracked: false,
        }
    }

    /// Set the occupying object.
    pub fn with_object(mut self, object_id: ObjectId) -> Self {
        self.object_id = object_id;
        self
    }

    /// Attach a resource record.
    pub fn with_resource(mut self, resource_id: ResourceId, amount: f32) -> Self {
        self.accessible_resource = Some(AccessibleResource {
            resource_id,
            amount,
        });
        self
    }

    /// Mark the tile collidable.
    pub fn with_collision(mut self, collision: Collision) -> Self {
        self.collision = Some(collision);
        self
    }

    /// Enable hover tracking.
    pub fn pointer_tracked(mut self) -> Self {
        self.pointer_tracked = true;
        self
    }

    /// Returns `true` if no object occupies the tile.
    pub fn is_empty(&self) -> bool {
        self.object_id == 0
    }

    /// Capabilities derived from the tile's optional features.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::SPATIAL;
        if self.collision.is_some() {
            caps = caps | Capabilities::COLLIDABLE;
        }
        if self.pointer_tracked {
            caps = caps | Capabilities::POINTER_TRACKABLE;
        }
        caps
    }
}

/// What a plant is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantActivity {
    /// Gains growth and produces resource each second.
    Growing,
    /// Paused; nothing changes.
    Resting,
    /// Terminal.
    Dead,
}

impl fmt::Display for PlantActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Growing => write!(f, "growing"),
            Self::Resting => write!(f, "resting"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// A live plant occupying one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Tile the plant occupies.
    pub tile: EntityId,
    /// Template the plant currently follows.
    pub template_id: PlantId,
    /// Object shown for this stage.
    pub object_id: ObjectId,
    /// Species name.
    pub species: String,
    /// Stage name.
    pub name: String,
    /// Successor template, `0` for none.
    pub grown_id: PlantId,
    /// Resource produced per second.
    pub growth_rate: f32,
    /// Growth gained per second.
    pub growth_speed: f32,
    /// Growth at which this stage is complete.
    pub max_growth: f32,
    /// Cleared when the plant is killed.
    pub is_alive: bool,
    /// Current activity.
    pub activity: PlantActivity,
    /// Accumulated growth.
    pub growth: f32,
}

impl Plant {
    /// A fresh, growing plant of `template` on `tile`.
    pub fn from_template(template: &PlantTemplate, tile: EntityId) -> Self {
        Self {
            tile,
            template_id: template.id,
            object_id: template.object_id,
            species: template.species.clone(),
            name: template.name.clone(),
            grown_id: template.grown_id,
            growth_rate: template.growth_rate,
            growth_speed: template.growth_speed,
            max_growth: template.max_growth,
            is_alive: true,
            activity: PlantActivity::Growing,
            growth: 0.0,
        }
    }

    /// Returns `true` once growth reached the stage maximum.
    pub fn is_fully_grown(&self) -> bool {
        self.growth >= self.max_growth
    }

    /// Take over a successor stage, keeping accumulated growth.
    ///
    /// The successor's maximum is offset by the growth carried over so the
    /// new stage still needs its full span.
    pub fn mature_into(&mut self, successor: &PlantTemplate) {
        let growth = self.growth;
        self.template_id = successor.id;
        self.object_id = successor.object_id;
        self.species = successor.species.clone();
        self.name = successor.name.clone();
        self.grown_id = successor.grown_id;
        self.growth_rate = successor.growth_rate;
        self.growth_speed = successor.growth_speed;
        self.max_growth = successor.max_growth + growth;
        self.growth = growth;
    }
}

/// Need categories a creature can have.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    /// Satisfied by food.
    Hunger,
    /// Satisfied by water.
    Thirst,
    /// Satisfied by shelter.
    Rest,
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hunger => write!(f, "hunger"),
            Self::Thirst => write!(f, "thirst"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

/// What a creature is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureActivity {
    /// Nothing to do.
    Idle,
    /// Has a movement target.
    Seeking,
    /// Consumed a resource this second.
    Feeding,
    /// Terminal.
    Dead,
}

impl fmt::Display for CreatureActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Seeking => write!(f, "seeking"),
            Self::Feeding => write!(f, "feeding"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// A live creature. Owns its own tile on [`CREATURE_LAYER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Catalog template.
    pub template_id: CreatureTemplateId,
    /// Tile the creature occupies.
    pub tile: EntityId,
    /// Species name.
    pub species: String,
    /// Subspecies name.
    pub subspecies: String,
    /// Display name.
    pub name: String,
    /// Current activity.
    pub activity: CreatureActivity,
    /// Current level per need, `0.0` is starving.
    pub needs: BTreeMap<NeedKind, f32>,
    /// Tile the creature is heading for.
    pub movement_target: Option<EntityId>,
    /// Need the movement target is meant to satisfy.
    #[serde(default)]
    pub target_need: Option<NeedKind>,
}

impl Creature {
    /// A fresh, idle creature of `template` on `tile`.
    pub fn from_template(template: &CreatureTemplate, tile: EntityId) -> Self {
        Self {
            template_id: template.id,
            tile,
            species: template.species.clone(),
            subspecies: template.subspecies.clone(),
            name: template.name.clone(),
            activity: CreatureActivity::Idle,
            needs: template.needs.iter().map(|n| (n.kind, n.initial)).collect(),
            movement_target: None,
            target_need: None,
        }
    }

    /// Current level of a need, `None` if the creature does not have it.
    pub fn need(&self, kind: NeedKind) -> Option<f32> {
        self.needs.get(&kind).copied()
    }
}

/// Anything the registry can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A grid cell.
    Tile(Tile),
    /// A plant; its tile is a separate entity.
    Plant(Plant),
    /// A creature; its tile is a separate entity.
    Creature(Creature),
}

impl Entity {
    /// Capability set observers are matched against.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Tile(tile) => tile.capabilities(),
            Self::Plant(_) | Self::Creature(_) => Capabilities::NONE,
        }
    }

    /// Borrow as a tile.
    pub fn as_tile(&self) -> Option<&Tile> {
        match self {
            Self::Tile(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Tile> for Entity {
    fn from(t: Tile) -> Self {
        Self::Tile(t)
    }
}

impl From<Plant> for Entity {
    fn from(p: Plant) -> Self {
        Self::Plant(p)
    }
}

impl From<Creature> for Entity {
    fn from(c: Creature) -> Self {
        Self::Creature(c)
    }
}
