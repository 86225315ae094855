//! Core types for Meadow: entities, the static catalog, and the world model.
//!
//! This crate owns entity identity and placement. It knows nothing about
//! time or behaviour; the simulation crate drives state changes through the
//! [`World`] and announces them on the [`MessageBus`].

/// Synchronous publish/subscribe bus and the messages it carries.
pub mod bus;
/// In-world calendar on a 360-day year.
pub mod calendar;
/// Immutable resource, object and species data.
pub mod catalog;
/// Entity types and identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Points, tile sizes, grid keys and bounding boxes.
pub mod geometry;
/// Arena storage for entities with capability observers.
pub mod registry;
/// Grid-keyed spatial index of tiles.
pub mod spatial;
/// The world: registry plus spatial index kept in step.
pub mod world;

/// Re-export bus types.
pub use bus::{ControlAction, Mailbox, Message, MessageBus, SubscriptionHandle, TimeStatus, Topic};
/// Re-export calendar types.
pub use calendar::{CalendarTime, Month};
/// Re-export catalog types.
pub use catalog::{Catalog, CatalogKind, CatalogSource};
/// Re-export core entity types.
pub use entity::{
    Capabilities, Creature, CreatureActivity, Entity, EntityId, NeedKind, Plant, PlantActivity,
    Tile,
};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry types.
pub use geometry::{Aabb, GridKey, Point, TileSize};
/// Re-export registry types.
pub use registry::{CapabilityObserver, EntityRegistry};
/// Re-export the spatial index.
pub use spatial::TileWorld;
/// Re-export the world model.
pub use world::World;
