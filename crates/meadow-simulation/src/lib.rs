//! Second-based life simulation for Meadow.
//!
//! Drives a [`meadow_core::World`] through a fixed pipeline of systems:
//! the [`TimeSystem`] turns real frame time into simulated seconds, the
//! [`PlantSystem`] grows and matures plants, and the [`CreatureSystem`]
//! decays needs and searches for resources. Systems talk to each other only
//! through the [`meadow_core::MessageBus`].

/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each frame.
pub mod context;
/// Creature needs, resource search and feeding.
pub mod creatures;
/// Error types for the simulation crate.
pub mod error;
/// Seeded world generation and entity spawning.
pub mod generation;
/// Atomic JSON save files.
pub mod persistence;
/// Plant growth and maturation.
pub mod plants;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that all simulation systems implement.
pub mod system;
/// Calendar clock with pause and speed control.
pub mod time;

#[cfg(test)]
mod testing;

/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-export of [`creatures::CreatureSystem`].
pub use creatures::CreatureSystem;
/// Re-exports of the simulation and persistence error types.
pub use error::{PersistError, PersistResult, SimError, SimResult};
/// Re-export of [`generation::WorldGenerator`].
pub use generation::WorldGenerator;
/// Re-exports of [`persistence::SaveFile`] and [`persistence::SAVE_VERSION`].
pub use persistence::{SAVE_VERSION, SaveFile};
/// Re-export of [`plants::PlantSystem`].
pub use plants::PlantSystem;
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`system::System`].
pub use system::System;
/// Re-export of [`time::TimeSystem`].
pub use time::TimeSystem;
