use meadow_core::bus::MessageBus;
use meadow_core::catalog::Catalog;
use meadow_core::world::World;

/// Mutable context passed to each system during an update.
pub struct SimContext<'a> {
    /// The live world.
    pub world: &'a mut World,
    /// Static data.
    pub catalog: &'a Catalog,
    /// Shared message bus.
    pub bus: &'a MessageBus,
}
