use crate::context::SimContext;
use crate::error::SimResult;

/// A simulation subsystem that runs every frame.
///
/// Systems are executed in registration order. Each system receives the
/// frame delta and a mutable context giving access to the world, catalog
/// and bus.
pub trait System: std::fmt::Debug {
    /// Human-readable name for this system.
    fn name(&self) -> &str;

    /// Called once per frame with the real time elapsed, in seconds.
    fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Called once before the first update. Subscribe to the bus here.
    fn init(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Support downcasting to concrete types for cross-system communication.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types for cross-system communication.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
