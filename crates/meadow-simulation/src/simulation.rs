use std::path::Path;
use std::sync::Arc;

use meadow_core::bus::{ControlAction, Mailbox, Message, MessageBus, Topic};
use meadow_core::calendar::CalendarTime;
use meadow_core::catalog::Catalog;
use meadow_core::world::World;

use crate::config::SimConfig;
use crate::context::SimContext;
use crate::creatures::CreatureSystem;
use crate::error::{SimError, SimResult};
use crate::generation::{WorldGenerator, place_object, spawn_creature};
use crate::persistence;
use crate::plants::PlantSystem;
use crate::system::System;
use crate::time::TimeSystem;

/// The top-level simulation orchestrator.
///
/// Owns the world, catalog, bus, and registered systems. Each frame it
/// applies queued control commands, then updates systems in a fixed order:
/// time, plants, creatures, then any added with [`add_system`](Self::add_system).
pub struct Simulation {
    world: World,
    catalog: Arc<Catalog>,
    bus: MessageBus,
    generator: WorldGenerator,
    systems: Vec<Box<dyn System>>,
    controls: Mailbox,
    initialized: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("calendar", &self.calendar())
            .field("entities", &self.world.registry().len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

impl Simulation {
    /// Create a simulation around an existing world.
    pub fn new(world: World, catalog: Arc<Catalog>, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let bus = MessageBus::new();
        let (_, controls) = bus.mailbox(Topic::Control);
        let systems: Vec<Box<dyn System>> = vec![
            Box::new(TimeSystem::new(config.speed)?),
            Box::new(PlantSystem::new()),
            Box::new(CreatureSystem::new()),
        ];
        Ok(Self {
            world,
            catalog,
            bus,
            generator: WorldGenerator::new(&config),
            systems,
            controls,
            initialized: false,
        })
    }

    /// Create a simulation with a freshly generated world.
    pub fn generate(catalog: Arc<Catalog>, config: SimConfig) -> SimResult<Self> {
        let mut sim = Self::new(World::new(config.tile_size()), catalog, config)?;
        let world = sim.generator.generate(&sim.catalog)?;
        sim.world = world;
        Ok(sim)
    }

    /// Register a system. It runs after the built-in systems.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                world: &mut self.world,
                catalog: &self.catalog,
                bus: &self.bus,
            };
            let result = system.init(&mut ctx);
            self.systems[i] = system;
            result?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Advance by one frame of `dt` real seconds.
    pub fn update(&mut self, dt: f32) -> SimResult<()> {
        if !self.initialized {
            self.init()?;
        }

        self.apply_controls()?;

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                world: &mut self.world,
                catalog: &self.catalog,
                bus: &self.bus,
            };
            let result = system.update(dt, &mut ctx);
            self.systems[i] = system;
            result?;
        }
        Ok(())
    }

    /// Run `frames` frames of `dt` seconds each.
    pub fn run(&mut self, frames: u64, dt: f32) -> SimResult<()> {
        for _ in 0..frames {
            self.update(dt)?;
        }
        Ok(())
    }

    /// Queue a control command. It is applied at the start of the next frame.
    pub fn send(&self, action: ControlAction) {
        self.bus.publish(Message::Control(action));
    }

    fn apply_controls(&mut self) -> SimResult<()> {
        for message in self.controls.take() {
            let Message::Control(action) = message else {
                continue;
            };
            tracing::debug!(?action, "control");
            match action {
                ControlAction::ReloadWorld { path: Some(path) } => {
                    let result = self.load(&path);
                    recoverable(result)?;
                }
                ControlAction::ReloadWorld { path: None } => self.regenerate()?,
                ControlAction::AddCreature {
                    creature_id,
                    position,
                } => {
                    let id = spawn_creature(&mut self.world, &self.catalog, creature_id, position)?;
                    let tile_id = self.world.creature(id)?.tile;
                    tracing::info!(creature = %id, template = creature_id, %position, "creature spawned");
                    self.bus.publish(Message::EntitySpawned {
                        entity_id: id,
                        tile_id,
                    });
                }
                ControlAction::AddObject {
                    object_id,
                    position,
                } => {
                    let id = place_object(&mut self.world, &self.catalog, object_id, position)?;
                    tracing::info!(tile = %id, object = object_id, %position, "object placed");
                    self.bus.publish(Message::EntitySpawned {
                        entity_id: id,
                        tile_id: id,
                    });
                }
                // The time system owns pausing.
                ControlAction::TogglePause => {}
                ControlAction::SaveWorld { path } => {
                    let result = self.save(&path);
                    recoverable(result)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the world with a freshly generated one.
    pub fn regenerate(&mut self) -> SimResult<()> {
        let world = self.generator.generate(&self.catalog)?;
        self.world.replace_with(world);
        self.bus.publish(Message::WorldLoaded { path: None });
        Ok(())
    }

    /// Write the world to `path`.
    pub fn save(&self, path: &Path) -> SimResult<()> {
        persistence::save(path, &self.world, self.calendar())?;
        Ok(())
    }

    /// Replace the world with the save at `path`.
    ///
    /// On error the current world is kept.
    pub fn load(&mut self, path: &Path) -> SimResult<()> {
        let calendar = persistence::load(path, &mut self.world, &self.catalog, &self.bus)?;
        if let Some(time) = self.get_system_mut::<TimeSystem>() {
            time.set_calendar(calendar);
        }
        Ok(())
    }

    /// Current in-world time.
    pub fn calendar(&self) -> CalendarTime {
        self.get_system::<TimeSystem>()
            .map(TimeSystem::calendar)
            .unwrap_or_default()
    }

    /// Change the time speed.
    pub fn set_speed(&mut self, speed: f32) -> SimResult<()> {
        match self.get_system_mut::<TimeSystem>() {
            Some(time) => time.set_speed(speed),
            None => Err(SimError::InvalidSpeed(speed)),
        }
    }

    /// The live world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The live world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Static data.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Shared message bus.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }
}

/// Log recoverable errors and keep going; propagate fatal ones.
fn recoverable(result: SimResult<()>) -> SimResult<()> {
    match result {
        Err(err) if !err.is_fatal() => {
            tracing::warn!(%err, "control command failed");
            Ok(())
        }
        other => other,
    }
}

/// Placeholder system used during the swap-and-update pattern.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &str {
        "noop"
    }
    fn update(&mut self, _dt: f32, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use meadow_core::bus::TimeStatus;
    use meadow_core::entity::{CreatureActivity, NeedKind, PlantActivity};
    use meadow_core::geometry::Point;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::{self, BUSH, CHICKEN, POND, SEEDLING};

    fn small_config() -> SimConfig {
        SimConfig::default().with_world_size(4, 4).with_plant_density(1.0)
    }

    fn sim() -> Simulation {
        Simulation::generate(testing::catalog(), small_config()).unwrap()
    }

    #[test]
    fn one_second_per_real_second() {
        let mut sim = sim();
        sim.run(10, 0.1).unwrap();
        let second = sim.calendar().total_seconds();
        assert!(second == 1 || second == 0, "float accumulation: {second}");
        sim.run(10, 0.1).unwrap();
        assert!(sim.calendar().total_seconds() >= 1);
    }

    #[test]
    fn plants_grow_through_the_bus() {
        let mut sim = sim();
        let plant = sim.world().plant_ids()[0];
        sim.run(3, 1.0).unwrap();
        assert_eq!(sim.world().plant(plant).unwrap().growth, 6.0);
    }

    #[test]
    fn plants_mature_over_time() {
        let mut sim = sim();
        let plant = sim.world().plant_ids()[0];
        // 5 seconds to reach 10 growth, one more to mature.
        sim.run(6, 1.0).unwrap();
        let plant = sim.world().plant(plant).unwrap();
        assert_eq!(plant.name, "bush");
        assert_eq!(sim.world().tile(plant.tile).unwrap().object_id, BUSH);
    }

    #[test]
    fn toggle_pause_control_stops_the_clock() {
        let mut sim = sim();
        let (_, status) = sim.bus().mailbox(Topic::TimeStatusChanged);
        sim.update(1.0).unwrap();
        sim.send(ControlAction::TogglePause);
        sim.run(5, 1.0).unwrap();
        assert_eq!(sim.calendar().total_seconds(), 1);
        assert_eq!(status.take(), vec![Message::TimeStatusChanged(TimeStatus::Paused)]);
        let plant = sim.world().plant_ids()[0];
        assert_eq!(sim.world().plant(plant).unwrap().growth, 2.0);
    }

    #[test]
    fn add_creature_publishes_spawn() {
        let mut sim = sim();
        let (_, spawned) = sim.bus().mailbox(Topic::EntitySpawned);
        sim.send(ControlAction::AddCreature {
            creature_id: CHICKEN,
            position: Point::new(33.0, 33.0),
        });
        sim.update(0.0).unwrap();

        let creatures = sim.world().creature_ids();
        assert_eq!(creatures.len(), 1);
        let tile = sim.world().creature(creatures[0]).unwrap().tile;
        assert_eq!(
            spawned.take(),
            vec![Message::EntitySpawned {
                entity_id: creatures[0],
                tile_id: tile,
            }]
        );
    }

    #[test]
    fn unknown_creature_template_is_fatal() {
        let mut sim = sim();
        sim.send(ControlAction::AddCreature {
            creature_id: 77,
            position: Point::new(0.0, 0.0),
        });
        let err = sim.update(0.0).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn hungry_creature_finds_food() {
        let mut sim = sim();
        sim.send(ControlAction::AddCreature {
            creature_id: CHICKEN,
            position: Point::new(32.0, 32.0),
        });
        sim.update(0.0).unwrap();
        let chick = sim.world().creature_ids()[0];
        sim.world_mut()
            .creature_mut(chick)
            .unwrap()
            .needs
            .insert(NeedKind::Hunger, 0.55);

        // Plants produce resource in their first second, before creatures run.
        sim.update(1.0).unwrap();
        let creature = sim.world().creature(chick).unwrap();
        assert_eq!(creature.activity, CreatureActivity::Seeking);
        let target = creature.movement_target.unwrap();
        let tile = sim.world().tile(target).unwrap();
        assert!(tile.accessible_resource.unwrap().amount > 0.0);
    }

    #[test]
    fn save_and_reload_through_controls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save.json");
        let mut sim = sim();
        sim.run(3, 1.0).unwrap();
        let plant = sim.world().plant_ids()[0];
        let growth = sim.world().plant(plant).unwrap().growth;

        sim.send(ControlAction::SaveWorld { path: path.clone() });
        sim.update(0.0).unwrap();
        sim.run(4, 1.0).unwrap();
        assert_ne!(sim.world().plant(plant).unwrap().growth, growth);

        let loaded = Rc::new(RefCell::new(0));
        {
            let loaded = Rc::clone(&loaded);
            sim.bus()
                .subscribe(Topic::WorldLoaded, move |_| *loaded.borrow_mut() += 1);
        }
        sim.send(ControlAction::ReloadWorld {
            path: Some(path.clone()),
        });
        sim.update(0.0).unwrap();

        assert_eq!(*loaded.borrow(), 1);
        assert_eq!(sim.world().plant(plant).unwrap().growth, growth);
        assert_eq!(sim.calendar().total_seconds(), 3);
    }

    #[test]
    fn bad_reload_keeps_world() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        let mut sim = sim();
        let before = sim.world().registry().len();

        sim.send(ControlAction::ReloadWorld { path: Some(path) });
        sim.update(0.0).unwrap();
        assert_eq!(sim.world().registry().len(), before);
    }

    #[test]
    fn regenerate_replaces_world() {
        let mut sim = sim();
        let (_, loaded) = sim.bus().mailbox(Topic::WorldLoaded);
        sim.send(ControlAction::AddObject {
            object_id: POND,
            position: Point::new(0.0, 0.0),
        });
        sim.update(0.0).unwrap();
        let pond_tiles = |sim: &Simulation| {
            sim.world()
                .registry()
                .tiles()
                .filter(|(_, t)| t.object_id == POND)
                .count()
        };
        assert_eq!(pond_tiles(&sim), 1);

        sim.send(ControlAction::ReloadWorld { path: None });
        sim.update(0.0).unwrap();
        assert_eq!(pond_tiles(&sim), 0);
        assert_eq!(loaded.take(), vec![Message::WorldLoaded { path: None }]);
    }

    #[test]
    fn custom_system_runs_after_builtins() {
        #[derive(Debug, Default)]
        struct Census {
            dead: usize,
        }
        impl System for Census {
            fn name(&self) -> &str {
                "census"
            }
            fn update(&mut self, _dt: f32, ctx: &mut SimContext<'_>) -> SimResult<()> {
                self.dead = ctx
                    .world
                    .registry()
                    .plants()
                    .filter(|(_, p)| p.activity == PlantActivity::Dead)
                    .count();
                Ok(())
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let mut sim = sim();
        sim.add_system(Census::default());
        let plant = sim.world().plant_ids()[0];
        PlantSystem::kill(sim.world_mut(), plant).unwrap();
        sim.update(1.0).unwrap();
        assert_eq!(sim.get_system::<Census>().unwrap().dead, 1);
        assert_eq!(sim.world().plant(plant).unwrap().template_id, SEEDLING);
    }
}
