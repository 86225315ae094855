use meadow_core::bus::{Mailbox, Message, MessageBus, Topic};
use meadow_core::catalog::Catalog;
use meadow_core::entity::{AccessibleResource, EntityId, PlantActivity};
use meadow_core::world::World;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Grows and matures every plant once per simulated second.
#[derive(Debug, Default)]
pub struct PlantSystem {
    seconds: Option<Mailbox>,
}

impl PlantSystem {
    /// A plant system that has not yet subscribed to the clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one simulated second for every plant, in id order.
    pub fn step(world: &mut World, catalog: &Catalog, bus: &MessageBus) -> SimResult<()> {
        for id in world.plant_ids() {
            Self::update_plant(world, catalog, bus, id)?;
        }
        Ok(())
    }

    /// Mark a plant as no longer alive. It turns `Dead` on its next update.
    pub fn kill(world: &mut World, plant: EntityId) -> SimResult<()> {
        world.plant_mut(plant)?.is_alive = false;
        Ok(())
    }

    fn update_plant(
        world: &mut World,
        catalog: &Catalog,
        bus: &MessageBus,
        id: EntityId,
    ) -> SimResult<()> {
        let tile_id = world.plant(id)?.tile;
        if world.tile(tile_id).is_err() {
            tracing::warn!(plant = %id, tile = %tile_id, "plant tile is gone, skipping");
            return Ok(());
        }

        let plant = world.plant_mut(id)?;
        if !plant.is_alive {
            plant.activity = PlantActivity::Dead;
            return Ok(());
        }
        if plant.activity == PlantActivity::Dead {
            return Ok(());
        }

        if plant.is_fully_grown() {
            if plant.grown_id == 0 {
                return Ok(());
            }
            let successor = catalog.plant_template(plant.grown_id)?;
            let from = plant.template_id;
            plant.mature_into(successor);
            let new_object_id = plant.object_id;
            tracing::info!(
                plant = %id,
                from,
                to = successor.id,
                stage = %successor.name,
                max_growth = plant.max_growth,
                "plant matured"
            );

            world.replace_tile_object(tile_id, new_object_id)?;
            bus.publish(Message::TileObjectReplace {
                tile_id,
                new_object_id,
            });
            return Ok(());
        }

        if plant.activity != PlantActivity::Growing {
            return Ok(());
        }
        plant.growth += plant.growth_speed.max(0.0);
        let rate = plant.growth_rate;
        let object_id = plant.object_id;

        let tile = world.tile_mut(tile_id)?;
        match tile.accessible_resource.as_mut() {
            Some(resource) => resource.amount = (resource.amount + rate).max(0.0),
            None => {
                let resource_id = catalog.object(object_id)?.resource_id;
                if resource_id != 0 {
                    tile.accessible_resource = Some(AccessibleResource {
                        resource_id,
                        amount: rate.max(0.0),
                    });
                }
            }
        }
        Ok(())
    }
}

impl System for PlantSystem {
    fn name(&self) -> &str {
        "plants"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let (_, mailbox) = ctx.bus.mailbox(Topic::TimeSecondPassed);
        self.seconds = Some(mailbox);
        Ok(())
    }

    fn update(&mut self, _dt: f32, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let Some(seconds) = &self.seconds else {
            return Ok(());
        };
        for _ in seconds.take() {
            Self::step(ctx.world, ctx.catalog, ctx.bus)?;
        }
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
    use proptest::prelude::*;

    use super::*;
    use crate::generation::spawn_plant;
    use crate::testing::{self, BERRY_BUSH, BUSH, SEEDLING};
    use meadow_core::geometry::Point;

    fn setup() -> (World, MessageBus, EntityId) {
        let catalog = testing::catalog();
        let mut world = World::default();
        let plant = spawn_plant(&mut world, &catalog, SEEDLING, Point::new(0.0, 0.0)).unwrap();
        (world, MessageBus::new(), plant)
    }

    #[test]
    fn growing_adds_speed_and_resource() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();

        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        PlantSystem::step(&mut world, &catalog, &bus).unwrap();

        let plant = world.plant(id).unwrap();
        assert_eq!(plant.growth, 4.0);
        let tile = world.tile(plant.tile).unwrap();
        assert_eq!(tile.accessible_resource.unwrap().amount, 1.0);
    }

    #[test]
    fn maturation_carries_growth_over() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        let (_, replaced) = bus.mailbox(Topic::TileObjectReplace);
        world.plant_mut(id).unwrap().growth = 9.0;

        // 9 + 2 = 11 >= 10
        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        assert_eq!(world.plant(id).unwrap().growth, 11.0);
        assert!(replaced.is_empty());

        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        let plant = world.plant(id).unwrap();
        assert_eq!(plant.template_id, BERRY_BUSH);
        assert_eq!(plant.growth, 11.0);
        assert_eq!(plant.max_growth, 20.0 + 11.0);
        assert_eq!(world.tile(plant.tile).unwrap().object_id, BUSH);
        assert_eq!(
            replaced.take(),
            vec![Message::TileObjectReplace {
                tile_id: plant.tile,
                new_object_id: BUSH,
            }]
        );
    }

    #[test]
    fn final_stage_stays_put() {
        let catalog = testing::catalog();
        let mut world = World::default();
        let bus = MessageBus::new();
        let (_, replaced) = bus.mailbox(Topic::TileObjectReplace);
        let id = spawn_plant(&mut world, &catalog, BERRY_BUSH, Point::new(0.0, 0.0)).unwrap();
        world.plant_mut(id).unwrap().growth = 25.0;
        let before = world.plant(id).unwrap().clone();

        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        assert_eq!(world.plant(id).unwrap(), &before);
        assert!(replaced.is_empty());
    }

    #[test]
    fn dead_is_terminal() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        PlantSystem::kill(&mut world, id).unwrap();

        for _ in 0..5 {
            PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        }
        let plant = world.plant(id).unwrap();
        assert_eq!(plant.activity, PlantActivity::Dead);
        assert_eq!(plant.growth, 0.0);
        assert_eq!(plant.template_id, SEEDLING);
    }

    #[test]
    fn resting_changes_nothing() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        world.plant_mut(id).unwrap().activity = PlantActivity::Resting;
        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        assert_eq!(world.plant(id).unwrap().growth, 0.0);
    }

    #[test]
    fn missing_successor_is_fatal() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        {
            let plant = world.plant_mut(id).unwrap();
            plant.grown_id = 404;
            plant.growth = 10.0;
        }
        let err = PlantSystem::step(&mut world, &catalog, &bus).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn plant_without_tile_is_skipped() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        let tile = world.plant(id).unwrap().tile;
        world.remove(tile);
        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        assert_eq!(world.plant(id).unwrap().growth, 0.0);
    }

    #[test]
    fn missing_resource_record_is_created() {
        let catalog = testing::catalog();
        let (mut world, bus, id) = setup();
        let tile = world.plant(id).unwrap().tile;
        world.tile_mut(tile).unwrap().accessible_resource = None;
        PlantSystem::step(&mut world, &catalog, &bus).unwrap();
        let resource = world.tile(tile).unwrap().accessible_resource.unwrap();
        assert_eq!(resource.resource_id, 1);
        assert_eq!(resource.amount, 0.5);
    }

    proptest! {
        #[test]
        fn growth_never_decreases(seconds in 1usize..60, start in 0.0f32..30.0) {
            let catalog = testing::catalog();
            let (mut world, bus, id) = setup();
            world.plant_mut(id).unwrap().growth = start;

            let mut last = start;
            for _ in 0..seconds {
                PlantSystem::step(&mut world, &catalog, &bus).unwrap();
                let plant = world.plant(id).unwrap();
                prop_assert!(plant.growth >= last);
                prop_assert!(plant.growth >= 0.0);
                last = plant.growth;
            }
        }
    }
}
