use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use meadow_core::catalog::{Catalog, CreatureTemplateId, ObjectDef, ObjectId, PlantId};
use meadow_core::entity::{
    CREATURE_LAYER, Collision, Creature, EntityId, GROUND_LAYER, OBJECT_LAYER, PLANT_LAYER, Plant,
    Tile,
};
use meadow_core::geometry::Point;
use meadow_core::world::World;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};

/// Pick a random object whose resource has the given type.
pub fn random_object_of_type<'c, R: Rng>(
    catalog: &'c Catalog,
    resource_type: &str,
    rng: &mut R,
) -> Option<&'c ObjectDef> {
    let candidates = catalog.objects_of_type(resource_type);
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}

/// A tile showing `object_id`, snapped to the grid, carrying the object's
/// default resource amount.
pub fn object_tile(
    world: &World,
    catalog: &Catalog,
    object_id: ObjectId,
    position: Point,
    layer: u32,
) -> SimResult<Tile> {
    let object = catalog.object(object_id)?;
    let mut tile = Tile::new(world.tile_size().snap(position), layer).with_object(object.id);
    if object.resource_id != 0 {
        tile = tile.with_resource(object.resource_id, object.default_amount.max(0.0));
    }
    Ok(tile)
}

/// Place a free-standing object on a new tile. Returns the tile id.
pub fn place_object(
    world: &mut World,
    catalog: &Catalog,
    object_id: ObjectId,
    position: Point,
) -> SimResult<EntityId> {
    let tile = object_tile(world, catalog, object_id, position, OBJECT_LAYER)?
        .with_collision(Collision::Sensor);
    Ok(world.add(tile))
}

/// Plant a fresh specimen of `template_id`. Returns the plant id.
pub fn spawn_plant(
    world: &mut World,
    catalog: &Catalog,
    template_id: PlantId,
    position: Point,
) -> SimResult<EntityId> {
    let template = catalog.plant_template(template_id)?;
    let tile = object_tile(world, catalog, template.object_id, position, PLANT_LAYER)?
        .pointer_tracked();
    let tile_id = world.add(tile);
    Ok(world.add(Plant::from_template(template, tile_id)))
}

/// Spawn a creature of `template_id` on its own tile. Returns the creature id.
pub fn spawn_creature(
    world: &mut World,
    catalog: &Catalog,
    template_id: CreatureTemplateId,
    position: Point,
) -> SimResult<EntityId> {
    let template = catalog.creature_template(template_id)?;
    let tile = object_tile(world, catalog, template.object_id, position, CREATURE_LAYER)?
        .with_collision(Collision::Main)
        .pointer_tracked();
    let tile_id = world.add(tile);
    Ok(world.add(Creature::from_template(template, tile_id)))
}

/// Seeded generator for fresh worlds.
///
/// Each call to [`generate`](Self::generate) continues the same random
/// stream, so a regenerated world differs from the first one while the
/// sequence stays reproducible.
#[derive(Debug)]
pub struct WorldGenerator {
    config: SimConfig,
    rng: StdRng,
}

impl WorldGenerator {
    /// A generator seeded from `config.seed`.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Build a ground layer of `world_width x world_height` tiles and scatter
    /// seed plants over it.
    pub fn generate(&mut self, catalog: &Catalog) -> SimResult<World> {
        self.config.validate()?;
        let size = self.config.tile_size();
        let mut world = World::new(size);

        if catalog.objects_of_type(&self.config.ground_type).is_empty() {
            return Err(SimError::InvalidConfig(format!(
                "catalog has no objects of type {:?}",
                self.config.ground_type
            )));
        }
        let seeds: Vec<PlantId> = catalog.seed_plants().iter().map(|p| p.id).collect();

        for row in 0..self.config.world_height {
            for col in 0..self.config.world_width {
                let position = Point::new(col as f32 * size.width, row as f32 * size.height);

                let Some(ground) =
                    random_object_of_type(catalog, &self.config.ground_type, &mut self.rng)
                else {
                    continue;
                };
                let tile = object_tile(&world, catalog, ground.id, position, GROUND_LAYER)?;
                world.add(tile);

                if !seeds.is_empty() && self.rng.random_bool(self.config.plant_density) {
                    let template = seeds[self.rng.random_range(0..seeds.len())];
                    spawn_plant(&mut world, catalog, template, position)?;
                }
            }
        }

        tracing::info!(
            width = self.config.world_width,
            height = self.config.world_height,
            tiles = world.tiles().len(),
            plants = world.plant_ids().len(),
            "world generated"
        );
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, BERRY_BUSH, CHICKEN, DIRT, GRASS, POND, SEEDLING, SPROUT};

    #[test]
    fn generates_full_ground_layer() {
        let catalog = testing::catalog();
        let config = SimConfig::default().with_world_size(4, 3).with_plant_density(0.0);
        let world = WorldGenerator::new(&config).generate(&catalog).unwrap();

        let ground: Vec<&Tile> = world.registry().tiles().map(|(_, t)| t).collect();
        assert_eq!(ground.len(), 12);
        assert!(ground.iter().all(|t| t.layer == GROUND_LAYER));
        assert!(ground.iter().all(|t| t.object_id == DIRT || t.object_id == GRASS));
        assert!(world.plant_ids().is_empty());
    }

    #[test]
    fn full_density_plants_every_cell_with_seeds() {
        let catalog = testing::catalog();
        let config = SimConfig::default().with_world_size(3, 3).with_plant_density(1.0);
        let world = WorldGenerator::new(&config).generate(&catalog).unwrap();

        let plants: Vec<&Plant> = world.registry().plants().map(|(_, p)| p).collect();
        assert_eq!(plants.len(), 9);
        assert!(plants.iter().all(|p| p.template_id == SEEDLING));
        for plant in plants {
            let tile = world.tile(plant.tile).unwrap();
            assert_eq!(tile.layer, PLANT_LAYER);
            assert_eq!(tile.object_id, SPROUT);
        }
    }

    #[test]
    fn same_seed_same_world() {
        let catalog = testing::catalog();
        let config = SimConfig::default().with_seed(7);
        let a = WorldGenerator::new(&config).generate(&catalog).unwrap();
        let b = WorldGenerator::new(&config).generate(&catalog).unwrap();

        let tiles_a: Vec<_> = a.registry().tiles().map(|(id, t)| (id, t.clone())).collect();
        let tiles_b: Vec<_> = b.registry().tiles().map(|(id, t)| (id, t.clone())).collect();
        assert_eq!(tiles_a, tiles_b);
    }

    #[test]
    fn missing_ground_type_is_config_error() {
        let catalog = testing::catalog();
        let config = SimConfig::default().with_ground_type("lava");
        let err = WorldGenerator::new(&config).generate(&catalog).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn spawn_creature_gets_collidable_tile() {
        let catalog = testing::catalog();
        let mut world = World::default();
        let id = spawn_creature(&mut world, &catalog, CHICKEN, Point::new(40.0, 70.0)).unwrap();

        let creature = world.creature(id).unwrap();
        let tile = world.tile(creature.tile).unwrap();
        assert_eq!(tile.position, Point::new(32.0, 64.0));
        assert_eq!(tile.layer, CREATURE_LAYER);
        assert_eq!(tile.collision, Some(Collision::Main));
    }

    #[test]
    fn placed_object_carries_default_resource() {
        let catalog = testing::catalog();
        let mut world = World::default();
        let id = place_object(&mut world, &catalog, POND, Point::new(0.0, 0.0)).unwrap();
        let resource = world.tile(id).unwrap().accessible_resource.unwrap();
        assert_eq!(resource.amount, 100.0);
    }

    #[test]
    fn unknown_template_is_fatal() {
        let catalog = testing::catalog();
        let mut world = World::default();
        let err = spawn_plant(&mut world, &catalog, 999, Point::new(0.0, 0.0)).unwrap_err();
        assert!(err.is_fatal());
        assert!(world.registry().is_empty());
        assert!(spawn_plant(&mut world, &catalog, BERRY_BUSH, Point::new(0.0, 0.0)).is_ok());
    }
}
