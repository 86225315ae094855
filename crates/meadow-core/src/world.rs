use crate::catalog::ObjectId;
use crate::entity::{Creature, Entity, EntityId, Plant, Tile};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Aabb, Point, TileSize};
use crate::registry::{CapabilityObserver, EntityRegistry, notify_one};
use crate::spatial::TileWorld;

/// The live world: entity records plus the spatial index that mirrors them.
///
/// All structural changes go through this type so the index never refers
/// to an entity the registry does not hold. The index is kept in step as a
/// [`CapabilityObserver`] interested in spatial entities.
#[derive(Debug, Default)]
pub struct World {
    registry: EntityRegistry,
    tiles: TileWorld,
}

impl World {
    /// An empty world for tiles of the given size.
    pub fn new(size: TileSize) -> Self {
        Self {
            registry: EntityRegistry::new(),
            tiles: TileWorld::new(size),
        }
    }

    /// Read access to every entity.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Read access to the spatial index.
    pub fn tiles(&self) -> &TileWorld {
        &self.tiles
    }

    /// Size of one grid cell.
    pub fn tile_size(&self) -> TileSize {
        self.tiles.tile_size()
    }

    /// Register an observer for entity attach/detach.
    pub fn register_observer(&mut self, observer: Box<dyn CapabilityObserver>) {
        self.registry.register_observer(observer);
    }

    // -----------------------------------------------------------------------
    // Structural changes
    // -----------------------------------------------------------------------

    /// Add an entity. Spatial entities are indexed.
    pub fn add(&mut self, entity: impl Into<Entity>) -> EntityId {
        let id = self.registry.add(entity);
        self.attach_index(id);
        id
    }

    /// Remove an entity. Removing a creature also removes its tile.
    ///
    /// Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.registry.remove(id)?;
        notify_one(&mut self.tiles, id, &entity, false);
        let creature_tile = match &entity {
            Entity::Creature(creature) => Some(creature.tile),
            _ => None,
        };
        if let Some((tile_id, tile)) =
            creature_tile.and_then(|tile_id| Some((tile_id, self.registry.remove(tile_id)?)))
        {
            notify_one(&mut self.tiles, tile_id, &tile, false);
        }
        Some(entity)
    }

    /// Insert an entity under a known id without notifying registered
    /// observers. The spatial index is still updated.
    pub fn restore(&mut self, id: EntityId, entity: Entity) {
        self.registry.restore(id, entity);
        self.attach_index(id);
    }

    fn attach_index(&mut self, id: EntityId) {
        if let Some(entity) = self.registry.get(id) {
            notify_one(&mut self.tiles, id, entity, true);
        }
    }

    /// Raise the id counter to at least `next_id`.
    pub fn reserve_ids(&mut self, next_id: u64) {
        self.registry.reserve_ids(next_id);
    }

    /// Drop every entity.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.tiles.clear();
    }

    /// Swap in the contents of `other`, keeping registered observers.
    pub fn replace_with(&mut self, other: World) {
        let World { registry, tiles } = other;
        self.registry.replace_with(registry);
        self.tiles = tiles;
    }

    /// Put a different object on a tile. Returns the previous object.
    pub fn replace_tile_object(
        &mut self,
        tile_id: EntityId,
        object_id: ObjectId,
    ) -> CoreResult<ObjectId> {
        let tile = self.registry.tile_mut(tile_id)?;
        Ok(std::mem::replace(&mut tile.object_id, object_id))
    }

    /// Move a tile, keeping the index in step.
    pub fn reposition(&mut self, tile_id: EntityId, position: Point) -> CoreResult<()> {
        if !position.is_finite() {
            return Err(CoreError::InvalidPosition {
                id: tile_id,
                position,
            });
        }
        let tile = self.registry.tile_mut(tile_id)?;
        tile.position = position;
        let tile = tile.clone();
        self.tiles.reposition(tile_id, &tile);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Typed access
    // -----------------------------------------------------------------------

    /// Borrow a tile.
    pub fn tile(&self, id: EntityId) -> CoreResult<&Tile> {
        self.registry.tile(id)
    }

    /// Mutably borrow a tile. Use [`reposition`](Self::reposition) to move it.
    pub fn tile_mut(&mut self, id: EntityId) -> CoreResult<&mut Tile> {
        self.registry.tile_mut(id)
    }

    /// Borrow a plant.
    pub fn plant(&self, id: EntityId) -> CoreResult<&Plant> {
        self.registry.plant(id)
    }

    /// Mutably borrow a plant.
    pub fn plant_mut(&mut self, id: EntityId) -> CoreResult<&mut Plant> {
        self.registry.plant_mut(id)
    }

    /// Borrow a creature.
    pub fn creature(&self, id: EntityId) -> CoreResult<&Creature> {
        self.registry.creature(id)
    }

    /// Mutably borrow a creature.
    pub fn creature_mut(&mut self, id: EntityId) -> CoreResult<&mut Creature> {
        self.registry.creature_mut(id)
    }

    /// Ids of every plant, ascending.
    pub fn plant_ids(&self) -> Vec<EntityId> {
        self.registry.plants().map(|(id, _)| id).collect()
    }

    /// Ids of every creature, ascending.
    pub fn creature_ids(&self) -> Vec<EntityId> {
        self.registry.creatures().map(|(id, _)| id).collect()
    }

    // -----------------------------------------------------------------------
    // Spatial queries
    // -----------------------------------------------------------------------

    /// Tiles strictly overlapping `area`, by ascending id.
    pub fn query_aabb(&self, area: &Aabb) -> Vec<EntityId> {
        self.tiles.query_aabb(&self.registry, area)
    }

    /// Tiles within `radius` tiles of `origin`, nearest first.
    pub fn query_surrounding(&self, origin: EntityId, radius: f32) -> CoreResult<Vec<EntityId>> {
        self.tiles.query_surrounding(&self.registry, origin, radius)
    }
}
