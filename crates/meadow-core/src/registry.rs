use std::collections::BTreeMap;
use std::fmt;

use crate::entity::{Capabilities, Creature, Entity, EntityId, Plant, Tile};
use crate::error::{CoreError, CoreResult};

/// Receives attach/detach notifications for entities whose capabilities
/// intersect [`CapabilityObserver::interests`].
pub trait CapabilityObserver: fmt::Debug {
    /// Capabilities this observer cares about.
    fn interests(&self) -> Capabilities;

    /// Called after an entity was added.
    fn on_attach(&mut self, id: EntityId, entity: &Entity);

    /// Called after an entity was removed.
    fn on_detach(&mut self, id: EntityId, entity: &Entity);
}

/// Arena owning every entity record, keyed by a monotonic [`EntityId`].
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    observers: Vec<Box<dyn CapabilityObserver>>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entities", &self.entities.len())
            .field("next_id", &self.next_id)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    /// An empty registry. The first id handed out is `1`.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            observers: Vec::new(),
        }
    }

    /// Register an observer. It only sees entities added afterwards.
    pub fn register_observer(&mut self, observer: Box<dyn CapabilityObserver>) {
        self.observers.push(observer);
    }

    // -----------------------------------------------------------------------
    // Attach / detach
    // -----------------------------------------------------------------------

    /// Store an entity under a fresh id and notify interested observers.
    pub fn add(&mut self, entity: impl Into<Entity>) -> EntityId {
        let entity = entity.into();
        let id = EntityId(self.next_id);
        self.next_id += 1;
        notify(&mut self.observers, id, &entity, true);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity and notify interested observers.
    ///
    /// Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        notify(&mut self.observers, id, &entity, false);
        Some(entity)
    }

    /// Insert an entity under a known id without notifying observers.
    ///
    /// Used when loading a snapshot. The id counter moves past `id` so it
    /// is never handed out again.
    pub fn restore(&mut self, id: EntityId, entity: Entity) -> Option<Entity> {
        self.next_id = self.next_id.max(id.0 + 1);
        self.entities.insert(id, entity)
    }

    /// Remove every entity, notifying observers for each one.
    ///
    /// The id counter is not reset.
    pub fn clear(&mut self) {
        let entities = std::mem::take(&mut self.entities);
        for (id, entity) in &entities {
            notify(&mut self.observers, *id, entity, false);
        }
    }

    /// Take over the contents of `other`, keeping this registry's observers.
    ///
    /// Observers see a detach for every old entity and an attach for every
    /// new one.
    pub fn replace_with(&mut self, other: EntityRegistry) {
        self.clear();
        let EntityRegistry {
            entities,
            next_id,
            observers,
        } = other;
        self.entities = entities;
        self.next_id = self.next_id.max(next_id);
        self.observers.extend(observers);
        for (id, entity) in &self.entities {
            notify(&mut self.observers, *id, entity, true);
        }
    }

    /// Raise the id counter to at least `next_id`.
    pub fn reserve_ids(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Borrow an entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutably borrow an entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns `true` if the id is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Borrow a tile.
    pub fn tile(&self, id: EntityId) -> CoreResult<&Tile> {
        match self.get(id) {
            Some(Entity::Tile(t)) => Ok(t),
            Some(_) => Err(wrong_kind(id, "tile")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Mutably borrow a tile.
    pub fn tile_mut(&mut self, id: EntityId) -> CoreResult<&mut Tile> {
        match self.get_mut(id) {
            Some(Entity::Tile(t)) => Ok(t),
            Some(_) => Err(wrong_kind(id, "tile")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Borrow a plant.
    pub fn plant(&self, id: EntityId) -> CoreResult<&Plant> {
        match self.get(id) {
            Some(Entity::Plant(p)) => Ok(p),
            Some(_) => Err(wrong_kind(id, "plant")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Mutably borrow a plant.
    pub fn plant_mut(&mut self, id: EntityId) -> CoreResult<&mut Plant> {
        match self.get_mut(id) {
            Some(Entity::Plant(p)) => Ok(p),
            Some(_) => Err(wrong_kind(id, "plant")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Borrow a creature.
    pub fn creature(&self, id: EntityId) -> CoreResult<&Creature> {
        match self.get(id) {
            Some(Entity::Creature(c)) => Ok(c),
            Some(_) => Err(wrong_kind(id, "creature")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Mutably borrow a creature.
    pub fn creature_mut(&mut self, id: EntityId) -> CoreResult<&mut Creature> {
        match self.get_mut(id) {
            Some(Entity::Creature(c)) => Ok(c),
            Some(_) => Err(wrong_kind(id, "creature")),
            None => Err(CoreError::EntityNotFound(id)),
        }
    }

    /// Every entity in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// Every tile in ascending id order.
    pub fn tiles(&self) -> impl Iterator<Item = (EntityId, &Tile)> {
        self.iter().filter_map(|(id, e)| match e {
            Entity::Tile(t) => Some((id, t)),
            _ => None,
        })
    }

    /// Every plant in ascending id order.
    pub fn plants(&self) -> impl Iterator<Item = (EntityId, &Plant)> {
        self.iter().filter_map(|(id, e)| match e {
            Entity::Plant(p) => Some((id, p)),
            _ => None,
        })
    }

    /// Every creature in ascending id order.
    pub fn creatures(&self) -> impl Iterator<Item = (EntityId, &Creature)> {
        self.iter().filter_map(|(id, e)| match e {
            Entity::Creature(c) => Some((id, c)),
            _ => None,
        })
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is live.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The id the next [`add`](Self::add) will hand out.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

fn wrong_kind(id: EntityId, expected: &'static str) -> CoreError {
    CoreError::WrongKind { id, expected }
}

fn notify(
    observers: &mut [Box<dyn CapabilityObserver>],
    id: EntityId,
    entity: &Entity,
    attach: bool,
) {
    for observer in observers.iter_mut() {
        notify_one(observer.as_mut(), id, entity, attach);
    }
}

/// Deliver one attach or detach to `observer` if its interests intersect
/// the entity's capabilities.
pub(crate) fn notify_one(
    observer: &mut dyn CapabilityObserver,
    id: EntityId,
    entity: &Entity,
    attach: bool,
) {
    if !observer.interests().intersects(entity.capabilities()) {
        return;
    }
    if attach {
        observer.on_attach(id, entity);
    } else {
        observer.on_detach(id, entity);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::entity::{Collision, GROUND_LAYER};
    use crate::geometry::Point;

    #[derive(Debug)]
    struct Recorder {
        interests: Capabilities,
        log: Rc<RefCell<Vec<(bool, EntityId)>>>,
    }

    impl CapabilityObserver for Recorder {
        fn interests(&self) -> Capabilities {
            self.interests
        }

        fn on_attach(&mut self, id: EntityId, _entity: &Entity) {
            self.log.borrow_mut().push((true, id));
        }

        fn on_detach(&mut self, id: EntityId, _entity: &Entity) {
            self.log.borrow_mut().push((false, id));
        }
    }

    fn tile() -> Tile {
        Tile::new(Point::new(0.0, 0.0), GROUND_LAYER)
    }

    #[test]
    fn ids_are_unique_and_never_reused() {
        let mut reg = EntityRegistry::new();
        let a = reg.add(tile());
        let b = reg.add(tile());
        assert_ne!(a, b);
        reg.remove(b);
        let c = reg.add(tile());
        assert!(c > b);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut reg = EntityRegistry::new();
        assert!(reg.remove(EntityId(99)).is_none());
    }

    #[test]
    fn observers_only_see_matching_capabilities() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = EntityRegistry::new();
        reg.register_observer(Box::new(Recorder {
            interests: Capabilities::COLLIDABLE,
            log: Rc::clone(&log),
        }));

        let plain = reg.add(tile());
        let solid = reg.add(tile().with_collision(Collision::Main));
        reg.remove(plain);
        reg.remove(solid);

        assert_eq!(*log.borrow(), vec![(true, solid), (false, solid)]);
    }

    #[test]
    fn restore_does_not_notify_and_bumps_counter() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = EntityRegistry::new();
        reg.register_observer(Box::new(Recorder {
            interests: Capabilities::SPATIAL,
            log: Rc::clone(&log),
        }));

        reg.restore(EntityId(10), tile().into());
        assert!(log.borrow().is_empty());
        assert_eq!(reg.add(tile()), EntityId(11));
    }

    #[test]
    fn typed_access_reports_wrong_kind() {
        let mut reg = EntityRegistry::new();
        let id = reg.add(tile());
        assert!(reg.tile(id).is_ok());
        let err = reg.plant(id).unwrap_err();
        assert!(matches!(err, CoreError::WrongKind { expected: "plant", .. }));
        assert!(matches!(
            reg.creature(EntityId(50)),
            Err(CoreError::EntityNotFound(_))
        ));
    }

    #[test]
    fn replace_with_keeps_observers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = EntityRegistry::new();
        reg.register_observer(Box::new(Recorder {
            interests: Capabilities::SPATIAL,
            log: Rc::clone(&log),
        }));
        let old = reg.add(tile());

        let mut other = EntityRegistry::new();
        other.restore(EntityId(7), tile().into());
        reg.replace_with(other);

        assert_eq!(
            *log.borrow(),
            vec![(true, old), (false, old), (true, EntityId(7))]
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.next_id(), 8);
    }
}
