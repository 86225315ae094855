use meadow_core::bus::{Mailbox, Message, MessageBus, Topic};
use meadow_core::catalog::Catalog;
use meadow_core::entity::{CreatureActivity, EntityId, NeedKind};
use meadow_core::world::World;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Decays creature needs and resolves movement targets for them.
///
/// Target resolution is a round trip over the bus: a search publishes a
/// [`Message::SpatialQueryResponse`] and the system's own subscription
/// turns the first matching tile into the creature's movement target.
#[derive(Debug, Default)]
pub struct CreatureSystem {
    seconds: Option<Mailbox>,
    responses: Option<Mailbox>,
}

impl CreatureSystem {
    /// A creature system that has not yet subscribed to the bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the clock and to search responses.
    pub fn subscribe(&mut self, bus: &MessageBus) {
        self.seconds = Some(bus.mailbox(Topic::TimeSecondPassed).1);
        self.responses = Some(bus.mailbox(Topic::SpatialQueryResponse).1);
    }

    /// Run one simulated second for every creature, in id order.
    pub fn step(&mut self, world: &mut World, catalog: &Catalog, bus: &MessageBus) -> SimResult<()> {
        for id in world.creature_ids() {
            let Some(need) = Self::decay_needs(world, catalog, id)? else {
                continue;
            };
            if world.tile(world.creature(id)?.tile).is_err() {
                tracing::warn!(creature = %id, "creature tile is gone, skipping search");
                continue;
            }
            Self::trigger_need(world, catalog, bus, id, need)?;
            self.handle_responses(world);
        }
        Ok(())
    }

    /// Apply every pending search response.
    pub fn handle_responses(&mut self, world: &mut World) {
        let Some(responses) = &self.responses else {
            return;
        };
        for message in responses.take() {
            let Message::SpatialQueryResponse {
                entity_id,
                need,
                tiles,
            } = message
            else {
                continue;
            };
            let Ok(creature) = world.creature_mut(entity_id) else {
                tracing::warn!(creature = %entity_id, "search response for unknown creature");
                continue;
            };
            if creature.activity == CreatureActivity::Dead {
                continue;
            }
            if let Some(&target) = tiles.first() {
                creature.movement_target = Some(target);
                creature.target_need = Some(need);
                creature.activity = CreatureActivity::Seeking;
                tracing::debug!(creature = %entity_id, %need, %target, "movement target set");
            }
        }
    }

    /// Search around the creature for tiles that satisfy `need`.
    ///
    /// Publishes the matches, nearest first, as a
    /// [`Message::SpatialQueryResponse`] and returns them.
    pub fn trigger_need(
        world: &World,
        catalog: &Catalog,
        bus: &MessageBus,
        creature_id: EntityId,
        need: NeedKind,
    ) -> SimResult<Vec<EntityId>> {
        let creature = world.creature(creature_id)?;
        let template = catalog.creature_template(creature.template_id)?;
        let Some(spec) = template.need(need) else {
            tracing::warn!(creature = %creature_id, %need, "species has no such need");
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        for tile_id in world.query_surrounding(creature.tile, spec.search_radius)? {
            let Some(resource) = world.tile(tile_id)?.accessible_resource else {
                continue;
            };
            if resource.amount <= 0.0 {
                continue;
            }
            if catalog.resource(resource.resource_id)?.resource_type == spec.resource_type {
                matches.push(tile_id);
            }
        }

        tracing::debug!(
            creature = %creature_id,
            %need,
            found = matches.len(),
            "resource search"
        );
        bus.publish(Message::SpatialQueryResponse {
            entity_id: creature_id,
            need,
            tiles: matches.clone(),
        });
        Ok(matches)
    }

    /// Called when the creature reached its movement target.
    ///
    /// Clears the target and, if the tile still carries the right resource,
    /// consumes enough of it to refill the need. Returns `true` if anything
    /// was consumed.
    pub fn arrive(world: &mut World, catalog: &Catalog, creature_id: EntityId) -> SimResult<bool> {
        let creature = world.creature_mut(creature_id)?;
        let Some(target) = creature.movement_target.take() else {
            return Ok(false);
        };
        let need = creature.target_need.take();
        if creature.activity != CreatureActivity::Dead {
            creature.activity = CreatureActivity::Idle;
        }
        let template_id = creature.template_id;
        let level = need.and_then(|n| creature.need(n));
        let (Some(need), Some(level)) = (need, level) else {
            return Ok(false);
        };

        let template = catalog.creature_template(template_id)?;
        let Some(spec) = template.need(need) else {
            return Ok(false);
        };
        let Ok(tile) = world.tile_mut(target) else {
            tracing::debug!(creature = %creature_id, %target, "target tile vanished");
            return Ok(false);
        };
        let Some(resource) = tile.accessible_resource.as_mut() else {
            return Ok(false);
        };
        if resource.amount <= 0.0
            || catalog.resource(resource.resource_id)?.resource_type != spec.resource_type
        {
            return Ok(false);
        }

        let wanted = if spec.satisfy_per_unit > 0.0 {
            (1.0 - level).max(0.0) / spec.satisfy_per_unit
        } else {
            0.0
        };
        let eaten = wanted.min(resource.amount);
        resource.amount -= eaten;
        if eaten <= 0.0 {
            return Ok(false);
        }

        let creature = world.creature_mut(creature_id)?;
        if let Some(value) = creature.needs.get_mut(&need) {
            *value = (*value + eaten * spec.satisfy_per_unit).min(1.0);
        }
        creature.activity = CreatureActivity::Feeding;
        tracing::info!(creature = %creature_id, %need, %target, eaten, "creature fed");
        Ok(true)
    }

    /// Drop the creature's movement target.
    pub fn clear_target(world: &mut World, creature_id: EntityId) -> SimResult<()> {
        let creature = world.creature_mut(creature_id)?;
        creature.movement_target = None;
        creature.target_need = None;
        if creature.activity == CreatureActivity::Seeking {
            creature.activity = CreatureActivity::Idle;
        }
        Ok(())
    }

    /// Mark a creature dead. Dead creatures no longer change.
    pub fn kill(world: &mut World, creature_id: EntityId) -> SimResult<()> {
        let creature = world.creature_mut(creature_id)?;
        creature.activity = CreatureActivity::Dead;
        creature.movement_target = None;
        creature.target_need = None;
        Ok(())
    }

    /// Decay one creature's needs and return the most urgent critical need
    /// when the creature has nothing to do.
    fn decay_needs(
        world: &mut World,
        catalog: &Catalog,
        id: EntityId,
    ) -> SimResult<Option<NeedKind>> {
        let creature = world.creature_mut(id)?;
        if creature.activity == CreatureActivity::Dead {
            return Ok(None);
        }
        if creature.activity == CreatureActivity::Feeding {
            creature.activity = CreatureActivity::Idle;
        }

        let template = catalog.creature_template(creature.template_id)?;
        let mut urgent: Option<(NeedKind, f32)> = None;
        for spec in &template.needs {
            let level = creature.needs.entry(spec.kind).or_insert(spec.initial);
            *level = (*level - spec.decay_per_second).max(0.0);
            if *level <= spec.critical && urgent.is_none_or(|(_, lowest)| *level < lowest) {
                urgent = Some((spec.kind, *level));
            }
        }

        if creature.movement_target.is_some() {
            return Ok(None);
        }
        Ok(urgent.map(|(kind, _)| kind))
    }
}

impl System for CreatureSystem {
    fn name(&self) -> &str {
        "creatures"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.subscribe(ctx.bus);
        Ok(())
    }

    fn update(&mut self, _dt: f32, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.handle_responses(ctx.world);
        let seconds = self.seconds.as_ref().map(Mailbox::take).unwrap_or_default();
        for _ in seconds {
            self.step(ctx.world, ctx.catalog, ctx.bus)?;
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
