//! World snapshots.
//!
//! A save is a single JSON document. Writing goes through a temporary file
//! in the target directory that is renamed into place, so a crash never
//! leaves a half-written save. Loading validates the whole document and
//! rebuilds the world off to the side before swapping it in; on any error
//! the live world is untouched.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meadow_core::bus::{Message, MessageBus};
use meadow_core::calendar::CalendarTime;
use meadow_core::catalog::Catalog;
use meadow_core::entity::{Creature, Entity, EntityId, Plant, Tile};
use meadow_core::geometry::TileSize;
use meadow_core::world::World;

use crate::error::{PersistError, PersistResult};

/// Save format version this build writes and reads.
pub const SAVE_VERSION: u32 = 1;

/// A tile with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTile {
    /// Entity id.
    pub id: EntityId,
    /// Tile state.
    #[serde(flatten)]
    pub tile: Tile,
}

/// A plant with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlant {
    /// Entity id.
    pub id: EntityId,
    /// Plant state.
    #[serde(flatten)]
    pub plant: Plant,
}

/// A creature with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCreature {
    /// Entity id.
    pub id: EntityId,
    /// Creature state.
    #[serde(flatten)]
    pub creature: Creature,
}

/// On-disk snapshot of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    /// Format version, see [`SAVE_VERSION`].
    pub version: u32,
    /// Wall-clock time the save was written.
    pub saved_at: DateTime<Utc>,
    /// In-world time, in total seconds.
    pub calendar_seconds: u64,
    /// Next entity id the registry would hand out.
    pub next_id: u64,
    /// Every tile, including plant and creature tiles.
    pub tiles: Vec<SavedTile>,
    /// Every plant.
    pub plants: Vec<SavedPlant>,
    /// Every creature.
    pub creatures: Vec<SavedCreature>,
}

impl SaveFile {
    /// Capture the current state of `world`.
    pub fn snapshot(world: &World, calendar: CalendarTime) -> Self {
        let mut save = Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            calendar_seconds: calendar.total_seconds(),
            next_id: world.registry().next_id(),
            tiles: Vec::new(),
            plants: Vec::new(),
            creatures: Vec::new(),
        };
        for (id, entity) in world.registry().iter() {
            match entity {
                Entity::Tile(tile) => save.tiles.push(SavedTile {
                    id,
                    tile: tile.clone(),
                }),
                Entity::Plant(plant) => save.plants.push(SavedPlant {
                    id,
                    plant: plant.clone(),
                }),
                Entity::Creature(creature) => save.creatures.push(SavedCreature {
                    id,
                    creature: creature.clone(),
                }),
            }
        }
        save
    }

    /// In-world time stored in the save.
    pub fn calendar(&self) -> CalendarTime {
        CalendarTime::from_seconds(self.calendar_seconds)
    }

    /// Check the document is internally consistent.
    pub fn validate(&self) -> PersistResult<()> {
        if self.version != SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
                expected: SAVE_VERSION,
            });
        }

        let mut ids = HashSet::new();
        let all_ids = self
            .tiles
            .iter()
            .map(|t| t.id)
            .chain(self.plants.iter().map(|p| p.id))
            .chain(self.creatures.iter().map(|c| c.id));
        for id in all_ids {
            if !ids.insert(id) {
                return Err(invalid(format!("entity id {id} appears more than once")));
            }
            if id.0 == 0 || id.0 >= self.next_id {
                return Err(invalid(format!(
                    "entity id {id} outside the allocated range (next id {})",
                    self.next_id
                )));
            }
        }

        let tile_ids: HashSet<EntityId> = self.tiles.iter().map(|t| t.id).collect();
        for saved in &self.tiles {
            let tile = &saved.tile;
            if !tile.position.is_finite() {
                return Err(invalid(format!("tile {} has a non-finite position", saved.id)));
            }
            if let Some(resource) = &tile.accessible_resource {
                check_amount("resource amount", saved.id, resource.amount)?;
            }
        }
        for saved in &self.plants {
            let plant = &saved.plant;
            if !tile_ids.contains(&plant.tile) {
                return Err(invalid(format!(
                    "plant {} references missing tile {}",
                    saved.id, plant.tile
                )));
            }
            check_amount("growth", saved.id, plant.growth)?;
            check_amount("max growth", saved.id, plant.max_growth)?;
            if !plant.growth_speed.is_finite() || !plant.growth_rate.is_finite() {
                return Err(invalid(format!("plant {} has non-finite rates", saved.id)));
            }
        }
        for saved in &self.creatures {
            let creature = &saved.creature;
            if !tile_ids.contains(&creature.tile) {
                return Err(invalid(format!(
                    "creature {} references missing tile {}",
                    saved.id, creature.tile
                )));
            }
            if let Some(target) = creature
                .movement_target
                .filter(|target| !tile_ids.contains(target))
            {
                return Err(invalid(format!(
                    "creature {} targets missing tile {target}",
                    saved.id
                )));
            }
            for (kind, level) in &creature.needs {
                if !level.is_finite() || *level < 0.0 {
                    return Err(invalid(format!(
                        "creature {} has invalid {kind} level {level}",
                        saved.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rebuild a world from the save, resolving every catalog reference.
    ///
    /// Ids are preserved. No observer or bus is involved.
    pub fn build_world(&self, catalog: &Catalog, size: TileSize) -> PersistResult<World> {
        let mut world = World::new(size);
        for saved in &self.tiles {
            let tile = &saved.tile;
            if tile.object_id != 0 {
                catalog.object(tile.object_id).map_err(PersistError::Catalog)?;
            }
            if let Some(resource) = tile.accessible_resource.filter(|r| r.resource_id != 0) {
                catalog
                    .resource(resource.resource_id)
                    .map_err(PersistError::Catalog)?;
            }
            world.restore(saved.id, Entity::Tile(tile.clone()));
        }
        for saved in &self.plants {
            let plant = &saved.plant;
            catalog
                .plant_template(plant.template_id)
                .map_err(PersistError::Catalog)?;
            catalog.object(plant.object_id).map_err(PersistError::Catalog)?;
            if plant.grown_id != 0 {
                catalog
                    .plant_template(plant.grown_id)
                    .map_err(PersistError::Catalog)?;
            }
            world.restore(saved.id, Entity::Plant(plant.clone()));
        }
        for saved in &self.creatures {
            catalog
                .creature_template(saved.creature.template_id)
                .map_err(PersistError::Catalog)?;
            world.restore(saved.id, Entity::Creature(saved.creature.clone()));
        }
        world.reserve_ids(self.next_id);
        Ok(world)
    }
}

fn invalid(message: String) -> PersistError {
    PersistError::Invalid(message)
}

fn check_amount(what: &str, id: EntityId, value: f32) -> PersistResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{what} of {id} is {value}")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write a snapshot of `world` to `path` atomically.
pub fn save(path: &Path, world: &World, calendar: CalendarTime) -> PersistResult<SaveFile> {
    let save = SaveFile::snapshot(world, calendar);
    let json = serde_json::to_string_pretty(&save)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_error(path, e))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| io_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    tracing::info!(
        path = %path.display(),
        tiles = save.tiles.len(),
        plants = save.plants.len(),
        creatures = save.creatures.len(),
        "world saved"
    );
    Ok(save)
}

/// Read and validate a save file without touching any world.
pub fn read(path: &Path) -> PersistResult<SaveFile> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let save: SaveFile = serde_json::from_str(&content)?;
    save.validate()?;
    Ok(save)
}

/// Replace `world` with the contents of the save at `path`.
///
/// On success publishes one [`Message::WorldLoaded`] and returns the saved
/// calendar time. On failure `world` is unchanged and nothing is published.
pub fn load(
    path: &Path,
    world: &mut World,
    catalog: &Catalog,
    bus: &MessageBus,
) -> PersistResult<CalendarTime> {
    let save = read(path)?;
    let rebuilt = save.build_world(catalog, world.tile_size())?;
    world.replace_with(rebuilt);

    tracing::info!(
        path = %path.display(),
        entities = world.registry().len(),
        calendar = %save.calendar(),
        "world loaded"
    );
    bus.publish(Message::WorldLoaded {
        path: Some(path.to_path_buf()),
    });
    Ok(save.calendar())
}
