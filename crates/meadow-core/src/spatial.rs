use std::collections::HashMap;

use crate::entity::{Capabilities, Entity, EntityId, Tile};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Aabb, GridKey, TileSize};
use crate::registry::{CapabilityObserver, EntityRegistry};

/// Grid-keyed index of tile ids.
///
/// Only ids are stored; every lookup resolves back into the
/// [`EntityRegistry`]. Entries that no longer resolve are logged and
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct TileWorld {
    size: TileSize,
    cells: HashMap<GridKey, Vec<EntityId>>,
    keys: HashMap<EntityId, GridKey>,
}

impl TileWorld {
    /// An empty index for tiles of the given size.
    pub fn new(size: TileSize) -> Self {
        Self {
            size,
            cells: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    /// Tile size this index was built for.
    pub fn tile_size(&self) -> TileSize {
        self.size
    }

    /// Index a tile. Re-inserting an id moves it.
    pub fn insert(&mut self, id: EntityId, tile: &Tile) {
        self.remove(id);
        let key = self.size.grid_key(tile.position);
        self.cells.entry(key).or_default().push(id);
        self.keys.insert(id, key);
    }

    /// Drop a tile from the index. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(key) = self.keys.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.cells.get_mut(&key) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.cells.remove(&key);
            }
        }
        true
    }

    /// Move a tile to the cell matching its current position.
    pub fn reposition(&mut self, id: EntityId, tile: &Tile) {
        let key = self.size.grid_key(tile.position);
        if self.keys.get(&id) == Some(&key) {
            return;
        }
        self.insert(id, tile);
    }

    /// Ids indexed in one grid cell, in insertion order.
    pub fn tiles_at(&self, key: GridKey) -> &[EntityId] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of indexed tiles.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `id` is indexed.
    pub fn contains(&self, id: EntityId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.keys.clear();
    }

    /// Every tile whose box strictly overlaps `area`, by ascending id.
    ///
    /// Any box is accepted. Boxes spanning more cells than are occupied scan
    /// the occupied cells instead of the span.
    pub fn query_aabb(&self, registry: &EntityRegistry, area: &Aabb) -> Vec<EntityId> {
        let lo = self.size.grid_key(area.min);
        let hi = self.size.grid_key(area.max);
        // A tile positioned inside cell k can extend into cell k + 1.
        let cols = lo.col.saturating_sub(1)..=hi.col;
        let rows = lo.row.saturating_sub(1)..=hi.row;

        let span = span_len(*cols.start(), *cols.end())
            .saturating_mul(span_len(*rows.start(), *rows.end()));
        let candidates: Vec<EntityId> = if span > self.cells.len() as u64 {
            self.cells
                .iter()
                .filter(|(key, _)| cols.contains(&key.col) && rows.contains(&key.row))
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect()
        } else {
            let mut ids = Vec::new();
            for col in cols {
                for row in rows.clone() {
                    ids.extend_from_slice(self.tiles_at(GridKey { col, row }));
                }
            }
            ids
        };

        let mut found: Vec<EntityId> = candidates
            .into_iter()
            .filter(|&id| match registry.tile(id) {
                Ok(tile) => self.size.tile_box(tile.position).intersects(area),
                Err(err) => {
                    tracing::error!(%id, %err, "tile index entry does not resolve");
                    false
                }
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Tiles around `origin`, nearest first.
    ///
    /// The search box is the origin tile grown by `radius` tiles on every
    /// side plus one unit of padding. Results are ordered by distance between
    /// tile centres, ties by ascending id. The origin itself is included.
    pub fn query_surrounding(
        &self,
        registry: &EntityRegistry,
        origin: EntityId,
        radius: f32,
    ) -> CoreResult<Vec<EntityId>> {
        let origin_tile = registry.tile(origin)?;
        if !self.contains(origin) {
            return Err(CoreError::EntityNotFound(origin));
        }
        let origin_box = self.size.tile_box(origin_tile.position);
        let area = origin_box.expand(
            self.size.width * radius + 1.0,
            self.size.height * radius + 1.0,
        );
        let centre = origin_box.center();

        let mut ranked: Vec<(f32, EntityId)> = self
            .query_aabb(registry, &area)
            .into_iter()
            .filter_map(|id| {
                let tile = registry.tile(id).ok()?;
                Some((self.size.tile_box(tile.position).center().distance(centre), id))
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }
}

/// Number of cells in `lo..=hi`, zero when empty.
fn span_len(lo: i32, hi: i32) -> u64 {
    u64::try_from(i64::from(hi) - i64::from(lo) + 1).unwrap_or(0)
}

impl CapabilityObserver for TileWorld {
    fn interests(&self) -> Capabilities {
        Capabilities::SPATIAL
    }

    fn on_attach(&mut self, id: EntityId, entity: &Entity) {
        if let Some(tile) = entity.as_tile() {
            self.insert(id, tile);
        }
    }

    fn on_detach(&mut self, id: EntityId, _entity: &Entity) {
        self.remove(id);
    }
}
