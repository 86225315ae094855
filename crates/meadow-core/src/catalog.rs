//! Immutable static data: resources, objects, and species templates.
//!
//! A [`Catalog`] is built once before the simulation starts and shared as
//! `Arc<Catalog>`. Live entities copy the template fields they need, so no
//! simulation step can mutate catalog data.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::NeedKind;
use crate::error::{CoreError, CoreResult};

/// Catalog id of a [`ResourceDef`].
pub type ResourceId = u32;
/// Catalog id of an [`ObjectDef`]. `0` means "no object".
pub type ObjectId = u32;
/// Catalog id of a [`PlantTemplate`]. `0` means "no successor".
pub type PlantId = u32;
/// Catalog id of a [`CreatureTemplate`].
pub type CreatureTemplateId = u32;

/// Which catalog table a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// [`ResourceDef`] table.
    Resource,
    /// [`ObjectDef`] table.
    Object,
    /// [`PlantTemplate`] table.
    Plant,
    /// [`CreatureTemplate`] table.
    Creature,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::Object => write!(f, "object"),
            Self::Plant => write!(f, "plant"),
            Self::Creature => write!(f, "creature"),
        }
    }
}

/// Description of a resource kind, e.g. plant matter or water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Catalog id.
    pub id: ResourceId,
    /// Resource type name used for matching needs ("plant_matter", "water").
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// A placeable object: something a tile can be occupied by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    /// Catalog id.
    pub id: ObjectId,
    /// Sprite index used by the rendering collaborator.
    pub sprite_id: u32,
    /// Display name.
    pub name: String,
    /// Resource the object exposes, `0` for none.
    #[serde(default)]
    pub resource_id: ResourceId,
    /// Amount of that resource a freshly placed object carries.
    #[serde(default, alias = "amount")]
    pub default_amount: f32,
}

/// Species definition for a plant growth stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantTemplate {
    /// Catalog id.
    pub id: PlantId,
    /// Object shown on the plant's tile during this stage.
    pub object_id: ObjectId,
    /// Species name.
    pub species: String,
    /// Stage name ("seedling", "shrub").
    pub name: String,
    /// Successor stage, `0` when this stage is final.
    #[serde(default)]
    pub grown_id: PlantId,
    /// Resource produced on the tile per second of growth.
    pub growth_rate: f32,
    /// Growth gained per second.
    pub growth_speed: f32,
    /// Growth at which the stage is complete.
    pub max_growth: f32,
}

/// How one need of a creature species behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedSpec {
    /// Which need this describes.
    pub kind: NeedKind,
    /// Level at spawn.
    #[serde(default = "default_need_initial")]
    pub initial: f32,
    /// Level lost per simulated second.
    #[serde(default)]
    pub decay_per_second: f32,
    /// Level at or below which the creature starts looking for the resource.
    #[serde(default)]
    pub critical: f32,
    /// Resource type that satisfies the need.
    pub resource_type: String,
    /// Search radius in tiles.
    #[serde(default = "default_search_radius")]
    pub search_radius: f32,
    /// Need level restored per unit of resource consumed.
    #[serde(default = "default_satisfy_per_unit")]
    pub satisfy_per_unit: f32,
}

fn default_need_initial() -> f32 {
    1.0
}

fn default_search_radius() -> f32 {
    3.0
}

fn default_satisfy_per_unit() -> f32 {
    0.1
}

/// Species definition for a creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    /// Catalog id.
    pub id: CreatureTemplateId,
    /// Object shown on the creature's tile.
    pub object_id: ObjectId,
    /// Species name.
    pub species: String,
    /// Subspecies name.
    #[serde(default)]
    pub subspecies: String,
    /// Display name.
    pub name: String,
    /// Needs schema.
    #[serde(default)]
    pub needs: Vec<NeedSpec>,
}

impl CreatureTemplate {
    /// The spec for a given need, if the species has it.
    pub fn need(&self, kind: NeedKind) -> Option<&NeedSpec> {
        self.needs.iter().find(|n| n.kind == kind)
    }
}

/// Raw catalog tables as authored, before cross-reference validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSource {
    /// Resource definitions.
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    /// Object definitions.
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    /// Plant stage templates.
    #[serde(default)]
    pub plants: Vec<PlantTemplate>,
    /// Creature species templates.
    #[serde(default)]
    pub creatures: Vec<CreatureTemplate>,
}

impl CatalogSource {
    /// Add a resource definition.
    pub fn with_resource(mut self, id: ResourceId, resource_type: impl Into<String>) -> Self {
        self.resources.push(ResourceDef {
            id,
            resource_type: resource_type.into(),
        });
        self
    }

    /// Add an object definition.
    pub fn with_object(mut self, object: ObjectDef) -> Self {
        self.objects.push(object);
        self
    }

    /// Add a plant template.
    pub fn with_plant(mut self, plant: PlantTemplate) -> Self {
        self.plants.push(plant);
        self
    }

    /// Add a creature template.
    pub fn with_creature(mut self, creature: CreatureTemplate) -> Self {
        self.creatures.push(creature);
        self
    }
}

/// Read-only lookup tables for all static data.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: BTreeMap<ResourceId, ResourceDef>,
    objects: BTreeMap<ObjectId, ObjectDef>,
    plants: BTreeMap<PlantId, PlantTemplate>,
    creatures: BTreeMap<CreatureTemplateId, CreatureTemplate>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and dangling references.
    pub fn new(source: CatalogSource) -> CoreResult<Self> {
        let mut catalog = Catalog::default();

        for r in source.resources {
            let id = r.id;
            if catalog.resources.insert(id, r).is_some() {
                return Err(duplicate(CatalogKind::Resource, id));
            }
        }
        for o in source.objects {
            let id = o.id;
            if id == 0 {
                return Err(CoreError::InvalidCatalog(
                    "object id 0 is reserved for empty tiles".into(),
                ));
            }
            if catalog.objects.insert(id, o).is_some() {
                return Err(duplicate(CatalogKind::Object, id));
            }
        }
        for p in source.plants {
            let id = p.id;
            if id == 0 {
                return Err(CoreError::InvalidCatalog(
                    "plant id 0 is reserved for \"no successor\"".into(),
                ));
            }
            if catalog.plants.insert(id, p).is_some() {
                return Err(duplicate(CatalogKind::Plant, id));
            }
        }
        for c in source.creatures {
            let id = c.id;
            if catalog.creatures.insert(id, c).is_some() {
                return Err(duplicate(CatalogKind::Creature, id));
            }
        }

        catalog.check_references()?;
        Ok(catalog)
    }

    /// Parse a JSON document with `resources`, `objects`, `plants` and
    /// `creatures` arrays.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let source: CatalogSource =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidCatalog(e.to_string()))?;
        Self::new(source)
    }

    fn check_references(&self) -> CoreResult<()> {
        for o in self.objects.values() {
            if o.resource_id != 0 && !self.resources.contains_key(&o.resource_id) {
                return Err(CoreError::InvalidCatalog(format!(
                    "object {} references unknown resource {}",
                    o.id, o.resource_id
                )));
            }
        }
        for p in self.plants.values() {
            if !self.objects.contains_key(&p.object_id) {
                return Err(CoreError::InvalidCatalog(format!(
                    "plant {} references unknown object {}",
                    p.id, p.object_id
                )));
            }
            if p.grown_id != 0 && !self.plants.contains_key(&p.grown_id) {
                return Err(CoreError::InvalidCatalog(format!(
                    "plant {} grows into unknown plant {}",
                    p.id, p.grown_id
                )));
            }
        }
        for c in self.creatures.values() {
            if !self.objects.contains_key(&c.object_id) {
                return Err(CoreError::InvalidCatalog(format!(
                    "creature {} references unknown object {}",
                    c.id, c.object_id
                )));
            }
            let mut seen = HashSet::new();
            for need in &c.needs {
                if !seen.insert(need.kind) {
                    return Err(CoreError::InvalidCatalog(format!(
                        "creature {} declares need {} twice",
                        c.id, need.kind
                    )));
                }
                if !(need.search_radius.is_finite() && need.search_radius >= 0.0) {
                    return Err(CoreError::InvalidCatalog(format!(
                        "creature {} need {} has search radius {}",
                        c.id, need.kind, need.search_radius
                    )));
                }
                if self.resource_by_type(&need.resource_type).is_none() {
                    return Err(CoreError::InvalidCatalog(format!(
                        "creature {} need {} uses unknown resource type {:?}",
                        c.id, need.kind, need.resource_type
                    )));
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Look up a resource definition.
    pub fn resource(&self, id: ResourceId) -> CoreResult<&ResourceDef> {
        self.resources.get(&id).ok_or(CoreError::MissingCatalogEntry {
            kind: CatalogKind::Resource,
            id,
        })
    }

    /// Look up an object definition.
    pub fn object(&self, id: ObjectId) -> CoreResult<&ObjectDef> {
        self.objects.get(&id).ok_or(CoreError::MissingCatalogEntry {
            kind: CatalogKind::Object,
            id,
        })
    }

    /// Look up a plant template.
    pub fn plant_template(&self, id: PlantId) -> CoreResult<&PlantTemplate> {
        self.plants.get(&id).ok_or(CoreError::MissingCatalogEntry {
            kind: CatalogKind::Plant,
            id,
        })
    }

    /// Look up a creature template.
    pub fn creature_template(&self, id: CreatureTemplateId) -> CoreResult<&CreatureTemplate> {
        self.creatures.get(&id).ok_or(CoreError::MissingCatalogEntry {
            kind: CatalogKind::Creature,
            id,
        })
    }

    /// Find a resource by its type name.
    pub fn resource_by_type(&self, resource_type: &str) -> Option<&ResourceDef> {
        self.resources
            .values()
            .find(|r| r.resource_type == resource_type)
    }

    /// All objects exposing a resource of the given type, in id order.
    pub fn objects_of_type(&self, resource_type: &str) -> Vec<&ObjectDef> {
        self.objects
            .values()
            .filter(|o| {
                self.resources
                    .get(&o.resource_id)
                    .is_some_and(|r| r.resource_type == resource_type)
            })
            .collect()
    }

    /// Plant templates that are no other template's successor.
    pub fn seed_plants(&self) -> Vec<&PlantTemplate> {
        let successors: HashSet<PlantId> = self.plants.values().map(|p| p.grown_id).collect();
        self.plants
            .values()
            .filter(|p| !successors.contains(&p.id))
            .collect()
    }

    /// All creature templates in id order.
    pub fn creature_templates(&self) -> impl Iterator<Item = &CreatureTemplate> {
        self.creatures.values()
    }

    /// Number of entries per table: resources, objects, plants, creatures.
    pub fn counts(&self) -> [usize; 4] {
        [
            self.resources.len(),
            self.objects.len(),
            self.plants.len(),
            self.creatures.len(),
        ]
    }
}

fn duplicate(kind: CatalogKind, id: u32) -> CoreError {
    CoreError::InvalidCatalog(format!("{kind} id {id} defined more than once"))
}
