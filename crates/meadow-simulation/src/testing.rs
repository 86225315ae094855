//! Shared fixtures for unit tests.

use std::sync::Arc;

use meadow_core::catalog::{
    Catalog, CatalogSource, CreatureTemplate, NeedSpec, ObjectDef, PlantTemplate,
};
use meadow_core::entity::NeedKind;

pub(crate) const DIRT: u32 = 1;
pub(crate) const GRASS: u32 = 2;
pub(crate) const SPROUT: u32 = 5;
pub(crate) const BUSH: u32 = 6;
pub(crate) const POND: u32 = 8;
pub(crate) const CHICK: u32 = 9;

pub(crate) const SEEDLING: u32 = 7;
pub(crate) const BERRY_BUSH: u32 = 42;
pub(crate) const CHICKEN: u32 = 1;

fn object(id: u32, name: &str, resource_id: u32, default_amount: f32) -> ObjectDef {
    ObjectDef {
        id,
        sprite_id: id * 10,
        name: name.into(),
        resource_id,
        default_amount,
    }
}

pub(crate) fn catalog() -> Arc<Catalog> {
    let source = CatalogSource::default()
        .with_resource(1, "plant_matter")
        .with_resource(2, "ground")
        .with_resource(3, "water")
        .with_object(object(DIRT, "Dirt", 2, 0.0))
        .with_object(object(GRASS, "Grass", 2, 0.0))
        .with_object(object(SPROUT, "Sprout", 1, 0.0))
        .with_object(object(BUSH, "Bush", 1, 5.0))
        .with_object(object(POND, "Pond", 3, 100.0))
        .with_object(object(CHICK, "Chick", 0, 0.0))
        .with_plant(PlantTemplate {
            id: SEEDLING,
            object_id: SPROUT,
            species: "berry".into(),
            name: "seedling".into(),
            grown_id: BERRY_BUSH,
            growth_rate: 0.5,
            growth_speed: 2.0,
            max_growth: 10.0,
        })
        .with_plant(PlantTemplate {
            id: BERRY_BUSH,
            object_id: BUSH,
            species: "berry".into(),
            name: "bush".into(),
            grown_id: 0,
            growth_rate: 1.0,
            growth_speed: 1.0,
            max_growth: 20.0,
        })
        .with_creature(CreatureTemplate {
            id: CHICKEN,
            object_id: CHICK,
            species: "chicken".into(),
            subspecies: "bantam".into(),
            name: "Chick".into(),
            needs: vec![
                NeedSpec {
                    kind: NeedKind::Hunger,
                    initial: 1.0,
                    decay_per_second: 0.1,
                    critical: 0.5,
                    resource_type: "plant_matter".into(),
                    search_radius: 2.0,
                    satisfy_per_unit: 0.25,
                },
                NeedSpec {
                    kind: NeedKind::Thirst,
                    initial: 1.0,
                    decay_per_second: 0.05,
                    critical: 0.3,
                    resource_type: "water".into(),
                    search_radius: 3.0,
                    satisfy_per_unit: 0.1,
                },
            ],
        });
    Arc::new(Catalog::new(source).expect("fixture catalog is consistent"))
}
