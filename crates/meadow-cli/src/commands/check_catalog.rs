use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

pub fn run(path: &Path) -> Result<(), String> {
    let catalog = super::load_catalog(path)?;
    let [resources, objects, plants, creatures] = catalog.counts();

    println!("  All checks passed for '{}'.", path.display());
    println!(
        "  {resources} resources, {objects} objects, {plants} plant stages, {creatures} creature templates"
    );
    println!();

    let seeds = catalog.seed_plants();
    if seeds.is_empty() {
        println!("  {}", "(no seed plants)".dimmed());
        println!();
    } else {
        println!("  {}", "Growth Chains".bold().underline());
        println!();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Species", "Stages"]);
        for seed in seeds {
            let mut stages = vec![seed.name.clone()];
            let mut next = seed.grown_id;
            // Catalog validation rejects dangling successors, but not cycles.
            while next != 0 && stages.len() <= plants {
                let Ok(stage) = catalog.plant_template(next) else {
                    break;
                };
                stages.push(stage.name.clone());
                next = stage.grown_id;
            }
            table.add_row(vec![seed.species.clone(), stages.join(" -> ")]);
        }
        println!("{table}");
        println!();
    }

    if creatures == 0 {
        return Ok(());
    }
    println!("  {}", "Creatures".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Species", "Name", "Needs"]);
    for template in catalog.creature_templates() {
        let needs = template
            .needs
            .iter()
            .map(|need| {
                format!(
                    "{} <- {} (r={})",
                    need.kind, need.resource_type, need.search_radius
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            template.id.to_string(),
            template.species.clone(),
            template.name.clone(),
            needs,
        ]);
    }
    println!("{table}");
    println!();

    Ok(())
}
