use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use meadow_core::CalendarTime;
use meadow_simulation::persistence;

pub fn run(path: &Path) -> Result<(), String> {
    let save =
        persistence::read(path).map_err(|e| format!("cannot read '{}': {e}", path.display()))?;

    println!(
        "  {} '{}' {}",
        "Save".bold(),
        path.display(),
        format!("(version {})", save.version).dimmed()
    );
    println!("  Saved at: {}", save.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "  In-world time: {}",
        CalendarTime::from_seconds(save.calendar_seconds)
    );
    println!(
        "  {} tiles, {} plants, {} creatures (next id #{})",
        save.tiles.len(),
        save.plants.len(),
        save.creatures.len(),
        save.next_id
    );
    println!();

    let mut layers: BTreeMap<u32, usize> = BTreeMap::new();
    for saved in &save.tiles {
        *layers.entry(saved.tile.layer).or_default() += 1;
    }
    if !layers.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Layer", "Tiles"]);
        for (layer, count) in &layers {
            table.add_row(vec![layer.to_string(), count.to_string()]);
        }
        println!("{table}");
        println!();
    }

    if !save.creatures.is_empty() {
        println!("  {}", "Creatures".bold().underline());
        println!();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Id", "Name", "Species", "Activity", "Needs"]);
        for saved in &save.creatures {
            let creature = &saved.creature;
            let needs = creature
                .needs
                .iter()
                .map(|(kind, level)| format!("{kind} {level:.2}"))
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                saved.id.to_string(),
                creature.name.clone(),
                creature.species.clone(),
                creature.activity.to_string(),
                needs,
            ]);
        }
        println!("{table}");
        println!();
    }

    Ok(())
}
