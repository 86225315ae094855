use std::collections::BTreeMap;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use meadow_core::{ControlAction, CreatureActivity, NeedKind, PlantActivity, Point, World};
use meadow_simulation::{SimConfig, Simulation};

pub struct SimulateArgs {
    pub catalog: PathBuf,
    pub load: Option<PathBuf>,
    pub seconds: u64,
    pub fps: u32,
    pub speed: f32,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub creatures: Vec<String>,
    pub save: Option<PathBuf>,
}

pub fn run(args: &SimulateArgs) -> Result<(), String> {
    if args.fps == 0 {
        return Err("--fps must be at least 1".into());
    }
    let catalog = super::load_catalog(&args.catalog)?;
    let spawns = args
        .creatures
        .iter()
        .map(|spec| parse_creature(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let config = SimConfig::default()
        .with_seed(args.seed)
        .with_speed(args.speed)
        .with_world_size(args.width, args.height);

    let mut sim = match &args.load {
        Some(path) => {
            let world = World::new(config.tile_size());
            let mut sim = Simulation::new(world, catalog, config)
                .map_err(|e| format!("simulation setup failed: {e}"))?;
            sim.load(path)
                .map_err(|e| format!("cannot load '{}': {e}", path.display()))?;
            sim
        }
        None => Simulation::generate(catalog, config)
            .map_err(|e| format!("world generation failed: {e}"))?,
    };

    for (creature_id, position) in spawns {
        sim.send(ControlAction::AddCreature {
            creature_id,
            position,
        });
    }

    let frames = args.seconds * u64::from(args.fps);
    let dt = 1.0 / args.fps as f32;
    sim.run(frames, dt)
        .map_err(|e| format!("simulation error: {e}"))?;

    if let Some(path) = &args.save {
        sim.save(path)
            .map_err(|e| format!("cannot save '{}': {e}", path.display()))?;
    }

    print_summary(&sim, args);
    Ok(())
}

/// Parse `TEMPLATE@X,Y`.
fn parse_creature(spec: &str) -> Result<(u32, Point), String> {
    let invalid = || format!("invalid creature '{spec}', expected ID@X,Y");
    let (id, position) = spec.split_once('@').ok_or_else(invalid)?;
    let (x, y) = position.split_once(',').ok_or_else(invalid)?;
    let id = id.trim().parse::<u32>().map_err(|_| invalid())?;
    let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
    let position = Point::new(x, y);
    if !position.is_finite() {
        return Err(invalid());
    }
    Ok((id, position))
}

fn print_summary(sim: &Simulation, args: &SimulateArgs) {
    let world = sim.world();
    let registry = world.registry();

    println!(
        "  {} {}",
        "Simulation".bold(),
        format!(
            "({}s at {} fps, speed={}, seed={})",
            args.seconds, args.fps, args.speed, args.seed
        )
        .dimmed()
    );
    println!("  In-world time: {}", sim.calendar());
    println!(
        "  {} tiles, {} plants, {} creatures",
        registry.tiles().count(),
        registry.plants().count(),
        registry.creatures().count()
    );
    if let Some(path) = &args.save {
        println!("  Saved to {}", path.display());
    }
    println!();

    // Plants, grouped by stage
    let mut stages: BTreeMap<(String, String), (usize, f32, usize)> = BTreeMap::new();
    for (_, plant) in registry.plants() {
        let entry = stages
            .entry((plant.species.clone(), plant.name.clone()))
            .or_default();
        entry.0 += 1;
        entry.1 += plant.growth;
        if plant.activity == PlantActivity::Dead {
            entry.2 += 1;
        }
    }
    if !stages.is_empty() {
        println!("  {}", "Plants".bold().underline());
        println!();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Species", "Stage", "Count", "Avg growth", "Dead"]);
        for ((species, stage), (count, growth, dead)) in &stages {
            table.add_row(vec![
                species.clone(),
                stage.clone(),
                count.to_string(),
                format!("{:.1}", growth / *count as f32),
                dead.to_string(),
            ]);
        }
        println!("{table}");
        println!();
    }

    // Creatures
    let creatures: Vec<_> = registry.creatures().collect();
    if creatures.is_empty() {
        return;
    }
    println!("  {}", "Creatures".bold().underline());
    println!();
    let kinds = [NeedKind::Hunger, NeedKind::Thirst, NeedKind::Rest];
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id", "Name", "Species", "Hunger", "Thirst", "Rest", "Activity", "Target",
    ]);
    for (id, creature) in creatures {
        let mut row = vec![
            id.to_string(),
            creature.name.clone(),
            creature.species.clone(),
        ];
        row.extend(kinds.iter().map(|kind| match creature.need(*kind) {
            Some(level) => format_need_bar(level),
            None => "--".to_string(),
        }));
        row.push(colorize_activity(creature.activity).to_string());
        row.push(
            creature
                .movement_target
                .map(|t| t.to_string())
                .unwrap_or_else(|| "--".to_string()),
        );
        table.add_row(row);
    }
    println!("{table}");
    println!();
}

fn colorize_activity(activity: CreatureActivity) -> colored::ColoredString {
    let label = activity.to_string();
    match activity {
        CreatureActivity::Idle => label.normal(),
        CreatureActivity::Seeking => label.cyan(),
        CreatureActivity::Feeding => label.green(),
        CreatureActivity::Dead => label.red().bold(),
    }
}

fn format_need_bar(val: f32) -> String {
    let pct = (val * 100.0) as u32;
    let filled = (val * 10.0).round() as usize;
    let empty = 10_usize.saturating_sub(filled);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));

    if val <= 0.15 {
        format!("[{}] {:>3}%", bar.red(), pct)
    } else if val <= 0.4 {
        format!("[{}] {:>3}%", bar.yellow(), pct)
    } else {
        format!("[{}] {:>3}%", bar.green(), pct)
    }
}
