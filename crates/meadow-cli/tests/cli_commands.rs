#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "resources": [
        { "id": 1, "type": "plant_matter" },
        { "id": 2, "type": "ground" }
    ],
    "objects": [
        { "id": 1, "sprite_id": 0, "name": "Dirt", "resource_id": 2 },
        { "id": 5, "sprite_id": 5, "name": "Sprout", "resource_id": 1 },
        { "id": 6, "sprite_id": 6, "name": "Bush", "resource_id": 1, "amount": 5.0 },
        { "id": 9, "sprite_id": 9, "name": "Chick" }
    ],
    "plants": [
        { "id": 7, "object_id": 5, "species": "berry", "name": "seedling",
          "grown_id": 42, "growth_rate": 0.5, "growth_speed": 2.0, "max_growth": 10.0 },
        { "id": 42, "object_id": 6, "species": "berry", "name": "bush",
          "growth_rate": 1.0, "growth_speed": 1.0, "max_growth": 20.0 }
    ],
    "creatures": [
        { "id": 1, "object_id": 9, "species": "chicken", "name": "Chick",
          "needs": [
            { "kind": "hunger", "decay_per_second": 0.1, "critical": 0.5,
              "resource_type": "plant_matter", "search_radius": 2.0 }
          ] }
    ]
}"#;

/// Create a temp directory holding a valid catalog.
fn test_dir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(&catalog, CATALOG).unwrap();
    (dir, catalog)
}

fn meadow() -> Command {
    let mut cmd = Command::cargo_bin("meadow").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

// ---------------------------------------------------------------------------
// check-catalog
// ---------------------------------------------------------------------------

#[test]
fn check_catalog_passes_valid_catalog() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("check-catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("2 resources, 4 objects, 2 plant stages"))
                .and(predicate::str::contains("seedling -> bush"))
                .and(predicate::str::contains("Creatures"))
                .and(predicate::str::contains("hunger <- plant_matter (r=2)")),
        );
}

#[test]
fn check_catalog_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(&catalog, "{ not json").unwrap();
    meadow()
        .arg("check-catalog")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog"));
}

#[test]
fn check_catalog_rejects_unknown_need_resource() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(
        &catalog,
        CATALOG.replace("\"resource_type\": \"plant_matter\"", "\"resource_type\": \"nectar\""),
    )
    .unwrap();
    meadow()
        .arg("check-catalog")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource type"));
}

#[test]
fn check_catalog_rejects_dangling_successor() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(&catalog, CATALOG.replace("\"grown_id\": 42", "\"grown_id\": 99")).unwrap();
    meadow()
        .arg("check-catalog")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown plant 99"));
}

#[test]
fn check_catalog_missing_file() {
    meadow()
        .args(["check-catalog", "/nonexistent/catalog.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read catalog"));
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_prints_summary() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--seconds", "10", "--fps", "5", "--width", "4", "--height", "4"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("In-world time: Year 1, January 1, 00:00:10")
                .and(predicate::str::contains("0 creatures")),
        );
}

#[test]
fn simulate_with_creature_and_save() {
    let (dir, catalog) = test_dir();
    let save = dir.path().join("save.json");
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--seconds", "3", "--width", "4", "--height", "4"])
        .args(["--creature", "1@40,40"])
        .arg("--save")
        .arg(&save)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1 creatures")
                .and(predicate::str::contains("Creatures"))
                .and(predicate::str::contains("chicken")),
        );
    assert!(save.exists());

    meadow()
        .arg("inspect")
        .arg(&save)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("version 1")
                .and(predicate::str::contains("00:00:03"))
                .and(predicate::str::contains("1 creatures"))
                .and(predicate::str::contains("hunger")),
        );
}

#[test]
fn simulate_continues_from_save() {
    let (dir, catalog) = test_dir();
    let save = dir.path().join("save.json");
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--seconds", "4", "--width", "2", "--height", "2"])
        .arg("--save")
        .arg(&save)
        .assert()
        .success();

    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--load")
        .arg(&save)
        .args(["--seconds", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:00:06"));
}

#[test]
fn simulate_speed_scales_time() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--seconds", "5", "--speed", "2", "--width", "2", "--height", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:00:10"));
}

#[test]
fn simulate_unknown_creature_template_fails() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--seconds", "1", "--creature", "77@0,0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("simulation error"));
}

#[test]
fn simulate_rejects_bad_creature_spec() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--creature", "chicken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected ID@X,Y"));
}

#[test]
fn simulate_rejects_negative_speed() {
    let (_dir, catalog) = test_dir();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--speed=-1"])
        .assert()
        .failure();
}

#[test]
fn simulate_bad_load_fails() {
    let (dir, catalog) = test_dir();
    let save = dir.path().join("broken.json");
    fs::write(&save, "[]").unwrap();
    meadow()
        .arg("simulate")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--load")
        .arg(&save)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load"));
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_missing_file() {
    meadow()
        .args(["inspect", "/nonexistent/save.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn inspect_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let save = dir.path().join("save.json");
    fs::write(&save, "not json").unwrap();
    meadow()
        .arg("inspect")
        .arg(&save)
        .assert()
        .failure();
}
