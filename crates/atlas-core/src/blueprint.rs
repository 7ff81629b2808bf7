//! Blueprint file I/O: the declarative JSON array of locations that seeds the
//! world graph.
//!
//! Loading enforces the per-location coverage invariant (a direction lives in
//! at most one of exits/pending/forbidden) and reports every violation at
//! once. Destinations are deliberately not resolved here: a blueprint may
//! reference locations seeded in an earlier run, and unresolvable ones are the
//! scanner's dangling-exit class, not a load error.

use crate::world::Location;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Load and validate a blueprint file.
pub fn load_blueprint(path: &Path) -> Result<Vec<Location>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint {}", path.display()))?;
    let locations: Vec<Location> = serde_json::from_str(&json)
        .with_context(|| format!("invalid blueprint JSON in {}", path.display()))?;

    let violations = validate_blueprint(&locations);
    if !violations.is_empty() {
        anyhow::bail!(
            "blueprint {} violates graph invariants:\n  - {}",
            path.display(),
            violations.join("\n  - ")
        );
    }
    Ok(locations)
}

/// Write a blueprint file, creating parent directories if needed.
pub fn save_blueprint(path: &Path, locations: &[Location]) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(locations).context("failed to serialize blueprint")?;
    fs::write(path, json).with_context(|| format!("failed to write blueprint {}", path.display()))?;
    Ok(())
}

/// Check the blueprint-level invariants, returning every violation found.
/// An empty result means the blueprint is safe to seed or merge into.
pub fn validate_blueprint(locations: &[Location]) -> Vec<String> {
    let mut violations = Vec::new();
    let mut seen_ids = BTreeSet::new();

    for location in locations {
        if !seen_ids.insert(location.id.clone()) {
            violations.push(format!("duplicate location id '{}'", location.id));
        }

        let mut exit_directions = BTreeSet::new();
        for exit in &location.exits {
            if !exit_directions.insert(exit.direction) {
                violations.push(format!(
                    "{}: duplicate hard exit direction '{}'",
                    location.id, exit.direction
                ));
            }
        }

        let availability = &location.exit_availability;
        for direction in exit_directions {
            if availability.pending.contains_key(&direction) {
                violations.push(format!(
                    "{}: direction '{direction}' is both a hard exit and pending",
                    location.id
                ));
            }
            if availability.forbidden.contains_key(&direction) {
                violations.push(format!(
                    "{}: direction '{direction}' is both a hard exit and forbidden",
                    location.id
                ));
            }
        }
        for direction in availability.pending.keys() {
            if availability.forbidden.contains_key(direction) {
                violations.push(format!(
                    "{}: direction '{direction}' is both pending and forbidden",
                    location.id
                ));
            }
        }
    }

    violations
}
