//! CLI binary for Atlas: seed, evolve, and audit text-world location graphs.

mod paths;

use anyhow::{Context, Result};
use atlas_core::config::AtlasConfig;
use atlas_core::filestore::FileStore;
use atlas_core::store::StoreError;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "atlas", about = "World location graph engine for text exploration games")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the world store from the blueprint (idempotent)
    Seed {
        /// Blueprint path relative to the project root (defaults to [world] data)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Validate an additions file and merge it into the blueprint
    Merge {
        /// Blueprint path (defaults to [world] data)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Additions file to merge
        #[arg(short, long)]
        additions: PathBuf,

        /// Report what would change without writing the blueprint
        #[arg(long)]
        dry_run: bool,
    },

    /// Scan the stored world for consistency anomalies
    Scan {
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra anchor location ids, comma-separated (extends [world] anchors)
        #[arg(long)]
        seed_locations: Option<String>,
    },

    /// Propose availability entries from location descriptions
    Detect {
        /// Blueprint path (defaults to [world] data)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the blueprint as DOT (Graphviz) or Mermaid flowchart
    Export {
        /// Output format: dot, mermaid
        #[arg(short, long, default_value = "dot")]
        format: String,

        /// Blueprint path (defaults to [world] data)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Show world store and configuration summary
    Info,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            // Store faults are infrastructure, everything else is input.
            if err
                .chain()
                .any(|cause| cause.downcast_ref::<StoreError>().is_some())
            {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Seed { data } => cmd_seed(&project_root, data.as_deref()),
        Commands::Merge {
            data,
            additions,
            dry_run,
        } => cmd_merge(&project_root, data.as_deref(), &additions, dry_run),
        Commands::Scan {
            output,
            seed_locations,
        } => cmd_scan(&project_root, output.as_deref(), seed_locations.as_deref()),
        Commands::Detect { data, output } => {
            cmd_detect(&project_root, data.as_deref(), output.as_deref())
        }
        Commands::Export { format, data } => cmd_export(&project_root, &format, data.as_deref()),
        Commands::Info => cmd_info(&project_root),
    }
}

/// Blueprint path: the explicit flag or the configured [world] data default.
fn blueprint_path(
    project_root: &Path,
    config: &AtlasConfig,
    data: Option<&Path>,
) -> Result<PathBuf> {
    match data {
        Some(p) => paths::resolve_inside(project_root, p),
        None => paths::resolve_inside(project_root, Path::new(&config.world.data)),
    }
}

/// Open the durable store, or refuse when the configured mode has none.
fn open_store(project_root: &Path, config: &AtlasConfig) -> Result<FileStore, StoreError> {
    if !config.storage.is_store_mode() {
        return Err(StoreError::WrongMode(config.storage.mode.clone()));
    }
    FileStore::open(project_root, config.storage.compress)
}

fn cmd_seed(project_root: &Path, data: Option<&Path>) -> Result<ExitCode> {
    use indicatif::{ProgressBar, ProgressStyle};

    let config = AtlasConfig::load(project_root)?;
    let blueprint_file = blueprint_path(project_root, &config, data)?;
    let blueprint = atlas_core::blueprint::load_blueprint(&blueprint_file)?;
    tracing::debug!(
        "loaded {} locations from {}",
        blueprint.len(),
        blueprint_file.display()
    );

    let mut store = open_store(project_root, &config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("Seeding {} locations...", blueprint.len()));

    let summary = atlas_engine::seed::seed_blueprint(&mut store, &blueprint)?;
    store.flush()?;
    spinner.finish_and_clear();

    let _ = atlas_core::filestore::ensure_gitignore(project_root);

    eprintln!("World seeded.");
    eprintln!(
        "  Locations: {} created, {} updated, {} unchanged",
        summary.locations_created, summary.locations_updated, summary.locations_unchanged
    );
    eprintln!(
        "  Exits: {} created, {} existing, {} conflict(s)",
        summary.exits_created, summary.exits_existing, summary.exit_conflicts
    );
    eprintln!(
        "  Availability: {} added, {} already covered",
        summary.availability_added, summary.availability_skipped
    );
    if summary.is_noop() {
        eprintln!("  Store already matched the blueprint; nothing changed.");
    }
    eprintln!("  Saved to: {}", store.path().display());

    Ok(ExitCode::SUCCESS)
}

fn cmd_merge(
    project_root: &Path,
    data: Option<&Path>,
    additions: &Path,
    dry_run: bool,
) -> Result<ExitCode> {
    let config = AtlasConfig::load(project_root)?;
    let blueprint_file = blueprint_path(project_root, &config, data)?;
    let additions_file = paths::resolve_inside(project_root, additions)?;

    let mut blueprint = atlas_core::blueprint::load_blueprint(&blueprint_file)?;
    let entries = atlas_engine::additions::load_additions(&additions_file)?;
    let valid = atlas_engine::additions::validate_additions(&entries)?;

    let outcome = atlas_engine::additions::apply_additions(&mut blueprint, &valid);

    if dry_run {
        eprintln!(
            "Dry run: {} addition(s) would apply, {} would be skipped.",
            outcome.applied.len(),
            outcome.skipped.len()
        );
    } else if outcome.applied.is_empty() {
        eprintln!("Nothing to apply; blueprint left untouched.");
    } else {
        atlas_core::blueprint::save_blueprint(&blueprint_file, &blueprint)?;
        eprintln!(
            "Merged {} addition(s) into {}",
            outcome.applied.len(),
            blueprint_file.display()
        );
    }
    if !dry_run && !outcome.skipped.is_empty() {
        eprintln!(
            "Skipped {} addition(s): unknown location or direction already covered.",
            outcome.skipped.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_scan(
    project_root: &Path,
    output: Option<&Path>,
    seed_locations: Option<&str>,
) -> Result<ExitCode> {
    let config = AtlasConfig::load(project_root)?;
    let output = output
        .map(|p| paths::resolve_inside(project_root, p))
        .transpose()?;

    let mut anchors: BTreeSet<String> = config.world.anchors.iter().cloned().collect();
    if let Some(list) = seed_locations {
        anchors.extend(
            list.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from),
        );
    }

    let mut store = open_store(project_root, &config)?;
    let report = atlas_inspect::scan::scan_world(&mut store, &anchors)?;

    let json = serde_json::to_string_pretty(&report)?;
    match &output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    eprintln!(
        "Scanned {} locations, {} exits: {} dangling, {} orphan(s), {} missing reciprocal(s)",
        report.summary.total_locations,
        report.summary.total_exits,
        report.summary.dangling_exits_count,
        report.summary.orphan_locations_count,
        report.summary.missing_reciprocal_count
    );

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Anomalies are findings, not faults.
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_detect(project_root: &Path, data: Option<&Path>, output: Option<&Path>) -> Result<ExitCode> {
    let config = AtlasConfig::load(project_root)?;
    let blueprint_file = blueprint_path(project_root, &config, data)?;
    let output = output
        .map(|p| paths::resolve_inside(project_root, p))
        .transpose()?;
    let blueprint = atlas_core::blueprint::load_blueprint(&blueprint_file)?;

    let report = atlas_inspect::detect::detect_candidates(&blueprint);

    let json = serde_json::to_string_pretty(&report)?;
    match &output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    eprintln!(
        "{} candidate(s) across {} location(s); {} skipped without descriptions",
        report.summary.total_candidates,
        report.summary.locations_scanned,
        report.summary.locations_skipped
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_export(project_root: &Path, format: &str, data: Option<&Path>) -> Result<ExitCode> {
    let config = AtlasConfig::load(project_root)?;
    let blueprint_file = blueprint_path(project_root, &config, data)?;
    let blueprint = atlas_core::blueprint::load_blueprint(&blueprint_file)?;
    let anchors: BTreeSet<String> = config.world.anchors.iter().cloned().collect();

    let export_format = match format {
        "dot" | "graphviz" => atlas_inspect::export::ExportFormat::Dot,
        "mermaid" | "md" => atlas_inspect::export::ExportFormat::Mermaid,
        _ => anyhow::bail!("Unknown export format: {}. Use 'dot' or 'mermaid'.", format),
    };

    let output = atlas_inspect::export::export(&blueprint, &anchors, export_format);
    print!("{}", output);

    Ok(ExitCode::SUCCESS)
}

fn cmd_info(project_root: &Path) -> Result<ExitCode> {
    let config = AtlasConfig::load(project_root)?;

    println!("Storage mode: {}", config.storage.mode);
    println!(
        "Compression: {}",
        if config.storage.compress { "zstd" } else { "off" }
    );
    println!("Blueprint: {}", config.world.data);
    if !config.world.anchors.is_empty() {
        println!("Anchors: {}", config.world.anchors.join(", "));
    }

    if !config.storage.is_store_mode() {
        println!("World file: none (memory mode)");
        return Ok(ExitCode::SUCCESS);
    }
    if !atlas_core::filestore::world_exists(project_root) {
        println!("World file: not seeded yet");
        return Ok(ExitCode::SUCCESS);
    }

    let mut store = FileStore::open(project_root, config.storage.compress)?;
    let vertices = atlas_core::store::fetch_vertices(&mut store)?;
    let edges = atlas_core::store::fetch_edges(&mut store)?;
    let availability: usize = vertices
        .iter()
        .map(|v| v.availability.pending.len() + v.availability.forbidden.len())
        .sum();

    println!("World file: {}", store.path().display());
    println!("  Locations: {}", vertices.len());
    println!("  Exits: {}", edges.len());
    println!("  Availability entries: {}", availability);

    Ok(ExitCode::SUCCESS)
}
