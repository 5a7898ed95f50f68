use clap::{Parser, Subcommand};
use pc_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run_with_progress, list_runs, load_run,
    load_scenario, lookup_chemical, open_chemical_store, summarize, zone_reports,
};
use pc_chem::{Chemical, ThresholdKind};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plumecast")]
#[command(about = "Plumecast - chemical release and atmospheric dispersion simulator", long_about = None)]
struct Cli {
    /// Chemical property file (YAML or JSON); defaults to the built-in catalog
    #[arg(long, global = true)]
    chemicals: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Run a scenario and store its results
    Run {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// Run store directory (defaults to .plumecast/runs beside the scenario)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs of a scenario
    Runs {
        scenario_path: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the release-rate series of a stored run as CSV
    ExportRelease {
        scenario_path: PathBuf,
        run_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a chemical's properties
    Chemical {
        /// Name, alias or CAS number
        name: String,
    },
    /// List a chemical's exposure thresholds
    Thresholds {
        /// Name, alias or CAS number
        name: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let chemicals = cli.chemicals.as_deref();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            out,
            no_cache,
        } => cmd_run(&scenario_path, out, !no_cache, chemicals),
        Commands::Runs { scenario_path, out } => cmd_runs(&scenario_path, out.as_deref()),
        Commands::ExportRelease {
            scenario_path,
            run_id,
            out,
            output,
        } => cmd_export_release(&scenario_path, &run_id, out.as_deref(), output.as_deref()),
        Commands::Chemical { name } => cmd_chemical(&name, chemicals),
        Commands::Thresholds { name } => cmd_thresholds(&name, chemicals),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_scenario(scenario_path)?;
    let summary = summarize(&scenario);
    println!("✓ Scenario is valid");
    println!(
        "  {} - {} release of {}, stability {}, wind {:.1} m/s, {} grid points",
        summary.id,
        summary.source_kind,
        summary.chemical,
        summary.stability,
        summary.wind_speed_m_s,
        summary.grid_points
    );
    Ok(())
}

fn cmd_run(scenario_path: &Path, out: Option<PathBuf>, use_cache: bool, chemicals: Option<&Path>) -> AppResult<()> {
    println!("Running scenario: {}", scenario_path.display());
    let store = open_chemical_store(chemicals)?;

    let request = RunRequest {
        scenario_path,
        options: RunOptions {
            use_cache,
            store_dir: out,
        },
    };

    let mut last_stage = None;
    let response = ensure_run_with_progress(
        &request,
        &store,
        Some(&mut |event| {
            if last_stage != Some(event.stage) {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    let manifest = &response.manifest;
    let s = &manifest.summary;
    println!("  Chemical: {}", manifest.chemical);
    println!("  Source: {} ({:.1} kg released, peak {:.3} kg/s)", manifest.source_kind, s.total_released_kg, s.peak_rate_kg_s);
    println!(
        "  Dispersion: {} (strength {:.3}, max {:.1} ppm)",
        manifest.dispersion_model.label(),
        s.dispersion_strength,
        s.max_concentration_ppm
    );
    println!("  Elapsed: {:.2}s", response.elapsed_wall_s);

    let reports = zone_reports(&response.artifacts);
    if reports.is_empty() {
        println!("\nNo threat zones: the chemical publishes no thresholds");
    } else {
        println!("\nThreat zones:");
        for z in reports {
            println!(
                "  {:<7} {:>10.1} ppm  area {:>12.0} m²  downwind {:>8.0} m  centerline {:>8.0} m  ({} polygons)",
                z.kind, z.level_ppm, z.area_m2, z.max_downwind_m, z.centerline_distance_m, z.polygons
            );
        }
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    if event.stage == RunStage::Completed {
        return;
    }
    let mut line = format!("\r{}  elapsed={:.2}s", event.stage.label(), event.elapsed_wall_s);
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{:<80}", line);
    let _ = io::stdout().flush();
}

fn cmd_runs(scenario_path: &Path, out: Option<&Path>) -> AppResult<()> {
    let runs = list_runs(scenario_path, out)?;
    if runs.is_empty() {
        println!("No stored runs for {}", scenario_path.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {} ({}, {}, {})",
                manifest.run_id,
                manifest.timestamp,
                manifest.dispersion_model.label(),
                manifest.solver_version
            );
        }
    }
    Ok(())
}

fn cmd_export_release(scenario_path: &Path, run_id: &str, out: Option<&Path>, output: Option<&Path>) -> AppResult<()> {
    let (_manifest, artifacts) = load_run(scenario_path, out, run_id)?;

    let mut csv = String::from("time_s,mass_flow_kg_s,airborne_kg_s,temperature_k,vapor,aerosol,liquid,released_kg\n");
    for s in &artifacts.release.samples {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            s.time_s,
            s.mass_flow_kg_s,
            s.airborne_kg_s,
            s.temperature_k,
            s.phase.vapor,
            s.phase.aerosol,
            s.phase.liquid,
            s.released_kg
        ));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} samples to {}",
            artifacts.release.samples.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_chemical(name: &str, chemicals: Option<&Path>) -> AppResult<()> {
    let store = open_chemical_store(chemicals)?;
    let c = lookup_chemical(&store, name)?;
    println!("{} (CAS {})", c.name, c.cas);
    if !c.aliases.is_empty() {
        println!("  Aliases: {}", c.aliases.join(", "));
    }
    println!("  Molecular weight: {:.3} g/mol", c.molecular_weight_g_mol);
    println!("  Boiling point: {:.2} K", c.boiling_point_k);
    println!("  Freezing point: {:.2} K", c.freezing_point_k);
    println!("  Liquid density: {:.1} kg/m³", c.liquid_density_kg_m3);
    println!("  Latent heat: {:.0} J/kg", c.latent_heat_j_kg);
    println!("  Critical point: {:.2} K, {:.0} Pa", c.critical_temperature_k, c.critical_pressure_pa);
    println!("  Vapor pressure at 298.15 K: {:.0} Pa", c.vapor_pressure_pa(298.15));
    print_thresholds(&c);
    Ok(())
}

fn cmd_thresholds(name: &str, chemicals: Option<&Path>) -> AppResult<()> {
    let store = open_chemical_store(chemicals)?;
    let c = lookup_chemical(&store, name)?;
    println!("{} (CAS {})", c.name, c.cas);
    print_thresholds(&c);
    Ok(())
}

fn print_thresholds(c: &Chemical) {
    let available = c.thresholds.available();
    if available.is_empty() {
        println!("  No published exposure thresholds");
        return;
    }
    println!("  Thresholds (ppm):");
    for kind in ThresholdKind::ALL {
        match c.thresholds.get(kind) {
            Some(v) => println!("    {:<7} {}", kind.label(), v),
            None => println!("    {:<7} -", kind.label()),
        }
    }
}
