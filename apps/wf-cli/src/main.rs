use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wf_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service,
    query, run_service,
};
use wf_results::RunManifest;
use wf_wakes::ParamDefault;

#[derive(Parser)]
#[command(name = "wf-cli")]
#[command(about = "WakeFlow CLI - wind farm wake propagation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List the registered models and their parameters
    Describe,
    /// List farms in a project
    Farms {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Run a farm over its states
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Farm ID (optional when the project has a single farm)
        farm_id: Option<String>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Evaluate states one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// List cached runs for a farm
    Runs {
        /// Path to the project file
        project_path: PathBuf,
        /// Farm ID (optional when the project has a single farm)
        farm_id: Option<String>,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Delete a cached run
    DeleteRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to delete
        run_id: String,
    },
    /// Export per state and turbine values of a run as CSV
    Export {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Describe => cmd_describe(),
        Commands::Farms { project_path } => cmd_farms(&project_path),
        Commands::Run {
            project_path,
            farm_id,
            no_cache,
            sequential,
        } => cmd_run(&project_path, farm_id.as_deref(), !no_cache, sequential),
        Commands::Runs {
            project_path,
            farm_id,
        } => cmd_runs(&project_path, farm_id.as_deref()),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::DeleteRun {
            project_path,
            run_id,
        } => cmd_delete_run(&project_path, &run_id),
        Commands::Export {
            project_path,
            run_id,
            output,
        } => cmd_export(&project_path, &run_id, output.as_deref()),
    }
}

/// The requested farm, or the only farm of the project.
fn resolve_farm_id(project_path: &Path, farm_id: Option<&str>) -> AppResult<String> {
    if let Some(id) = farm_id {
        return Ok(id.to_string());
    }
    let project = project_service::load_project(project_path)?;
    match project.farms.as_slice() {
        [only] => Ok(only.id.clone()),
        farms => Err(AppError::InvalidInput(format!(
            "project has {} farms, pass a farm ID",
            farms.len()
        ))),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_describe() -> AppResult<()> {
    for (kind, infos) in query::describe_models() {
        println!("{}s:", kind);
        for info in infos {
            println!("  {} - {}", info.name, info.doc);
            for p in info.params {
                let default = match p.default {
                    ParamDefault::Required => "required".to_string(),
                    ParamDefault::Optional => "optional".to_string(),
                    ParamDefault::Value(v) => format!("default {}", v),
                };
                println!("      {} ({}): {}", p.name, default, p.doc);
            }
        }
    }
    Ok(())
}

fn cmd_farms(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let farms = project_service::list_farms(&project);

    if farms.is_empty() {
        println!("No farms found in project");
    } else {
        println!("Farms in project:");
        for farm in farms {
            println!(
                "  {} - {} ({} turbines, {} states, wakes: [{}]{})",
                farm.id,
                farm.name,
                farm.turbine_count,
                farm.state_count,
                farm.wake_models.join(", "),
                if farm.fixed_order { ", fixed order" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    farm_id: Option<&str>,
    use_cache: bool,
    sequential: bool,
) -> AppResult<()> {
    let farm_id = resolve_farm_id(project_path, farm_id)?;
    println!("Running farm: {}", farm_id);
    tracing::debug!(farm = %farm_id, use_cache, sequential, "starting run");

    let request = RunRequest {
        project_path,
        farm_id: &farm_id,
        options: RunOptions {
            use_cache,
            parallel: sequential.then_some(false),
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let done = event.states.is_some_and(|p| p.completed == p.total);
            if event.states.is_none() || done || last_emit.elapsed().as_millis() >= 100 {
                render_cli_progress(&event);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }

    let timing = &response.timing;
    println!("\nTiming summary:");
    if response.loaded_from_cache {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    } else {
        println!("  Compile: {:.3}s", timing.compile_time_s);
        println!("  Engine:  {:.3}s", timing.engine_time_s);
        println!("  Save:    {:.3}s", timing.save_time_s);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);

    print_manifest_notes(&response.manifest);

    let (_manifest, results) = run_service::load_run(project_path, &response.run_id)?;
    print_summary(&query::get_run_summary(&results)?);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, event.states) {
        (RunStage::RunningEngine, Some(p)) => {
            let width = 28usize;
            let filled = ((p.fraction_complete() * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] {:>6.2}%  states={}/{}  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled)),
                p.fraction_complete() * 100.0,
                p.completed,
                p.total,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_manifest_notes(manifest: &RunManifest) {
    if !manifest.failed_states.is_empty() {
        println!("\nFailed states: {}", manifest.failed_states.len());
        for f in &manifest.failed_states {
            println!("  {}", f.message);
        }
    }
    if !manifest.warnings.is_empty() {
        println!("\nWarnings: {}", manifest.warnings.len());
        for w in manifest.warnings.iter().take(10) {
            println!("  {}", w);
        }
        if manifest.warnings.len() > 10 {
            println!("  ... {} more", manifest.warnings.len() - 10);
        }
    }
}

fn print_summary(summary: &query::RunSummary) {
    println!("\nRun Summary:");
    println!("  States:   {}", summary.n_states);
    println!("  Turbines: {}", summary.n_turbines);
    println!("  Weight sum: {:.6}", summary.weight_sum);
    if !summary.complete {
        println!("  Incomplete run: farm aggregates are not reported");
        return;
    }
    if let (Some(amb), Some(wak)) = (summary.ambient_power_w, summary.waked_power_w) {
        println!("  Mean power, ambient: {:.3} MW", amb / 1e6);
        println!("  Mean power, waked:   {:.3} MW", wak / 1e6);
    }
    if let Some(eff) = summary.farm_efficiency {
        println!("  Farm efficiency: {:.2}%", eff * 100.0);
    }
    if let Some(aep) = summary.annual_yield_gwh {
        println!("  Annual yield: {:.2} GWh", aep);
    }
}

fn cmd_runs(project_path: &Path, farm_id: Option<&str>) -> AppResult<()> {
    let farm_id = resolve_farm_id(project_path, farm_id)?;
    let runs = run_service::list_runs(project_path, &farm_id)?;

    if runs.is_empty() {
        println!("No cached runs found for farm: {}", farm_id);
    } else {
        println!("Cached runs for farm '{}':", farm_id);
        for manifest in runs {
            println!(
                "  {} ({}, engine {}, {} failed states)",
                manifest.run_id,
                manifest.timestamp,
                manifest.engine_version,
                manifest.failed_states.len()
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, results) = run_service::load_run(project_path, run_id)?;
    println!("  Farm: {}", manifest.farm_id);
    println!("  Created: {}", manifest.timestamp);
    println!("  Engine: {} ({:.3}s)", manifest.engine_version, manifest.elapsed_s);
    print_manifest_notes(&manifest);
    print_summary(&query::get_run_summary(&results)?);

    if results.is_complete() {
        println!("\nTurbines:");
        for t in query::turbine_summaries(&results)? {
            let eff = t
                .efficiency
                .map(|e| format!("{:.2}%", e * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<12} ws={:>6.2} m/s  power={:>8.3} MW  efficiency={}",
                t.name,
                t.mean_ws,
                t.mean_power_w / 1e6,
                eff
            );
        }
    }
    Ok(())
}

fn cmd_delete_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    run_service::delete_run(project_path, run_id)?;
    println!("✓ Deleted run: {}", run_id);
    Ok(())
}

fn cmd_export(project_path: &Path, run_id: &str, output: Option<&Path>) -> AppResult<()> {
    let (_manifest, results) = run_service::load_run(project_path, run_id)?;
    let csv = query::export_csv(&results);

    if let Some(path) = output {
        std::fs::write(path, &csv)?;
        println!(
            "✓ Exported {} rows to {}",
            csv.lines().count().saturating_sub(1),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}
