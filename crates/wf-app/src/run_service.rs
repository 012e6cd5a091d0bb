//! Run execution and caching service.

use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use tracing::{info, warn};
use wf_engine::{ENGINE_VERSION, EngineOutput, Progress, WakeEngine};
use wf_farm::StateSet;
use wf_project::FarmDef;
use wf_results::{FailedState, FarmResults, RunManifest, RunStore};
use wf_wakes::ModelBook;

use crate::compile::{self, FarmRuntime};
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage, StateProgress};
use crate::project_service;

/// Options for running a farm.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    /// Overrides the farm's `engine.parallel` setting when set.
    pub parallel: Option<bool>,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            parallel: None,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub farm_id: &'a str,
    pub options: RunOptions,
}

/// Wall-clock breakdown of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub engine_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    states: Option<StateProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            states,
        });
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingProject,
        started,
        Some("Loading project".to_string()),
        None,
    );
    let project = project_service::load_project(request.project_path)?;
    let farm = project_service::get_farm(&project, request.farm_id)?;

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    let run_id = wf_results::compute_run_id(farm, &request.options.engine_version);
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(run_id = %run_id, farm = %farm.id, "loaded cached run");

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    let manifest = execute_run(
        farm,
        &store,
        &run_id,
        &request.options,
        &mut progress_cb,
        started,
        &mut timing,
    )?;
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

fn execute_run(
    farm: &FarmDef,
    store: &RunStore,
    run_id: &str,
    options: &RunOptions,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    timing: &mut RunTimingSummary,
) -> AppResult<RunManifest> {
    emit_progress(
        progress_cb,
        RunStage::Compiling,
        started,
        Some(format!("Compiling farm '{}'", farm.id)),
        None,
    );
    let compile_started = Instant::now();
    let book = ModelBook::new();
    let FarmRuntime {
        layout,
        states,
        mut config,
    } = compile::compile_farm(farm, &book)?;
    if let Some(parallel) = options.parallel {
        config = config.with_parallel(parallel);
    }
    let engine = WakeEngine::new(layout, config)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    let engine_started = Instant::now();
    let output = run_engine(&engine, &states, progress_cb, started)?;
    timing.engine_time_s = engine_started.elapsed().as_secs_f64();

    emit_progress(
        progress_cb,
        RunStage::SavingResults,
        started,
        Some("Saving results".to_string()),
        None,
    );
    let save_started = Instant::now();
    let manifest = build_manifest(run_id, &farm.id, &options.engine_version, &output);
    store.save_run(&manifest, &output.results)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();

    if !manifest.failed_states.is_empty() {
        warn!(
            run_id = %run_id,
            failed = manifest.failed_states.len(),
            "run finished with failed states"
        );
    }
    info!(
        run_id = %run_id,
        farm = %farm.id,
        states = manifest.n_states,
        turbines = manifest.n_turbines,
        elapsed_s = output.elapsed_s,
        "run saved"
    );
    Ok(manifest)
}

/// Run the engine on a worker thread and forward its per-state progress to
/// `progress_cb` on the calling thread.
fn run_engine(
    engine: &WakeEngine,
    states: &StateSet,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
) -> AppResult<EngineOutput> {
    let (tx, rx) = mpsc::channel::<Progress>();
    std::thread::scope(|scope| {
        let worker = scope.spawn(move || {
            engine.run_with_progress(states, move |p| {
                let _ = tx.send(p);
            })
        });
        for p in rx {
            emit_progress(
                progress_cb,
                RunStage::RunningEngine,
                started,
                None,
                Some(StateProgress {
                    completed: p.completed,
                    total: p.total,
                }),
            );
        }
        match worker.join() {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Engine("engine worker panicked".to_string())),
        }
    })
}

fn build_manifest(
    run_id: &str,
    farm_id: &str,
    engine_version: &str,
    output: &EngineOutput,
) -> RunManifest {
    let mut manifest = RunManifest::new(run_id.to_string(), farm_id, engine_version, &output.results);
    manifest.elapsed_s = output.elapsed_s;
    manifest.failed_states = output
        .failures
        .iter()
        .map(|f| FailedState {
            state: f.state,
            message: f.to_string(),
        })
        .collect();
    manifest.warnings = output.warnings.iter().map(|w| w.to_string()).collect();
    manifest
}

/// List runs for a farm, most recent first.
pub fn list_runs(project_path: &Path, farm_id: &str) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    let mut runs = store.list_runs(farm_id)?;
    runs.reverse();
    Ok(runs)
}

/// Load a specific run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, FarmResults)> {
    let store = RunStore::for_project(project_path)?;
    let manifest = store.load_manifest(run_id)?;
    let results = store.load_results(run_id)?;
    Ok((manifest, results))
}

/// Remove a stored run. Missing runs are not an error.
pub fn delete_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let store = RunStore::for_project(project_path)?;
    store.delete_run(run_id)?;
    info!(run_id = %run_id, "deleted run");
    Ok(())
}
