use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use wf_app::{
    RunOptions, RunProgressEvent, RunRequest, RunStage, delete_run, ensure_run,
    ensure_run_with_progress, export_csv, get_run_summary, list_runs, load_run, project_service, query,
};
use wf_core::Variable;
use wf_results::Flow;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Copy a demo project into a fresh directory so runs land in its own store.
fn demo_project(name: &str, tag: &str) -> PathBuf {
    let src = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name);
    let dir = unique_temp_dir(&format!("wf_app_{tag}"));
    let dst = dir.join(name);
    fs::copy(&src, &dst).expect("copy demo project");
    dst
}

#[test]
fn run_is_cached_and_reloaded() {
    let project = demo_project("single_pair.json", "cache");
    let request = RunRequest {
        project_path: &project,
        farm_id: "pair",
        options: RunOptions::default(),
    };

    let first = ensure_run(&request).expect("first run");
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.n_states, 1);
    assert_eq!(first.manifest.n_turbines, 2);
    assert!(first.manifest.failed_states.is_empty());

    let second = ensure_run(&request).expect("second run");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let runs = list_runs(&project, "pair").expect("list runs");
    assert_eq!(runs.len(), 1);

    let (manifest, results) = load_run(&project, &first.run_id).expect("load run");
    assert_eq!(manifest.farm_id, "pair");
    let ws = results.value(0, 1, Variable::WindSpeed, Flow::Waked).unwrap();
    let expected = 8.0 - 8.0 * 0.5 * (50.0f64 / 62.5).powi(2);
    assert!((ws - expected).abs() < 1e-12);

    let summary = get_run_summary(&results).expect("summary");
    assert!(summary.complete);
    assert!(summary.farm_efficiency.unwrap() < 1.0);

    let csv = export_csv(&results);
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(2).unwrap().contains(",T1,1,"));

    assert!(delete_run(&project, "../..").is_err());
    assert!(project.is_file());
    delete_run(&project, &first.run_id).expect("delete run");
    assert!(list_runs(&project, "pair").expect("list runs").is_empty());
    assert!(matches!(
        load_run(&project, &first.run_id),
        Err(wf_app::AppError::RunNotFound(_))
    ));
}

#[test]
fn sequential_and_uncached_runs_match() {
    let project = demo_project("two_rows.yaml", "sequential");
    let parallel = ensure_run(&RunRequest {
        project_path: &project,
        farm_id: "rows",
        options: RunOptions::default(),
    })
    .expect("parallel run");

    let sequential = ensure_run(&RunRequest {
        project_path: &project,
        farm_id: "rows",
        options: RunOptions {
            use_cache: false,
            parallel: Some(false),
            ..RunOptions::default()
        },
    })
    .expect("sequential run");
    assert!(!sequential.loaded_from_cache);
    assert_eq!(sequential.run_id, parallel.run_id);

    // The second run overwrote the first under the same id
    let (_, results) = load_run(&project, &parallel.run_id).expect("load run");
    let turbines = query::turbine_summaries(&results).expect("turbine summaries");
    assert_eq!(turbines.len(), 10);
    assert!(turbines.iter().all(|t| t.mean_ws > 0.0));
}

#[test]
fn progress_is_reported_per_state() {
    let project = demo_project("two_rows.yaml", "progress");
    let request = RunRequest {
        project_path: &project,
        farm_id: "rows",
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };
    let mut events: Vec<RunProgressEvent> = Vec::new();
    let response = ensure_run_with_progress(&request, Some(&mut |e| events.push(e)))
        .expect("run with progress");

    assert!(events.iter().any(|e| e.stage == RunStage::Compiling));
    let engine_events: Vec<_> = events.iter().filter_map(|e| e.states).collect();
    assert_eq!(engine_events.len(), response.manifest.n_states);
    assert!(engine_events
        .iter()
        .any(|p| p.completed == p.total && p.fraction_complete() == 1.0));
    assert!(matches!(events.last().map(|e| e.stage), Some(RunStage::Completed)));
    assert!(response.timing.total_time_s > 0.0);
}

#[test]
fn unknown_farm_and_missing_file() {
    let project = demo_project("single_pair.json", "errors");
    let err = ensure_run(&RunRequest {
        project_path: &project,
        farm_id: "nope",
        options: RunOptions::default(),
    })
    .unwrap_err();
    assert!(matches!(err, wf_app::AppError::FarmNotFound(_)));

    let missing = project.with_file_name("missing.yaml");
    assert!(matches!(
        project_service::load_project(&missing),
        Err(wf_app::AppError::ProjectFileRead { .. })
    ));
}

#[test]
fn project_is_saved_and_summarised() {
    let project_path = demo_project("single_pair.json", "save");
    let project = project_service::load_project(&project_path).expect("load project");

    let yaml_path = project_path.with_file_name("copy.yaml");
    project_service::save_project(&yaml_path, &project).expect("save project");
    let reloaded = project_service::load_project(&yaml_path).expect("reload project");
    assert_eq!(reloaded, project);

    let farms = project_service::list_farms(&reloaded);
    assert_eq!(farms.len(), 1);
    assert_eq!(farms[0].id, "pair");
    assert_eq!(farms[0].turbine_count, 2);
    assert_eq!(farms[0].state_count, 1);
    assert!(farms[0].fixed_order);
}
