//! Project loading, saving, validation, and introspection.

use std::path::Path;

use wf_project::{FarmDef, OrderingDef, Project, ProjectFormat, StatesDef};

use crate::error::{AppError, AppResult};

/// Summary of a farm for listing.
#[derive(Debug, Clone)]
pub struct FarmSummary {
    pub id: String,
    pub name: String,
    pub turbine_count: usize,
    pub turbine_type_count: usize,
    pub state_count: usize,
    pub wake_models: Vec<String>,
    pub fixed_order: bool,
}

/// Load a project (YAML or JSON by extension), migrated and validated.
pub fn load_project(path: &Path) -> AppResult<Project> {
    wf_project::load(path).map_err(|e| match e {
        wf_project::ProjectError::Io(source) => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            message: source.to_string(),
        },
        other => other.into(),
    })
}

/// Save a project, choosing the format from the file extension. Anything
/// that is not `.json` is written as YAML.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    ProjectFormat::from_path(path)
        .unwrap_or(ProjectFormat::Yaml)
        .save(path, project)?;
    Ok(())
}

/// Validate project structure.
pub fn validate_project(project: &Project) -> AppResult<()> {
    if project.farms.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one farm".to_string(),
        ));
    }
    wf_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))
}

/// Number of states a farm definition expands to.
pub fn state_count(farm: &FarmDef) -> usize {
    match &farm.states {
        StatesDef::Table { records, .. } => records.len(),
        StatesDef::Scan { wd_deg, ws_mps, .. } => wd_deg.len() * ws_mps.len(),
    }
}

/// List all farms in the project with summaries.
pub fn list_farms(project: &Project) -> Vec<FarmSummary> {
    project
        .farms
        .iter()
        .map(|farm| FarmSummary {
            id: farm.id.clone(),
            name: farm.name.clone(),
            turbine_count: farm.turbines.len(),
            turbine_type_count: farm.turbine_types.len(),
            state_count: state_count(farm),
            wake_models: farm.models.wakes.iter().map(|w| w.model.name.clone()).collect(),
            fixed_order: matches!(farm.engine.ordering, OrderingDef::Fixed { .. }),
        })
        .collect()
}

/// Get a specific farm by ID.
pub fn get_farm<'a>(project: &'a Project, farm_id: &str) -> AppResult<&'a FarmDef> {
    project
        .farms
        .iter()
        .find(|f| f.id == farm_id)
        .ok_or_else(|| AppError::FarmNotFound(farm_id.to_string()))
}
