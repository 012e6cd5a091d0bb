//! Schema migration framework.

use crate::ProjectError;
use crate::schema::{Project, StatesDef};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        1 => migrate_v1_to_v2(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    project.version = 1;
    Ok(project)
}

/// Version 1 stored wind directions as given. Version 2 keeps them in `[0, 360)`.
fn migrate_v1_to_v2(mut project: Project) -> Result<Project, ProjectError> {
    for farm in &mut project.farms {
        match &mut farm.states {
            StatesDef::Table { records, .. } => {
                for r in records {
                    r.wd_deg = wrap(r.wd_deg);
                }
            }
            StatesDef::Scan { wd_deg, .. } => {
                for wd in wd_deg {
                    *wd = wrap(*wd);
                }
            }
        }
    }
    project.version = 2;
    Ok(project)
}

fn wrap(wd: f64) -> f64 {
    if wd.is_finite() { wd.rem_euclid(360.0) } else { wd }
}
