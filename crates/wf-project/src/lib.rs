//! wf-project: canonical project file format and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

use std::fs;
use std::path::Path;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_farm, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Unknown project format: {path}")]
    UnknownFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a project file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFormat {
    Yaml,
    Json,
}

impl ProjectFormat {
    /// Format implied by the file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// Decode, migrate and validate project text.
    pub fn parse(self, content: &str) -> ProjectResult<Project> {
        let raw: Project = match self {
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
        };
        let project = migrate_to_latest(raw)?;
        validate_project(&project)?;
        Ok(project)
    }

    /// Validate and encode a project.
    pub fn render(self, project: &Project) -> ProjectResult<String> {
        validate_project(project)?;
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(project)?,
            Self::Json => serde_json::to_string_pretty(project)?,
        })
    }

    pub fn load(self, path: &Path) -> ProjectResult<Project> {
        self.parse(&fs::read_to_string(path)?)
    }

    pub fn save(self, path: &Path, project: &Project) -> ProjectResult<()> {
        fs::write(path, self.render(project)?)?;
        Ok(())
    }
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    ProjectFormat::Yaml.load(path)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    ProjectFormat::Yaml.save(path, project)
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    ProjectFormat::Json.load(path)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    ProjectFormat::Json.save(path, project)
}

/// Load a project, choosing the format from the file extension.
pub fn load(path: &Path) -> ProjectResult<Project> {
    ProjectFormat::from_path(path)
        .ok_or_else(|| ProjectError::UnknownFormat {
            path: path.display().to_string(),
        })?
        .load(path)
}
