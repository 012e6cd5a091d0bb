//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json` and `<root>/<run_id>/results.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::hash::is_valid_run_id;
use crate::types::{FarmResults, RunManifest};
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const RESULTS_FILE: &str = "results.json";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store under `.wakeflow/runs` next to the project file.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        let runs_dir = project_dir.join(".wakeflow").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory of `run_id`. Ids that are not content hashes are rejected
    /// before any path is built from them.
    fn run_dir(&self, run_id: &str) -> ResultsResult<PathBuf> {
        if !is_valid_run_id(run_id) {
            return Err(ResultsError::InvalidPath {
                message: format!("'{run_id}' is not a run id"),
            });
        }
        Ok(self.root_dir.join(run_id))
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).is_ok_and(|dir| {
            dir.join(MANIFEST_FILE).is_file() && dir.join(RESULTS_FILE).is_file()
        })
    }

    pub fn save_run(&self, manifest: &RunManifest, results: &FarmResults) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id)?;
        fs::create_dir_all(&run_dir)?;

        // Results first, so a manifest never points at missing results
        let results_json = serde_json::to_string(results)?;
        fs::write(run_dir.join(RESULTS_FILE), results_json)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;

        tracing::debug!(run_id = %manifest.run_id, dir = %run_dir.display(), "saved run");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        self.read_json(run_id, MANIFEST_FILE)
    }

    pub fn load_results(&self, run_id: &str) -> ResultsResult<FarmResults> {
        self.read_json(run_id, RESULTS_FILE)
    }

    fn read_json<T: DeserializeOwned>(&self, run_id: &str, file: &str) -> ResultsResult<T> {
        let path = self.run_dir(run_id)?.join(file);
        if !path.is_file() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Runs of `farm_id`, oldest first.
    pub fn list_runs(&self, farm_id: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.farm_id == farm_id
                {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by_key(|m| chrono::DateTime::parse_from_rfc3339(&m.timestamp).ok());
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id)?;
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
