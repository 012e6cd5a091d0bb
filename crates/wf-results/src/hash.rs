//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use wf_project::schema::FarmDef;

/// Run id of `farm` evaluated by engine `engine_version`.
///
/// The parallelism switch is excluded: it never changes results.
pub fn compute_run_id(farm: &FarmDef, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let mut normalized = farm.clone();
    normalized.engine.parallel = true;
    let farm_json = serde_json::to_string(&normalized).unwrap_or_default();
    hasher.update(farm_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

/// True for ids in the form produced by [`compute_run_id`]: 64 lowercase
/// hex digits.
pub fn is_valid_run_id(run_id: &str) -> bool {
    run_id.len() == 64
        && run_id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_project::schema::*;

    fn farm(ws: f64) -> FarmDef {
        FarmDef {
            id: "f1".to_string(),
            name: "Test".to_string(),
            turbine_types: vec![],
            turbines: vec![],
            states: StatesDef::Scan {
                wd_deg: vec![270.0],
                ws_mps: vec![ws],
                ti: 0.06,
                rho_kgpm3: 1.225,
            },
            profile: None,
            models: ModelsDef::default(),
            engine: EngineDef::default(),
        }
    }

    #[test]
    fn hash_stability() {
        let a = compute_run_id(&farm(8.0), "v1");
        let b = compute_run_id(&farm(8.0), "v1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        assert_ne!(compute_run_id(&farm(8.0), "v1"), compute_run_id(&farm(9.0), "v1"));
        assert_ne!(compute_run_id(&farm(8.0), "v1"), compute_run_id(&farm(8.0), "v2"));
    }

    #[test]
    fn parallelism_does_not_change_id() {
        let mut sequential = farm(8.0);
        sequential.engine.parallel = false;
        assert_eq!(compute_run_id(&sequential, "v1"), compute_run_id(&farm(8.0), "v1"));
    }

    #[test]
    fn computed_ids_are_valid() {
        assert!(is_valid_run_id(&compute_run_id(&farm(8.0), "v1")));
        for bad in ["", "..", "../..", "run-123", &"A".repeat(64), &"a".repeat(63)] {
            assert!(!is_valid_run_id(bad), "{bad:?}");
        }
    }
}
