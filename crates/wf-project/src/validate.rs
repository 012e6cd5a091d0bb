//! Project validation logic.
//!
//! Structural checks only: references resolve, numbers are finite and in
//! range. Model names are resolved against the model registry when the
//! project is compiled.

use crate::schema::{
    EngineDef, FarmDef, ModelDef, OrderingDef, ProfileDef, Project, StatesDef, TurbineTypeDef,
};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite"))
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be non-negative"))
    }
}

fn fraction(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(field, v, "must be in [0, 1]"))
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut farm_ids = HashSet::new();
    for farm in &project.farms {
        if !farm_ids.insert(&farm.id) {
            return Err(ValidationError::DuplicateId {
                id: farm.id.clone(),
                context: "farms".to_string(),
            });
        }
        validate_farm(farm)?;
    }
    Ok(())
}

pub fn validate_farm(farm: &FarmDef) -> Result<(), ValidationError> {
    let mut type_ids = HashSet::new();
    for t in &farm.turbine_types {
        if !type_ids.insert(t.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: t.id.clone(),
                context: format!("farm {} turbine_types", farm.id),
            });
        }
        validate_turbine_type(t)?;
    }

    if farm.turbines.is_empty() {
        return Err(invalid(
            format!("farms.{}.turbines", farm.id),
            0,
            "a farm needs at least one turbine",
        ));
    }

    let mut names = HashSet::new();
    for t in &farm.turbines {
        if !names.insert(t.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: t.name.clone(),
                context: format!("farm {} turbines", farm.id),
            });
        }
        if !type_ids.contains(t.turbine_type.as_str()) {
            return Err(ValidationError::MissingReference {
                id: t.turbine_type.clone(),
                context: format!("turbine {} turbine_type", t.name),
            });
        }
        finite(&format!("{}.x_m", t.name), t.x_m)?;
        finite(&format!("{}.y_m", t.name), t.y_m)?;
        for m in &t.models {
            validate_model(&format!("{}.models", t.name), m)?;
        }
    }

    validate_states(&farm.states)?;
    if let Some(ProfileDef::PowerLaw {
        alpha,
        reference_height_m,
    }) = &farm.profile
    {
        finite("profile.alpha", *alpha)?;
        positive("profile.reference_height_m", *reference_height_m)?;
    }

    validate_model("models.rotor", &farm.models.rotor)?;
    for w in &farm.models.wakes {
        validate_model("models.wakes", &w.model)?;
        if let Some(p) = &w.partial {
            validate_model("models.wakes.partial", p)?;
        }
    }
    let mut seen = HashSet::new();
    for s in &farm.models.superpositions {
        if !seen.insert(s.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: s.clone(),
                context: "models.superpositions".to_string(),
            });
        }
    }

    validate_engine(&farm.engine, &names)
}

fn validate_turbine_type(t: &TurbineTypeDef) -> Result<(), ValidationError> {
    positive(&format!("{}.rotor_diameter_m", t.id), t.rotor_diameter_m)?;
    positive(&format!("{}.hub_height_m", t.id), t.hub_height_m)?;
    if let Some(rho) = t.rho_ref_kgpm3 {
        positive(&format!("{}.rho_ref_kgpm3", t.id), rho)?;
    }
    if t.curve.len() < 2 {
        return Err(invalid(
            format!("{}.curve", t.id),
            t.curve.len(),
            "a power/ct curve needs at least two points",
        ));
    }
    for p in &t.curve {
        non_negative(&format!("{}.curve.ws_mps", t.id), p.ws_mps)?;
        non_negative(&format!("{}.curve.power_kw", t.id), p.power_kw)?;
        non_negative(&format!("{}.curve.ct", t.id), p.ct)?;
    }
    if t.curve.windows(2).any(|w| w[1].ws_mps <= w[0].ws_mps) {
        return Err(invalid(
            format!("{}.curve.ws_mps", t.id),
            "[..]",
            "wind speeds must be strictly increasing",
        ));
    }
    Ok(())
}

fn validate_model(context: &str, m: &ModelDef) -> Result<(), ValidationError> {
    if m.name.trim().is_empty() {
        return Err(invalid(context, "\"\"", "model name must not be empty"));
    }
    for (k, v) in &m.params {
        finite(&format!("{context}.{}.{k}", m.name), *v)?;
    }
    Ok(())
}

fn validate_states(states: &StatesDef) -> Result<(), ValidationError> {
    match states {
        StatesDef::Table {
            ti,
            rho_kgpm3,
            records,
        } => {
            if records.is_empty() {
                return Err(invalid("states.records", 0, "at least one state is required"));
            }
            for (i, r) in records.iter().enumerate() {
                finite(&format!("states.records[{i}].wd_deg"), r.wd_deg)?;
                positive(&format!("states.records[{i}].ws_mps"), r.ws_mps)?;
                non_negative(&format!("states.records[{i}].weight"), r.weight)?;
                let Some(row_ti) = r.ti.or(*ti) else {
                    return Err(ValidationError::MissingReference {
                        id: "ti".to_string(),
                        context: format!("states.records[{i}]"),
                    });
                };
                fraction(&format!("states.records[{i}].ti"), row_ti)?;
                let Some(row_rho) = r.rho_kgpm3.or(*rho_kgpm3) else {
                    return Err(ValidationError::MissingReference {
                        id: "rho_kgpm3".to_string(),
                        context: format!("states.records[{i}]"),
                    });
                };
                positive(&format!("states.records[{i}].rho_kgpm3"), row_rho)?;
            }
        }
        StatesDef::Scan {
            wd_deg,
            ws_mps,
            ti,
            rho_kgpm3,
        } => {
            if wd_deg.is_empty() || ws_mps.is_empty() {
                return Err(invalid(
                    "states.scan",
                    format!("{}x{}", wd_deg.len(), ws_mps.len()),
                    "scan needs at least one direction and one speed",
                ));
            }
            for wd in wd_deg {
                finite("states.wd_deg", *wd)?;
            }
            for ws in ws_mps {
                positive("states.ws_mps", *ws)?;
            }
            fraction("states.ti", *ti)?;
            positive("states.rho_kgpm3", *rho_kgpm3)?;
        }
    }
    Ok(())
}

fn validate_engine(engine: &EngineDef, names: &HashSet<&str>) -> Result<(), ValidationError> {
    if let Some(sum) = engine.expected_weight_sum {
        positive("engine.expected_weight_sum", sum)?;
    }
    non_negative("engine.weight_tolerance", engine.weight_tolerance)?;
    if let Some(spread) = engine.wake_reach_spread {
        non_negative("engine.wake_reach_spread", spread)?;
    }

    if let OrderingDef::Fixed { turbines } = &engine.ordering {
        let mut seen = HashSet::new();
        for name in turbines {
            if !names.contains(name.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: name.clone(),
                    context: "engine.ordering".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: name.clone(),
                    context: "engine.ordering".to_string(),
                });
            }
        }
        if seen.len() != names.len() {
            return Err(invalid(
                "engine.ordering",
                seen.len(),
                "a fixed order must list every turbine exactly once",
            ));
        }
    }
    Ok(())
}
