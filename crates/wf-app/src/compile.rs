//! Compilation of a `FarmDef` into engine inputs.

use std::collections::HashMap;
use std::sync::Arc;

use wf_core::TurbineId;
use wf_core::units::{kw, m};
use wf_engine::EngineConfig;
use wf_farm::{
    FarmLayout, LayoutBuilder, PowerCtCurve, StateSet, TurbineModel, TurbineOrdering,
    TurbineType, WakeReach, WindProfile,
};
use wf_project::{FarmDef, ModelDef, OrderingDef, ProfileDef, StatesDef, TurbineTypeDef};
use wf_wakes::{ModelBook, ModelSpec};

use crate::error::{AppError, AppResult};

/// Everything the engine needs to run one farm.
#[derive(Debug)]
pub struct FarmRuntime {
    pub layout: Arc<FarmLayout>,
    pub states: StateSet,
    pub config: EngineConfig,
}

/// Registry selection from a project model entry.
pub fn model_spec(def: &ModelDef) -> ModelSpec {
    def.params
        .iter()
        .fold(ModelSpec::new(def.name.clone()), |spec, (k, v)| spec.with(k.clone(), *v))
}

/// Compile a farm definition into layout, states and engine configuration.
pub fn compile_farm(farm: &FarmDef, book: &ModelBook) -> AppResult<FarmRuntime> {
    let layout = Arc::new(build_layout(farm, book)?);
    let states = build_states(farm);
    let config = build_config(farm, book, &layout)?;
    Ok(FarmRuntime {
        layout,
        states,
        config,
    })
}

pub fn build_turbine_type(def: &TurbineTypeDef) -> AppResult<TurbineType> {
    let points = def
        .curve
        .iter()
        .map(|p| (p.ws_mps, kw(p.power_kw).value, p.ct))
        .collect();
    let curve = PowerCtCurve::new(points)?;
    let ttype = TurbineType::new(
        def.id.clone(),
        m(def.rotor_diameter_m),
        m(def.hub_height_m),
        curve,
    )?
    .with_density_correction(def.rho_ref_kgpm3)?;
    Ok(ttype)
}

pub fn build_layout(farm: &FarmDef, book: &ModelBook) -> AppResult<FarmLayout> {
    let mut types = HashMap::new();
    for def in &farm.turbine_types {
        types.insert(def.id.as_str(), Arc::new(build_turbine_type(def)?));
    }

    let mut builder = LayoutBuilder::new();
    for t in &farm.turbines {
        let ttype = types.get(t.turbine_type.as_str()).ok_or_else(|| {
            AppError::Compile(format!(
                "Turbine '{}' references unknown type '{}'",
                t.name, t.turbine_type
            ))
        })?;
        let models = t
            .models
            .iter()
            .map(|def| book.turbine_model(&model_spec(def)))
            .collect::<Result<Vec<Arc<dyn TurbineModel>>, _>>()?;
        builder.add_turbine(t.name.clone(), t.x_m, t.y_m, ttype.clone(), models);
    }
    Ok(builder.build()?)
}

pub fn build_states(farm: &FarmDef) -> StateSet {
    let states = match &farm.states {
        StatesDef::Table {
            ti,
            rho_kgpm3,
            records,
        } => {
            // Rows without their own values were checked to have a table default
            let rows: Vec<_> = records
                .iter()
                .map(|r| {
                    (
                        r.wd_deg,
                        r.ws_mps,
                        r.ti.or(*ti).unwrap_or(f64::NAN),
                        r.rho_kgpm3.or(*rho_kgpm3).unwrap_or(f64::NAN),
                        r.weight,
                    )
                })
                .collect();
            StateSet::from_records(&rows)
        }
        StatesDef::Scan {
            wd_deg,
            ws_mps,
            ti,
            rho_kgpm3,
        } => StateSet::wind_rose_scan(wd_deg, ws_mps, *ti, *rho_kgpm3),
    };
    match farm.profile {
        Some(ProfileDef::PowerLaw {
            alpha,
            reference_height_m,
        }) => states.with_profile(WindProfile::PowerLaw {
            alpha,
            reference_height: reference_height_m,
        }),
        Some(ProfileDef::Uniform) | None => states,
    }
}

pub fn build_config(farm: &FarmDef, book: &ModelBook, layout: &FarmLayout) -> AppResult<EngineConfig> {
    let models = &farm.models;
    let rotor = book.rotor_model(&model_spec(&models.rotor))?;

    let mut config = EngineConfig::default().with_rotor(rotor.clone());
    for wake in &models.wakes {
        let model = book.wake_model(&model_spec(&wake.model))?;
        config = match &wake.partial {
            Some(partial) => {
                config.with_wake_and_partial(model, book.partial_wake(&model_spec(partial), &rotor)?)
            }
            None => config.with_wake(model),
        };
    }
    for name in &models.superpositions {
        config = config.with_superposition(book.superposition(&ModelSpec::new(name.clone()))?);
    }

    let ordering = match &farm.engine.ordering {
        OrderingDef::Downwind => TurbineOrdering::Downwind,
        OrderingDef::Fixed { turbines } => {
            let ids = turbines
                .iter()
                .map(|name| {
                    layout.find(name).map(|t| t.id).ok_or_else(|| {
                        AppError::Compile(format!("Fixed order names unknown turbine '{name}'"))
                    })
                })
                .collect::<AppResult<Vec<TurbineId>>>()?;
            TurbineOrdering::Fixed(ids)
        }
    };
    let reach = farm
        .engine
        .wake_reach_spread
        .map(WakeReach::cone)
        .unwrap_or(WakeReach::UNBOUNDED);

    Ok(config
        .with_ordering(ordering)
        .with_reach(reach)
        .with_parallel(farm.engine.parallel)
        .with_expected_weight_sum(farm.engine.expected_weight_sum, farm.engine.weight_tolerance))
}
