//! Model registry: string identifiers to model factories.
//!
//! Every entry declares its parameter schema. Specs naming an unknown model,
//! an undeclared parameter, or missing a required one are rejected with a
//! [`ModelError`] before anything is computed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wf_core::{ModelError, ModelResult, Variable};
use wf_farm::{FixedK, KSource, KTi, TurbineModel};

use crate::bastankhah::Bastankhah2014;
use crate::crespo_hernandez::CrespoHernandez;
use crate::induction::Induction;
use crate::jensen::Jensen;
use crate::partial::{RotorAveraged, TopHatPartial};
use crate::rotor::{CentreRotor, GridRotor};
use crate::superposition::{ApplyRule, CombinationLaw, Superposition};
use crate::traits::{PartialWakeModel, RotorModel, ScaleSpeed, WakeModel};

/// Default value of a declared parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamDefault {
    Required,
    Optional,
    Value(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: ParamDefault,
    pub doc: &'static str,
}

const fn param(name: &'static str, default: ParamDefault, doc: &'static str) -> ParamSpec {
    ParamSpec { name, default, doc }
}

/// A model selection by name, with numeric parameters.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ModelSpec {
    pub name: String,
    pub params: BTreeMap<String, f64>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, param: impl Into<String>, value: f64) -> Self {
        self.params.insert(param.into(), value);
        self
    }
}

/// Checked parameter access for a factory.
pub struct Params<'a> {
    model: &'a str,
    schema: &'static [ParamSpec],
    values: &'a BTreeMap<String, f64>,
}

impl<'a> Params<'a> {
    fn check(
        model: &'a str,
        schema: &'static [ParamSpec],
        values: &'a BTreeMap<String, f64>,
    ) -> ModelResult<Self> {
        for (key, value) in values {
            if !schema.iter().any(|p| p.name == key) {
                let known: Vec<&str> = schema.iter().map(|p| p.name).collect();
                return Err(ModelError::invalid_param(
                    model,
                    key,
                    format!("unknown parameter (declared: [{}])", known.join(", ")),
                ));
            }
            if !value.is_finite() {
                return Err(ModelError::invalid_param(model, key, "must be finite"));
            }
        }
        for p in schema {
            if p.default == ParamDefault::Required && !values.contains_key(p.name) {
                return Err(ModelError::MissingParameter {
                    model: model.to_string(),
                    param: p.name.to_string(),
                });
            }
        }
        Ok(Self {
            model,
            schema,
            values,
        })
    }

    /// The value given, or the declared default.
    pub fn opt(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().or_else(|| {
            self.schema
                .iter()
                .find(|p| p.name == name)
                .and_then(|p| match p.default {
                    ParamDefault::Value(v) => Some(v),
                    _ => None,
                })
        })
    }

    pub fn get(&self, name: &str) -> ModelResult<f64> {
        self.opt(name).ok_or_else(|| ModelError::MissingParameter {
            model: self.model.to_string(),
            param: name.to_string(),
        })
    }

    pub fn non_negative(&self, name: &str) -> ModelResult<Option<f64>> {
        match self.opt(name) {
            Some(v) if v < 0.0 => Err(ModelError::invalid_param(self.model, name, "must be non-negative")),
            other => Ok(other),
        }
    }

    pub fn flag(&self, name: &str) -> ModelResult<bool> {
        match self.opt(name) {
            None => Ok(false),
            Some(v) if v == 0.0 => Ok(false),
            Some(v) if v == 1.0 => Ok(true),
            Some(_) => Err(ModelError::invalid_param(self.model, name, "flag must be 0 or 1")),
        }
    }
}

/// Kind of registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Wake,
    Rotor,
    PartialWake,
    Superposition,
    Turbine,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Wake,
        ModelKind::Rotor,
        ModelKind::PartialWake,
        ModelKind::Superposition,
        ModelKind::Turbine,
    ];

    fn label(self) -> &'static str {
        match self {
            ModelKind::Wake => "wake model",
            ModelKind::Rotor => "rotor model",
            ModelKind::PartialWake => "partial wake model",
            ModelKind::Superposition => "superposition",
            ModelKind::Turbine => "turbine model",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type WakeFactory = fn(&Params<'_>) -> ModelResult<Arc<dyn WakeModel>>;
type RotorFactory = fn(&Params<'_>) -> ModelResult<Arc<dyn RotorModel>>;
type PartialFactory =
    fn(&Params<'_>, &Arc<dyn RotorModel>) -> ModelResult<Arc<dyn PartialWakeModel>>;
/// Superpositions take no parameters; the entry carries the variable and law.
type SuperpositionFactory = (Variable, CombinationLaw);
type TurbineFactory = fn(&Params<'_>) -> ModelResult<Arc<dyn TurbineModel>>;

struct Entry<F> {
    doc: &'static str,
    params: &'static [ParamSpec],
    factory: F,
}

/// Description of a registered model, for listings.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelInfo {
    pub kind: ModelKind,
    pub name: &'static str,
    pub doc: &'static str,
    pub params: &'static [ParamSpec],
}

/// The registry of all built-in models.
pub struct ModelBook {
    wakes: BTreeMap<&'static str, Entry<WakeFactory>>,
    rotors: BTreeMap<&'static str, Entry<RotorFactory>>,
    partials: BTreeMap<&'static str, Entry<PartialFactory>>,
    superpositions: BTreeMap<&'static str, Entry<SuperpositionFactory>>,
    turbines: BTreeMap<&'static str, Entry<TurbineFactory>>,
}

const K_PARAM: ParamSpec = param(
    "k",
    ParamDefault::Optional,
    "fixed wake growth coefficient; the emitter's K when omitted",
);
const SCALE_AMBIENT: ParamSpec = param(
    "scale_ambient",
    ParamDefault::Value(0.0),
    "1 scales the deficit with the ambient instead of the waked wind speed",
);

const JENSEN_PARAMS: &[ParamSpec] = &[K_PARAM, SCALE_AMBIENT];
const BASTANKHAH_PARAMS: &[ParamSpec] = &[
    K_PARAM,
    param("sbeta_factor", ParamDefault::Value(0.2), "factor on sqrt(beta) in the initial wake width"),
    SCALE_AMBIENT,
];
const CRESPO_PARAMS: &[ParamSpec] = &[
    K_PARAM,
    param("use_ambti", ParamDefault::Value(0.0), "1 uses the emitter's ambient TI"),
    param("near_wake_d", ParamDefault::Value(2.0), "near wake length in rotor diameters"),
];
const GRID_PARAMS: &[ParamSpec] = &[param("n", ParamDefault::Value(4.0), "points per side of the grid")];
const KTI_PARAMS: &[ParamSpec] = &[
    param("k_ti", ParamDefault::Required, "slope of K against TI"),
    param("k_b", ParamDefault::Value(0.0), "offset of K"),
];
const KFIXED_PARAMS: &[ParamSpec] = &[param("k", ParamDefault::Required, "wake growth coefficient")];

fn grid_n(p: &Params<'_>) -> ModelResult<usize> {
    let n = p.get("n")?;
    if n < 1.0 || n.fract() != 0.0 || n > 64.0 {
        return Err(ModelError::invalid_param(p.model, "n", "must be an integer in [1, 64]"));
    }
    Ok(n as usize)
}

fn bastankhah(p: &Params<'_>, induction: Induction) -> ModelResult<Arc<dyn WakeModel>> {
    let sbeta_factor = p.get("sbeta_factor")?;
    if sbeta_factor <= 0.0 {
        return Err(ModelError::invalid_param(p.model, "sbeta_factor", "must be positive"));
    }
    Ok(Arc::new(Bastankhah2014 {
        k: p.non_negative("k")?,
        sbeta_factor,
        induction,
        scale: ScaleSpeed::from_flag(p.flag("scale_ambient")?),
    }))
}

fn superposition(variable: Variable, law: CombinationLaw) -> Superposition {
    let apply = match variable {
        Variable::TurbulenceIntensity => ApplyRule::Quadratic,
        _ => ApplyRule::Add,
    };
    Superposition::new(variable, law, apply)
}

impl Default for ModelBook {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBook {
    /// A registry with every built-in model.
    pub fn new() -> Self {
        let mut wakes: BTreeMap<&'static str, Entry<WakeFactory>> = BTreeMap::new();
        wakes.insert(
            "Jensen",
            Entry {
                doc: "top-hat wind speed deficit with linear wake expansion",
                params: JENSEN_PARAMS,
                factory: |p| {
                    Ok(Arc::new(Jensen::new(
                        p.non_negative("k")?,
                        ScaleSpeed::from_flag(p.flag("scale_ambient")?),
                    )))
                },
            },
        );
        wakes.insert(
            "Bastankhah2014",
            Entry {
                doc: "Gaussian wind speed deficit, Madsen induction",
                params: BASTANKHAH_PARAMS,
                factory: |p| bastankhah(p, Induction::Madsen),
            },
        );
        wakes.insert(
            "Bastankhah2014_Betz",
            Entry {
                doc: "Gaussian wind speed deficit, Betz induction",
                params: BASTANKHAH_PARAMS,
                factory: |p| bastankhah(p, Induction::Betz),
            },
        );
        wakes.insert(
            "CrespoHernandez",
            Entry {
                doc: "top-hat turbulence intensity addition",
                params: CRESPO_PARAMS,
                factory: |p| {
                    let near_wake_d = p.get("near_wake_d")?;
                    if near_wake_d < 0.0 {
                        return Err(ModelError::invalid_param(p.model, "near_wake_d", "must be non-negative"));
                    }
                    Ok(Arc::new(CrespoHernandez {
                        k: p.non_negative("k")?,
                        use_ambient_ti: p.flag("use_ambti")?,
                        near_wake_d,
                        induction: Induction::Betz,
                    }))
                },
            },
        );

        let mut rotors: BTreeMap<&'static str, Entry<RotorFactory>> = BTreeMap::new();
        rotors.insert(
            "centre",
            Entry {
                doc: "single point at the hub",
                params: &[],
                factory: |_| Ok(Arc::new(CentreRotor::new())),
            },
        );
        rotors.insert(
            "grid",
            Entry {
                doc: "n x n cell centres inside the rotor disk, equal weights",
                params: GRID_PARAMS,
                factory: |p| Ok(Arc::new(GridRotor::new(grid_n(p)?))),
            },
        );

        let mut partials: BTreeMap<&'static str, Entry<PartialFactory>> = BTreeMap::new();
        partials.insert(
            "rotor_points",
            Entry {
                doc: "average over the engine's rotor model points",
                params: &[],
                factory: |_, rotor| Ok(Arc::new(RotorAveraged::new("rotor_points", rotor.clone()))),
            },
        );
        partials.insert(
            "centre",
            Entry {
                doc: "wake value at the receiver hub",
                params: &[],
                factory: |_, _| Ok(Arc::new(RotorAveraged::new("centre", Arc::new(CentreRotor::new())))),
            },
        );
        partials.insert(
            "grid",
            Entry {
                doc: "average over a separate n x n rotor grid",
                params: GRID_PARAMS,
                factory: |p, _| {
                    Ok(Arc::new(RotorAveraged::new("grid", Arc::new(GridRotor::new(grid_n(p)?)))))
                },
            },
        );
        partials.insert(
            "top_hat",
            Entry {
                doc: "exact rotor/wake disk overlap, top-hat wake models only",
                params: &[],
                factory: |_, _| Ok(Arc::new(TopHatPartial)),
            },
        );

        let mut superpositions: BTreeMap<&'static str, Entry<SuperpositionFactory>> =
            BTreeMap::new();
        for (name, doc, variable, law) in [
            ("ws_linear", "sum of deficits", Variable::WindSpeed, CombinationLaw::Linear),
            ("ws_quadratic", "root sum of squared deficits", Variable::WindSpeed, CombinationLaw::Quadratic),
            ("ws_max", "largest single deficit", Variable::WindSpeed, CombinationLaw::Max),
            ("ti_linear", "sum of TI additions, applied quadratically", Variable::TurbulenceIntensity, CombinationLaw::Linear),
            ("ti_quadratic", "root sum of squared TI additions, applied quadratically", Variable::TurbulenceIntensity, CombinationLaw::Quadratic),
            ("ti_max", "largest TI addition, applied quadratically", Variable::TurbulenceIntensity, CombinationLaw::Max),
        ] {
            superpositions.insert(
                name,
                Entry {
                    doc,
                    params: &[],
                    factory: (variable, law),
                },
            );
        }

        let mut turbines: BTreeMap<&'static str, Entry<TurbineFactory>> = BTreeMap::new();
        turbines.insert(
            "kTI",
            Entry {
                doc: "K = k_ti * TI + k_b from the rotor-effective TI",
                params: KTI_PARAMS,
                factory: |p| Ok(Arc::new(KTi::new(p.get("k_ti")?, p.get("k_b")?, KSource::Waked)?)),
            },
        );
        turbines.insert(
            "kTI_amb",
            Entry {
                doc: "K = k_ti * TI + k_b from the ambient TI",
                params: KTI_PARAMS,
                factory: |p| Ok(Arc::new(KTi::new(p.get("k_ti")?, p.get("k_b")?, KSource::Ambient)?)),
            },
        );
        turbines.insert(
            "kFixed",
            Entry {
                doc: "constant K",
                params: KFIXED_PARAMS,
                factory: |p| Ok(Arc::new(FixedK::new(p.get("k")?)?)),
            },
        );

        Self {
            wakes,
            rotors,
            partials,
            superpositions,
            turbines,
        }
    }

    pub fn wake_model(&self, spec: &ModelSpec) -> ModelResult<Arc<dyn WakeModel>> {
        let entry = lookup(&self.wakes, ModelKind::Wake, &spec.name)?;
        (entry.factory)(&Params::check(&spec.name, entry.params, &spec.params)?)
    }

    pub fn rotor_model(&self, spec: &ModelSpec) -> ModelResult<Arc<dyn RotorModel>> {
        let entry = lookup(&self.rotors, ModelKind::Rotor, &spec.name)?;
        (entry.factory)(&Params::check(&spec.name, entry.params, &spec.params)?)
    }

    /// Build a partial wake model. `rotor` is the engine's rotor model, used
    /// by `rotor_points`.
    pub fn partial_wake(
        &self,
        spec: &ModelSpec,
        rotor: &Arc<dyn RotorModel>,
    ) -> ModelResult<Arc<dyn PartialWakeModel>> {
        let entry = lookup(&self.partials, ModelKind::PartialWake, &spec.name)?;
        (entry.factory)(&Params::check(&spec.name, entry.params, &spec.params)?, rotor)
    }

    pub fn superposition(&self, spec: &ModelSpec) -> ModelResult<Superposition> {
        let entry = lookup(&self.superpositions, ModelKind::Superposition, &spec.name)?;
        Params::check(&spec.name, entry.params, &spec.params)?;
        let (variable, law) = entry.factory;
        Ok(superposition(variable, law))
    }

    pub fn turbine_model(&self, spec: &ModelSpec) -> ModelResult<Arc<dyn TurbineModel>> {
        let entry = lookup(&self.turbines, ModelKind::Turbine, &spec.name)?;
        (entry.factory)(&Params::check(&spec.name, entry.params, &spec.params)?)
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: ModelKind) -> Vec<&'static str> {
        match kind {
            ModelKind::Wake => self.wakes.keys().copied().collect(),
            ModelKind::Rotor => self.rotors.keys().copied().collect(),
            ModelKind::PartialWake => self.partials.keys().copied().collect(),
            ModelKind::Superposition => self.superpositions.keys().copied().collect(),
            ModelKind::Turbine => self.turbines.keys().copied().collect(),
        }
    }

    /// Full descriptions of one kind, sorted by name.
    pub fn describe(&self, kind: ModelKind) -> Vec<ModelInfo> {
        fn infos<F>(kind: ModelKind, map: &BTreeMap<&'static str, Entry<F>>) -> Vec<ModelInfo> {
            map.iter()
                .map(|(&name, e)| ModelInfo {
                    kind,
                    name,
                    doc: e.doc,
                    params: e.params,
                })
                .collect()
        }
        match kind {
            ModelKind::Wake => infos(kind, &self.wakes),
            ModelKind::Rotor => infos(kind, &self.rotors),
            ModelKind::PartialWake => infos(kind, &self.partials),
            ModelKind::Superposition => infos(kind, &self.superpositions),
            ModelKind::Turbine => infos(kind, &self.turbines),
        }
    }
}

fn lookup<'m, F>(
    map: &'m BTreeMap<&'static str, Entry<F>>,
    kind: ModelKind,
    name: &str,
) -> ModelResult<&'m Entry<F>> {
    map.get(name).ok_or_else(|| ModelError::UnknownModel {
        kind: kind.label(),
        name: name.to_string(),
        available: map.keys().copied().collect::<Vec<_>>().join(", "),
    })
}
