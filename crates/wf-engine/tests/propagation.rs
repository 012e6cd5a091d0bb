use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::Vector3;
use wf_core::units::{kgpm3, m, mps};
use wf_core::{ModelError, ModelResult, TurbineId, VarMap, Variable};
use wf_engine::{EngineConfig, EngineError, FlowField, WakeEngine};
use wf_farm::{
    FarmError, FarmLayout, LayoutBuilder, PowerCtCurve, StateSet, Turbine, TurbineModel,
    TurbineOrdering, TurbineType, WindProfile,
};
use wf_results::{FarmResultsEval, Flow};
use wf_wakes::{ModelBook, ModelSpec};

fn small_type(ct: f64) -> Arc<TurbineType> {
    let curve = PowerCtCurve::new(vec![
        (3.0, 0.0, ct),
        (4.0, 1e5, ct),
        (12.0, 3e6, ct),
        (25.0, 3e6, ct),
    ])
    .unwrap();
    Arc::new(TurbineType::new("t100", m(100.0), m(100.0), curve).unwrap())
}

/// Two turbines 500 m apart along a northerly wind.
fn pair() -> Arc<FarmLayout> {
    let t = small_type(0.75);
    let mut b = LayoutBuilder::new();
    b.add_turbine("T0", 0.0, 0.0, t.clone(), vec![]);
    b.add_turbine("T1", 0.0, -500.0, t, vec![]);
    Arc::new(b.build().unwrap())
}

fn jensen_config(k: f64) -> EngineConfig {
    let book = ModelBook::new();
    let wake = book
        .wake_model(&ModelSpec::new("Jensen").with("k", k))
        .unwrap();
    EngineConfig::default().with_wake(wake)
}

fn kti() -> Arc<dyn TurbineModel> {
    ModelBook::new()
        .turbine_model(&ModelSpec::new("kTI").with("k_ti", 0.2))
        .unwrap()
}

/// 3 x 3 grid with 5 D spacing, K from turbulence.
fn grid() -> Arc<FarmLayout> {
    let t = Arc::new(TurbineType::default());
    let mut b = LayoutBuilder::new();
    for row in 0..3 {
        for col in 0..3 {
            b.add_turbine(
                format!("R{row}C{col}"),
                col as f64 * 630.0,
                row as f64 * 630.0,
                t.clone(),
                vec![kti()],
            );
        }
    }
    Arc::new(b.build().unwrap())
}

fn gaussian_config() -> EngineConfig {
    let book = ModelBook::new();
    EngineConfig::default()
        .with_rotor(book.rotor_model(&ModelSpec::new("grid").with("n", 3.0)).unwrap())
        .with_wake(book.wake_model(&ModelSpec::new("Bastankhah2014")).unwrap())
        .with_wake(book.wake_model(&ModelSpec::new("CrespoHernandez")).unwrap())
}

fn rose() -> StateSet {
    let wds: Vec<f64> = (0..12).map(|i| i as f64 * 30.0).collect();
    StateSet::wind_rose_scan(&wds, &[6.0, 9.0, 12.0], 0.06, 1.225)
}

#[test]
fn two_turbine_closed_form() {
    let engine = WakeEngine::new(pair(), jensen_config(0.025)).unwrap();
    let states = StateSet::single(0.0, mps(8.0), 0.05, kgpm3(1.225));
    let out = engine.run(&states).unwrap();
    assert!(out.failures.is_empty());
    assert!(out.warnings.is_empty());
    let r = &out.results;

    // Upstream turbine sees the ambient flow
    let up = r.get(0, 0).unwrap();
    assert_eq!(up.waked, up.ambient);
    assert_eq!(up.order_index, 0);

    let r_w: f64 = 50.0 + 0.025 * 500.0;
    let deficit = 8.0 * (1.0 - (1.0f64 - 0.75).sqrt()) * (50.0 / r_w).powi(2);
    let ws = r.value(0, 1, Variable::WindSpeed, Flow::Waked).unwrap();
    assert!((ws - (8.0 - deficit)).abs() < 1e-12, "{ws} vs {}", 8.0 - deficit);
    assert!((deficit - 2.56).abs() < 1e-12);
    assert_eq!(r.get(0, 1).unwrap().order_index, 1);

    let single = small_type(0.75).curve.lookup(8.0).0;
    let eval = FarmResultsEval::new(r);
    assert_eq!(eval.mean_farm_power(Flow::Ambient).unwrap(), 2.0 * single);
    assert!(eval.farm_efficiency().unwrap() < 1.0);
}

#[test]
fn parallel_and_sequential_runs_are_bit_identical() {
    let layout = grid();
    let states = rose();
    let par = WakeEngine::new(layout.clone(), gaussian_config())
        .unwrap()
        .run(&states)
        .unwrap();
    let seq = WakeEngine::new(layout, gaussian_config().with_parallel(false))
        .unwrap()
        .run(&states)
        .unwrap();
    let again = WakeEngine::new(grid(), gaussian_config().with_parallel(false))
        .unwrap()
        .run(&states)
        .unwrap();

    let bits = |o: &wf_engine::EngineOutput| -> Vec<u64> {
        let r = &o.results;
        let mut v = Vec::new();
        for s in 0..r.n_states() {
            for t in 0..r.n_turbines() {
                let c = r.get(s, t).unwrap();
                v.extend(c.ambient.iter().map(|(_, x)| x.to_bits()));
                v.extend(c.waked.iter().map(|(_, x)| x.to_bits()));
            }
        }
        v
    };
    assert!(par.results.is_complete());
    assert_eq!(bits(&par), bits(&seq));
    assert_eq!(bits(&seq), bits(&again));
}

#[test]
fn first_turbine_in_order_is_never_waked() {
    let out = WakeEngine::new(grid(), gaussian_config())
        .unwrap()
        .run(&rose())
        .unwrap();
    let r = &out.results;
    for s in 0..r.n_states() {
        let mut waked_somewhere = false;
        for t in 0..r.n_turbines() {
            let c = r.get(s, t).unwrap();
            if c.order_index == 0 {
                assert_eq!(c.waked[Variable::WindSpeed], c.ambient[Variable::WindSpeed]);
                assert_eq!(
                    c.waked[Variable::TurbulenceIntensity],
                    c.ambient[Variable::TurbulenceIntensity]
                );
            }
            assert!(c.waked[Variable::WindSpeed] <= c.ambient[Variable::WindSpeed]);
            assert!(c.waked[Variable::TurbulenceIntensity] >= c.ambient[Variable::TurbulenceIntensity]);
            waked_somewhere |= c.waked[Variable::WindSpeed] < c.ambient[Variable::WindSpeed];
        }
        // Axis-aligned directions line up whole rows of the grid
        if r.states()[s].wd_deg % 90.0 == 0.0 {
            assert!(waked_somewhere, "state {s} has no wake interaction");
        }
    }
}

#[test]
fn fixed_order_matches_downwind_order() {
    let states = StateSet::single(0.0, mps(8.0), 0.05, kgpm3(1.225));
    let downwind = WakeEngine::new(pair(), jensen_config(0.04))
        .unwrap()
        .run(&states)
        .unwrap();
    let fixed = WakeEngine::new(
        pair(),
        jensen_config(0.04).with_ordering(TurbineOrdering::Fixed(vec![
            TurbineId::from_usize(0),
            TurbineId::from_usize(1),
        ])),
    )
    .unwrap()
    .run(&states)
    .unwrap();
    assert_eq!(downwind.results, fixed.results);
}

#[test]
fn fixed_order_against_the_wind_is_rejected_before_running() {
    let engine = WakeEngine::new(
        pair(),
        jensen_config(0.04).with_ordering(TurbineOrdering::Fixed(vec![
            TurbineId::from_usize(1),
            TurbineId::from_usize(0),
        ])),
    )
    .unwrap();
    let calls = AtomicUsize::new(0);
    let states = StateSet::single(0.0, mps(8.0), 0.05, kgpm3(1.225));
    let err = engine
        .run_with_progress(&states, |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Farm(FarmError::OrderViolation { .. })));
    assert!(err.is_configuration());
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn weights_are_checked() {
    let engine = WakeEngine::new(pair(), jensen_config(0.04)).unwrap();
    let states = StateSet::from_records(&[(0.0, 8.0, 0.05, 1.225, 0.3), (90.0, 8.0, 0.05, 1.225, 0.3)]);
    assert!(matches!(
        engine.run(&states),
        Err(EngineError::Farm(FarmError::WeightSum { .. }))
    ));

    let lenient =
        WakeEngine::new(pair(), jensen_config(0.04).with_expected_weight_sum(None, 0.0)).unwrap();
    let out = lenient.run(&states).unwrap();
    assert!((out.results.weight_sum() - 0.6).abs() < 1e-12);
}

#[test]
fn configuration_errors() {
    let book = ModelBook::new();
    let gauss = book.wake_model(&ModelSpec::new("Bastankhah2014")).unwrap();

    // Gaussian model reads K, pair turbines have no K model
    let err = WakeEngine::new(pair(), EngineConfig::default().with_wake(gauss.clone())).unwrap_err();
    assert!(matches!(err, EngineError::Configuration { .. }));

    // Top-hat overlap cannot reduce a Gaussian wake
    let rotor = book.rotor_model(&ModelSpec::new("centre")).unwrap();
    let top_hat = book.partial_wake(&ModelSpec::new("top_hat"), &rotor).unwrap();
    let err = WakeEngine::new(
        grid(),
        EngineConfig::default().with_wake_and_partial(gauss, top_hat),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Model(ModelError::Incompatible { .. })));
    assert!(err.is_configuration());

    // A wake variable needs a superposition
    let mut config = jensen_config(0.04);
    config.superpositions.clear();
    assert!(matches!(
        WakeEngine::new(pair(), config),
        Err(EngineError::Configuration { .. })
    ));

    // At most one superposition per variable
    let mut config = jensen_config(0.04);
    let dup = config.superpositions[0].clone();
    config.superpositions.push(dup);
    assert!(matches!(
        WakeEngine::new(pair(), config),
        Err(EngineError::Configuration { .. })
    ));
}

/// Fails above a wind speed limit, to exercise per-state failures.
#[derive(Debug)]
struct Envelope {
    max_ws: f64,
}

impl TurbineModel for Envelope {
    fn name(&self) -> &str {
        "envelope"
    }

    fn output_vars(&self) -> &'static [Variable] {
        &[]
    }

    fn calculate(&self, _turbine: &Turbine, _ambient: &VarMap, vars: &mut VarMap) -> ModelResult<()> {
        if vars[Variable::WindSpeed] > self.max_ws {
            return Err(ModelError::unrecoverable("envelope", "wind speed above limit"));
        }
        Ok(())
    }
}

#[test]
fn evaluation_error_fails_only_its_state() {
    let t = small_type(0.75);
    let envelope: Arc<dyn TurbineModel> = Arc::new(Envelope { max_ws: 10.0 });
    let mut b = LayoutBuilder::new();
    b.add_turbine("T0", 0.0, 0.0, t.clone(), vec![envelope.clone()]);
    b.add_turbine("T1", 0.0, -500.0, t, vec![envelope]);
    let layout = Arc::new(b.build().unwrap());

    let states = StateSet::from_records(&[
        (0.0, 8.0, 0.05, 1.225, 0.5),
        (0.0, 11.0, 0.05, 1.225, 0.25),
        (180.0, 9.0, 0.05, 1.225, 0.25),
    ]);
    let out = WakeEngine::new(layout, jensen_config(0.04))
        .unwrap()
        .run(&states)
        .unwrap();

    assert_eq!(out.failures.len(), 1);
    let f = &out.failures[0];
    assert_eq!(f.state, 1);
    assert_eq!(f.turbine, "T0");
    assert!(f.error.is_evaluation_error());

    let r = &out.results;
    assert!(r.is_state_complete(0));
    assert!(!r.is_state_complete(1));
    assert!(r.is_state_complete(2));
    assert!(!r.is_complete());
    assert!(FarmResultsEval::new(r).mean_farm_power(Flow::Waked).is_err());
}

#[test]
fn clamped_wind_speed_raises_a_warning() {
    // Two emitters side by side, both fully covering the receiver hub
    let t = small_type(0.99);
    let mut b = LayoutBuilder::new();
    b.add_turbine("L", 0.0, -40.0, t.clone(), vec![]);
    b.add_turbine("R", 0.0, 40.0, t.clone(), vec![]);
    b.add_turbine("D", 500.0, 0.0, t, vec![]);
    let layout = Arc::new(b.build().unwrap());

    let wake = ModelBook::new()
        .wake_model(
            &ModelSpec::new("Jensen")
                .with("k", 0.0)
                .with("scale_ambient", 1.0),
        )
        .unwrap();
    let engine = WakeEngine::new(layout, EngineConfig::default().with_wake(wake)).unwrap();
    let states = StateSet::single(270.0, mps(8.0), 0.05, kgpm3(1.225));
    let out = engine.run(&states).unwrap();

    assert_eq!(out.warnings.len(), 1);
    let w = &out.warnings[0];
    assert_eq!(w.turbine, "D");
    assert_eq!(w.variable, Variable::WindSpeed);
    assert!((w.raw - (8.0 - 2.0 * 7.2)).abs() < 1e-9);
    assert_eq!(w.clamped, 0.0);
    assert_eq!(out.results.value(0, 2, Variable::WindSpeed, Flow::Waked).unwrap(), 0.0);
    assert_eq!(out.results.value(0, 2, Variable::Power, Flow::Waked).unwrap(), 0.0);
}

#[test]
fn progress_reports_every_state() {
    let engine = WakeEngine::new(grid(), gaussian_config()).unwrap();
    let states = rose();
    let calls = AtomicUsize::new(0);
    let last = AtomicUsize::new(0);
    engine
        .run_with_progress(&states, |p| {
            calls.fetch_add(1, Ordering::Relaxed);
            last.fetch_max(p.completed, Ordering::Relaxed);
            assert_eq!(p.total, 36);
        })
        .unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 36);
    assert_eq!(last.load(Ordering::Relaxed), 36);
}

#[test]
fn shear_profile_changes_ambient_rotor_speed() {
    let states = StateSet::single(270.0, mps(8.0), 0.06, kgpm3(1.225)).with_profile(
        WindProfile::PowerLaw {
            alpha: 0.2,
            reference_height: 90.0,
        },
    );
    let book = ModelBook::new();
    let engine = WakeEngine::new(
        grid(),
        gaussian_config().with_rotor(book.rotor_model(&ModelSpec::new("grid").with("n", 6.0)).unwrap()),
    )
    .unwrap();
    let out = engine.run(&states).unwrap();
    let amb = out
        .results
        .value(0, 0, Variable::WindSpeed, Flow::Ambient)
        .unwrap();
    // The power law is concave in z, so the rotor average sits below the hub value
    assert!(amb < 8.0 && amb > 7.5, "{amb}");
}

#[test]
fn flow_field_matches_rotor_values_at_hubs() {
    let layout = pair();
    let engine = WakeEngine::new(layout.clone(), jensen_config(0.025)).unwrap();
    let states = StateSet::single(0.0, mps(8.0), 0.05, kgpm3(1.225));
    let out = engine.run(&states).unwrap();
    let field = FlowField::new(&engine, &states, &out.results).unwrap();

    let hub = layout.turbines()[1].hub();
    let upstream_point = Vector3::new(0.0, 300.0, 100.0);
    let behind = Vector3::new(0.0, -250.0, 100.0);
    let samples = field.evaluate(&[hub, upstream_point, behind], 0).unwrap();

    let ws_t1 = out.results.value(0, 1, Variable::WindSpeed, Flow::Waked).unwrap();
    assert!((samples[0].ws - ws_t1).abs() < 1e-12);
    assert_eq!(samples[1].ws, 8.0);
    assert_eq!(samples[1].ti, 0.05);
    assert!(samples[2].ws < samples[0].ws);

    assert!(field.evaluate(&[hub], 5).is_err());
}
