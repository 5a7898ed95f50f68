//! Mass and phase invariants that every source kind must honor.

use pc_chem::{Chemical, ChemicalStore, InMemoryStore};
use pc_met::{MetConditions, MeteorologicalState};
use pc_sim::{SimOptions, StepModel, Stepper};
use pc_source::{
    DirectSpec, PipelineSpec, PuddleSpec, SourceSpec, TankGasSpec, TankLiquidSpec, TwoPhaseRelease,
    TwoPhaseSpec, collect_series,
};
use proptest::prelude::*;

fn chemical(name: &str) -> Chemical {
    InMemoryStore::builtin().get_chemical(name).unwrap()
}

fn met() -> MeteorologicalState {
    MeteorologicalState::new(MetConditions::default()).unwrap()
}

fn opts(t_end: f64) -> SimOptions {
    SimOptions {
        dt: 1.0,
        t_end,
        min_dt: 1e-4,
        ..SimOptions::default()
    }
}

fn every_kind() -> Vec<(SourceSpec, &'static str)> {
    vec![
        (
            SourceSpec::Pipeline(PipelineSpec {
                length_m: 200.0,
                ..PipelineSpec::default()
            }),
            "methane",
        ),
        (SourceSpec::TankGas(TankGasSpec::default()), "methane"),
        (SourceSpec::TankLiquid(TankLiquidSpec::default()), "toluene"),
        (SourceSpec::TwoPhase(TwoPhaseSpec::default()), "ammonia"),
        (SourceSpec::Puddle(PuddleSpec::default()), "toluene"),
        (SourceSpec::Direct(DirectSpec::default()), "ammonia"),
    ]
}

#[test]
fn released_mass_never_exceeds_inventory() {
    let met = met();
    for (spec, name) in every_kind() {
        let model = spec.build(&chemical(name), &met).unwrap();
        let inventory = model.initial_inventory_kg();
        let series = collect_series(&model, opts(600.0)).unwrap();
        assert!(series.samples.len() > 1, "{} produced no steps", spec.kind());

        let mut last_time = -1.0;
        let mut last_released = 0.0;
        for s in &series.samples {
            assert!(s.time_s > last_time, "{}: time went backwards", spec.kind());
            assert!(s.mass_flow_kg_s >= 0.0, "{}: negative flow", spec.kind());
            assert!(s.airborne_kg_s >= 0.0, "{}: negative airborne rate", spec.kind());
            assert!(
                s.released_kg <= inventory * (1.0 + 1e-9),
                "{}: released {} of {}",
                spec.kind(),
                s.released_kg,
                inventory
            );
            assert!(s.released_kg >= last_released - 1e-12);
            let p = s.phase;
            assert!((p.vapor + p.aerosol + p.liquid - 1.0).abs() < 1e-12);
            last_time = s.time_s;
            last_released = s.released_kg;
        }
    }
}

#[test]
fn two_phase_energy_balance_closes_every_step() {
    let model = TwoPhaseRelease::new(&TwoPhaseSpec::default(), &chemical("ammonia"), &met()).unwrap();
    for record in Stepper::new(&model, opts(900.0)).unwrap() {
        let record = record.unwrap();
        assert!(record.state.closure_residual < 1e-6);
        assert!((0.0..=1.0).contains(&record.state.flash_fraction));
    }
}

#[test]
fn two_phase_airborne_share_follows_flash() {
    let model = SourceSpec::TwoPhase(TwoPhaseSpec::default())
        .build(&chemical("ammonia"), &met())
        .unwrap();
    let first = model.sample(&model.initial_state());
    assert!(first.airborne_kg_s > 0.0);
    assert!(first.airborne_kg_s < first.mass_flow_kg_s);
    assert!((first.airborne_kg_s - first.mass_flow_kg_s * first.phase.airborne()).abs() < 1e-12);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn flash_fraction_stays_in_unit_interval(t in 245.0f64..400.0) {
        let spec = TwoPhaseSpec {
            initial_temperature_k: Some(t),
            ..TwoPhaseSpec::default()
        };
        let model = TwoPhaseRelease::new(&spec, &chemical("ammonia"), &met()).unwrap();
        let state = model.initial_state();
        prop_assert!((0.0..=1.0).contains(&state.flash_fraction));
        prop_assert!(state.mass_flow_kg_s >= 0.0);
    }
}
