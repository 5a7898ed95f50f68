//! Natural-gas transmission line rupture through a 0.1 m hole.

use pc_chem::{ChemicalStore, InMemoryStore};
use pc_met::{MetConditions, MeteorologicalState};
use pc_sim::{SimOptions, StepModel, Stepper};
use pc_source::{PipelineLeak, PipelineSpec, SourceSpec, collect_series};

fn spec() -> PipelineSpec {
    PipelineSpec {
        length_m: 10_000.0,
        diameter_m: 0.3,
        hole_diameter_m: 0.1,
        initial_pressure_pa: 80e5,
        ..PipelineSpec::default()
    }
}

fn opts() -> SimOptions {
    SimOptions {
        dt: 5.0,
        t_end: 7200.0,
        min_dt: 1e-3,
        ..SimOptions::default()
    }
}

#[test]
fn rate_decays_monotonically_to_near_zero() {
    let chem = InMemoryStore::builtin().get_chemical("methane").unwrap();
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let model = SourceSpec::Pipeline(spec()).build(&chem, &met).unwrap();
    let series = collect_series(&model, opts()).unwrap();

    let initial = series.samples[0].mass_flow_kg_s;
    assert!(initial > 10.0, "initial rate {initial}");
    for pair in series.samples.windows(2) {
        assert!(pair[1].mass_flow_kg_s <= pair[0].mass_flow_kg_s);
    }
    let last = series.samples.last().unwrap();
    assert!(last.mass_flow_kg_s < 1e-2 * initial, "final rate {}", last.mass_flow_kg_s);
    assert!(last.time_s > 600.0);
}

#[test]
fn released_plus_inventory_is_conserved() {
    let chem = InMemoryStore::builtin().get_chemical("methane").unwrap();
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let model = PipelineLeak::new(&spec(), &chem, &met).unwrap();
    let m0 = model.initial_inventory_kg();
    let mut last = model.initial_state();
    for record in Stepper::new(&model, opts()).unwrap() {
        let state = record.unwrap().state;
        assert!(((state.released_kg + state.inventory_kg) - m0).abs() / m0 < 1e-9);
        assert!(state.temperature_k <= last.temperature_k + 1e-9);
        last = state;
    }
    assert!(model.is_terminal(&last) || last.time_s >= 7200.0 - 1e-6);
    assert!(last.released_kg > 0.9 * m0);
}

#[test]
fn integrated_flow_matches_released_mass() {
    let chem = InMemoryStore::builtin().get_chemical("methane").unwrap();
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let model = SourceSpec::Pipeline(spec()).build(&chem, &met).unwrap();
    // Each step books its opening rate; at 1 s the sampled trapezoid stays within 0.5 %.
    let series = collect_series(&model, SimOptions { dt: 1.0, ..opts() }).unwrap();

    let integral: f64 = series
        .samples
        .windows(2)
        .map(|w| 0.5 * (w[0].mass_flow_kg_s + w[1].mass_flow_kg_s) * (w[1].time_s - w[0].time_s))
        .sum();
    let total = series.total_released_kg();
    assert!(total > 0.0);
    let rel = (integral - total) / total;
    assert!(rel.abs() < 5e-3, "trapezoid {integral} vs released {total} ({rel:e})");
}
