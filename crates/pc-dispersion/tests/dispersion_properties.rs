//! Field-level properties of the Gaussian and heavy-gas models.

use pc_chem::{ChemicalStore, InMemoryStore};
use pc_core::PpmConverter;
use pc_dispersion::{
    ConcentrationField, GaussianModel, GridSpec, HeavyGasConfig, HeavyGasModel, PointSource, Regime,
    ReleaseMode, evaluate_grid,
};
use pc_met::{MetConditions, MeteorologicalState, StabilityClass, SurfaceRoughness};
use proptest::prelude::*;

fn met_with(stability: StabilityClass, roughness: SurfaceRoughness) -> MeteorologicalState {
    MeteorologicalState::new(MetConditions {
        stability,
        roughness,
        ..MetConditions::default()
    })
    .unwrap()
}

proptest! {
    #[test]
    fn ground_centerline_never_increases_downwind(
        x in 1.0f64..15_000.0,
        dx in 0.5f64..2_000.0,
        idx in 0usize..6,
        rural in any::<bool>(),
    ) {
        let roughness = if rural { SurfaceRoughness::Rural } else { SurfaceRoughness::Urban };
        let met = met_with(StabilityClass::ALL[idx], roughness);
        let model = GaussianModel::continuous(&met, 1.0, 0.0).unwrap();
        let near = model.concentration(x, 0.0, 0.0, 0.0);
        let far = model.concentration(x + dx, 0.0, 0.0, 0.0);
        prop_assert!(far <= near);
    }
}

#[test]
fn heavy_gas_approaches_the_passive_plume() {
    let chlorine = InMemoryStore::builtin().get_chemical("chlorine").unwrap();
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let config = HeavyGasConfig {
        rate_kg_s: 2.0,
        ..HeavyGasConfig::default()
    };
    let traj = HeavyGasModel::new(&config, &chlorine, &met).unwrap().run().unwrap();

    let first = traj.points[0];
    assert_eq!(first.regime, Regime::Dense);

    let last = *traj.points.last().unwrap();
    assert_eq!(last.regime, Regime::Passive);
    assert!(last.passive_weight > 0.9);
    let rel = (last.centerline_kg_m3 - last.passive_kg_m3).abs() / last.passive_kg_m3;
    assert!(rel < 0.05, "relative difference {rel}");

    let plume = GaussianModel::continuous(&met, 2.0, 0.0).unwrap();
    let far = plume.concentration(last.distance_m, 0.0, 0.0, 0.0);
    assert!((last.passive_kg_m3 - far).abs() <= 1e-12 * far);
}

#[test]
fn two_sources_superpose_on_the_grid() {
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let ppm = PpmConverter::new(17.031, 298.15, 101_325.0).unwrap();
    let grid = GridSpec {
        x_min_m: 0.0,
        x_max_m: 1_000.0,
        y_min_m: -200.0,
        y_max_m: 200.0,
        nx: 51,
        ny: 21,
        z_m: 1.5,
    };
    let a = PointSource::at_origin(1.0);
    let b = PointSource {
        y_m: 100.0,
        ..PointSource::at_origin(0.5)
    };
    let both = GaussianModel::new(&met, ReleaseMode::Continuous, vec![a.clone(), b.clone()]).unwrap();
    let only_a = GaussianModel::new(&met, ReleaseMode::Continuous, vec![a]).unwrap();
    let only_b = GaussianModel::new(&met, ReleaseMode::Continuous, vec![b]).unwrap();

    let f_both = evaluate_grid(&both, &grid, 0.0, &ppm).unwrap();
    let f_a = evaluate_grid(&only_a, &grid, 0.0, &ppm).unwrap();
    let f_b = evaluate_grid(&only_b, &grid, 0.0, &ppm).unwrap();
    for k in 0..grid.len() {
        let sum = f_a.values[k] + f_b.values[k];
        assert!((f_both.values[k] - sum).abs() <= 1e-9 * sum.max(1.0));
    }
    assert!(f_both.values.iter().all(|v| *v >= 0.0));
}

#[test]
fn grid_evaluation_is_deterministic() {
    let met = MeteorologicalState::new(MetConditions::default()).unwrap();
    let ppm = PpmConverter::new(17.031, 298.15, 101_325.0).unwrap();
    let model = GaussianModel::continuous(&met, 1.0, 0.0).unwrap();
    let grid = GridSpec::default();
    let a = evaluate_grid(&model, &grid, 0.0, &ppm).unwrap();
    let b = evaluate_grid(&model, &grid, 0.0, &ppm).unwrap();
    assert_eq!(a, b);
}
