//! Scenario loading and introspection.

use std::path::Path;

use pc_chem::{Chemical, ChemicalStore, InMemoryStore};
use pc_scenario::Scenario;

use crate::error::{AppError, AppResult};

/// One-line description of a scenario for listings.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: Option<String>,
    pub chemical: String,
    pub source_kind: &'static str,
    pub stability: String,
    pub wind_speed_m_s: f64,
    pub grid_points: usize,
}

/// Load and validate a YAML or JSON scenario.
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    pc_scenario::load(path).map_err(|e| AppError::from_scenario_file(path, e))
}

/// Look the scenario's chemical up and apply its molecular-weight override.
pub fn resolve_chemical(scenario: &Scenario, store: &dyn ChemicalStore) -> AppResult<Chemical> {
    let def = scenario.chemical();
    let chemical = store
        .get_chemical(&def.name)
        .map_err(|e| AppError::from_chem(scenario.id(), e))?;
    match def.molecular_weight_g_mol {
        Some(mw) => chemical
            .with_molecular_weight(mw)
            .map_err(|e| AppError::from_chem(scenario.id(), e)),
        None => Ok(chemical),
    }
}

pub fn summarize(scenario: &Scenario) -> ScenarioSummary {
    let met = scenario.meteorology();
    ScenarioSummary {
        id: scenario.id().to_string(),
        name: scenario.name().map(str::to_string),
        chemical: scenario.chemical().name.clone(),
        source_kind: scenario.source().kind(),
        stability: met.stability.label().to_string(),
        wind_speed_m_s: met.wind_speed_m_s,
        grid_points: scenario.grid().len(),
    }
}

/// The built-in catalog, or a YAML/JSON chemical file when given.
pub fn open_chemical_store(path: Option<&Path>) -> AppResult<InMemoryStore> {
    match path {
        Some(p) => Ok(InMemoryStore::load(p)?),
        None => Ok(InMemoryStore::builtin()),
    }
}

/// Direct lookup outside any scenario.
pub fn lookup_chemical(store: &dyn ChemicalStore, name_or_cas: &str) -> AppResult<Chemical> {
    Ok(store.get_chemical(name_or_cas)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_and_override() {
        let scenario = pc_scenario::from_yaml_str(
            "id: s\nsource:\n  rate_kg_s: 1.0\nchemical:\n  name: Chlorine\n  molecular_weight_g_mol: 71.0\n",
        )
        .unwrap();
        let summary = summarize(&scenario);
        assert_eq!(summary.source_kind, "direct");
        assert_eq!(summary.stability, "D");

        let chlorine = resolve_chemical(&scenario, &InMemoryStore::builtin()).unwrap();
        assert_eq!(chlorine.molecular_weight_g_mol, 71.0);
    }

    #[test]
    fn lookup_by_cas() {
        let store = open_chemical_store(None).unwrap();
        let ammonia = lookup_chemical(&store, "7664-41-7").unwrap();
        assert_eq!(ammonia.name, "Ammonia");
        assert!(matches!(lookup_chemical(&store, "nope"), Err(AppError::Chemical(_))));
    }
}
