//! The validated, immutable scenario handed to the simulation.

use crate::schema::{ChemicalDef, ConsequenceDef, DispersionDef, LocationDef, ScenarioDocument, SimulationDef};
use crate::validate::{ValidationError, validate_document};
use pc_dispersion::GridSpec;
use pc_met::MetConditions;
use pc_sim::SimOptions;
use pc_source::{DirectSpec, SourceSpec};
use serde::Serialize;

/// A scenario that passed validation. Only [`Scenario::from_document`]
/// builds one, so every field is known to be physical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    id: String,
    name: Option<String>,
    location: Option<LocationDef>,
    source: SourceSpec,
    source_height_m: f64,
    release_temperature_k: Option<f64>,
    chemical: ChemicalDef,
    meteorology: MetConditions,
    grid: GridSpec,
    dispersion: DispersionDef,
    simulation: SimulationDef,
    consequence: ConsequenceDef,
}

impl Scenario {
    pub fn from_document(doc: ScenarioDocument) -> Result<Self, ValidationError> {
        validate_document(&doc)?;
        let source = match (doc.source.rate_kg_s, doc.source.model) {
            (Some(rate_kg_s), _) => SourceSpec::Direct(DirectSpec {
                rate_kg_s,
                duration_s: doc.source.duration_s.unwrap_or(doc.simulation.duration_s),
                temperature_k: doc.source.temperature_k,
            }),
            (None, Some(model)) => model,
            (None, None) => {
                return Err(ValidationError::MissingField {
                    field: "source.rate_kg_s or source.model".to_string(),
                });
            }
        };
        tracing::debug!(id = %doc.id, source = source.kind(), chemical = %doc.chemical.name, "scenario validated");
        Ok(Self {
            id: doc.id,
            name: doc.name,
            location: doc.source.location,
            source,
            source_height_m: doc.source.height_m,
            release_temperature_k: doc.source.temperature_k,
            chemical: doc.chemical,
            meteorology: doc.meteorology,
            grid: doc.grid,
            dispersion: doc.dispersion,
            simulation: doc.simulation,
            consequence: doc.consequence,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn location(&self) -> Option<LocationDef> {
        self.location
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub fn source_height_m(&self) -> f64 {
        self.source_height_m
    }

    /// Temperature override for the airborne release, if any.
    pub fn release_temperature_k(&self) -> Option<f64> {
        self.release_temperature_k
    }

    pub fn chemical(&self) -> &ChemicalDef {
        &self.chemical
    }

    pub fn meteorology(&self) -> &MetConditions {
        &self.meteorology
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn dispersion(&self) -> &DispersionDef {
        &self.dispersion
    }

    pub fn simulation(&self) -> &SimulationDef {
        &self.simulation
    }

    pub fn consequence(&self) -> &ConsequenceDef {
        &self.consequence
    }

    /// Source-term stepping options; cut-back never goes below 1e-4 s.
    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            dt: self.simulation.dt_s,
            t_end: self.simulation.duration_s,
            max_steps: self.simulation.max_steps,
            min_dt: 1e-4_f64.min(self.simulation.dt_s),
            ..SimOptions::default()
        }
    }

    /// Copy with a different id and meteorology, for what-if sweeps.
    pub fn with_meteorology(&self, id: impl Into<String>, meteorology: MetConditions) -> Result<Self, ValidationError> {
        let mut doc = self.to_document();
        doc.id = id.into();
        doc.meteorology = meteorology;
        Scenario::from_document(doc)
    }

    /// The document this scenario validates from.
    pub fn to_document(&self) -> ScenarioDocument {
        ScenarioDocument {
            version: crate::schema::SCHEMA_VERSION,
            id: self.id.clone(),
            name: self.name.clone(),
            source: crate::schema::SourceDef {
                location: self.location,
                height_m: self.source_height_m,
                rate_kg_s: None,
                duration_s: None,
                temperature_k: self.release_temperature_k,
                model: Some(self.source.clone()),
            },
            chemical: self.chemical.clone(),
            meteorology: self.meteorology.clone(),
            grid: self.grid.clone(),
            dispersion: self.dispersion.clone(),
            simulation: self.simulation.clone(),
            consequence: self.consequence.clone(),
        }
    }
}
