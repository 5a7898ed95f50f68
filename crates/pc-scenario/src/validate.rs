//! Scenario validation.

use crate::schema::{ScenarioDocument, SCHEMA_VERSION};
use pc_met::MeteorologicalState;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("Conflicting fields: {fields} ({reason})")]
    Conflict { fields: String, reason: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: impl ToString) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

pub fn validate_document(doc: &ScenarioDocument) -> Result<(), ValidationError> {
    if doc.version > SCHEMA_VERSION {
        return Err(ValidationError::UnsupportedVersion { version: doc.version });
    }
    if doc.id.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: "id".to_string(),
        });
    }

    validate_source(doc)?;

    if doc.chemical.name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: "chemical.name".to_string(),
        });
    }
    if let Some(mw) = doc.chemical.molecular_weight_g_mol {
        positive("chemical.molecular_weight_g_mol", mw)?;
    }

    MeteorologicalState::new(doc.meteorology.clone())
        .map_err(|e| invalid("meteorology", doc.meteorology.wind_speed_m_s, e))?;
    doc.grid
        .validate()
        .map_err(|e| invalid("grid", format!("{}x{}", doc.grid.nx, doc.grid.ny), e))?;

    let d = &doc.dispersion;
    positive("dispersion.dense_gas_ratio", d.dense_gas_ratio)?;
    positive("dispersion.heavy_gas_max_distance_m", d.heavy_gas_max_distance_m)?;
    positive("dispersion.averaging_window_s", d.averaging_window_s)?;
    if let pc_dispersion::ReleaseMode::Puff { duration_s } = d.release_mode {
        positive("dispersion.release_mode.duration_s", duration_s)?;
    }
    if let Some(t) = d.evaluation_time_s {
        if !(t.is_finite() && t >= 0.0) {
            return Err(invalid("dispersion.evaluation_time_s", t, "must be non-negative"));
        }
    }

    let s = &doc.simulation;
    positive("simulation.dt_s", s.dt_s)?;
    positive("simulation.duration_s", s.duration_s)?;
    if s.duration_s < s.dt_s {
        return Err(invalid("simulation.duration_s", s.duration_s, "shorter than one step"));
    }
    if s.max_steps == 0 {
        return Err(invalid("simulation.max_steps", 0, "must be positive"));
    }
    Ok(())
}

fn validate_source(doc: &ScenarioDocument) -> Result<(), ValidationError> {
    let source = &doc.source;
    match (source.rate_kg_s, &source.model) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::Conflict {
                fields: "source.rate_kg_s, source.model".to_string(),
                reason: "give either a release rate or a source model".to_string(),
            });
        }
        (None, None) => {
            return Err(ValidationError::MissingField {
                field: "source.rate_kg_s or source.model".to_string(),
            });
        }
        (Some(rate), None) => {
            positive("source.rate_kg_s", rate)?;
            if let Some(d) = source.duration_s {
                positive("source.duration_s", d)?;
            }
        }
        (None, Some(model)) => {
            model.validate().map_err(|e| invalid("source.model", model.kind(), e))?;
        }
    }
    if let Some(t) = source.temperature_k {
        positive("source.temperature_k", t)?;
    }
    if !(source.height_m.is_finite() && source.height_m >= 0.0) {
        return Err(invalid("source.height_m", source.height_m, "must be non-negative"));
    }
    if let Some(loc) = source.location {
        if !(-90.0..=90.0).contains(&loc.latitude_deg) {
            return Err(invalid("source.location.latitude_deg", loc.latitude_deg, "outside [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&loc.longitude_deg) {
            return Err(invalid("source.location.longitude_deg", loc.longitude_deg, "outside [-180, 180]"));
        }
    }
    Ok(())
}
