//! pc-scenario: scenario document format, loading and validation.

pub mod scenario;
pub mod schema;
pub mod validate;

pub use scenario::Scenario;
pub use schema::*;
pub use validate::{ValidationError, validate_document};

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> ScenarioResult<Scenario> {
    let doc: ScenarioDocument = serde_yaml::from_str(content)?;
    Ok(Scenario::from_document(doc)?)
}

pub fn from_json_str(content: &str) -> ScenarioResult<Scenario> {
    let doc: ScenarioDocument = serde_json::from_str(content)?;
    Ok(Scenario::from_document(doc)?)
}

pub fn load_yaml(path: &std::path::Path) -> ScenarioResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn load_json(path: &std::path::Path) -> ScenarioResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ScenarioResult<Scenario> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}

pub fn save_yaml(path: &std::path::Path, scenario: &Scenario) -> ScenarioResult<()> {
    let content = serde_yaml::to_string(&scenario.to_document())?;
    std::fs::write(path, content)?;
    Ok(())
}
