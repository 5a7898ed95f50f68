//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over the JSON form of the validated scenario and the solver
/// version. Identical inputs give identical IDs.
pub fn compute_run_id<S: Serialize + ?Sized>(scenario: &S, solver_version: &str) -> crate::ResultsResult<String> {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario)?;
    hasher.update(scenario_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
