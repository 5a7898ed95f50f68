//! pc-chem: chemical property records and exposure thresholds.
//!
//! Chemical data is owned by an external property collaborator. The core only
//! sees it through the [`ChemicalStore`] capability, which hands out immutable,
//! fully typed [`Chemical`] records.

pub mod catalog;
pub mod chemical;
pub mod error;
pub mod store;
pub mod thresholds;

pub use catalog::{ChemicalCatalogEntry, builtin_chemicals, catalog_entries};
pub use chemical::{AntoineCoefficients, Chemical};
pub use error::{ChemError, ChemResult};
pub use store::{ChemicalStore, InMemoryStore};
pub use thresholds::{ExposureThresholds, ThresholdFamily, ThresholdKind, parse_ppm};
