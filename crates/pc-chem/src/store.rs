//! Read-only chemical property lookup capability.
//!
//! A store is passed explicitly into every simulation call. Concurrent scenario
//! runs share a store by reference; nothing here is global or mutable after
//! construction.

use crate::catalog::builtin_chemicals;
use crate::chemical::Chemical;
use crate::error::{ChemError, ChemResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Read-only lookup keyed by case-insensitive name, alias or CAS number.
pub trait ChemicalStore: Send + Sync {
    /// Human-readable name of the backing data set.
    fn source_name(&self) -> &str;

    fn get_chemical(&self, name_or_cas: &str) -> ChemResult<Chemical>;

    /// Display names of every record, in storage order.
    fn chemical_names(&self) -> Vec<String>;
}

/// On-disk layout accepted by [`InMemoryStore::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalDocument {
    pub chemicals: Vec<Chemical>,
}

/// Store backed by an owned list of validated records.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    source: String,
    chemicals: Vec<Chemical>,
    index: HashMap<String, usize>,
}

impl InMemoryStore {
    pub fn new(source: impl Into<String>, chemicals: Vec<Chemical>) -> ChemResult<Self> {
        let mut index = HashMap::new();
        for (i, chem) in chemicals.iter().enumerate() {
            chem.validate()?;
            let keys = std::iter::once(chem.name.as_str())
                .chain(chem.aliases.iter().map(String::as_str))
                .chain(std::iter::once(chem.cas.as_str()));
            for key in keys {
                let key = normalize(key);
                if key.is_empty() {
                    continue;
                }
                if let Some(previous) = index.insert(key.clone(), i)
                    && previous != i
                {
                    return Err(ChemError::Parse {
                        message: format!("duplicate chemical key '{key}'"),
                    });
                }
            }
        }
        Ok(Self {
            source: source.into(),
            chemicals,
            index,
        })
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        let chemicals = builtin_chemicals();
        let mut index = HashMap::new();
        for (i, chem) in chemicals.iter().enumerate() {
            index.insert(normalize(&chem.name), i);
            index.insert(normalize(&chem.cas), i);
            for alias in &chem.aliases {
                index.insert(normalize(alias), i);
            }
        }
        Self {
            source: "builtin".to_string(),
            chemicals,
            index,
        }
    }

    pub fn from_yaml_str(source: impl Into<String>, content: &str) -> ChemResult<Self> {
        let doc: ChemicalDocument = serde_yaml::from_str(content)?;
        Self::new(source, doc.chemicals)
    }

    pub fn from_json_str(source: impl Into<String>, content: &str) -> ChemResult<Self> {
        let doc: ChemicalDocument = serde_json::from_str(content)?;
        Self::new(source, doc.chemicals)
    }

    /// Load a `.yaml`/`.yml` or `.json` property file.
    pub fn load(path: &Path) -> ChemResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ChemError::Parse {
            message: format!("{}: {e}", path.display()),
        })?;
        let source = path.display().to_string();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(source, &content),
            _ => Self::from_yaml_str(source, &content),
        }
    }

    pub fn len(&self) -> usize {
        self.chemicals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chemicals.is_empty()
    }
}

impl ChemicalStore for InMemoryStore {
    fn source_name(&self) -> &str {
        &self.source
    }

    fn get_chemical(&self, name_or_cas: &str) -> ChemResult<Chemical> {
        let key = normalize(name_or_cas);
        let found = self.index.get(&key).map(|&i| self.chemicals[i].clone());
        tracing::debug!(query = name_or_cas, found = found.is_some(), source = %self.source, "chemical lookup");
        found.ok_or_else(|| ChemError::ChemicalNotFound {
            query: name_or_cas.to_string(),
        })
    }

    fn chemical_names(&self) -> Vec<String> {
        self.chemicals.iter().map(|c| c.name.clone()).collect()
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_alias_and_cas() {
        let store = InMemoryStore::builtin();
        assert_eq!(store.get_chemical("AMMONIA").unwrap().cas, "7664-41-7");
        assert_eq!(store.get_chemical("nh3").unwrap().name, "Ammonia");
        assert_eq!(store.get_chemical(" 7782-50-5 ").unwrap().name, "Chlorine");
    }

    #[test]
    fn unknown_chemical_is_not_found() {
        let store = InMemoryStore::builtin();
        let err = store.get_chemical("unobtainium").unwrap_err();
        assert!(matches!(err, ChemError::ChemicalNotFound { .. }));
    }

    #[test]
    fn duplicate_keys_rejected() {
        let nh3 = InMemoryStore::builtin().get_chemical("ammonia").unwrap();
        let err = InMemoryStore::new("dup", vec![nh3.clone(), nh3]).unwrap_err();
        assert!(matches!(err, ChemError::Parse { .. }));
    }
}
