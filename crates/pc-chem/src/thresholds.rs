//! Airborne exposure thresholds (AEGL, ERPG, IDLH, PAC, flammability limits).
//!
//! All values are volumetric mixing ratios in ppm. AEGL values are the 60 min
//! tier. LEL/UEL are stored in ppm as well (1 % = 10 000 ppm).

use crate::error::{ChemError, ChemResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThresholdKind {
    #[serde(rename = "AEGL-1")]
    Aegl1,
    #[serde(rename = "AEGL-2")]
    Aegl2,
    #[serde(rename = "AEGL-3")]
    Aegl3,
    #[serde(rename = "ERPG-1")]
    Erpg1,
    #[serde(rename = "ERPG-2")]
    Erpg2,
    #[serde(rename = "ERPG-3")]
    Erpg3,
    #[serde(rename = "IDLH")]
    Idlh,
    #[serde(rename = "PAC-1")]
    Pac1,
    #[serde(rename = "PAC-2")]
    Pac2,
    #[serde(rename = "PAC-3")]
    Pac3,
    #[serde(rename = "LEL")]
    Lel,
    #[serde(rename = "UEL")]
    Uel,
}

impl ThresholdKind {
    pub const ALL: [ThresholdKind; 12] = [
        ThresholdKind::Aegl1,
        ThresholdKind::Aegl2,
        ThresholdKind::Aegl3,
        ThresholdKind::Erpg1,
        ThresholdKind::Erpg2,
        ThresholdKind::Erpg3,
        ThresholdKind::Idlh,
        ThresholdKind::Pac1,
        ThresholdKind::Pac2,
        ThresholdKind::Pac3,
        ThresholdKind::Lel,
        ThresholdKind::Uel,
    ];

    /// The toxic-exposure kinds (flammability limits excluded).
    pub const TOXIC: [ThresholdKind; 10] = [
        ThresholdKind::Aegl1,
        ThresholdKind::Aegl2,
        ThresholdKind::Aegl3,
        ThresholdKind::Erpg1,
        ThresholdKind::Erpg2,
        ThresholdKind::Erpg3,
        ThresholdKind::Idlh,
        ThresholdKind::Pac1,
        ThresholdKind::Pac2,
        ThresholdKind::Pac3,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ThresholdKind::Aegl1 => "AEGL-1",
            ThresholdKind::Aegl2 => "AEGL-2",
            ThresholdKind::Aegl3 => "AEGL-3",
            ThresholdKind::Erpg1 => "ERPG-1",
            ThresholdKind::Erpg2 => "ERPG-2",
            ThresholdKind::Erpg3 => "ERPG-3",
            ThresholdKind::Idlh => "IDLH",
            ThresholdKind::Pac1 => "PAC-1",
            ThresholdKind::Pac2 => "PAC-2",
            ThresholdKind::Pac3 => "PAC-3",
            ThresholdKind::Lel => "LEL",
            ThresholdKind::Uel => "UEL",
        }
    }

    pub fn family(&self) -> Option<ThresholdFamily> {
        match self {
            ThresholdKind::Aegl1 | ThresholdKind::Aegl2 | ThresholdKind::Aegl3 => {
                Some(ThresholdFamily::Aegl)
            }
            ThresholdKind::Erpg1 | ThresholdKind::Erpg2 | ThresholdKind::Erpg3 => {
                Some(ThresholdFamily::Erpg)
            }
            ThresholdKind::Pac1 | ThresholdKind::Pac2 | ThresholdKind::Pac3 => {
                Some(ThresholdFamily::Pac)
            }
            ThresholdKind::Idlh | ThresholdKind::Lel | ThresholdKind::Uel => None,
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ThresholdKind {
    type Err = ChemError;

    /// Accepts `AEGL-2`, `aegl2`, `Aegl_2`, `idlh`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        ThresholdKind::ALL
            .into_iter()
            .find(|kind| kind.label().replace('-', "") == key)
            .ok_or(ChemError::InvalidArg {
                what: "unrecognized threshold kind",
            })
    }
}

/// Tiered threshold families used to size protective-action zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdFamily {
    Aegl,
    Erpg,
    Pac,
}

impl ThresholdFamily {
    pub const DEFAULT_PREFERENCE: [ThresholdFamily; 3] =
        [ThresholdFamily::Aegl, ThresholdFamily::Erpg, ThresholdFamily::Pac];

    /// Tier 1..3 kinds, least to most severe.
    pub fn kinds(&self) -> [ThresholdKind; 3] {
        match self {
            ThresholdFamily::Aegl => [ThresholdKind::Aegl1, ThresholdKind::Aegl2, ThresholdKind::Aegl3],
            ThresholdFamily::Erpg => [ThresholdKind::Erpg1, ThresholdKind::Erpg2, ThresholdKind::Erpg3],
            ThresholdFamily::Pac => [ThresholdKind::Pac1, ThresholdKind::Pac2, ThresholdKind::Pac3],
        }
    }
}

/// Exposure thresholds of one chemical, ppm. `None` means "no published value".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureThresholds {
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub aegl1: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub aegl2: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub aegl3: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub erpg1: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub erpg2: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub erpg3: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub idlh: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub pac1: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub pac2: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub pac3: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub lel: Option<f64>,
    #[serde(deserialize_with = "ppm_value", skip_serializing_if = "Option::is_none")]
    pub uel: Option<f64>,
}

impl ExposureThresholds {
    pub const NONE: ExposureThresholds = ExposureThresholds {
        aegl1: None,
        aegl2: None,
        aegl3: None,
        erpg1: None,
        erpg2: None,
        erpg3: None,
        idlh: None,
        pac1: None,
        pac2: None,
        pac3: None,
        lel: None,
        uel: None,
    };

    pub fn get(&self, kind: ThresholdKind) -> Option<f64> {
        match kind {
            ThresholdKind::Aegl1 => self.aegl1,
            ThresholdKind::Aegl2 => self.aegl2,
            ThresholdKind::Aegl3 => self.aegl3,
            ThresholdKind::Erpg1 => self.erpg1,
            ThresholdKind::Erpg2 => self.erpg2,
            ThresholdKind::Erpg3 => self.erpg3,
            ThresholdKind::Idlh => self.idlh,
            ThresholdKind::Pac1 => self.pac1,
            ThresholdKind::Pac2 => self.pac2,
            ThresholdKind::Pac3 => self.pac3,
            ThresholdKind::Lel => self.lel,
            ThresholdKind::Uel => self.uel,
        }
    }

    /// All published values, in [`ThresholdKind::ALL`] order.
    pub fn available(&self) -> Vec<(ThresholdKind, f64)> {
        ThresholdKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|v| (kind, v)))
            .collect()
    }

    /// First family in `preference` with at least one published tier.
    pub fn recommended_family(&self, preference: &[ThresholdFamily]) -> Option<ThresholdFamily> {
        preference
            .iter()
            .copied()
            .find(|family| family.kinds().iter().any(|k| self.get(*k).is_some()))
    }

    pub fn validate(&self) -> ChemResult<()> {
        for (_, value) in self.available() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ChemError::NonPhysical {
                    what: "exposure threshold must be a positive ppm value",
                });
            }
        }
        Ok(())
    }
}

/// Parse a threshold string such as `"160"`, `"160 ppm"` or `"1,100 ppm"`.
pub fn parse_ppm(text: &str) -> ChemResult<f64> {
    let trimmed = text.trim();
    let numeric = trimmed
        .strip_suffix("ppm")
        .or_else(|| trimmed.strip_suffix("PPM"))
        .unwrap_or(trimmed)
        .trim()
        .replace(',', "");
    numeric.parse::<f64>().map_err(|_| ChemError::Parse {
        message: format!("not a ppm value: '{text}'"),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPpm {
    Number(f64),
    Text(String),
}

fn ppm_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawPpm> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawPpm::Number(v)) => Ok(Some(v)),
        Some(RawPpm::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawPpm::Text(s)) => parse_ppm(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_lenient() {
        assert_eq!("AEGL-2".parse::<ThresholdKind>().unwrap(), ThresholdKind::Aegl2);
        assert_eq!("aegl2".parse::<ThresholdKind>().unwrap(), ThresholdKind::Aegl2);
        assert_eq!("pac_3".parse::<ThresholdKind>().unwrap(), ThresholdKind::Pac3);
        assert_eq!("idlh".parse::<ThresholdKind>().unwrap(), ThresholdKind::Idlh);
        assert!("AEGL-4".parse::<ThresholdKind>().is_err());
    }

    #[test]
    fn parse_ppm_variants() {
        assert_eq!(parse_ppm("160").unwrap(), 160.0);
        assert_eq!(parse_ppm(" 160 ppm ").unwrap(), 160.0);
        assert_eq!(parse_ppm("1,100 ppm").unwrap(), 1100.0);
        assert!(parse_ppm("n/a").is_err());
    }

    #[test]
    fn recommended_family_skips_missing() {
        let t = ExposureThresholds {
            pac2: Some(17_000.0),
            ..ExposureThresholds::NONE
        };
        assert_eq!(
            t.recommended_family(&ThresholdFamily::DEFAULT_PREFERENCE),
            Some(ThresholdFamily::Pac)
        );
        assert_eq!(ExposureThresholds::NONE.recommended_family(&ThresholdFamily::DEFAULT_PREFERENCE), None);
    }

    #[test]
    fn yaml_accepts_ppm_strings() {
        let yaml = "aegl2: \"160 ppm\"\nidlh: 300\n";
        let t: ExposureThresholds = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.aegl2, Some(160.0));
        assert_eq!(t.idlh, Some(300.0));
        assert_eq!(t.aegl1, None);
    }

    #[test]
    fn validate_rejects_non_positive() {
        let t = ExposureThresholds {
            idlh: Some(-1.0),
            ..ExposureThresholds::NONE
        };
        assert!(t.validate().is_err());
    }
}
