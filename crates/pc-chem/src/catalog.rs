use crate::chemical::{AntoineCoefficients, Chemical};
use crate::thresholds::ExposureThresholds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChemicalCatalogEntry {
    pub canonical_id: &'static str,
    pub display_name: &'static str,
    pub cas: &'static str,
    pub aliases: &'static [&'static str],
    pub molecular_weight_g_mol: f64,
    pub antoine: AntoineCoefficients,
    pub boiling_point_k: f64,
    pub freezing_point_k: f64,
    pub liquid_density_kg_m3: f64,
    pub liquid_cp_j_kg_k: f64,
    pub latent_heat_j_kg: f64,
    pub heat_capacity_ratio: f64,
    pub critical_temperature_k: f64,
    pub critical_pressure_pa: f64,
    pub joule_thomson_k_per_pa: f64,
    pub thresholds: ExposureThresholds,
}

impl ChemicalCatalogEntry {
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            return true;
        }

        self.canonical_id.to_ascii_lowercase().contains(&query)
            || self.display_name.to_ascii_lowercase().contains(&query)
            || self.cas == query
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_ascii_lowercase().contains(&query))
    }

    pub fn to_chemical(&self) -> Chemical {
        Chemical {
            name: self.display_name.to_string(),
            cas: self.cas.to_string(),
            aliases: std::iter::once(self.canonical_id)
                .chain(self.aliases.iter().copied())
                .map(str::to_string)
                .collect(),
            molecular_weight_g_mol: self.molecular_weight_g_mol,
            antoine: self.antoine,
            boiling_point_k: self.boiling_point_k,
            freezing_point_k: self.freezing_point_k,
            liquid_density_kg_m3: self.liquid_density_kg_m3,
            liquid_cp_j_kg_k: self.liquid_cp_j_kg_k,
            latent_heat_j_kg: self.latent_heat_j_kg,
            heat_capacity_ratio: self.heat_capacity_ratio,
            critical_temperature_k: self.critical_temperature_k,
            critical_pressure_pa: self.critical_pressure_pa,
            joule_thomson_k_per_pa: self.joule_thomson_k_per_pa,
            thresholds: self.thresholds,
        }
    }
}

const fn antoine(a: f64, b: f64, c: f64) -> AntoineCoefficients {
    AntoineCoefficients { a, b, c }
}

// Antoine coefficients: log10(mmHg), degC. Thresholds: ppm, AEGL 60 min.
const BUILTIN_CATALOG: [ChemicalCatalogEntry; 10] = [
    ChemicalCatalogEntry {
        canonical_id: "NH3",
        display_name: "Ammonia",
        cas: "7664-41-7",
        aliases: &["anhydrous ammonia"],
        molecular_weight_g_mol: 17.031,
        antoine: antoine(7.554_66, 1_002.711, 247.885),
        boiling_point_k: 239.82,
        freezing_point_k: 195.4,
        liquid_density_kg_m3: 682.0,
        liquid_cp_j_kg_k: 4_700.0,
        latent_heat_j_kg: 1.37e6,
        heat_capacity_ratio: 1.31,
        critical_temperature_k: 405.4,
        critical_pressure_pa: 11.33e6,
        joule_thomson_k_per_pa: 2.0e-5,
        thresholds: ExposureThresholds {
            aegl1: Some(30.0),
            aegl2: Some(160.0),
            aegl3: Some(1_100.0),
            erpg1: Some(25.0),
            erpg2: Some(150.0),
            erpg3: Some(1_500.0),
            idlh: Some(300.0),
            pac1: Some(30.0),
            pac2: Some(160.0),
            pac3: Some(1_100.0),
            lel: Some(150_000.0),
            uel: Some(280_000.0),
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "Cl2",
        display_name: "Chlorine",
        cas: "7782-50-5",
        aliases: &[],
        molecular_weight_g_mol: 70.906,
        antoine: antoine(6.937_90, 861.34, 246.33),
        boiling_point_k: 239.11,
        freezing_point_k: 172.2,
        liquid_density_kg_m3: 1_563.0,
        liquid_cp_j_kg_k: 926.0,
        latent_heat_j_kg: 2.88e5,
        heat_capacity_ratio: 1.33,
        critical_temperature_k: 417.0,
        critical_pressure_pa: 7.991e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            aegl1: Some(0.5),
            aegl2: Some(2.0),
            aegl3: Some(20.0),
            erpg1: Some(1.0),
            erpg2: Some(3.0),
            erpg3: Some(20.0),
            idlh: Some(10.0),
            pac1: Some(0.5),
            pac2: Some(2.0),
            pac3: Some(20.0),
            ..ExposureThresholds::NONE
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "CH4",
        display_name: "Methane",
        cas: "74-82-8",
        aliases: &["natural gas"],
        molecular_weight_g_mol: 16.043,
        antoine: antoine(6.611_84, 389.93, 266.0),
        boiling_point_k: 111.66,
        freezing_point_k: 90.7,
        liquid_density_kg_m3: 422.6,
        liquid_cp_j_kg_k: 3_480.0,
        latent_heat_j_kg: 5.1e5,
        heat_capacity_ratio: 1.31,
        critical_temperature_k: 190.6,
        critical_pressure_pa: 4.599e6,
        joule_thomson_k_per_pa: 4.4e-6,
        thresholds: ExposureThresholds {
            pac1: Some(65_000.0),
            pac2: Some(230_000.0),
            pac3: Some(400_000.0),
            lel: Some(50_000.0),
            uel: Some(150_000.0),
            ..ExposureThresholds::NONE
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C3H8",
        display_name: "Propane",
        cas: "74-98-6",
        aliases: &["lpg"],
        molecular_weight_g_mol: 44.097,
        antoine: antoine(6.829_73, 813.2, 248.0),
        boiling_point_k: 231.05,
        freezing_point_k: 85.5,
        liquid_density_kg_m3: 493.0,
        liquid_cp_j_kg_k: 2_520.0,
        latent_heat_j_kg: 4.26e5,
        heat_capacity_ratio: 1.13,
        critical_temperature_k: 369.8,
        critical_pressure_pa: 4.248e6,
        joule_thomson_k_per_pa: 1.9e-5,
        thresholds: ExposureThresholds {
            idlh: Some(2_100.0),
            pac1: Some(5_500.0),
            pac2: Some(17_000.0),
            pac3: Some(33_000.0),
            lel: Some(21_000.0),
            uel: Some(95_000.0),
            ..ExposureThresholds::NONE
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C4H10",
        display_name: "Butane",
        cas: "106-97-8",
        aliases: &["n-butane"],
        molecular_weight_g_mol: 58.12,
        antoine: antoine(6.808_96, 935.86, 238.73),
        boiling_point_k: 272.65,
        freezing_point_k: 134.8,
        liquid_density_kg_m3: 601.0,
        liquid_cp_j_kg_k: 2_390.0,
        latent_heat_j_kg: 3.85e5,
        heat_capacity_ratio: 1.10,
        critical_temperature_k: 425.1,
        critical_pressure_pa: 3.796e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            pac1: Some(5_500.0),
            pac2: Some(17_000.0),
            pac3: Some(53_000.0),
            lel: Some(16_000.0),
            uel: Some(84_000.0),
            ..ExposureThresholds::NONE
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C7H8",
        display_name: "Toluene",
        cas: "108-88-3",
        aliases: &["methylbenzene"],
        molecular_weight_g_mol: 92.14,
        antoine: antoine(6.954_64, 1_344.8, 219.48),
        boiling_point_k: 383.75,
        freezing_point_k: 178.0,
        liquid_density_kg_m3: 867.0,
        liquid_cp_j_kg_k: 1_700.0,
        latent_heat_j_kg: 3.51e5,
        heat_capacity_ratio: 1.09,
        critical_temperature_k: 591.75,
        critical_pressure_pa: 4.108e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            aegl1: Some(67.0),
            aegl2: Some(560.0),
            aegl3: Some(3_700.0),
            erpg1: Some(50.0),
            erpg2: Some(300.0),
            erpg3: Some(1_000.0),
            idlh: Some(500.0),
            pac1: Some(67.0),
            pac2: Some(560.0),
            pac3: Some(3_700.0),
            lel: Some(11_000.0),
            uel: Some(71_000.0),
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C6H6",
        display_name: "Benzene",
        cas: "71-43-2",
        aliases: &[],
        molecular_weight_g_mol: 78.11,
        antoine: antoine(6.892_72, 1_203.531, 219.888),
        boiling_point_k: 353.25,
        freezing_point_k: 278.6,
        liquid_density_kg_m3: 876.0,
        liquid_cp_j_kg_k: 1_740.0,
        latent_heat_j_kg: 3.94e5,
        heat_capacity_ratio: 1.12,
        critical_temperature_k: 562.0,
        critical_pressure_pa: 4.894e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            aegl1: Some(52.0),
            aegl2: Some(800.0),
            aegl3: Some(4_000.0),
            erpg1: Some(50.0),
            erpg2: Some(150.0),
            erpg3: Some(1_000.0),
            idlh: Some(500.0),
            pac1: Some(52.0),
            pac2: Some(800.0),
            pac3: Some(4_000.0),
            lel: Some(12_000.0),
            uel: Some(78_000.0),
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "CH3OH",
        display_name: "Methanol",
        cas: "67-56-1",
        aliases: &["methyl alcohol"],
        molecular_weight_g_mol: 32.04,
        antoine: antoine(7.897_5, 1_474.08, 229.13),
        boiling_point_k: 337.85,
        freezing_point_k: 175.6,
        liquid_density_kg_m3: 792.0,
        liquid_cp_j_kg_k: 2_510.0,
        latent_heat_j_kg: 1.1e6,
        heat_capacity_ratio: 1.20,
        critical_temperature_k: 512.6,
        critical_pressure_pa: 8.084e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            aegl1: Some(530.0),
            aegl2: Some(2_100.0),
            aegl3: Some(7_200.0),
            erpg1: Some(200.0),
            erpg2: Some(1_000.0),
            erpg3: Some(5_000.0),
            idlh: Some(6_000.0),
            pac1: Some(530.0),
            pac2: Some(2_100.0),
            pac3: Some(7_200.0),
            lel: Some(60_000.0),
            uel: Some(360_000.0),
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C2H5OH",
        display_name: "Ethanol",
        cas: "64-17-5",
        aliases: &["ethyl alcohol"],
        molecular_weight_g_mol: 46.07,
        antoine: antoine(8.044_94, 1_554.3, 222.65),
        boiling_point_k: 351.45,
        freezing_point_k: 159.0,
        liquid_density_kg_m3: 789.0,
        liquid_cp_j_kg_k: 2_440.0,
        latent_heat_j_kg: 8.46e5,
        heat_capacity_ratio: 1.13,
        critical_temperature_k: 513.9,
        critical_pressure_pa: 6.148e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            idlh: Some(3_300.0),
            pac1: Some(1_800.0),
            pac2: Some(3_300.0),
            pac3: Some(15_000.0),
            lel: Some(33_000.0),
            uel: Some(190_000.0),
            ..ExposureThresholds::NONE
        },
    },
    ChemicalCatalogEntry {
        canonical_id: "C3H6O",
        display_name: "Acetone",
        cas: "67-64-1",
        aliases: &["propanone"],
        molecular_weight_g_mol: 58.08,
        antoine: antoine(7.024_47, 1_161.0, 224.0),
        boiling_point_k: 329.25,
        freezing_point_k: 178.5,
        liquid_density_kg_m3: 784.0,
        liquid_cp_j_kg_k: 2_160.0,
        latent_heat_j_kg: 5.18e5,
        heat_capacity_ratio: 1.11,
        critical_temperature_k: 508.1,
        critical_pressure_pa: 4.70e6,
        joule_thomson_k_per_pa: 0.0,
        thresholds: ExposureThresholds {
            aegl1: Some(200.0),
            aegl2: Some(3_200.0),
            aegl3: Some(5_700.0),
            idlh: Some(2_500.0),
            pac1: Some(200.0),
            pac2: Some(3_200.0),
            pac3: Some(5_700.0),
            lel: Some(25_000.0),
            uel: Some(130_000.0),
            ..ExposureThresholds::NONE
        },
    },
];

pub fn catalog_entries() -> &'static [ChemicalCatalogEntry] {
    &BUILTIN_CATALOG
}

pub fn builtin_chemicals() -> Vec<Chemical> {
    BUILTIN_CATALOG.iter().map(ChemicalCatalogEntry::to_chemical).collect()
}
