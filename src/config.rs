use crate::error::{MapError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Raw unit code that is always reported as unit 811.
pub const G00_UNIT_CODE: &str = "G00";
pub const G00_REMAPPED_UNIT: i64 = 811;

/// Year-specific program configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearConfig {
    #[schemars(
        description = "Ordered list of subsidy program codes (Pp) reported individually and excluded from the chapter pivots."
    )]
    pub programas_especificos: Vec<String>,

    #[schemars(description = "Display name for each program code.")]
    #[serde(default)]
    pub programas_nombres: BTreeMap<String, String>,

    #[schemars(
        description = "Special reporting labels for selected program codes, carried in the summary metadata."
    )]
    #[serde(default)]
    pub nombres_especiales: BTreeMap<String, String>,

    #[schemars(
        description = "Programs merged into another code for the year, keyed by the original IDEN_PROY + PROYECTO code."
    )]
    #[serde(default)]
    pub fusion_programas: BTreeMap<String, String>,
}

impl YearConfig {
    pub fn is_specific_program(&self, pp: &str) -> bool {
        self.programas_especificos.iter().any(|p| p == pp)
    }

    /// Display name from `programas_nombres`; empty when the code is not
    /// configured. Special names are reporting labels and never replace it.
    pub fn program_display_name(&self, pp: &str) -> String {
        self.programas_nombres.get(pp).cloned().unwrap_or_default()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(YearConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Year-keyed configuration lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigRegistry {
    years: BTreeMap<i32, YearConfig>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, config: YearConfig) -> Self {
        self.insert(year, config);
        self
    }

    pub fn insert(&mut self, year: i32, config: YearConfig) {
        self.years.insert(year, config);
    }

    /// Parses `{"2024": {...}, "2025": {...}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, YearConfig> = serde_json::from_str(json)?;
        let mut registry = Self::new();

        for (key, config) in raw {
            let year = key.trim().parse::<i32>().map_err(|_| {
                MapError::InvalidConfig(format!("configuration key '{}' is not a year", key))
            })?;
            registry.insert(year, config);
        }

        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Configuration for `year`, falling back to the latest earlier year.
    pub fn for_year(&self, year: i32) -> Result<&YearConfig> {
        self.years
            .range(..=year)
            .next_back()
            .map(|(_, config)| config)
            .ok_or(MapError::ConfigNotFound(year))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }
}

/// Static remap of legacy unit codes to their current codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRemap {
    codes: BTreeMap<i64, i64>,
}

impl UnitRemap {
    pub fn new(codes: BTreeMap<i64, i64>) -> Self {
        Self { codes }
    }

    /// Current unit code for a raw `UNIDAD` value.
    ///
    /// `G00` always maps to 811. Other values must be all digits to be looked
    /// up; anything else is treated as code 0.
    pub fn resolve(&self, raw_unit: &str) -> i64 {
        let raw_unit = raw_unit.trim();
        if raw_unit == G00_UNIT_CODE {
            return G00_REMAPPED_UNIT;
        }

        let code = if !raw_unit.is_empty() && raw_unit.chars().all(|c| c.is_ascii_digit()) {
            raw_unit.parse::<i64>().unwrap_or(0)
        } else {
            0
        };

        self.codes.get(&code).copied().unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for UnitRemap {
    fn default() -> Self {
        let pairs: [(i64, i64); 46] = [
            (121, 260), (122, 261), (123, 262), (124, 263), (125, 264), (126, 265),
            (127, 266), (128, 267), (129, 268), (130, 269), (131, 270), (132, 271),
            (133, 272), (134, 273), (135, 274), (136, 275), (137, 276), (138, 277),
            (139, 278), (140, 279), (141, 280), (142, 281), (143, 282), (144, 283),
            (145, 284), (146, 285), (147, 286), (148, 287), (149, 288), (150, 289),
            (151, 290), (152, 291), (153, 292), (108, 810), (215, 220), (300, 225),
            (310, 226), (700, 227), (600, 230), (612, 231), (312, 232), (315, 233),
            (400, 235), (311, 237), (314, 245), (113, 250),
        ];
        Self::new(pairs.into_iter().collect())
    }
}

/// Summary categories published in the `categorias` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Chapter 1000, payroll.
    ServiciosPersonales,
    /// Chapters 2000 and 3000, operating expenses.
    GastoCorriente,
    /// The year's specific subsidy programs.
    Subsidios,
    /// Chapter 4000, other transfer programs.
    OtrosProgramas,
    /// Chapters 5000 and 7000, capital goods.
    BienesMuebles,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ServiciosPersonales,
        Category::GastoCorriente,
        Category::Subsidios,
        Category::OtrosProgramas,
        Category::BienesMuebles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::ServiciosPersonales => "Servicios personales (Cap. 1000)",
            Category::GastoCorriente => "Gasto corriente (Cap. 2000 + 3000)",
            Category::Subsidios => "Subsidios",
            Category::OtrosProgramas => "Otros programas (Cap. 4000)",
            Category::BienesMuebles => "Bienes muebles (Cap. 5000 + 7000)",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::ServiciosPersonales => "servicios_personales",
            Category::GastoCorriente => "gasto_corriente",
            Category::Subsidios => "subsidios",
            Category::OtrosProgramas => "otros_programas",
            Category::BienesMuebles => "bienes_muebles",
        }
    }
}

/// A category defined by the expenditure chapters it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterGroup {
    pub category: Category,
    pub chapters: Vec<i64>,
}

/// Fixed classification rules of the accounting schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRules {
    /// Chapter-based categories; specific programs are excluded from each.
    pub chapter_groups: Vec<ChapterGroup>,
    /// Programs whose net frozen amount is reported on its own.
    pub frozen_programs: Vec<String>,
    /// Chapter left out of the unit dashboards.
    pub dashboard_excluded_chapter: i64,
    /// Object classes left out of the unit dashboards.
    pub dashboard_excluded_partidas: Vec<i64>,
    /// Chapters broken down per unit, as single digits (2 means 2000).
    pub dashboard_chapters: Vec<i64>,
    pub top_available_limit: usize,
}

impl ClassificationRules {
    pub fn chapters_for(&self, category: Category) -> Option<&[i64]> {
        self.chapter_groups
            .iter()
            .find(|group| group.category == category)
            .map(|group| group.chapters.as_slice())
    }

    pub fn in_dashboard_scope(&self, capitulo: i64, partida: i64) -> bool {
        capitulo != self.dashboard_excluded_chapter
            && !self.dashboard_excluded_partidas.contains(&partida)
    }
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            chapter_groups: vec![
                ChapterGroup {
                    category: Category::ServiciosPersonales,
                    chapters: vec![1000],
                },
                ChapterGroup {
                    category: Category::GastoCorriente,
                    chapters: vec![2000, 3000],
                },
                ChapterGroup {
                    category: Category::OtrosProgramas,
                    chapters: vec![4000],
                },
                ChapterGroup {
                    category: Category::BienesMuebles,
                    chapters: vec![5000, 7000],
                },
            ],
            frozen_programs: vec!["S263".to_string(), "S293".to_string(), "S304".to_string()],
            dashboard_excluded_chapter: 1000,
            dashboard_excluded_partidas: vec![39801, 39810],
            dashboard_chapters: vec![2, 3, 4],
            top_available_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> YearConfig {
        YearConfig {
            programas_especificos: vec!["S263".to_string(), "U281".to_string()],
            programas_nombres: BTreeMap::from([
                ("S263".to_string(), "Programa de Sanidad".to_string()),
                ("E001".to_string(), "Desarrollo de capacidades".to_string()),
            ]),
            nombres_especiales: BTreeMap::from([(
                "E001".to_string(),
                "Capacidades (especial)".to_string(),
            )]),
            fusion_programas: BTreeMap::new(),
        }
    }

    #[test]
    fn test_unit_remap_default_table() {
        let remap = UnitRemap::default();
        assert_eq!(remap.len(), 46);
        assert_eq!(remap.resolve("121"), 260);
        assert_eq!(remap.resolve(" 108 "), 810);
        assert_eq!(remap.resolve("113"), 250);
        assert_eq!(remap.resolve("999"), 999);
        assert_eq!(remap.resolve("A10"), 0);
    }

    #[test]
    fn test_g00_overrides_remap_table() {
        let remap = UnitRemap::new(BTreeMap::from([(0, 5), (811, 900)]));
        assert_eq!(remap.resolve("G00"), 811);
        assert_eq!(UnitRemap::default().resolve("G00"), 811);
    }

    #[test]
    fn test_program_display_name() {
        let config = sample_config();
        assert_eq!(config.program_display_name("S263"), "Programa de Sanidad");
        assert_eq!(config.program_display_name("E001"), "Desarrollo de capacidades");
        assert_eq!(config.program_display_name("X999"), "");
        assert!(config.is_specific_program("U281"));
        assert!(!config.is_specific_program("E001"));
    }

    #[test]
    fn test_registry_falls_back_to_earlier_year() {
        let registry = ConfigRegistry::new()
            .with_year(2023, YearConfig::default())
            .with_year(2025, sample_config());

        assert!(registry.for_year(2023).unwrap().programas_especificos.is_empty());
        assert!(registry.for_year(2024).unwrap().programas_especificos.is_empty());
        assert_eq!(registry.for_year(2026).unwrap(), &sample_config());
        assert!(matches!(
            registry.for_year(2020),
            Err(MapError::ConfigNotFound(2020))
        ));
    }

    #[test]
    fn test_registry_from_json() {
        let json = r#"{
            "2025": {
                "programas_especificos": ["S263", "S304"],
                "programas_nombres": {"S263": "Sanidad"},
                "fusion_programas": {"U024": "S304"}
            }
        }"#;

        let registry = ConfigRegistry::from_json_str(json).unwrap();
        let config = registry.for_year(2025).unwrap();
        assert_eq!(config.programas_especificos, vec!["S263", "S304"]);
        assert_eq!(config.fusion_programas.get("U024").unwrap(), "S304");
        assert!(config.nombres_especiales.is_empty());

        let bad = ConfigRegistry::from_json_str(r#"{"dos mil": {"programas_especificos": []}}"#);
        assert!(matches!(bad, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = YearConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("programas_especificos"));
        assert!(schema_json.contains("fusion_programas"));
    }

    #[test]
    fn test_default_rules() {
        let rules = ClassificationRules::default();
        assert_eq!(
            rules.chapters_for(Category::GastoCorriente),
            Some(&[2000, 3000][..])
        );
        assert_eq!(rules.chapters_for(Category::Subsidios), None);
        assert!(rules.in_dashboard_scope(2000, 21101));
        assert!(!rules.in_dashboard_scope(1000, 11301));
        assert!(!rules.in_dashboard_scope(3000, 39801));
        assert!(!rules.in_dashboard_scope(3000, 39810));
    }
}
