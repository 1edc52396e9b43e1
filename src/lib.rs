//! # MAP Budget Summary
//!
//! A library for turning a monthly budget-execution spreadsheet ("MAP" file)
//! into a structured budget summary: totals by expenditure chapter, subsidy
//! program breakdowns, frozen-funds accounting and per-unit dashboards.
//!
//! ## Pipeline
//!
//! - **Column derivation**: unit remap, program code, chapter and key per record
//! - **Aggregates**: annual and period sums of original, modified, frozen and
//!   exercised amounts, with the prior-year closing special case
//! - **Pivots**: fixed chapter categories, subsidy programs and grand totals
//! - **Unit dashboards**: per-unit figures, chapter breakdowns and the lines
//!   with the most unspent budget
//!
//! Every amount is an exact decimal rounded half away from zero at each step,
//! so results match the spreadsheet the file came from.
//!
//! ## Example
//!
//! ```rust,ignore
//! use map_budget_summary::*;
//!
//! let registry = ConfigRegistry::from_path("programas.json")?;
//! let table = read_map_csv_path("MAP_JUNIO_2025.csv")?;
//!
//! let processed = MapProcessor::new(&registry).process(table, "MAP_JUNIO_2025.csv")?;
//! println!("{}", processed.summary.to_markdown());
//! ```

pub mod config;
pub mod dashboard;
pub mod deriver;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod period;
pub mod pivots;
pub mod report;
pub mod schema;
pub mod utils;
pub mod words;

pub use config::{
    Category, ChapterGroup, ClassificationRules, ConfigRegistry, UnitRemap, YearConfig,
};
pub use dashboard::{AvailableLine, ChapterBreakdown, DashboardBuilder, UnitDashboards, UnitSummary};
pub use deriver::{chapter_of, program_code, ColumnDeriver};
pub use engine::AggregateCalculator;
pub use error::{MapError, Result};
pub use ingestion::{read_map_csv, read_map_csv_path};
pub use period::{FilePeriod, FilenamePeriodDetector, PeriodDetector};
pub use pivots::{FrozenFunds, PivotBuilder, PivotSet, PivotSummary};
pub use report::{MapSummary, ProcessedMap, SummaryMetadata};
pub use schema::*;
pub use utils::{round_like_excel, MONTH_NAMES};
pub use words::amount_to_words;

use chrono::Datelike;
use log::{debug, info};
use std::path::Path;

/// Runs the whole pipeline for one MAP file.
pub struct MapProcessor<'a> {
    registry: &'a ConfigRegistry,
    detector: &'a dyn PeriodDetector,
    unit_remap: UnitRemap,
    rules: ClassificationRules,
    reference_year: Option<i32>,
}

impl<'a> MapProcessor<'a> {
    pub fn new(registry: &'a ConfigRegistry) -> Self {
        Self {
            registry,
            detector: &FilenamePeriodDetector,
            unit_remap: UnitRemap::default(),
            rules: ClassificationRules::default(),
            reference_year: None,
        }
    }

    pub fn with_detector(mut self, detector: &'a dyn PeriodDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_unit_remap(mut self, unit_remap: UnitRemap) -> Self {
        self.unit_remap = unit_remap;
        self
    }

    pub fn with_rules(mut self, rules: ClassificationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Year compared against the file's fiscal year to spot closing reports.
    /// Defaults to the current local year.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    fn reference_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    pub fn process(&self, table: RecordTable, filename: &str) -> Result<ProcessedMap> {
        let period = self.detector.detect(filename)?;
        debug!(
            "Detected period {:02}/{} from '{}'",
            period.month, period.fiscal_year, filename
        );
        self.process_period(table, period)
    }

    pub fn process_csv_path(&self, path: impl AsRef<Path>) -> Result<ProcessedMap> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let table = read_map_csv_path(path)?;
        self.process(table, &filename)
    }

    /// Processes a table whose reporting period is already known.
    pub fn process_period(&self, mut table: RecordTable, period: FilePeriod) -> Result<ProcessedMap> {
        utils::validate_month(period.month)?;
        let config = self.registry.for_year(period.fiscal_year)?;

        info!(
            "Processing MAP {:02}/{} with {} records",
            period.month,
            period.fiscal_year,
            table.len()
        );

        ColumnDeriver::new(&self.unit_remap, &config.fusion_programas).derive(&mut table);

        let calculator =
            AggregateCalculator::new(period.month, period.fiscal_year, self.reference_year());
        calculator.calculate(&mut table);
        if calculator.is_prior_year_closure() {
            info!(
                "File for {:02}/{} treated as closing report of the prior year",
                period.month, period.fiscal_year
            );
        }

        let pivots = PivotBuilder::new(&self.rules, config).build(&table);
        let dashboards = DashboardBuilder::new(&self.rules, config).build(&table);

        info!(
            "Summary ready: {} programs, {} units",
            pivots.programs.len(),
            dashboards.resultados_por_ur.len()
        );

        let summary = MapSummary {
            totales: pivots.totals,
            categorias: pivots.categories,
            programas: pivots.programs,
            congelados: pivots.frozen,
            resultados_por_ur: dashboards.resultados_por_ur,
            capitulos_por_ur: dashboards.capitulos_por_ur,
            partidas_por_ur: dashboards.partidas_por_ur,
            metadata: SummaryMetadata {
                fecha_archivo: period.file_date,
                mes: period.month,
                anio: period.fiscal_year,
                registros: table.len(),
                config: config.clone(),
                es_cierre_anio_anterior: calculator.is_prior_year_closure(),
            },
        };

        Ok(ProcessedMap { summary, table })
    }
}

pub fn process_map(
    table: RecordTable,
    filename: &str,
    registry: &ConfigRegistry,
) -> Result<ProcessedMap> {
    MapProcessor::new(registry).process(table, filename)
}
