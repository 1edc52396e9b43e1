use crate::config::{ClassificationRules, YearConfig};
use crate::schema::{BudgetRecord, RecordTable};
use crate::utils::{checked_difference, ratio_or_zero, round_money, sum_money};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Dashboard headline figures for one administrative unit.
///
/// `Congelado_anual` and `Congelado_periodo` carry the real sums of the
/// unit's in-scope net frozen amounts. Earlier dashboard exports always
/// wrote 0 in both fields, so consumers comparing against those files will
/// see different values there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    #[serde(rename = "Original")]
    pub original: Decimal,
    #[serde(rename = "Modificado_anual")]
    pub modificado_anual: Decimal,
    #[serde(rename = "Modificado_periodo")]
    pub modificado_periodo: Decimal,
    #[serde(rename = "Ejercido")]
    pub ejercido: Decimal,
    #[serde(rename = "Disponible_anual")]
    pub disponible_anual: Decimal,
    #[serde(rename = "Disponible_periodo")]
    pub disponible_periodo: Decimal,
    #[serde(rename = "Congelado_anual")]
    pub congelado_anual: Decimal,
    #[serde(rename = "Congelado_periodo")]
    pub congelado_periodo: Decimal,
    /// Share of the annual net budget already spent; 0 when there is no budget.
    #[serde(rename = "Pct_avance_anual")]
    pub pct_avance_anual: Decimal,
    #[serde(rename = "Pct_avance_periodo")]
    pub pct_avance_periodo: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterBreakdown {
    #[serde(rename = "Original")]
    pub original: Decimal,
    #[serde(rename = "Modificado_anual")]
    pub modificado_anual: Decimal,
    #[serde(rename = "Modificado_periodo")]
    pub modificado_periodo: Decimal,
    #[serde(rename = "Ejercido")]
    pub ejercido: Decimal,
}

/// An (object class, program) line with unspent budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableLine {
    #[serde(rename = "Partida")]
    pub partida: i64,
    #[serde(rename = "Programa")]
    pub programa: String,
    #[serde(rename = "Denom_Programa")]
    pub denom_programa: String,
    #[serde(rename = "Original")]
    pub original: Decimal,
    #[serde(rename = "Modificado_periodo")]
    pub modificado_periodo: Decimal,
    #[serde(rename = "Ejercido")]
    pub ejercido: Decimal,
    #[serde(rename = "Disponible")]
    pub disponible: Decimal,
}

/// Per-unit dashboards keyed by the trimmed `UNIDAD` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitDashboards {
    pub resultados_por_ur: BTreeMap<String, UnitSummary>,
    pub capitulos_por_ur: BTreeMap<String, BTreeMap<String, ChapterBreakdown>>,
    pub partidas_por_ur: BTreeMap<String, Vec<AvailableLine>>,
}

/// Fourth pipeline stage: operational dashboards per administrative unit.
///
/// Payroll (chapter 1000) and the administrative object classes listed in
/// the rules are left out of every figure here, though they still count in
/// the pivots.
pub struct DashboardBuilder<'a> {
    rules: &'a ClassificationRules,
    config: &'a YearConfig,
}

impl<'a> DashboardBuilder<'a> {
    pub fn new(rules: &'a ClassificationRules, config: &'a YearConfig) -> Self {
        Self { rules, config }
    }

    pub fn build(&self, table: &RecordTable) -> UnitDashboards {
        let scoped: Vec<&BudgetRecord> = table
            .iter()
            .filter(|record| {
                self.rules
                    .in_dashboard_scope(record.ids.capitulo, record.ids.partida)
            })
            .collect();

        let mut dashboards = UnitDashboards::default();
        let mut seen = BTreeSet::new();

        for unit in table.iter().map(BudgetRecord::unit_key) {
            if !seen.insert(unit) {
                continue;
            }

            let unit_records: Vec<&BudgetRecord> = scoped
                .iter()
                .copied()
                .filter(|record| record.unit_key() == unit)
                .collect();

            if unit_records.is_empty() {
                continue;
            }

            dashboards
                .resultados_por_ur
                .insert(unit.to_string(), unit_summary(&unit_records));
            dashboards
                .capitulos_por_ur
                .insert(unit.to_string(), self.chapter_breakdowns(&unit_records));
            dashboards
                .partidas_por_ur
                .insert(unit.to_string(), self.top_available(&unit_records));
        }

        debug!(
            "Built dashboards for {} of {} units ({} records in scope)",
            dashboards.resultados_por_ur.len(),
            seen.len(),
            scoped.len()
        );

        dashboards
    }

    fn chapter_breakdowns(&self, records: &[&BudgetRecord]) -> BTreeMap<String, ChapterBreakdown> {
        self.rules
            .dashboard_chapters
            .iter()
            .map(|chapter| {
                let in_chapter: Vec<&BudgetRecord> = records
                    .iter()
                    .copied()
                    .filter(|record| record.ids.capitulo == chapter * 1000)
                    .collect();
                (chapter.to_string(), chapter_breakdown(&in_chapter))
            })
            .collect()
    }

    /// Lines with the largest positive period balance, best first.
    pub fn top_available(&self, records: &[&BudgetRecord]) -> Vec<AvailableLine> {
        let mut groups: BTreeMap<(i64, &str), Vec<&BudgetRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.ids.partida, record.ids.pp.as_str()))
                .or_default()
                .push(record);
        }

        let mut lines: Vec<AvailableLine> = groups
            .into_iter()
            .map(|((partida, pp), group)| {
                let modificado =
                    sum_money(group.iter().map(|r| r.metrics.modificado_periodo_neto));
                let ejercido = sum_money(group.iter().map(|r| r.metrics.ejercido));
                AvailableLine {
                    partida,
                    programa: pp.to_string(),
                    denom_programa: self.config.program_display_name(pp),
                    original: sum_money(group.iter().map(|r| r.metrics.original)),
                    modificado_periodo: modificado,
                    ejercido,
                    disponible: round_money(checked_difference(modificado, ejercido)),
                }
            })
            .filter(|line| line.disponible > Decimal::ZERO)
            .collect();

        lines.sort_by(|a, b| b.disponible.cmp(&a.disponible));
        lines.truncate(self.rules.top_available_limit);
        lines
    }
}

fn unit_summary(records: &[&BudgetRecord]) -> UnitSummary {
    let original = sum_money(records.iter().map(|r| r.metrics.original));
    let modificado_anual = sum_money(records.iter().map(|r| r.metrics.modificado_anual_neto));
    let modificado_periodo = sum_money(records.iter().map(|r| r.metrics.modificado_periodo_neto));
    let ejercido = sum_money(records.iter().map(|r| r.metrics.ejercido));

    UnitSummary {
        original,
        modificado_anual,
        modificado_periodo,
        ejercido,
        disponible_anual: round_money(checked_difference(modificado_anual, ejercido)),
        disponible_periodo: round_money(checked_difference(modificado_periodo, ejercido)),
        congelado_anual: sum_money(records.iter().map(|r| r.metrics.congelado_anual)),
        congelado_periodo: sum_money(records.iter().map(|r| r.metrics.congelado_periodo)),
        pct_avance_anual: ratio_or_zero(ejercido, modificado_anual),
        pct_avance_periodo: ratio_or_zero(ejercido, modificado_periodo),
    }
}

fn chapter_breakdown(records: &[&BudgetRecord]) -> ChapterBreakdown {
    ChapterBreakdown {
        original: sum_money(records.iter().map(|r| r.metrics.original)),
        modificado_anual: sum_money(records.iter().map(|r| r.metrics.modificado_anual_neto)),
        modificado_periodo: sum_money(records.iter().map(|r| r.metrics.modificado_periodo_neto)),
        ejercido: sum_money(records.iter().map(|r| r.metrics.ejercido)),
    }
}
