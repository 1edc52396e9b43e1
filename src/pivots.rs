use crate::config::{Category, ClassificationRules, YearConfig};
use crate::schema::{BudgetRecord, RecordTable};
use crate::utils::{checked_total, round_money, sum_money};
use crate::words::amount_to_words;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Add;

/// The four amounts reported for every category and program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PivotSummary {
    pub original: Decimal,
    pub modificado_anual_neto: Decimal,
    pub modificado_periodo_neto: Decimal,
    pub ejercido: Decimal,
}

impl PivotSummary {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_records<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r BudgetRecord>,
    {
        records
            .into_iter()
            .map(|record| Self {
                original: record.metrics.original,
                modificado_anual_neto: record.metrics.modificado_anual_neto,
                modificado_periodo_neto: record.metrics.modificado_periodo_neto,
                ejercido: record.metrics.ejercido,
            })
            .sum()
    }

    pub fn rounded(self) -> Self {
        Self {
            original: round_money(self.original),
            modificado_anual_neto: round_money(self.modificado_anual_neto),
            modificado_periodo_neto: round_money(self.modificado_periodo_neto),
            ejercido: round_money(self.ejercido),
        }
    }
}

impl Add for PivotSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            original: checked_total([self.original, rhs.original]),
            modificado_anual_neto: checked_total([
                self.modificado_anual_neto,
                rhs.modificado_anual_neto,
            ]),
            modificado_periodo_neto: checked_total([
                self.modificado_periodo_neto,
                rhs.modificado_periodo_neto,
            ]),
            ejercido: checked_total([self.ejercido, rhs.ejercido]),
        }
    }
}

impl std::iter::Sum for PivotSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let parts: Vec<Self> = iter.collect();
        Self {
            original: checked_total(parts.iter().map(|p| p.original)),
            modificado_anual_neto: checked_total(parts.iter().map(|p| p.modificado_anual_neto)),
            modificado_periodo_neto: checked_total(
                parts.iter().map(|p| p.modificado_periodo_neto),
            ),
            ejercido: checked_total(parts.iter().map(|p| p.ejercido)),
        }
        .rounded()
    }
}

/// Net frozen amount per tracked program, in figures and in words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrozenFunds {
    pub valores: BTreeMap<String, Decimal>,
    pub textos: BTreeMap<String, String>,
}

/// Everything the pivot stage produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotSet {
    pub categories: BTreeMap<Category, PivotSummary>,
    pub programs: BTreeMap<String, PivotSummary>,
    pub totals: PivotSummary,
    pub frozen: FrozenFunds,
}

impl PivotSet {
    pub fn category(&self, category: Category) -> PivotSummary {
        self.categories.get(&category).copied().unwrap_or_default()
    }
}

/// Third pipeline stage: category, program and frozen-funds pivots.
pub struct PivotBuilder<'a> {
    rules: &'a ClassificationRules,
    config: &'a YearConfig,
}

impl<'a> PivotBuilder<'a> {
    pub fn new(rules: &'a ClassificationRules, config: &'a YearConfig) -> Self {
        Self { rules, config }
    }

    pub fn build(&self, table: &RecordTable) -> PivotSet {
        let programs = self.program_pivots(table);
        let subsidy_subtotal: PivotSummary = programs.values().copied().sum();

        let mut categories = BTreeMap::new();
        for category in Category::ALL {
            let pivot = match self.rules.chapters_for(category) {
                Some(chapters) => self.chapter_pivot(table, chapters),
                None if category == Category::Subsidios => subsidy_subtotal,
                None => PivotSummary::zero(),
            };
            categories.insert(category, pivot);
        }

        let totals: PivotSummary = categories.values().copied().sum();
        let frozen = self.frozen_funds(table);

        debug!(
            "Built {} category pivots and {} program pivots",
            categories.len(),
            programs.len()
        );

        PivotSet {
            categories,
            programs,
            totals,
            frozen,
        }
    }

    /// Records in any of `chapters`, leaving out the specific programs.
    pub fn chapter_pivot(&self, table: &RecordTable, chapters: &[i64]) -> PivotSummary {
        PivotSummary::from_records(table.iter().filter(|record| {
            chapters.contains(&record.ids.capitulo)
                && !self.config.is_specific_program(&record.ids.pp)
        }))
    }

    pub fn program_pivot(&self, table: &RecordTable, program: &str) -> PivotSummary {
        PivotSummary::from_records(table.iter().filter(|record| record.ids.pp == program))
    }

    fn program_pivots(&self, table: &RecordTable) -> BTreeMap<String, PivotSummary> {
        self.config
            .programas_especificos
            .iter()
            .map(|program| (program.clone(), self.program_pivot(table, program)))
            .collect()
    }

    fn frozen_funds(&self, table: &RecordTable) -> FrozenFunds {
        let mut frozen = FrozenFunds::default();

        for program in &self.rules.frozen_programs {
            let amount = sum_money(
                table
                    .iter()
                    .filter(|record| record.ids.pp == *program)
                    .map(|record| record.metrics.congelado_anual),
            );
            frozen
                .textos
                .insert(program.clone(), amount_to_words(amount));
            frozen.valores.insert(program.clone(), amount);
        }

        frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RecordIdentifiers, RecordMetrics};
    use rust_decimal_macros::dec;

    fn record(pp: &str, capitulo: i64, original: Decimal, ejercido: Decimal) -> BudgetRecord {
        BudgetRecord {
            ids: RecordIdentifiers {
                pp: pp.to_string(),
                capitulo,
                partida: capitulo * 10 + 101,
                ..RecordIdentifiers::default()
            },
            metrics: RecordMetrics {
                original,
                modificado_anual_neto: original,
                modificado_periodo_neto: original / dec!(2),
                ejercido,
                congelado_anual: dec!(10.5),
                ..RecordMetrics::default()
            },
            ..BudgetRecord::default()
        }
    }

    fn config() -> YearConfig {
        YearConfig {
            programas_especificos: vec!["S263".to_string(), "S304".to_string()],
            ..YearConfig::default()
        }
    }

    fn table() -> RecordTable {
        RecordTable::with_all_columns(vec![
            record("E001", 1000, dec!(1000), dec!(400)),
            record("S263", 1000, dec!(50), dec!(5)),
            record("E001", 2000, dec!(200), dec!(20)),
            record("E001", 3000, dec!(300), dec!(30)),
            record("S263", 4000, dec!(4000), dec!(100)),
            record("U001", 4000, dec!(40), dec!(4)),
            record("E001", 5000, dec!(500), dec!(50)),
            record("E001", 7000, dec!(700), dec!(70)),
            record("E001", 6000, dec!(600), dec!(60)),
        ])
    }

    #[test]
    fn test_category_pivots_exclude_specific_programs() {
        let rules = ClassificationRules::default();
        let config = config();
        let pivots = PivotBuilder::new(&rules, &config).build(&table());

        assert_eq!(pivots.category(Category::ServiciosPersonales).original, dec!(1000));
        assert_eq!(pivots.category(Category::GastoCorriente).original, dec!(500));
        assert_eq!(pivots.category(Category::OtrosProgramas).original, dec!(40));
        assert_eq!(pivots.category(Category::BienesMuebles).original, dec!(1200));
        assert_eq!(pivots.category(Category::BienesMuebles).ejercido, dec!(120));
        assert_eq!(
            pivots.category(Category::GastoCorriente).modificado_periodo_neto,
            dec!(250)
        );
    }

    #[test]
    fn test_program_pivots_and_subsidy_subtotal() {
        let rules = ClassificationRules::default();
        let config = config();
        let pivots = PivotBuilder::new(&rules, &config).build(&table());

        assert_eq!(pivots.programs["S263"].original, dec!(4050));
        assert_eq!(pivots.programs["S304"], PivotSummary::zero());
        assert_eq!(pivots.category(Category::Subsidios).original, dec!(4050));
        assert_eq!(pivots.category(Category::Subsidios).ejercido, dec!(105));
    }

    #[test]
    fn test_totals_are_sum_of_categories() {
        let rules = ClassificationRules::default();
        let config = config();
        let pivots = PivotBuilder::new(&rules, &config).build(&table());

        let expected: PivotSummary = Category::ALL
            .iter()
            .map(|c| pivots.category(*c))
            .fold(PivotSummary::zero(), Add::add);
        assert_eq!(pivots.totals, expected);
        // chapter 6000 belongs to no category
        assert_eq!(pivots.totals.original, dec!(6790));
    }

    #[test]
    fn test_empty_table_gives_zero_pivots() {
        let rules = ClassificationRules::default();
        let config = config();
        let pivots = PivotBuilder::new(&rules, &config).build(&RecordTable::default());

        assert_eq!(pivots.categories.len(), 5);
        assert!(pivots.categories.values().all(|p| *p == PivotSummary::zero()));
        assert_eq!(pivots.totals, PivotSummary::zero());
        assert_eq!(pivots.frozen.valores.len(), 3);
        assert_eq!(pivots.frozen.valores["S293"], Decimal::ZERO);
        assert_eq!(pivots.frozen.textos["S293"], "CERO PESOS 00/100 M.N.");
    }

    #[test]
    fn test_frozen_funds_by_program() {
        let rules = ClassificationRules::default();
        let config = config();
        let pivots = PivotBuilder::new(&rules, &config).build(&table());

        assert_eq!(pivots.frozen.valores["S263"], dec!(21));
        assert_eq!(pivots.frozen.textos["S263"], "VEINTIUN PESOS 00/100 M.N.");
        assert_eq!(pivots.frozen.valores["S304"], Decimal::ZERO);
    }
}
