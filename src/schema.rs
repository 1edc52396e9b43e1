use crate::utils::{checked_total, MONTH_NAMES};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The seven monthly transaction kinds carried by a MAP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionKind {
    /// `ORI`: originally approved budget.
    Original,
    /// `AMP`: budget increases.
    Amplified,
    /// `RED`: budget reductions.
    Reduced,
    /// `MOD`: modified (current) budget.
    Modified,
    /// `CONG`: amounts frozen by administrative hold.
    Frozen,
    /// `DESCONG`: amounts released from a hold.
    Unfrozen,
    /// `EJE`: amounts actually spent.
    Exercised,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 7] = [
        TransactionKind::Original,
        TransactionKind::Amplified,
        TransactionKind::Reduced,
        TransactionKind::Modified,
        TransactionKind::Frozen,
        TransactionKind::Unfrozen,
        TransactionKind::Exercised,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            TransactionKind::Original => "ORI",
            TransactionKind::Amplified => "AMP",
            TransactionKind::Reduced => "RED",
            TransactionKind::Modified => "MOD",
            TransactionKind::Frozen => "CONG",
            TransactionKind::Unfrozen => "DESCONG",
            TransactionKind::Exercised => "EJE",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Column header for this kind and a 0-based month index, e.g. `MOD_MAR`.
    pub fn column_name(self, month: usize) -> String {
        format!("{}_{}", self.prefix(), MONTH_NAMES[month])
    }

    /// Splits a `{KIND}_{MONTH}` header into its kind and month index.
    pub fn parse_column(header: &str) -> Option<(Self, usize)> {
        let (prefix, month) = header.rsplit_once('_')?;
        let kind = Self::from_prefix(prefix)?;
        let month = MONTH_NAMES.iter().position(|name| *name == month)?;
        Some((kind, month))
    }
}

/// Monthly cells of one record, indexed by kind and 0-based month.
///
/// `None` marks a cell the source did not provide (absent column or blank).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyColumns {
    cells: [[Option<Decimal>; 12]; 7],
}

impl MonthlyColumns {
    pub fn get(&self, kind: TransactionKind, month: usize) -> Option<Decimal> {
        self.cells[kind.index()].get(month).copied().flatten()
    }

    pub fn set(&mut self, kind: TransactionKind, month: usize, value: Option<Decimal>) {
        if let Some(cell) = self.cells[kind.index()].get_mut(month) {
            *cell = value;
        }
    }

    /// Plain sum over `months`; missing cells count as zero and an
    /// out-of-range total counts as zero.
    pub fn total(&self, kind: TransactionKind, months: Range<usize>) -> Decimal {
        checked_total(months.filter_map(|month| self.get(kind, month)))
    }
}

/// Which `{KIND}_{MONTH}` columns the source file carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPresence {
    present: [[bool; 12]; 7],
}

impl ColumnPresence {
    pub fn all() -> Self {
        Self {
            present: [[true; 12]; 7],
        }
    }

    pub fn mark(&mut self, kind: TransactionKind, month: usize) {
        if let Some(flag) = self.present[kind.index()].get_mut(month) {
            *flag = true;
        }
    }

    pub fn contains(&self, kind: TransactionKind, month: usize) -> bool {
        self.present[kind.index()]
            .get(month)
            .copied()
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.present.iter().flatten().filter(|flag| **flag).count()
    }
}

/// Identifiers computed from the raw key columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordIdentifiers {
    #[serde(rename = "NuevaUR")]
    pub nueva_ur: i64,
    #[serde(rename = "Pp_Original")]
    pub pp_original: String,
    #[serde(rename = "Pp")]
    pub pp: String,
    #[serde(rename = "PARTIDA")]
    pub partida: i64,
    #[serde(rename = "Capitulo")]
    pub capitulo: i64,
    #[serde(rename = "Llave")]
    pub llave: String,
}

/// Monthly-summed amounts of one record, all rounded to 2 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordMetrics {
    pub original: Decimal,
    pub original_periodo: Decimal,
    pub modificado_anual_bruto: Decimal,
    pub modificado_periodo_bruto: Decimal,
    pub congelado_anual: Decimal,
    pub congelado_periodo: Decimal,
    pub modificado_anual_neto: Decimal,
    pub modificado_periodo_neto: Decimal,
    pub ejercido: Decimal,
    pub disponible_anual_neto: Decimal,
    pub disponible_periodo_neto: Decimal,
}

/// One budget line: a (unit, object class, program) combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    #[serde(rename = "UNIDAD")]
    pub unidad: String,
    #[serde(rename = "IDEN_PROY")]
    pub iden_proy: String,
    #[serde(rename = "PROYECTO")]
    pub proyecto: String,
    /// `PARTIDA` exactly as read; the coerced code lives in the identifiers.
    #[serde(rename = "PARTIDA_RAW")]
    pub partida_raw: String,
    pub monthly: MonthlyColumns,
    #[serde(flatten)]
    pub ids: RecordIdentifiers,
    #[serde(flatten)]
    pub metrics: RecordMetrics,
}

impl BudgetRecord {
    pub fn new(
        unidad: impl Into<String>,
        iden_proy: impl Into<String>,
        proyecto: impl Into<String>,
        partida: impl Into<String>,
    ) -> Self {
        Self {
            unidad: unidad.into(),
            iden_proy: iden_proy.into(),
            proyecto: proyecto.into(),
            partida_raw: partida.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper that fills one monthly cell.
    pub fn with_amount(mut self, kind: TransactionKind, month: usize, value: Decimal) -> Self {
        self.monthly.set(kind, month, Some(value));
        self
    }

    /// Unit code as compared by the dashboards.
    pub fn unit_key(&self) -> &str {
        self.unidad.trim()
    }
}

/// The record table shared by every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    pub columns: ColumnPresence,
    pub records: Vec<BudgetRecord>,
}

impl RecordTable {
    pub fn new(columns: ColumnPresence, records: Vec<BudgetRecord>) -> Self {
        Self { columns, records }
    }

    /// A table that claims every monthly column, handy for in-memory data.
    pub fn with_all_columns(records: Vec<BudgetRecord>) -> Self {
        Self::new(ColumnPresence::all(), records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BudgetRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_column_names_round_trip_through_parser() {
        assert_eq!(TransactionKind::Frozen.column_name(0), "CONG_ENE");
        assert_eq!(TransactionKind::Unfrozen.column_name(11), "DESCONG_DIC");
        assert_eq!(
            TransactionKind::parse_column("DESCONG_MAR"),
            Some((TransactionKind::Unfrozen, 2))
        );
        assert_eq!(
            TransactionKind::parse_column("EJE_DIC"),
            Some((TransactionKind::Exercised, 11))
        );
        assert_eq!(TransactionKind::parse_column("EJE_XYZ"), None);
        assert_eq!(TransactionKind::parse_column("UNIDAD"), None);
    }

    #[test]
    fn test_monthly_total_ignores_missing_cells() {
        let record = BudgetRecord::new("108", "E", "1", "21101")
            .with_amount(TransactionKind::Modified, 0, dec!(100.10))
            .with_amount(TransactionKind::Modified, 2, dec!(50.05))
            .with_amount(TransactionKind::Modified, 11, dec!(1));

        assert_eq!(
            record.monthly.total(TransactionKind::Modified, 0..3),
            dec!(150.15)
        );
        assert_eq!(
            record.monthly.total(TransactionKind::Modified, 0..12),
            dec!(151.15)
        );
        assert_eq!(
            record.monthly.total(TransactionKind::Exercised, 0..12),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_column_presence() {
        let mut presence = ColumnPresence::default();
        presence.mark(TransactionKind::Original, 3);
        assert!(presence.contains(TransactionKind::Original, 3));
        assert!(!presence.contains(TransactionKind::Original, 4));
        assert_eq!(presence.count(), 1);
        assert_eq!(ColumnPresence::all().count(), 84);
    }
}
