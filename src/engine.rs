use crate::schema::{BudgetRecord, RecordMetrics, RecordTable, TransactionKind};
use crate::utils::{
    all_months, checked_difference, is_prior_year_closure, months_up_to, round_money,
};
use log::debug;
use rust_decimal::Decimal;
use std::ops::Range;

/// Second pipeline stage: per-record monthly sums.
pub struct AggregateCalculator {
    period: Range<usize>,
    closure: bool,
}

impl AggregateCalculator {
    pub fn new(month: u32, fiscal_year: i32, reference_year: i32) -> Self {
        Self {
            period: months_up_to(month),
            closure: is_prior_year_closure(month, fiscal_year, reference_year),
        }
    }

    /// Whether the file is treated as the closing report of a past year.
    pub fn is_prior_year_closure(&self) -> bool {
        self.closure
    }

    /// Months summed for the "period" figures.
    pub fn period_months(&self) -> Range<usize> {
        if self.closure {
            all_months()
        } else {
            self.period.clone()
        }
    }

    pub fn calculate(&self, table: &mut RecordTable) {
        for record in &mut table.records {
            record.metrics = self.metrics_for(record);
        }

        debug!(
            "Computed metrics for {} records over months 1..={} (closure: {})",
            table.records.len(),
            self.period.end,
            self.closure
        );
    }

    pub fn metrics_for(&self, record: &BudgetRecord) -> RecordMetrics {
        let year = all_months();
        let period = self.period_months();

        let original = sum_column(record, TransactionKind::Original, year.clone());
        let original_periodo = sum_column(record, TransactionKind::Original, self.period.clone());

        let modificado_anual_bruto = sum_column(record, TransactionKind::Modified, year.clone());
        let modificado_periodo_bruto = sum_column(record, TransactionKind::Modified, period.clone());

        let congelado_anual = net_frozen(record, year.clone());
        let congelado_periodo = net_frozen(record, period);

        let modificado_anual_neto =
            round_money(checked_difference(modificado_anual_bruto, congelado_anual));
        let modificado_periodo_neto = if self.closure {
            modificado_anual_neto
        } else {
            round_money(checked_difference(modificado_periodo_bruto, congelado_periodo))
        };

        let ejercido = sum_column(record, TransactionKind::Exercised, year);

        RecordMetrics {
            original,
            original_periodo,
            modificado_anual_bruto,
            modificado_periodo_bruto,
            congelado_anual,
            congelado_periodo,
            modificado_anual_neto,
            modificado_periodo_neto,
            ejercido,
            disponible_anual_neto: round_money(checked_difference(
                modificado_anual_neto,
                ejercido,
            )),
            disponible_periodo_neto: round_money(checked_difference(
                modificado_periodo_neto,
                ejercido,
            )),
        }
    }
}

fn sum_column(record: &BudgetRecord, kind: TransactionKind, months: Range<usize>) -> Decimal {
    round_money(record.monthly.total(kind, months))
}

fn net_frozen(record: &BudgetRecord, months: Range<usize>) -> Decimal {
    let frozen = sum_column(record, TransactionKind::Frozen, months.clone());
    let unfrozen = sum_column(record, TransactionKind::Unfrozen, months);
    round_money(checked_difference(frozen, unfrozen))
}
