use crate::config::UnitRemap;
use crate::schema::{BudgetRecord, ColumnPresence, RecordIdentifiers, RecordTable, TransactionKind};
use crate::utils::{all_months, coerce_integer, round_money, zero_pad};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// First pipeline stage: record identifiers and rounding of the raw monthly
/// columns.
pub struct ColumnDeriver<'a> {
    unit_remap: &'a UnitRemap,
    fusion: &'a BTreeMap<String, String>,
}

impl<'a> ColumnDeriver<'a> {
    pub fn new(unit_remap: &'a UnitRemap, fusion: &'a BTreeMap<String, String>) -> Self {
        Self { unit_remap, fusion }
    }

    pub fn derive(&self, table: &mut RecordTable) {
        let mut fused = 0usize;

        for record in &mut table.records {
            record.ids = self.identifiers_for(record);
            if record.ids.pp != record.ids.pp_original {
                fused += 1;
            }
            round_present_columns(record, &table.columns);
        }

        debug!(
            "Derived identifiers for {} records ({} programs fused)",
            table.records.len(),
            fused
        );
    }

    pub fn identifiers_for(&self, record: &BudgetRecord) -> RecordIdentifiers {
        let nueva_ur = self.unit_remap.resolve(&record.unidad);
        let pp_original = program_code(&record.iden_proy, &record.proyecto);
        let pp = self
            .fusion
            .get(&pp_original)
            .cloned()
            .unwrap_or_else(|| pp_original.clone());
        let partida = coerce_integer(&record.partida_raw);
        let capitulo = chapter_of(partida);
        let llave = format!("{}{}{}", nueva_ur, partida, pp);

        RecordIdentifiers {
            nueva_ur,
            pp_original,
            pp,
            partida,
            capitulo,
            llave,
        }
    }
}

/// Program code: project id followed by the project number padded to three digits.
pub fn program_code(iden_proy: &str, proyecto: &str) -> String {
    format!("{}{}", iden_proy.trim(), zero_pad(proyecto.trim(), 3))
}

/// Expenditure chapter of an object class: its ten-thousands bucket times 1000.
pub fn chapter_of(partida: i64) -> i64 {
    partida.div_euclid(10_000) * 1_000
}

fn round_present_columns(record: &mut BudgetRecord, columns: &ColumnPresence) {
    for kind in TransactionKind::ALL {
        for month in all_months() {
            if columns.contains(kind, month) {
                let value = record.monthly.get(kind, month).unwrap_or(Decimal::ZERO);
                record.monthly.set(kind, month, Some(round_money(value)));
            }
        }
    }
}
