use crate::error::{MapError, Result};
use crate::schema::{BudgetRecord, ColumnPresence, RecordTable, TransactionKind};
use crate::utils::parse_decimal;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 4] = ["UNIDAD", "IDEN_PROY", "PROYECTO", "PARTIDA"];

struct HeaderLayout {
    unidad: usize,
    iden_proy: usize,
    proyecto: usize,
    partida: usize,
    monthly: Vec<(usize, TransactionKind, usize)>,
    presence: ColumnPresence,
}

impl HeaderLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            positions
                .entry(header.trim().to_ascii_uppercase())
                .or_insert(idx);
        }

        let mut key_positions = [0usize; 4];
        for (slot, name) in key_positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = positions
                .get(name)
                .copied()
                .ok_or_else(|| MapError::MissingColumn(name.to_string()))?;
        }
        let [unidad, iden_proy, proyecto, partida] = key_positions;

        let mut monthly = Vec::new();
        let mut presence = ColumnPresence::default();
        for (name, idx) in &positions {
            if let Some((kind, month)) = TransactionKind::parse_column(name) {
                monthly.push((*idx, kind, month));
                presence.mark(kind, month);
            }
        }

        Ok(Self {
            unidad,
            iden_proy,
            proyecto,
            partida,
            monthly,
            presence,
        })
    }
}

/// Reads a MAP extract in CSV form into a record table.
///
/// The four key columns are required; monthly columns are picked up by name
/// and any other column is ignored. Blank or non-numeric amounts are kept as
/// missing cells.
pub fn read_map_csv<R: Read>(reader: R) -> Result<RecordTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let layout = HeaderLayout::from_headers(csv_reader.headers()?)?;
    debug!(
        "MAP layout has {} monthly columns out of {}",
        layout.presence.count(),
        TransactionKind::ALL.len() * 12
    );

    let mut records = Vec::new();
    let mut unparsed_cells = 0usize;

    for row in csv_reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();

        let mut record = BudgetRecord::new(
            field(layout.unidad),
            field(layout.iden_proy),
            field(layout.proyecto),
            field(layout.partida),
        );

        for &(idx, kind, month) in &layout.monthly {
            let raw = row.get(idx).unwrap_or("");
            let value = parse_decimal(raw);
            if value.is_none() && !raw.trim().is_empty() {
                unparsed_cells += 1;
            }
            record.monthly.set(kind, month, value);
        }

        records.push(record);
    }

    if unparsed_cells > 0 {
        warn!(
            "{} non-numeric amount cells were treated as empty",
            unparsed_cells
        );
    }

    Ok(RecordTable::new(layout.presence, records))
}

pub fn read_map_csv_path(path: impl AsRef<Path>) -> Result<RecordTable> {
    let file = std::fs::File::open(path)?;
    read_map_csv(file)
}
