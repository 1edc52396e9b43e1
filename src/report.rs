use crate::config::{Category, YearConfig};
use crate::dashboard::{AvailableLine, ChapterBreakdown, UnitSummary};
use crate::pivots::{FrozenFunds, PivotSummary};
use crate::schema::RecordTable;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub fecha_archivo: NaiveDate,
    pub mes: u32,
    #[serde(rename = "año")]
    pub anio: i32,
    pub registros: usize,
    pub config: YearConfig,
    #[serde(rename = "es_cierre_año_anterior")]
    pub es_cierre_anio_anterior: bool,
}

/// Budget summary of one MAP file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub totales: PivotSummary,
    pub categorias: BTreeMap<Category, PivotSummary>,
    pub programas: BTreeMap<String, PivotSummary>,
    pub congelados: FrozenFunds,
    pub resultados_por_ur: BTreeMap<String, UnitSummary>,
    pub capitulos_por_ur: BTreeMap<String, BTreeMap<String, ChapterBreakdown>>,
    pub partidas_por_ur: BTreeMap<String, Vec<AvailableLine>>,
    pub metadata: SummaryMetadata,
}

/// A processed file: its summary plus the fully derived record table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMap {
    pub summary: MapSummary,
    pub table: RecordTable,
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn percent(value: Decimal) -> String {
    let scaled = value.checked_mul(Decimal::ONE_HUNDRED).unwrap_or_default();
    format!("{:.1}%", scaled)
}

impl MapSummary {
    pub fn category(&self, category: Category) -> PivotSummary {
        self.categorias.get(&category).copied().unwrap_or_default()
    }

    /// Program pivots in the order the year configuration lists them.
    ///
    /// `programas` is keyed by code, so serialized output is sorted; any
    /// program missing from the configured list follows in code order.
    pub fn programs_in_config_order(&self) -> Vec<(&str, PivotSummary)> {
        let configured = &self.metadata.config.programas_especificos;
        let mut ordered: Vec<(&str, PivotSummary)> = configured
            .iter()
            .filter_map(|pp| {
                self.programas
                    .get_key_value(pp)
                    .map(|(code, pivot)| (code.as_str(), *pivot))
            })
            .collect();

        ordered.extend(
            self.programas
                .iter()
                .filter(|(code, _)| !configured.contains(*code))
                .map(|(code, pivot)| (code.as_str(), *pivot)),
        );
        ordered
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Categories view plus the grand total, one row each.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Categoria,Original,ModificadoAnualNeto,ModificadoPeriodoNeto,Ejercido\n");

        let rows = Category::ALL
            .iter()
            .map(|c| (c.key(), self.category(*c)))
            .chain(std::iter::once(("totales", self.totales)));

        for (name, pivot) in rows {
            output.push_str(&format!(
                "{},{},{},{},{}\n",
                name,
                money(pivot.original),
                money(pivot.modificado_anual_neto),
                money(pivot.modificado_periodo_neto),
                money(pivot.ejercido)
            ));
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let meta = &self.metadata;

        output.push_str(&format!(
            "# Resumen presupuestario {:02}/{}\n\n",
            meta.mes, meta.anio
        ));
        output.push_str(&format!(
            "**Fecha de archivo:** {} | **Registros:** {}",
            meta.fecha_archivo.format("%Y-%m-%d"),
            meta.registros
        ));
        if meta.es_cierre_anio_anterior {
            output.push_str(" | **Cierre de ejercicio anterior**");
        }
        output.push_str("\n\n");

        output.push_str("## Categorias\n\n");
        output.push_str("| Categoria | Original | Modificado anual | Modificado periodo | Ejercido |\n");
        output.push_str("|---|---:|---:|---:|---:|\n");
        for category in Category::ALL {
            push_pivot_row(&mut output, category.label(), &self.category(category));
        }
        push_pivot_row(&mut output, "**Total**", &self.totales);
        output.push('\n');

        if !self.programas.is_empty() {
            output.push_str("## Programas de subsidio\n\n");
            output.push_str("| Programa | Original | Modificado anual | Modificado periodo | Ejercido |\n");
            output.push_str("|---|---:|---:|---:|---:|\n");
            for (program, pivot) in self.programs_in_config_order() {
                push_pivot_row(&mut output, program, &pivot);
            }
            output.push('\n');
        }

        output.push_str("## Congelados\n\n");
        for (program, amount) in &self.congelados.valores {
            let words = self
                .congelados
                .textos
                .get(program)
                .map(String::as_str)
                .unwrap_or("");
            output.push_str(&format!("- {}: {} ({})\n", program, money(*amount), words));
        }
        output.push('\n');

        if !self.resultados_por_ur.is_empty() {
            output.push_str("## Unidades responsables\n\n");
            output.push_str("| UR | Modificado periodo | Ejercido | Disponible periodo | Avance |\n");
            output.push_str("|---|---:|---:|---:|---:|\n");
            for (unit, summary) in &self.resultados_por_ur {
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    unit,
                    money(summary.modificado_periodo),
                    money(summary.ejercido),
                    money(summary.disponible_periodo),
                    percent(summary.pct_avance_periodo)
                ));
            }
            output.push('\n');
        }

        output
    }
}

fn push_pivot_row(output: &mut String, name: &str, pivot: &PivotSummary) {
    output.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n",
        name,
        money(pivot.original),
        money(pivot.modificado_anual_neto),
        money(pivot.modificado_periodo_neto),
        money(pivot.ejercido)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary() -> MapSummary {
        let pivot = PivotSummary {
            original: dec!(100),
            modificado_anual_neto: dec!(90),
            modificado_periodo_neto: dec!(45.5),
            ejercido: dec!(30.25),
        };
        let categorias = Category::ALL
            .iter()
            .map(|c| (*c, pivot))
            .collect::<BTreeMap<_, _>>();

        MapSummary {
            totales: categorias.values().copied().sum(),
            categorias,
            programas: BTreeMap::from([("S263".to_string(), pivot)]),
            congelados: FrozenFunds {
                valores: BTreeMap::from([("S263".to_string(), dec!(1))]),
                textos: BTreeMap::from([("S263".to_string(), "UN PESO 00/100 M.N.".to_string())]),
            },
            resultados_por_ur: BTreeMap::from([(
                "108".to_string(),
                UnitSummary {
                    modificado_periodo: dec!(200),
                    ejercido: dec!(50),
                    disponible_periodo: dec!(150),
                    pct_avance_periodo: dec!(0.25),
                    ..UnitSummary::default()
                },
            )]),
            capitulos_por_ur: BTreeMap::new(),
            partidas_por_ur: BTreeMap::new(),
            metadata: SummaryMetadata {
                fecha_archivo: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                mes: 6,
                anio: 2025,
                registros: 3,
                config: YearConfig::default(),
                es_cierre_anio_anterior: false,
            },
        }
    }

    #[test]
    fn test_json_uses_published_keys() {
        let json = summary().to_json().unwrap();
        for key in [
            "\"totales\"",
            "\"categorias\"",
            "\"servicios_personales\"",
            "\"bienes_muebles\"",
            "\"congelados\"",
            "\"valores\"",
            "\"textos\"",
            "\"resultados_por_ur\"",
            "\"Pct_avance_periodo\"",
            "\"ModificadoPeriodoNeto\"",
            "\"año\"",
            "\"es_cierre_año_anterior\"",
        ] {
            assert!(json.contains(key), "missing {} in {}", key, json);
        }
    }

    #[test]
    fn test_csv_rows() {
        let csv = summary().to_csv();
        assert!(csv.starts_with("Categoria,Original"));
        assert!(csv.contains("gasto_corriente,100.00,90.00,45.50,30.25"));
        assert!(csv.contains("totales,500.00,450.00,227.50,151.25"));
        assert_eq!(csv.lines().count(), 7);
    }

    #[test]
    fn test_markdown_report() {
        let markdown = summary().to_markdown();
        assert!(markdown.contains("# Resumen presupuestario 06/2025"));
        assert!(markdown.contains("| **Total** | 500.00 |"));
        assert!(markdown.contains("- S263: 1.00 (UN PESO 00/100 M.N.)"));
        assert!(markdown.contains("| 108 | 200.00 | 50.00 | 150.00 | 25.0% |"));
        assert!(!markdown.contains("Cierre"));
    }

    #[test]
    fn test_programs_follow_configured_order() {
        let mut summary = summary();
        let pivot = summary.programas["S263"];
        summary.programas.insert("S304".to_string(), pivot);
        summary.programas.insert("E999".to_string(), pivot);
        summary.metadata.config.programas_especificos =
            vec!["S304".to_string(), "S293".to_string(), "S263".to_string()];

        let order: Vec<&str> = summary
            .programs_in_config_order()
            .into_iter()
            .map(|(code, _)| code)
            .collect();
        assert_eq!(order, vec!["S304", "S263", "E999"]);

        let markdown = summary.to_markdown();
        let s304 = markdown.find("| S304 |").unwrap();
        let s263 = markdown.find("| S263 |").unwrap();
        assert!(s304 < s263);
    }
}
