use crate::domain::model::{CostLine, CostLineId};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{parse_amount, validate_non_empty_string};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CostRow {
    concept: String,
    amount: String,
    #[serde(default)]
    applies_vat: Option<String>,
    #[serde(default)]
    applies_withholding: Option<String>,
}

fn parse_flag(field: &str, row: usize, raw: Option<&str>) -> Result<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") | Some("si") | Some("sí") => Ok(true),
        Some(other) => Err(EngineError::ValidationError {
            message: format!("row {}: '{}' is not a valid {} flag", row, other, field),
        }),
    }
}

/// 從 CSV 匯入成本項目。
///
/// 欄位：`concept,amount,applies_vat,applies_withholding`。id 從 `first_id` 起依序編號。
pub fn read_cost_lines<R: Read>(reader: R, first_id: CostLineId) -> Result<Vec<CostLine>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut lines = Vec::new();
    for (index, record) in csv_reader.deserialize::<CostRow>().enumerate() {
        let row_number = index + 2; // header is row 1
        let row = record?;

        validate_non_empty_string(&format!("row {} concept", row_number), &row.concept)?;
        let amount = parse_amount(&format!("row {}", row_number), &row.amount)?;

        let mut line = CostLine::new(first_id + index as CostLineId, row.concept, amount);
        line.applies_vat = parse_flag("applies_vat", row_number, row.applies_vat.as_deref())?;
        line.applies_withholding = parse_flag(
            "applies_withholding",
            row_number,
            row.applies_withholding.as_deref(),
        )?;
        lines.push(line);
    }

    tracing::debug!("Imported {} cost lines from CSV", lines.len());
    Ok(lines)
}

pub fn read_cost_lines_from_file<P: AsRef<Path>>(
    path: P,
    first_id: CostLineId,
) -> Result<Vec<CostLine>> {
    let file = std::fs::File::open(path)?;
    read_cost_lines(file, first_id)
}
