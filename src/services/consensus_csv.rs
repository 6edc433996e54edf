// src/services/consensus_csv.rs
use csv::{Reader, StringRecord};
use log::{debug, info};
use std::fs;
use std::path::Path;

use crate::services::quarter_map::RawCell;
use crate::BoxError;

/// Read a consolidated consensus table: a header row of column tags
/// (`A|2024/12`, `Q|2025/03`, ...) followed by one row of EPS values.
/// A leading label column (e.g. `EPS`) is kept as an ordinary cell and
/// rejected later by the tag parser.
pub fn parse_consensus_csv(csv_text: &str) -> Result<Vec<RawCell>, BoxError> {
    let mut rdr = Reader::from_reader(csv_text.as_bytes());
    let headers = rdr.headers()?.clone();

    let row: StringRecord = match rdr.records().next() {
        Some(record) => record?,
        None => return Err("No data rows in consensus CSV".into()),
    };

    let cells: Vec<RawCell> = headers
        .iter()
        .zip(row.iter())
        .map(|(tag, value)| RawCell::new(tag.trim(), value.trim()))
        .collect();

    debug!("Parsed {} consensus cells", cells.len());
    Ok(cells)
}

pub fn load_consensus_csv(path: &Path) -> Result<Vec<RawCell>, BoxError> {
    info!("Loading consensus table from {}", path.display());
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_consensus_csv(&text)
}
