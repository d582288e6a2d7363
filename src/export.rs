use camino::Utf8Path;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::enrich::EnrichedRow;
use crate::error::ScoreError;
use crate::store::write_bytes_atomic;

/// Public reduction of one pair; the raw score list is not exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub disease_id: String,
    pub target_id: String,
    pub median: f64,
    pub top3: Vec<f64>,
    pub name: Option<String>,
    pub approved_symbol: Option<String>,
}

impl From<EnrichedRow> for ExportRow {
    fn from(row: EnrichedRow) -> Self {
        let summary = row.summary;
        Self {
            disease_id: summary.key.disease_id.into_string(),
            target_id: summary.key.target_id.into_string(),
            median: summary.median,
            top3: summary.top3,
            name: row.name,
            approved_symbol: row.approved_symbol,
        }
    }
}

/// Rows keyed by their position: `{"0": {...}, "1": {...}}`.
pub struct IndexedRows<'a>(pub &'a [ExportRow]);

impl Serialize for IndexedRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, row) in self.0.iter().enumerate() {
            map.serialize_entry(&index.to_string(), row)?;
        }
        map.end()
    }
}

/// Drops score lists and orders by ascending median; equal medians keep their input order.
pub fn rank(rows: Vec<EnrichedRow>) -> Vec<ExportRow> {
    let mut ranked: Vec<ExportRow> = rows.into_iter().map(ExportRow::from).collect();
    ranked.sort_by(|a, b| a.median.total_cmp(&b.median));
    ranked
}

pub fn render(rows: &[ExportRow]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    IndexedRows(rows).serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Ranks `rows` and writes them to `output` in one atomic step. Returns the number of rows written.
pub fn export_result(rows: Vec<EnrichedRow>, output: &Utf8Path) -> Result<usize, ScoreError> {
    let ranked = rank(rows);
    let content = render(&ranked).map_err(|err| ScoreError::output(output, err))?;
    write_bytes_atomic(output, &content)?;
    tracing::info!(rows = ranked.len(), "wrote {output}");
    Ok(ranked.len())
}
