use serde_json::Value;

use crate::domain::{DiseaseId, TargetId};
use crate::error::ScoreError;
use crate::loader::{Row, Table};

pub const DISEASE_COLUMNS: [&str; 2] = ["id", "name"];
pub const TARGET_COLUMNS: [&str; 2] = ["id", "approvedSymbol"];
pub const EVIDENCE_COLUMNS: [&str; 3] = ["diseaseId", "targetId", "score"];

#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub disease_id: DiseaseId,
    pub target_id: TargetId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseRecord {
    pub id: DiseaseId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: TargetId,
    pub approved_symbol: Option<String>,
}

impl EvidenceRecord {
    /// Rows with a null disease or target id are skipped; a missing or non-numeric score is an error.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, ScoreError> {
        let mut records = Vec::with_capacity(table.len());
        let mut skipped = 0usize;
        for row in table.rows() {
            let (Some(disease_id), Some(target_id)) = (
                string_field(table, row, "diseaseId")?,
                string_field(table, row, "targetId")?,
            ) else {
                skipped += 1;
                continue;
            };
            let score = table
                .value(row, "score")
                .and_then(Value::as_f64)
                .ok_or_else(|| field_error(row, "score", "expected a number"))?;
            records.push(Self {
                disease_id: DiseaseId::new(disease_id),
                target_id: TargetId::new(target_id),
                score,
            });
        }
        if skipped > 0 {
            tracing::debug!(skipped, "dropped evidence rows without disease/target id");
        }
        Ok(records)
    }
}

impl DiseaseRecord {
    pub fn from_table(table: &Table) -> Result<Vec<Self>, ScoreError> {
        let mut records = Vec::with_capacity(table.len());
        for row in table.rows() {
            let Some(id) = string_field(table, row, "id")? else {
                continue;
            };
            records.push(Self {
                id: DiseaseId::new(id),
                name: string_field(table, row, "name")?,
            });
        }
        Ok(records)
    }
}

impl TargetRecord {
    pub fn from_table(table: &Table) -> Result<Vec<Self>, ScoreError> {
        let mut records = Vec::with_capacity(table.len());
        for row in table.rows() {
            let Some(id) = string_field(table, row, "id")? else {
                continue;
            };
            records.push(Self {
                id: TargetId::new(id),
                approved_symbol: string_field(table, row, "approvedSymbol")?,
            });
        }
        Ok(records)
    }
}

fn string_field(table: &Table, row: &Row, column: &str) -> Result<Option<String>, ScoreError> {
    match table.value(row, column) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(field_error(row, column, "expected a string")),
    }
}

fn field_error(row: &Row, column: &str, message: &str) -> ScoreError {
    ScoreError::data_source(
        row.origin.path.clone(),
        Some(row.origin.line),
        format!("field `{column}`: {message}"),
    )
}
