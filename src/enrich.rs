use std::collections::HashMap;

use crate::records::{DiseaseRecord, TargetRecord};
use crate::summary::GroupSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub summary: GroupSummary,
    pub name: Option<String>,
    pub approved_symbol: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Enriched {
    pub rows: Vec<EnrichedRow>,
    pub unmatched_diseases: usize,
    pub unmatched_targets: usize,
}

/// Left join of summaries against the disease and target tables.
///
/// Unmatched ids keep their row with `None` names. Duplicate reference ids resolve
/// to the row loaded last.
pub fn enrich(
    summaries: Vec<GroupSummary>,
    diseases: &[DiseaseRecord],
    targets: &[TargetRecord],
) -> Enriched {
    let disease_names: HashMap<&str, Option<&str>> = diseases
        .iter()
        .map(|disease| (disease.id.as_str(), disease.name.as_deref()))
        .collect();
    let target_symbols: HashMap<&str, Option<&str>> = targets
        .iter()
        .map(|target| (target.id.as_str(), target.approved_symbol.as_deref()))
        .collect();

    let mut enriched = Enriched {
        rows: Vec::with_capacity(summaries.len()),
        ..Enriched::default()
    };
    for summary in summaries {
        let name = disease_names.get(summary.key.disease_id.as_str());
        let symbol = target_symbols.get(summary.key.target_id.as_str());
        if name.is_none() {
            enriched.unmatched_diseases += 1;
        }
        if symbol.is_none() {
            enriched.unmatched_targets += 1;
        }
        enriched.rows.push(EnrichedRow {
            name: name.copied().flatten().map(str::to_string),
            approved_symbol: symbol.copied().flatten().map(str::to_string),
            summary,
        });
    }

    if enriched.unmatched_diseases > 0 || enriched.unmatched_targets > 0 {
        tracing::warn!(
            unmatched_diseases = enriched.unmatched_diseases,
            unmatched_targets = enriched.unmatched_targets,
            "evidence pairs without reference names"
        );
    }
    enriched
}
