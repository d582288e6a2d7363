use kira_evidence_rank::domain::{DiseaseId, GroupKey, TargetId};
use kira_evidence_rank::enrich::enrich;
use kira_evidence_rank::records::{DiseaseRecord, TargetRecord};
use kira_evidence_rank::summary::GroupSummary;

fn summary(disease: &str, target: &str, scores: &[f64]) -> GroupSummary {
    GroupSummary::from_scores(
        GroupKey::new(DiseaseId::new(disease), TargetId::new(target)),
        scores.to_vec(),
    )
    .unwrap()
}

fn disease(id: &str, name: Option<&str>) -> DiseaseRecord {
    DiseaseRecord {
        id: DiseaseId::new(id),
        name: name.map(str::to_string),
    }
}

fn target(id: &str, symbol: Option<&str>) -> TargetRecord {
    TargetRecord {
        id: TargetId::new(id),
        approved_symbol: symbol.map(str::to_string),
    }
}

#[test]
fn matching_rows_get_names() {
    let enriched = enrich(
        vec![summary("D1", "T1", &[0.2])],
        &[disease("D1", Some("Asthma"))],
        &[target("T1", Some("GENE1"))],
    );

    assert_eq!(enriched.rows.len(), 1);
    assert_eq!(enriched.rows[0].name.as_deref(), Some("Asthma"));
    assert_eq!(enriched.rows[0].approved_symbol.as_deref(), Some("GENE1"));
    assert_eq!(enriched.unmatched_diseases, 0);
    assert_eq!(enriched.unmatched_targets, 0);
}

#[test]
fn unmatched_rows_are_kept_with_null_names() {
    let enriched = enrich(
        vec![
            summary("D1", "T1", &[0.2]),
            summary("D9", "T1", &[0.4]),
            summary("D1", "T9", &[0.6]),
        ],
        &[disease("D1", Some("Asthma"))],
        &[target("T1", Some("GENE1"))],
    );

    assert_eq!(enriched.rows.len(), 3);
    assert_eq!(enriched.rows[1].summary.key.disease_id.as_str(), "D9");
    assert_eq!(enriched.rows[1].name, None);
    assert_eq!(enriched.rows[1].approved_symbol.as_deref(), Some("GENE1"));
    assert_eq!(enriched.rows[2].name.as_deref(), Some("Asthma"));
    assert_eq!(enriched.rows[2].approved_symbol, None);
    assert_eq!(enriched.unmatched_diseases, 1);
    assert_eq!(enriched.unmatched_targets, 1);
}

#[test]
fn matched_reference_with_null_name_stays_null() {
    let enriched = enrich(
        vec![summary("D1", "T1", &[0.2])],
        &[disease("D1", None)],
        &[target("T1", Some("GENE1"))],
    );

    assert_eq!(enriched.rows[0].name, None);
    assert_eq!(enriched.unmatched_diseases, 0);
}

#[test]
fn duplicate_reference_ids_resolve_to_last_loaded() {
    let enriched = enrich(
        vec![summary("D1", "T1", &[0.2])],
        &[disease("D1", Some("old")), disease("D1", Some("new"))],
        &[target("T1", Some("A")), target("T1", Some("B"))],
    );

    assert_eq!(enriched.rows[0].name.as_deref(), Some("new"));
    assert_eq!(enriched.rows[0].approved_symbol.as_deref(), Some("B"));
}

#[test]
fn join_preserves_row_order() {
    let enriched = enrich(
        vec![
            summary("D2", "T1", &[0.1]),
            summary("D1", "T1", &[0.2]),
        ],
        &[],
        &[],
    );

    let ids: Vec<&str> = enriched
        .rows
        .iter()
        .map(|row| row.summary.key.disease_id.as_str())
        .collect();
    assert_eq!(ids, vec!["D2", "D1"]);
}
