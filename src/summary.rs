use std::collections::BTreeMap;

use crate::domain::GroupKey;
use crate::error::ScoreError;
use crate::records::EvidenceRecord;

pub const TOP_N: usize = 3;

/// Score distribution of one (disease, target) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: GroupKey,
    /// Scores in the order they were read.
    pub scores: Vec<f64>,
    pub median: f64,
    /// Highest scores, descending, at most [`TOP_N`].
    pub top3: Vec<f64>,
}

impl GroupSummary {
    pub fn from_scores(key: GroupKey, scores: Vec<f64>) -> Result<Self, ScoreError> {
        let Some(median) = median(&scores) else {
            return Err(ScoreError::EmptyGroup {
                disease_id: key.disease_id.to_string(),
                target_id: key.target_id.to_string(),
            });
        };
        let top3 = top_n(&scores, TOP_N);
        Ok(Self {
            key,
            scores,
            median,
            top3,
        })
    }
}

/// One summary per distinct (disease, target) pair, in ascending key order.
pub fn summarize(records: &[EvidenceRecord]) -> Result<Vec<GroupSummary>, ScoreError> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for record in records {
        let key = GroupKey::new(record.disease_id.clone(), record.target_id.clone());
        groups.entry(key).or_default().push(record.score);
    }

    tracing::debug!(
        records = records.len(),
        groups = groups.len(),
        "grouped evidence"
    );

    groups
        .into_iter()
        .map(|(key, scores)| GroupSummary::from_scores(key, scores))
        .collect()
}

/// 50th percentile: middle value, or the mean of the two middle values for an even count.
pub fn median(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// The `n` largest scores, descending.
pub fn top_n(scores: &[f64], n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let mut values = scores.to_vec();
    if values.len() > n {
        values.select_nth_unstable_by(n - 1, |a, b| b.total_cmp(a));
        values.truncate(n);
    }
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiseaseId, TargetId};

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn top_n_partial_selection() {
        assert_eq!(top_n(&[5.0, 1.0, 9.0, 3.0, 9.0], 3), vec![9.0, 9.0, 5.0]);
        assert_eq!(top_n(&[2.0], 3), vec![2.0]);
        assert_eq!(top_n(&[0.2, 0.8], 3), vec![0.8, 0.2]);
        assert!(top_n(&[1.0], 0).is_empty());
    }

    #[test]
    fn empty_group_is_rejected() {
        let key = GroupKey::new(DiseaseId::new("D1"), TargetId::new("T1"));
        let err = GroupSummary::from_scores(key, Vec::new()).unwrap_err();
        assert!(matches!(err, ScoreError::EmptyGroup { .. }));
    }
}
