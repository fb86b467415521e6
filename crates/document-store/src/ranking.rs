use crate::record::{DocumentRecord, SearchHit};
use docqa_vector_store::Neighbor;
use std::cmp::Ordering;

/// Number of index candidates to request for `k` results.
#[must_use]
pub fn candidate_count(k: usize, overfetch_factor: usize, total: usize) -> usize {
    k.saturating_mul(overfetch_factor.max(1)).min(total)
}

/// Score order with `-0.0 == 0.0`; NaN falls back to the IEEE total order.
fn compare_scores(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Ascending score, ties broken by ascending `doc_id` (byte order).
#[must_use]
pub fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    compare_scores(a.score, b.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Joins raw neighbors to their records and returns the top `k`.
///
/// Handles outside `0..records.len()` are dropped silently.
#[must_use]
pub fn rank_neighbors(
    records: &[DocumentRecord],
    neighbors: Vec<Neighbor>,
    k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = neighbors
        .into_iter()
        .filter_map(|neighbor| {
            let ordinal = usize::try_from(neighbor.handle).ok()?;
            let record = records.get(ordinal)?;
            Some(SearchHit {
                doc_id: record.doc_id.clone(),
                score: neighbor.distance,
                language: record.language.clone(),
                content: record.content.clone(),
            })
        })
        .collect();

    hits.sort_by(compare_hits);
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::compute_identity;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn records(n: usize) -> Vec<DocumentRecord> {
        (0..n)
            .map(|i| DocumentRecord {
                doc_id: format!("doc_{i}"),
                content_hash: compute_identity(&format!("content {i}")),
                language: "en".to_string(),
                content: format!("content {i}"),
                vector_handle: i,
            })
            .collect()
    }

    fn neighbor(handle: i64, distance: f32) -> Neighbor {
        Neighbor { handle, distance }
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.doc_id.as_str()).collect()
    }

    #[test]
    fn out_of_range_handles_are_dropped() {
        let records = records(3);
        let hits = rank_neighbors(
            &records,
            vec![
                neighbor(-1, 0.0),
                neighbor(2, 0.5),
                neighbor(3, 0.1),
                neighbor(99, 0.2),
                neighbor(0, 0.9),
            ],
            10,
        );
        assert_eq!(ids(&hits), vec!["doc_2", "doc_0"]);
        assert_eq!(hits[0].content, "content 2");
    }

    #[test]
    fn ties_order_by_doc_id_lexically() {
        let records = records(12);
        let hits = rank_neighbors(
            &records,
            vec![neighbor(2, 1.0), neighbor(10, 1.0), neighbor(1, 1.0), neighbor(11, 0.5)],
            4,
        );
        assert_eq!(ids(&hits), vec!["doc_11", "doc_1", "doc_10", "doc_2"]);
    }

    #[test]
    fn signed_zero_scores_are_ties() {
        let records = records(2);
        let hits = rank_neighbors(&records, vec![neighbor(1, -0.0), neighbor(0, 0.0)], 2);
        assert_eq!(ids(&hits), vec!["doc_0", "doc_1"]);
    }

    #[test]
    fn candidate_count_is_bounded_by_corpus() {
        assert_eq!(candidate_count(3, 2, 100), 6);
        assert_eq!(candidate_count(3, 2, 4), 4);
        assert_eq!(candidate_count(usize::MAX, 2, 7), 7);
    }

    proptest! {
        #[test]
        fn ranked_hits_are_sorted_and_bounded(
            scores in prop::collection::vec(-4i8..4, 0..24),
            k in 1usize..10,
        ) {
            let records = records(scores.len());
            let neighbors = scores
                .iter()
                .enumerate()
                .map(|(i, s)| neighbor(i as i64, f32::from(*s) * 0.25))
                .collect();

            let hits = rank_neighbors(&records, neighbors, k);

            prop_assert!(hits.len() <= k);
            prop_assert_eq!(hits.len(), k.min(scores.len()));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score <= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].doc_id < pair[1].doc_id);
                }
            }
        }
    }
}
