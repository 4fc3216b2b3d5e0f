//! Degree annotation over the full, unfiltered record set.

use std::collections::HashMap;

use tracing::debug;

use crate::record::{NetworkStats, Record, RecordId};

/// Size of one degree pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DegreeScan {
    pub nodes: usize,
    /// Listed targets, duplicates and dangling ids included.
    pub edges: usize,
    /// Ordered record pairs visited; grows with `nodes^2`.
    pub pairs: usize,
}

/// Annotates every record with in/out/overall degree, incoming neighbours and
/// `target_by` back-references.
///
/// Semantics:
/// - `degree_out` is `target_nodes.len()` (duplicates count).
/// - `degree_in` counts distinct records whose `target_nodes` contain this id;
///   a record listing itself counts toward its own in-degree.
/// - `target_by` lists sources whose first `links_per_node` targets include
///   this record, in source order.
///
/// Previous annotations are discarded. The pairwise scan is O(n^2).
pub fn add_network_degree_to_nodes(records: &mut [Record], links_per_node: usize) -> DegreeScan {
    let index: HashMap<RecordId, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id, i))
        .collect();

    let mut stats: Vec<NetworkStats> = vec![NetworkStats::default(); records.len()];

    for (si, source) in records.iter().enumerate() {
        for target in records.iter() {
            if target.target_nodes.contains(&source.id) {
                stats[si].degree_in += 1;
                stats[si].incoming_nodes.insert(target.id);
            }
        }
        stats[si].degree_out = source.target_nodes.len() as u32;
        stats[si].degree_overall = stats[si].degree_in + stats[si].degree_out;
    }

    for source in records.iter() {
        for target in source.target_nodes.iter().take(links_per_node) {
            if let Some(&ti) = index.get(target) {
                stats[ti].target_by.push(source.id);
            }
        }
    }

    for (record, s) in records.iter_mut().zip(stats) {
        record.network = s;
    }

    let scan = DegreeScan {
        nodes: records.len(),
        edges: records.iter().map(|r| r.target_nodes.len()).sum(),
        pairs: records.len() * records.len(),
    };
    debug!(
        nodes = scan.nodes,
        edges = scan.edges,
        pairs = scan.pairs,
        "quadratic degree scan finished"
    );
    scan
}

#[cfg(test)]
mod tests {
    use super::{DegreeScan, add_network_degree_to_nodes};
    use crate::record::{Record, RecordId};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn rec(id: u32, targets: &[u32]) -> Record {
        let at = NaiveDate::from_ymd_opt(1940, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        Record::new(RecordId(id), at).with_targets(targets.iter().copied().map(RecordId))
    }

    #[test]
    fn overall_is_in_plus_out() {
        let mut records = vec![rec(1, &[2, 3]), rec(2, &[3]), rec(3, &[1]), rec(4, &[])];
        add_network_degree_to_nodes(&mut records, 10);

        for r in &records {
            assert_eq!(
                r.network.degree_overall,
                r.network.degree_in + r.network.degree_out
            );
        }
        assert_eq!(records[2].network.degree_in, 2);
        assert_eq!(
            records[2].network.incoming_nodes,
            BTreeSet::from([RecordId(1), RecordId(2)])
        );
        assert_eq!(records[0].network.degree_out, 2);
        assert_eq!(records[3].network.degree_overall, 0);
    }

    #[test]
    fn target_by_respects_links_per_node() {
        let mut records = vec![rec(1, &[2, 3]), rec(2, &[]), rec(3, &[])];
        add_network_degree_to_nodes(&mut records, 1);
        assert_eq!(records[1].network.target_by, vec![RecordId(1)]);
        assert!(records[2].network.target_by.is_empty());
        // Degrees still see every edge.
        assert_eq!(records[2].network.degree_in, 1);
    }

    #[test]
    fn self_links_and_duplicates() {
        let mut records = vec![rec(1, &[1, 2, 2]), rec(2, &[])];
        add_network_degree_to_nodes(&mut records, 10);
        assert_eq!(records[0].network.degree_in, 1);
        assert_eq!(records[0].network.degree_out, 3);
        assert_eq!(records[1].network.degree_in, 1);
    }

    #[test]
    fn dangling_targets_are_ignored_for_back_references() {
        let mut records = vec![rec(1, &[99])];
        add_network_degree_to_nodes(&mut records, 10);
        assert_eq!(records[0].network.degree_out, 1);
        assert_eq!(records[0].network.degree_in, 0);
    }

    #[test]
    fn rerunning_does_not_accumulate() {
        let mut records = vec![rec(1, &[2]), rec(2, &[1])];
        add_network_degree_to_nodes(&mut records, 10);
        add_network_degree_to_nodes(&mut records, 10);
        assert_eq!(records[0].network.degree_in, 1);
        assert_eq!(records[0].network.target_by, vec![RecordId(2)]);
    }

    #[test]
    fn scan_reports_quadratic_pair_count() {
        let mut records = vec![rec(1, &[2, 2, 9]), rec(2, &[1]), rec(3, &[])];
        let scan = add_network_degree_to_nodes(&mut records, 10);
        assert_eq!(
            scan,
            DegreeScan {
                nodes: 3,
                edges: 4,
                pairs: 9,
            }
        );
    }
}
