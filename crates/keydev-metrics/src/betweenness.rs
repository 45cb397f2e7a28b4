//! Weighted betweenness centrality over the developer graph.
//!
//! Brandes' algorithm with Dijkstra shortest paths. Edge distance is the
//! reciprocal of the shared-work weight, so strongly collaborating pairs
//! are "close" and a developer bridging two otherwise-distant groups
//! collects the shortest paths between them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BinaryHeap;

use petgraph::visit::EdgeRef;

use keydev_graph::DeveloperGraph;

/// Comparison slack for accumulated floating-point distances.
const EPS: f64 = 1e-12;

/// Min-heap entry for Dijkstra.
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest distance.
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Normalized betweenness centrality per developer.
///
/// Normalization divides by `(n-1)(n-2)`, matching the usual undirected
/// convention where each pair is counted from both endpoints. Graphs with
/// fewer than three developers, and developers with degree zero, score 0.
///
/// # Examples
///
/// ```
/// use keydev_core::{DecayKind, GraphConfig};
/// use keydev_graph::{ArtifactGraph, Decay, DeveloperGraph};
/// use keydev_metrics::betweenness;
///
/// let empty = ArtifactGraph::empty(Decay::new(DecayKind::Linear, 30));
/// let devs = DeveloperGraph::project(&empty, &GraphConfig::default());
/// assert!(betweenness(&devs).is_empty());
/// ```
pub fn betweenness(dev_graph: &DeveloperGraph) -> BTreeMap<String, f64> {
    let graph = dev_graph.graph();
    let n = graph.node_count();

    let mut scores: BTreeMap<String, f64> = dev_graph
        .developers()
        .into_iter()
        .map(|dev| (dev.to_string(), 0.0))
        .collect();
    if n < 3 {
        return scores;
    }

    // Adjacency with reciprocal-weight distances. Node indices of a
    // freshly built UnGraph are contiguous 0..n.
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for edge in graph.edge_references() {
        let weight = *edge.weight();
        if weight <= 0.0 {
            continue;
        }
        let dist = 1.0 / weight;
        adjacency[edge.source().index()].push((edge.target().index(), dist));
        adjacency[edge.target().index()].push((edge.source().index(), dist));
    }

    let mut centrality = vec![0.0f64; n];

    for source in 0..n {
        // Dijkstra from `source`, tracking path counts and predecessors.
        let mut dist = vec![f64::INFINITY; n];
        let mut sigma = vec![0.0f64; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut settled_order: Vec<usize> = Vec::with_capacity(n);
        let mut settled = vec![false; n];

        dist[source] = 0.0;
        sigma[source] = 1.0;
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist: 0.0,
            node: source,
        });

        while let Some(HeapEntry { dist: d, node: v }) = heap.pop() {
            if settled[v] {
                continue;
            }
            settled[v] = true;
            settled_order.push(v);

            for &(w, len) in &adjacency[v] {
                let candidate = d + len;
                if candidate < dist[w] - EPS {
                    dist[w] = candidate;
                    sigma[w] = sigma[v];
                    preds[w].clear();
                    preds[w].push(v);
                    heap.push(HeapEntry {
                        dist: candidate,
                        node: w,
                    });
                } else if (candidate - dist[w]).abs() <= EPS && !settled[w] {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        // Dependency accumulation in reverse settlement order.
        let mut delta = vec![0.0f64; n];
        for &w in settled_order.iter().rev() {
            for &v in &preds[w] {
                if sigma[w] > 0.0 {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for (dev, score) in scores.iter_mut() {
        if let Some(idx) = dev_graph.node_index(dev) {
            *score = centrality[idx.index()] * scale;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use keydev_core::{ChangeSet, ChangeType, CodeChange, DecayKind, GraphConfig};
    use keydev_graph::{ArtifactGraph, Decay, WindowDelta};

    fn make_change_set(hash: &str, author: &str, files: &[&str]) -> ChangeSet {
        ChangeSet {
            commit_hash: hash.into(),
            author: author.into(),
            timestamp: Utc.with_ymd_and_hms(2019, 1, 1, 12, 0, 0).unwrap(),
            issues: vec![],
            code_changes: files
                .iter()
                .map(|f| CodeChange {
                    file_path: (*f).into(),
                    change_type: ChangeType::Modify,
                })
                .collect(),
        }
    }

    fn project(change_sets: Vec<ChangeSet>) -> DeveloperGraph {
        let delta = WindowDelta {
            window_end: Utc.with_ymd_and_hms(2019, 1, 1, 23, 59, 59).unwrap(),
            entering: change_sets,
            expiring: vec![],
        };
        let artifact = ArtifactGraph::empty(Decay::new(DecayKind::None, 30))
            .apply(&delta, &GraphConfig::default());
        DeveloperGraph::project(&artifact, &GraphConfig::default())
    }

    #[test]
    fn bridge_developer_has_highest_betweenness() {
        // alice-bridge via f1, bridge-bob via f2: bridge sits between them
        let devs = project(vec![
            make_change_set("c1", "alice", &["f1"]),
            make_change_set("c2", "bridge", &["f1", "f2"]),
            make_change_set("c3", "bob", &["f2"]),
        ]);
        let scores = betweenness(&devs);

        assert!(scores["bridge"] > scores["alice"]);
        assert!(scores["bridge"] > scores["bob"]);
        // With n=3 the single bridging pair gives the maximum score 1.0
        assert!((scores["bridge"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degree_zero_developer_scores_exactly_zero() {
        let devs = project(vec![
            make_change_set("c1", "alice", &["f1"]),
            make_change_set("c2", "bridge", &["f1", "f2"]),
            make_change_set("c3", "bob", &["f2"]),
            make_change_set("c4", "loner", &["solo.java"]),
        ]);
        let scores = betweenness(&devs);
        assert_eq!(scores["loner"], 0.0);
    }

    #[test]
    fn endpoints_of_a_single_edge_score_zero() {
        let devs = project(vec![
            make_change_set("c1", "alice", &["f1"]),
            make_change_set("c2", "bob", &["f1"]),
            make_change_set("c3", "carol", &["lonely.java"]),
        ]);
        let scores = betweenness(&devs);
        assert_eq!(scores["alice"], 0.0);
        assert_eq!(scores["bob"], 0.0);
    }

    #[test]
    fn chain_center_beats_chain_ends() {
        // a - b - c - d: b and c each bridge, ends bridge nothing
        let devs = project(vec![
            make_change_set("c1", "a", &["f1"]),
            make_change_set("c2", "b", &["f1", "f2"]),
            make_change_set("c3", "c", &["f2", "f3"]),
            make_change_set("c4", "d", &["f3"]),
        ]);
        let scores = betweenness(&devs);

        assert!(scores["b"] > scores["a"]);
        assert!(scores["c"] > scores["d"]);
        assert!((scores["b"] - scores["c"]).abs() < 1e-9, "symmetric chain");
    }

    #[test]
    fn heavier_shared_work_attracts_shortest_paths() {
        // Two routes from a to c: via strong collaborator b (weight 2 per
        // hop) or via weak collaborator w (weight ~1 per hop). Paths go
        // through b.
        let devs = project(vec![
            make_change_set("c1", "a", &["ab1", "ab2", "aw"]),
            make_change_set("c2", "b", &["ab1", "ab2", "bc1", "bc2"]),
            make_change_set("c3", "w", &["aw", "wc"]),
            make_change_set("c4", "c", &["bc1", "bc2", "wc"]),
        ]);
        let scores = betweenness(&devs);
        assert!(scores["b"] > scores["w"]);
    }
}
