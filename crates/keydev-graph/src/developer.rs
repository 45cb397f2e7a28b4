//! Developer graph projected from an artifact graph.
//!
//! A pure function of the artifact snapshot: developer→file contribution
//! weights plus a developer↔developer graph where an edge means two
//! developers worked on the same file (or the same issue) in-window.
//! Aggregation runs over sorted keys, so the same artifact graph always
//! projects to the identical developer graph.

use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};

use keydev_core::GraphConfig;

use crate::artifact::ArtifactGraph;

/// Developer nodes with contribution weights and shared-work edges.
///
/// # Examples
///
/// ```
/// use keydev_core::{DecayKind, GraphConfig};
/// use keydev_graph::{ArtifactGraph, Decay, DeveloperGraph};
///
/// let empty = ArtifactGraph::empty(Decay::new(DecayKind::Linear, 30));
/// let devs = DeveloperGraph::project(&empty, &GraphConfig::default());
/// assert!(devs.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DeveloperGraph {
    /// developer → file → decayed contribution weight.
    contributions: BTreeMap<String, BTreeMap<String, f64>>,
    graph: UnGraph<String, f64>,
    index: BTreeMap<String, NodeIndex>,
}

impl DeveloperGraph {
    /// Project the developer graph out of an artifact snapshot.
    ///
    /// Developer↔developer edge weight is the shared contribution
    /// strength: for each common file, the smaller of the two developers'
    /// decayed weights on it, summed. Issue links contribute the same way
    /// when `include_issue_links` is set. Edges below `min_edge_weight`
    /// are dropped.
    pub fn project(artifact: &ArtifactGraph, config: &GraphConfig) -> Self {
        let mut contributions: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut pair_weights: BTreeMap<(String, String), f64> = BTreeMap::new();

        for path in artifact.files() {
            let mut per_dev: BTreeMap<&str, f64> = BTreeMap::new();
            for (author, timestamp) in artifact.touches_on(path) {
                *per_dev.entry(author).or_default() += artifact.touch_weight(timestamp);
            }

            for (dev, weight) in &per_dev {
                *contributions
                    .entry((*dev).to_string())
                    .or_default()
                    .entry(path.to_string())
                    .or_default() += weight;
            }

            accumulate_pairs(&per_dev, &mut pair_weights);
        }

        if config.include_issue_links {
            for (_, authors) in artifact.issue_links() {
                // Strongest in-window change set per developer on this issue.
                let mut per_dev: BTreeMap<&str, f64> = BTreeMap::new();
                for (author, timestamp) in authors {
                    let weight = artifact.touch_weight(timestamp);
                    let entry = per_dev.entry(author).or_default();
                    if weight > *entry {
                        *entry = weight;
                    }
                }
                accumulate_pairs(&per_dev, &mut pair_weights);
            }
        }

        let mut graph = UnGraph::new_undirected();
        let mut index = BTreeMap::new();
        for dev in contributions.keys() {
            let idx = graph.add_node(dev.clone());
            index.insert(dev.clone(), idx);
        }
        for ((a, b), weight) in pair_weights {
            if weight <= 0.0 || weight < config.min_edge_weight {
                continue;
            }
            let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) else {
                continue;
            };
            graph.add_edge(ia, ib, weight);
        }

        Self {
            contributions,
            graph,
            index,
        }
    }

    /// Developer ids, sorted.
    pub fn developers(&self) -> Vec<&str> {
        self.contributions.keys().map(String::as_str).collect()
    }

    /// Per-file contribution weights for `dev`.
    pub fn files_of(&self, dev: &str) -> Option<&BTreeMap<String, f64>> {
        self.contributions.get(dev)
    }

    /// Number of shared-work edges incident to `dev`.
    pub fn degree(&self, dev: &str) -> usize {
        self.index
            .get(dev)
            .map_or(0, |&idx| self.graph.edges(idx).count())
    }

    /// Shared-work weight between two developers, if they are connected.
    pub fn edge_weight_between(&self, a: &str, b: &str) -> Option<f64> {
        let (&ia, &ib) = (self.index.get(a)?, self.index.get(b)?);
        self.graph
            .find_edge(ia, ib)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    /// The underlying developer↔developer graph.
    pub fn graph(&self) -> &UnGraph<String, f64> {
        &self.graph
    }

    /// Petgraph index for `dev`.
    pub fn node_index(&self, dev: &str) -> Option<NodeIndex> {
        self.index.get(dev).copied()
    }

    /// Number of developers.
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    /// Whether no developer is active in the window.
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

/// Add `min(w_a, w_b)` for every developer pair, keyed in sorted order.
fn accumulate_pairs(per_dev: &BTreeMap<&str, f64>, pair_weights: &mut BTreeMap<(String, String), f64>) {
    let devs: Vec<(&str, f64)> = per_dev.iter().map(|(d, w)| (*d, *w)).collect();
    for i in 0..devs.len() {
        for j in (i + 1)..devs.len() {
            let (a, wa) = devs[i];
            let (b, wb) = devs[j];
            *pair_weights
                .entry((a.to_string(), b.to_string()))
                .or_default() += wa.min(wb);
        }
    }
}
