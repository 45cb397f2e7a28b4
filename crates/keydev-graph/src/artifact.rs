//! Bipartite artifact graph over change sets and files.
//!
//! Nodes are change sets and files; an edge means "change set touched
//! file" and is stamped with the event timestamp. Recency weights are
//! derived on demand from the configured decay, so aging never mutates
//! the graph. Each window tick produces a new snapshot with a bumped
//! generation counter; snapshots are never shared between pipelines.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;

use keydev_core::{ChangeSet, ChangeType, DecayKind, GraphConfig};

use crate::window::WindowDelta;

/// A node in the artifact graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactNode {
    /// A change set, carrying the author and issue links needed for the
    /// developer projection.
    ChangeSet {
        /// Commit hash.
        hash: String,
        /// Author id.
        author: String,
        /// Linked issue ids.
        issues: Vec<String>,
    },
    /// A file path.
    File(String),
}

/// Edge payload: when the change set touched the file.
#[derive(Debug, Clone, Copy)]
pub struct TouchEdge {
    /// Timestamp of the originating change set.
    pub timestamp: DateTime<Utc>,
}

/// Recency decay applied to edge weights.
///
/// Weight is 1.0 for an event at the window end and monotonically
/// non-increasing with age, reaching 0.0 once the event exits the window.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use keydev_core::DecayKind;
/// use keydev_graph::Decay;
///
/// let decay = Decay::new(DecayKind::Linear, 10);
/// assert_eq!(decay.weight(Duration::zero()), 1.0);
/// assert_eq!(decay.weight(Duration::days(5)), 0.5);
/// assert_eq!(decay.weight(Duration::days(10)), 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Decay {
    kind: DecayKind,
    window: Duration,
}

impl Decay {
    /// Create a decay over a window of `window_days` days.
    pub fn new(kind: DecayKind, window_days: u32) -> Self {
        Self {
            kind,
            window: Duration::days(i64::from(window_days)),
        }
    }

    /// Weight of an edge whose event is `age` old.
    pub fn weight(&self, age: Duration) -> f64 {
        if age > self.window {
            return 0.0;
        }
        if age < Duration::zero() {
            return 1.0;
        }
        match self.kind {
            DecayKind::None => 1.0,
            DecayKind::Linear => {
                let ratio = age.num_seconds() as f64 / self.window.num_seconds() as f64;
                (1.0 - ratio).max(0.0)
            }
            DecayKind::Exponential => {
                // Half-life of a quarter window.
                let half_life = self.window.num_seconds() as f64 / 4.0;
                let halvings = age.num_seconds() as f64 / half_life;
                0.5f64.powf(halvings)
            }
        }
    }
}

/// Versioned snapshot of the bipartite change-set / file graph.
///
/// At any tick the edge set is exactly what the in-window events imply:
/// expiring change sets take their edges with them, and nodes left with
/// degree zero are pruned on the same tick.
#[derive(Debug, Clone)]
pub struct ArtifactGraph {
    graph: StableUnGraph<ArtifactNode, TouchEdge>,
    change_sets: HashMap<String, NodeIndex>,
    files: HashMap<String, NodeIndex>,
    decay: Decay,
    window_end: DateTime<Utc>,
    generation: u64,
}

impl ArtifactGraph {
    /// An empty graph at generation zero.
    pub fn empty(decay: Decay) -> Self {
        Self {
            graph: StableUnGraph::default(),
            change_sets: HashMap::new(),
            files: HashMap::new(),
            decay,
            window_end: DateTime::<Utc>::MIN_UTC,
            generation: 0,
        }
    }

    /// Derive the next snapshot from a window delta.
    ///
    /// Expiring change sets are removed first, then entering ones are
    /// added; renames and deletes inside entering change sets are applied
    /// before their touch edges. Isolated nodes are pruned either way.
    pub fn apply(&self, delta: &WindowDelta, config: &GraphConfig) -> ArtifactGraph {
        let mut next = self.clone();
        next.generation += 1;
        next.window_end = delta.window_end;

        for cs in &delta.expiring {
            next.remove_change_set(&cs.commit_hash);
        }
        for cs in &delta.entering {
            next.add_change_set(cs, config);
        }
        next
    }

    fn add_change_set(&mut self, cs: &ChangeSet, config: &GraphConfig) {
        for cc in &cs.code_changes {
            match &cc.change_type {
                ChangeType::Rename { from } => self.rename_file(from, &cc.file_path),
                ChangeType::Delete => self.delete_file(&cc.file_path),
                ChangeType::Add | ChangeType::Modify => {}
            }
        }

        let touched = cs.touched_paths();
        // Large change sets are usually refactors or bulk imports; their
        // edges would connect everyone to everything.
        if touched.is_empty() || touched.len() > config.max_files_per_change_set {
            return;
        }

        let cs_idx = *self
            .change_sets
            .entry(cs.commit_hash.clone())
            .or_insert_with(|| {
                self.graph.add_node(ArtifactNode::ChangeSet {
                    hash: cs.commit_hash.clone(),
                    author: cs.author.clone(),
                    issues: cs.issues.clone(),
                })
            });

        for path in touched {
            let file_idx = *self
                .files
                .entry(path.to_string())
                .or_insert_with(|| self.graph.add_node(ArtifactNode::File(path.to_string())));
            if self.graph.find_edge(cs_idx, file_idx).is_none() {
                self.graph.add_edge(
                    cs_idx,
                    file_idx,
                    TouchEdge {
                        timestamp: cs.timestamp,
                    },
                );
            }
        }
    }

    fn remove_change_set(&mut self, hash: &str) {
        let Some(idx) = self.change_sets.remove(hash) else {
            return;
        };
        let neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        self.graph.remove_node(idx);
        for neighbor in neighbors {
            self.remove_if_isolated(neighbor);
        }
    }

    fn rename_file(&mut self, from: &str, to: &str) {
        let Some(idx) = self.files.remove(from) else {
            return;
        };
        if self.files.contains_key(to) {
            // Target already tracked: drop the old node rather than trying
            // to merge two edge sets.
            let neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
            self.graph.remove_node(idx);
            for neighbor in neighbors {
                self.remove_if_isolated(neighbor);
            }
            return;
        }
        if let Some(node) = self.graph.node_weight_mut(idx) {
            *node = ArtifactNode::File(to.to_string());
        }
        self.files.insert(to.to_string(), idx);
    }

    fn delete_file(&mut self, path: &str) {
        let Some(idx) = self.files.remove(path) else {
            return;
        };
        let neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        self.graph.remove_node(idx);
        for neighbor in neighbors {
            self.remove_if_isolated(neighbor);
        }
    }

    fn remove_if_isolated(&mut self, idx: NodeIndex) {
        if self.graph.neighbors(idx).next().is_some() {
            return;
        }
        match self.graph.remove_node(idx) {
            Some(ArtifactNode::ChangeSet { hash, .. }) => {
                self.change_sets.remove(&hash);
            }
            Some(ArtifactNode::File(path)) => {
                self.files.remove(&path);
            }
            None => {}
        }
    }

    /// Recency weight of a touch at `timestamp` relative to the current
    /// window end.
    pub fn touch_weight(&self, timestamp: DateTime<Utc>) -> f64 {
        self.decay.weight(self.window_end - timestamp)
    }

    /// End of the window this snapshot was built for.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    /// Snapshot generation, starting at 1 for the initial window.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// File paths currently in the graph, sorted.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.files.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    /// Commit hashes currently in the graph, sorted.
    pub fn change_set_hashes(&self) -> Vec<&str> {
        let mut hashes: Vec<&str> = self.change_sets.keys().map(String::as_str).collect();
        hashes.sort_unstable();
        hashes
    }

    /// Whether `path` is a live file node.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Whether `hash` is a live change-set node.
    pub fn contains_change_set(&self, hash: &str) -> bool {
        self.change_sets.contains_key(hash)
    }

    /// Number of nodes (change sets + files).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of touch edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Authors and touch timestamps of the change sets touching `path`.
    ///
    /// Returned in deterministic (author, timestamp) order.
    pub fn touches_on(&self, path: &str) -> Vec<(&str, DateTime<Utc>)> {
        let Some(&file_idx) = self.files.get(path) else {
            return Vec::new();
        };
        let mut touches = Vec::new();
        for neighbor in self.graph.neighbors(file_idx) {
            let Some(ArtifactNode::ChangeSet { author, .. }) = self.graph.node_weight(neighbor)
            else {
                continue;
            };
            let Some(edge) = self.graph.find_edge(file_idx, neighbor) else {
                continue;
            };
            if let Some(touch) = self.graph.edge_weight(edge) {
                touches.push((author.as_str(), touch.timestamp));
            }
        }
        touches.sort_unstable_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));
        touches
    }

    /// Issue id → (author, change-set timestamp) pairs for all in-window
    /// change sets that link an issue.
    pub fn issue_links(&self) -> BTreeMap<&str, Vec<(&str, DateTime<Utc>)>> {
        let mut links: BTreeMap<&str, Vec<(&str, DateTime<Utc>)>> = BTreeMap::new();
        let mut indices: Vec<NodeIndex> = self.change_sets.values().copied().collect();
        indices.sort_unstable();
        for idx in indices {
            let Some(ArtifactNode::ChangeSet { author, issues, .. }) = self.graph.node_weight(idx)
            else {
                continue;
            };
            let timestamp = self
                .graph
                .edges(idx)
                .map(|edge| edge.weight().timestamp)
                .next();
            let Some(timestamp) = timestamp else {
                continue;
            };
            for issue in issues {
                links
                    .entry(issue.as_str())
                    .or_default()
                    .push((author.as_str(), timestamp));
            }
        }
        for authors in links.values_mut() {
            authors.sort_unstable_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));
        }
        links
    }
}
