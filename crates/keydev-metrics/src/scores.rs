//! Per-developer role scores for one window tick.
//!
//! Three complementary views of the same developer graph: jack measures
//! breadth across areas, maven measures exclusive ownership of areas,
//! connector measures brokerage between otherwise-distant developers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use keydev_core::{DeveloperScore, MetricsConfig};
use keydev_graph::DeveloperGraph;

use crate::areas::area_of;
use crate::betweenness::betweenness;

/// Which score to rank developers by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Jack,
    Maven,
    Connector,
}

/// Compute jack, maven, and connector scores for every developer active
/// in the window ending at `window_end`.
///
/// An empty developer graph yields an empty vector rather than an error;
/// windows with no activity are a normal part of a sliding run. Results
/// come back sorted by developer id.
pub fn compute_scores(
    dev_graph: &DeveloperGraph,
    config: &MetricsConfig,
    window_end: DateTime<Utc>,
) -> Vec<DeveloperScore> {
    if dev_graph.is_empty() {
        debug!(%window_end, "no active developers in window");
        return Vec::new();
    }

    // developer → area → summed contribution weight
    let mut area_weights: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
    for dev in dev_graph.developers() {
        let per_area = area_weights.entry(dev).or_default();
        if let Some(files) = dev_graph.files_of(dev) {
            for (path, weight) in files {
                *per_area.entry(area_of(path, config.area_depth)).or_default() += weight;
            }
        }
    }

    // area → total weight across all developers, for dominance shares
    let mut area_totals: BTreeMap<&str, f64> = BTreeMap::new();
    for per_area in area_weights.values() {
        for (area, weight) in per_area {
            *area_totals.entry(area.as_str()).or_default() += weight;
        }
    }
    let active_areas = area_totals.len();

    // area → (top share, developer holding it); ties go to the
    // lexicographically smaller id, matching BTreeMap iteration order.
    let mut dominant: BTreeMap<&str, (f64, &str)> = BTreeMap::new();
    for (dev, per_area) in &area_weights {
        for (area, weight) in per_area {
            let total = area_totals[area.as_str()];
            if total <= 0.0 {
                continue;
            }
            let share = weight / total;
            let entry = dominant.entry(area.as_str()).or_insert((share, *dev));
            if share > entry.0 {
                *entry = (share, *dev);
            }
        }
    }

    let connector_scores = betweenness(dev_graph);

    let mut scores = Vec::with_capacity(area_weights.len());
    for (dev, per_area) in &area_weights {
        let jack = if active_areas == 0 {
            0.0
        } else {
            per_area.len() as f64 / active_areas as f64
        };

        let dominated_share: f64 = per_area
            .keys()
            .filter_map(|area| {
                let &(share, holder) = dominant.get(area.as_str())?;
                (holder == *dev).then_some(share)
            })
            .sum();
        let maven = if active_areas == 0 {
            0.0
        } else {
            dominated_share / active_areas as f64
        };

        let connector = connector_scores.get(*dev).copied().unwrap_or(0.0);

        scores.push(DeveloperScore {
            window_end,
            developer: (*dev).to_string(),
            jack,
            maven,
            connector,
        });
    }
    scores
}

/// Developers ranked by one metric, strongest first.
///
/// Scores below `threshold` are dropped; a score exactly at the
/// threshold survives. Equal scores order by developer id, so rankings
/// are stable across runs.
pub fn ranked(scores: &[DeveloperScore], metric: Metric, threshold: f64) -> Vec<(String, f64)> {
    let mut ranking: Vec<(String, f64)> = scores
        .iter()
        .map(|s| {
            let value = match metric {
                Metric::Jack => s.jack,
                Metric::Maven => s.maven,
                Metric::Connector => s.connector,
            };
            (s.developer.clone(), value)
        })
        .filter(|(_, value)| *value >= threshold)
        .collect();
    ranking.sort_by(|(dev_a, a), (dev_b, b)| {
        b.partial_cmp(a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| dev_a.cmp(dev_b))
    });
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
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

    fn window_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 1, 1, 23, 59, 59).unwrap()
    }

    fn project(change_sets: Vec<ChangeSet>) -> DeveloperGraph {
        let delta = WindowDelta {
            window_end: window_end(),
            entering: change_sets,
            expiring: vec![],
        };
        let artifact = ArtifactGraph::empty(Decay::new(DecayKind::None, 30))
            .apply(&delta, &GraphConfig::default());
        DeveloperGraph::project(&artifact, &GraphConfig::default())
    }

    fn score_of<'a>(scores: &'a [DeveloperScore], dev: &str) -> &'a DeveloperScore {
        scores.iter().find(|s| s.developer == dev).unwrap()
    }

    #[test]
    fn empty_graph_yields_no_scores() {
        let devs = project(vec![]);
        assert!(compute_scores(&devs, &MetricsConfig::default(), window_end()).is_empty());
    }

    #[test]
    fn jack_rewards_breadth_across_areas() {
        // generalist touches all three areas, specialist only one
        let devs = project(vec![
            make_change_set(
                "c1",
                "generalist",
                &["core/a/X.java", "ui/b/Y.java", "db/c/Z.java"],
            ),
            make_change_set("c2", "specialist", &["core/a/W.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        let generalist = score_of(&scores, "generalist");
        let specialist = score_of(&scores, "specialist");
        assert!((generalist.jack - 1.0).abs() < 1e-9);
        assert!((specialist.jack - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn maven_rewards_exclusive_ownership() {
        // owner holds db alone; core is split evenly, so the tie goes to
        // the lexicographically smaller id.
        let devs = project(vec![
            make_change_set("c1", "owner", &["db/store/Engine.java"]),
            make_change_set("c2", "owner", &["core/a/X.java"]),
            make_change_set("c3", "rival", &["core/a/X.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        let owner = score_of(&scores, "owner");
        let rival = score_of(&scores, "rival");
        // owner dominates db (share 1.0) and wins the core tie (share 0.5)
        assert!((owner.maven - 1.5 / 2.0).abs() < 1e-9);
        assert_eq!(rival.maven, 0.0);
    }

    #[test]
    fn connector_comes_from_betweenness() {
        let devs = project(vec![
            make_change_set("c1", "alice", &["x/a/F.java"]),
            make_change_set("c2", "bridge", &["x/a/F.java", "y/b/G.java"]),
            make_change_set("c3", "bob", &["y/b/G.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        assert!(score_of(&scores, "bridge").connector > 0.0);
        assert_eq!(score_of(&scores, "alice").connector, 0.0);
    }

    #[test]
    fn ranked_sorts_descending_and_applies_threshold() {
        let devs = project(vec![
            make_change_set("c1", "broad", &["a/x/F.java", "b/y/G.java"]),
            make_change_set("c2", "narrow", &["a/x/F.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        let ranking = ranked(&scores, Metric::Jack, 0.0);
        assert_eq!(ranking[0].0, "broad");
        assert_eq!(ranking.len(), 2);

        // Threshold above narrow's score of 0.5 leaves only broad
        let filtered = ranked(&scores, Metric::Jack, 0.6);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, "broad");
    }

    #[test]
    fn ranked_keeps_scores_exactly_at_the_threshold() {
        let devs = project(vec![
            make_change_set("c1", "broad", &["a/x/F.java", "b/y/G.java"]),
            make_change_set("c2", "narrow", &["a/x/F.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        // narrow's jack is exactly 0.5; the threshold is inclusive
        let ranking = ranked(&scores, Metric::Jack, 0.5);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[1].0, "narrow");
        assert!((ranking[1].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ranked_breaks_score_ties_by_developer_id() {
        let devs = project(vec![
            make_change_set("c1", "zed", &["a/x/F.java"]),
            make_change_set("c2", "amy", &["b/y/G.java"]),
        ]);
        let scores = compute_scores(&devs, &MetricsConfig::default(), window_end());

        let ranking = ranked(&scores, Metric::Jack, 0.0);
        assert_eq!(ranking[0].0, "amy");
        assert_eq!(ranking[1].0, "zed");
    }
}
