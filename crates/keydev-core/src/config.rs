use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KeydevError;

/// Top-level configuration loaded from `keydev.toml`.
///
/// Every knob is threaded explicitly through the components that use it;
/// there is no process-wide state.
///
/// # Examples
///
/// ```
/// use keydev_core::KeydevConfig;
///
/// let config = KeydevConfig::default();
/// assert_eq!(config.window.window_days, 365);
/// assert_eq!(config.window.step_days, 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeydevConfig {
    /// Project identifier used to label output files and logs.
    #[serde(default)]
    pub project: Option<String>,
    /// Sliding window settings.
    #[serde(default)]
    pub window: WindowConfig,
    /// Artifact / developer graph settings.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Metric engine settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// What to do with a malformed change-set record.
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

impl KeydevConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::Io`] if the file cannot be read, or
    /// [`KeydevError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use keydev_core::KeydevConfig;
    /// use std::path::Path;
    ///
    /// let config = KeydevConfig::from_file(Path::new("keydev.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, KeydevError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use keydev_core::KeydevConfig;
    ///
    /// let toml = r#"
    /// [window]
    /// window_days = 90
    /// "#;
    /// let config = KeydevConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.window.window_days, 90);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, KeydevError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Sliding window configuration.
///
/// # Examples
///
/// ```
/// use keydev_core::WindowConfig;
///
/// let config = WindowConfig::default();
/// assert_eq!(config.window_days, 365);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window size W in days (default: 365).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Step size in days the window advances per tick (default: 1).
    #[serde(default = "default_step_days")]
    pub step_days: u32,
}

fn default_window_days() -> u32 {
    365
}

fn default_step_days() -> u32 {
    1
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            step_days: default_step_days(),
        }
    }
}

/// Graph construction configuration.
///
/// # Examples
///
/// ```
/// use keydev_core::{DecayKind, GraphConfig};
///
/// let config = GraphConfig::default();
/// assert_eq!(config.decay, DecayKind::Linear);
/// assert_eq!(config.max_files_per_change_set, 50);
/// assert!(config.include_issue_links);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// How edge weight decays with age inside the window (default: linear).
    #[serde(default)]
    pub decay: DecayKind,
    /// Skip change sets adding/modifying more files than this (default: 50).
    ///
    /// Large change sets are usually refactors or imports and would connect
    /// everyone to everything.
    #[serde(default = "default_max_files_per_change_set")]
    pub max_files_per_change_set: usize,
    /// Also connect developers who worked on the same issue (default: true).
    #[serde(default = "default_include_issue_links")]
    pub include_issue_links: bool,
    /// Developer-graph edges below this weight are dropped (default: 0.0).
    #[serde(default)]
    pub min_edge_weight: f64,
}

fn default_max_files_per_change_set() -> usize {
    50
}

fn default_include_issue_links() -> bool {
    true
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            decay: DecayKind::default(),
            max_files_per_change_set: default_max_files_per_change_set(),
            include_issue_links: default_include_issue_links(),
            min_edge_weight: 0.0,
        }
    }
}

/// Edge decay strategy.
///
/// All strategies are monotonically non-increasing with age and reach
/// zero once an event leaves the window.
///
/// # Examples
///
/// ```
/// use keydev_core::DecayKind;
///
/// assert_eq!(DecayKind::default(), DecayKind::Linear);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayKind {
    /// Binary presence: weight 1 inside the window, 0 outside.
    None,
    /// Weight falls linearly from 1 (fresh) to 0 (window exit).
    #[default]
    Linear,
    /// Half-life decay with half-life W/4, clamped to 0 at window exit.
    Exponential,
}

/// Metric engine configuration.
///
/// # Examples
///
/// ```
/// use keydev_core::MetricsConfig;
///
/// let config = MetricsConfig::default();
/// assert_eq!(config.area_depth, 2);
/// assert!(config.score_threshold > 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Scores below this threshold are excluded from rankings
    /// (default: 5e-6).
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    /// Number of leading path components that define a file area
    /// (default: 2).
    #[serde(default = "default_area_depth")]
    pub area_depth: usize,
}

fn default_score_threshold() -> f64 {
    0.000005
}

fn default_area_depth() -> usize {
    2
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            area_depth: default_area_depth(),
        }
    }
}

/// Policy for malformed change-set records.
///
/// # Examples
///
/// ```
/// use keydev_core::MalformedPolicy;
///
/// assert_eq!(MalformedPolicy::default(), MalformedPolicy::Skip);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log a warning and drop the record.
    #[default]
    Skip,
    /// Abort the dataset run.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = KeydevConfig::default();
        assert_eq!(config.window.window_days, 365);
        assert_eq!(config.window.step_days, 1);
        assert_eq!(config.graph.decay, DecayKind::Linear);
        assert_eq!(config.graph.max_files_per_change_set, 50);
        assert!(config.graph.include_issue_links);
        assert_eq!(config.graph.min_edge_weight, 0.0);
        assert_eq!(config.metrics.score_threshold, 0.000005);
        assert_eq!(config.metrics.area_depth, 2);
        assert_eq!(config.on_malformed, MalformedPolicy::Skip);
        assert!(config.project.is_none());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[window]
window_days = 30
step_days = 7
"#;
        let config = KeydevConfig::from_toml(toml).unwrap();
        assert_eq!(config.window.window_days, 30);
        assert_eq!(config.window.step_days, 7);
        // Untouched sections keep their defaults
        assert_eq!(config.graph.max_files_per_change_set, 50);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
project = "hive"
on_malformed = "abort"

[window]
window_days = 180

[graph]
decay = "exponential"
max_files_per_change_set = 25
include_issue_links = false
min_edge_weight = 0.01

[metrics]
score_threshold = 0.001
area_depth = 3
"#;
        let config = KeydevConfig::from_toml(toml).unwrap();
        assert_eq!(config.project.as_deref(), Some("hive"));
        assert_eq!(config.on_malformed, MalformedPolicy::Abort);
        assert_eq!(config.window.window_days, 180);
        assert_eq!(config.graph.decay, DecayKind::Exponential);
        assert_eq!(config.graph.max_files_per_change_set, 25);
        assert!(!config.graph.include_issue_links);
        assert_eq!(config.graph.min_edge_weight, 0.01);
        assert_eq!(config.metrics.score_threshold, 0.001);
        assert_eq!(config.metrics.area_depth, 3);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = KeydevConfig::from_toml("").unwrap();
        assert_eq!(config.window.window_days, 365);
        assert_eq!(config.graph.decay, DecayKind::Linear);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = KeydevConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn decay_kind_none_parses() {
        let toml = r#"
[graph]
decay = "none"
"#;
        let config = KeydevConfig::from_toml(toml).unwrap();
        assert_eq!(config.graph.decay, DecayKind::None);
    }
}
