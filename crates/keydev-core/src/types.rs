use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of change a change set applies to a single file.
///
/// # Examples
///
/// ```
/// use keydev_core::ChangeType;
///
/// let change = ChangeType::Rename { from: "old/Main.java".into() };
/// assert_ne!(change, ChangeType::Modify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeType {
    /// New file.
    Add,
    /// Existing file modified.
    Modify,
    /// File removed from the project.
    Delete,
    /// File moved from another path.
    Rename {
        /// Original path before the rename.
        from: String,
    },
}

/// A single file change within a change set.
///
/// # Examples
///
/// ```
/// use keydev_core::{ChangeType, CodeChange};
///
/// let change = CodeChange {
///     file_path: "core/src/query/Parser.java".into(),
///     change_type: ChangeType::Modify,
/// };
/// assert_eq!(change.change_type, ChangeType::Modify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChange {
    /// File path relative to the repository root.
    pub file_path: String,
    /// Type of change.
    pub change_type: ChangeType,
}

/// An atomic set of file modifications by one author at one point in time.
///
/// Immutable once read from the event log. Change sets are ordered by
/// timestamp; ties are broken by commit hash for determinism.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use keydev_core::{ChangeSet, ChangeType, CodeChange};
///
/// let cs = ChangeSet {
///     commit_hash: "a1b2c3d4".into(),
///     author: "alice".into(),
///     timestamp: Utc.with_ymd_and_hms(2019, 6, 1, 14, 30, 0).unwrap(),
///     issues: vec!["PIG-1234".into()],
///     code_changes: vec![CodeChange {
///         file_path: "src/Parser.java".into(),
///         change_type: ChangeType::Modify,
///     }],
/// };
/// assert_eq!(cs.author, "alice");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Commit hash identifying the change set.
    pub commit_hash: String,
    /// Author id (normalized during extraction).
    pub author: String,
    /// When the change set was committed.
    pub timestamp: DateTime<Utc>,
    /// Issue ids linked to this change set, if any.
    pub issues: Vec<String>,
    /// File changes in this change set. Never empty.
    pub code_changes: Vec<CodeChange>,
}

impl ChangeSet {
    /// Paths added or modified by this change set.
    ///
    /// Deletes are excluded, and so are renames: a rename relabels an
    /// existing node rather than recording new work on the file.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use keydev_core::{ChangeSet, ChangeType, CodeChange};
    ///
    /// let cs = ChangeSet {
    ///     commit_hash: "a1".into(),
    ///     author: "alice".into(),
    ///     timestamp: Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap(),
    ///     issues: vec![],
    ///     code_changes: vec![
    ///         CodeChange { file_path: "a.java".into(), change_type: ChangeType::Add },
    ///         CodeChange { file_path: "b.java".into(), change_type: ChangeType::Delete },
    ///     ],
    /// };
    /// assert_eq!(cs.touched_paths(), vec!["a.java"]);
    /// ```
    pub fn touched_paths(&self) -> Vec<&str> {
        self.code_changes
            .iter()
            .filter(|cc| matches!(cc.change_type, ChangeType::Add | ChangeType::Modify))
            .map(|cc| cc.file_path.as_str())
            .collect()
    }
}

/// One developer's scores for one window position.
///
/// Append-only output of the metric engine; one record per active
/// developer per tick, serialized as a JSON line.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use keydev_core::DeveloperScore;
///
/// let score = DeveloperScore {
///     window_end: Utc.with_ymd_and_hms(2019, 6, 1, 23, 59, 59).unwrap(),
///     developer: "alice".into(),
///     jack: 0.4,
///     maven: 0.1,
///     connector: 0.0,
/// };
/// let json = serde_json::to_string(&score).unwrap();
/// assert!(json.contains("\"windowEnd\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperScore {
    /// End of the window this record was computed for.
    pub window_end: DateTime<Utc>,
    /// Developer id.
    pub developer: String,
    /// Breadth: share of active file areas the developer reaches.
    pub jack: f64,
    /// Depth: aggregated exclusivity over the areas the developer dominates.
    pub maven: f64,
    /// Bridge position: normalized betweenness in the developer graph.
    pub connector: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_score() -> DeveloperScore {
        DeveloperScore {
            window_end: Utc.with_ymd_and_hms(2019, 9, 12, 23, 59, 59).unwrap(),
            developer: "d1".into(),
            jack: 0.25,
            maven: 0.5,
            connector: 0.125,
        }
    }

    #[test]
    fn developer_score_round_trips_through_json() {
        let score = make_score();
        let json = serde_json::to_string(&score).unwrap();
        let back: DeveloperScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, score);
    }

    #[test]
    fn developer_score_uses_camel_case_keys() {
        let json = serde_json::to_string(&make_score()).unwrap();
        assert!(json.contains("\"windowEnd\""));
        assert!(json.contains("\"developer\""));
        assert!(!json.contains("window_end"));
    }

    #[test]
    fn touched_paths_skips_deletes_and_renames() {
        let cs = ChangeSet {
            commit_hash: "c1".into(),
            author: "d1".into(),
            timestamp: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            issues: vec![],
            code_changes: vec![
                CodeChange {
                    file_path: "kept.java".into(),
                    change_type: ChangeType::Rename {
                        from: "moved.java".into(),
                    },
                },
                CodeChange {
                    file_path: "gone.java".into(),
                    change_type: ChangeType::Delete,
                },
                CodeChange {
                    file_path: "new.java".into(),
                    change_type: ChangeType::Add,
                },
            ],
        };
        assert_eq!(cs.touched_paths(), vec!["new.java"]);
    }
}
