//! Change-set log loading and validation.
//!
//! Reads a pre-extracted JSON event log (`{"change_sets": [...]}`) into
//! memory once, validates each record, and enforces chronological order.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use keydev_core::{ChangeSet, ChangeType, CodeChange, KeydevError, MalformedPolicy};

/// Timestamp format used by the extraction stage.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct RawLog {
    #[serde(default)]
    change_sets: Vec<RawChangeSet>,
}

#[derive(Debug, Deserialize)]
struct RawChangeSet {
    #[serde(default)]
    commit_hash: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    code_changes: Vec<RawCodeChange>,
}

#[derive(Debug, Deserialize)]
struct RawCodeChange {
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    change_type: String,
    #[serde(default)]
    old_file_path: Option<String>,
}

/// A validated, chronologically ordered change-set log.
///
/// # Examples
///
/// ```
/// use keydev_core::MalformedPolicy;
/// use keydev_graph::Dataset;
///
/// let json = r#"{"change_sets": [{
///     "commit_hash": "c1",
///     "author": "alice",
///     "date": "2019-01-01T12:00:00Z",
///     "issues": [],
///     "code_changes": [{"file_path": "a.java", "change_type": "ADD"}]
/// }]}"#;
/// let dataset = Dataset::from_json_str(json, MalformedPolicy::Skip).unwrap();
/// assert_eq!(dataset.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    change_sets: Vec<ChangeSet>,
}

impl Dataset {
    /// Load and validate a change-set log from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::FileNotFound`] if `path` does not exist,
    /// [`KeydevError::Serialization`] if the file is not valid JSON,
    /// [`KeydevError::DataFormat`] for a malformed record when the policy
    /// is [`MalformedPolicy::Abort`], and [`KeydevError::OutOfOrder`] if
    /// the log violates chronological order.
    pub fn load(path: &Path, policy: MalformedPolicy) -> Result<Self, KeydevError> {
        if !path.exists() {
            return Err(KeydevError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, policy)
    }

    /// Parse and validate a change-set log from a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::load`], minus the filesystem variants.
    pub fn from_json_str(content: &str, policy: MalformedPolicy) -> Result<Self, KeydevError> {
        let raw: RawLog = serde_json::from_str(content)?;

        let mut change_sets = Vec::with_capacity(raw.change_sets.len());
        for (position, raw_cs) in raw.change_sets.into_iter().enumerate() {
            match validate_change_set(raw_cs, position) {
                Ok(cs) => change_sets.push(cs),
                Err(err) => match policy {
                    MalformedPolicy::Skip => warn!(%err, "skipping malformed change set"),
                    MalformedPolicy::Abort => return Err(err),
                },
            }
        }

        // Ordering is checked before the tie-break sort so that a log with
        // genuinely decreasing timestamps is rejected, not silently fixed.
        for pair in change_sets.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(KeydevError::OutOfOrder {
                    record: pair[1].commit_hash.clone(),
                    timestamp: pair[1].timestamp,
                    previous: pair[0].timestamp,
                });
            }
        }
        change_sets.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.commit_hash.cmp(&b.commit_hash))
        });

        Ok(Self { change_sets })
    }

    /// Change sets in chronological order.
    pub fn change_sets(&self) -> &[ChangeSet] {
        &self.change_sets
    }

    /// Consume the dataset, yielding its change sets.
    pub fn into_change_sets(self) -> Vec<ChangeSet> {
        self.change_sets
    }

    /// Number of valid change sets.
    pub fn len(&self) -> usize {
        self.change_sets.len()
    }

    /// Whether the log contains no valid change sets.
    pub fn is_empty(&self) -> bool {
        self.change_sets.is_empty()
    }

    /// Timestamp of the earliest change set.
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.change_sets.first().map(|cs| cs.timestamp)
    }

    /// Timestamp of the latest change set.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.change_sets.last().map(|cs| cs.timestamp)
    }
}

fn validate_change_set(raw: RawChangeSet, position: usize) -> Result<ChangeSet, KeydevError> {
    let record = if raw.commit_hash.is_empty() {
        format!("#{position}")
    } else {
        raw.commit_hash.clone()
    };

    if raw.author.trim().is_empty() {
        return Err(KeydevError::DataFormat {
            record,
            reason: "missing author".into(),
        });
    }

    let timestamp = NaiveDateTime::parse_from_str(&raw.date, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| KeydevError::DataFormat {
            record: record.clone(),
            reason: if raw.date.is_empty() {
                "missing date".into()
            } else {
                format!("unparsable date '{}'", raw.date)
            },
        })?;

    if raw.code_changes.is_empty() {
        return Err(KeydevError::DataFormat {
            record,
            reason: "empty file list".into(),
        });
    }

    let mut code_changes = Vec::with_capacity(raw.code_changes.len());
    for raw_cc in raw.code_changes {
        if raw_cc.file_path.is_empty() {
            return Err(KeydevError::DataFormat {
                record: record.clone(),
                reason: "code change with empty file path".into(),
            });
        }
        let change_type = match raw_cc.change_type.as_str() {
            "ADD" => ChangeType::Add,
            "MODIFY" => ChangeType::Modify,
            "DELETE" => ChangeType::Delete,
            "RENAME" => match raw_cc.old_file_path {
                Some(from) if !from.is_empty() => ChangeType::Rename { from },
                _ => {
                    return Err(KeydevError::DataFormat {
                        record: record.clone(),
                        reason: format!("rename of '{}' without old path", raw_cc.file_path),
                    })
                }
            },
            other => {
                return Err(KeydevError::DataFormat {
                    record: record.clone(),
                    reason: format!("unknown change type '{other}'"),
                })
            }
        };
        code_changes.push(CodeChange {
            file_path: raw_cc.file_path,
            change_type,
        });
    }

    Ok(ChangeSet {
        commit_hash: raw.commit_hash,
        author: raw.author.to_lowercase(),
        timestamp,
        issues: raw.issues,
        code_changes,
    })
}
