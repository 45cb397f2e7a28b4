//! JSONL score checkpointing.
//!
//! One line per developer score, flushed after every tick, so a killed
//! run leaves a usable file behind and a resumed run can pick up at the
//! first window it never finished.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use keydev_core::{DeveloperScore, KeydevError, Result};

/// Append-only JSONL sink for per-tick developer scores.
pub struct Checkpoint {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Checkpoint {
    /// Open a checkpoint file for writing.
    ///
    /// With `resume` set and an existing file at `path`, the window end
    /// of the last complete tick is returned; the caller skips every tick
    /// at or before it. A run killed mid-write can leave the file torn in
    /// two ways, and both are recovered here: a final line cut short is
    /// dropped, and the records of the most recent window are discarded
    /// wholesale, since the batch for that window may have been only
    /// partially flushed. That window is re-scored on resume.
    ///
    /// Without `resume` the file is truncated.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::Io`] if the file cannot be opened or
    /// rewritten.
    pub fn open(path: &Path, resume: bool) -> Result<(Self, Option<DateTime<Utc>>)> {
        let kept = if resume && path.exists() {
            let scores = read_scores_lenient(path)?;
            scores.last().map(|score| score.window_end).map(|last| {
                scores
                    .into_iter()
                    .filter(|score| score.window_end < last)
                    .collect::<Vec<_>>()
            })
        } else {
            None
        };

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut checkpoint = Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        };

        let mut resume_from = None;
        if let Some(complete) = kept {
            checkpoint.append_batch(&complete)?;
            resume_from = complete.last().map(|score| score.window_end);
            if let Some(window_end) = resume_from {
                info!(path = %path.display(), %window_end, "resuming from checkpoint");
            }
        }

        Ok((checkpoint, resume_from))
    }

    /// Append one tick's scores and flush them to disk.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::Io`] on write failure.
    pub fn append_batch(&mut self, scores: &[DeveloperScore]) -> Result<()> {
        for score in scores {
            serde_json::to_writer(&mut self.writer, score)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Path this checkpoint writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Window end of the last tick with any record in a checkpoint file.
///
/// Tolerates a torn final line the same way resume does; the returned
/// window may be incomplete.
pub fn last_window_end(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let scores = read_scores_lenient(path)?;
    Ok(scores.last().map(|score| score.window_end))
}

/// Read every score line from a checkpoint file.
///
/// # Errors
///
/// Returns [`KeydevError::FileNotFound`] if `path` does not exist and
/// [`KeydevError::Serialization`] on a malformed line.
pub fn read_scores(path: &Path) -> Result<Vec<DeveloperScore>> {
    if !path.exists() {
        return Err(KeydevError::FileNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut scores = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        scores.push(serde_json::from_str(&line)?);
    }
    Ok(scores)
}

/// Read the parseable prefix of a checkpoint file.
///
/// An interrupted write leaves at most one cut-short line at the end of
/// the file; parsing stops there and the remainder is discarded.
fn read_scores_lenient(path: &Path) -> Result<Vec<DeveloperScore>> {
    if !path.exists() {
        return Err(KeydevError::FileNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut scores = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(score) => scores.push(score),
            Err(err) => {
                warn!(path = %path.display(), %err, "dropping torn checkpoint line");
                break;
            }
        }
    }
    Ok(scores)
}
