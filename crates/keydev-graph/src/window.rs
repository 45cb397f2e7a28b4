//! Sliding time window over a chronological change-set log.
//!
//! The window covers `window_days` whole days and advances `step_days`
//! per tick. Each tick yields the change sets entering scope and the
//! change sets expiring out of it; expiry is a FIFO walk over the
//! pre-sorted log, so a tick costs O(entering + expiring).

use chrono::{DateTime, Duration, NaiveTime, Utc};

use keydev_core::{ChangeSet, KeydevError, WindowConfig};

use crate::dataset::Dataset;

/// The change sets crossing the window boundary on one tick.
///
/// A tick with no entering and no expiring change sets is still a valid
/// delta: downstream graph pruning runs on every tick.
#[derive(Debug, Clone)]
pub struct WindowDelta {
    /// End of the window after this tick (inclusive).
    pub window_end: DateTime<Utc>,
    /// Change sets newly in scope, in chronological order.
    pub entering: Vec<ChangeSet>,
    /// Change sets that fell out of scope, in chronological order.
    pub expiring: Vec<ChangeSet>,
}

/// Sliding window manager.
///
/// The first [`advance`](SlidingWindow::advance) yields the initial window
/// (everything within `window_days` of the first event); each later call
/// moves the window forward one step until the log is exhausted.
///
/// # Examples
///
/// ```
/// use keydev_core::{MalformedPolicy, WindowConfig};
/// use keydev_graph::{Dataset, SlidingWindow};
///
/// let json = r#"{"change_sets": [
///     {"commit_hash": "c1", "author": "a", "date": "2019-01-01T10:00:00Z",
///      "issues": [], "code_changes": [{"file_path": "f1", "change_type": "ADD"}]},
///     {"commit_hash": "c2", "author": "b", "date": "2019-01-04T10:00:00Z",
///      "issues": [], "code_changes": [{"file_path": "f2", "change_type": "ADD"}]}
/// ]}"#;
/// let dataset = Dataset::from_json_str(json, MalformedPolicy::Skip).unwrap();
/// let config = WindowConfig { window_days: 3, step_days: 1 };
/// let mut window = SlidingWindow::new(dataset, &config).unwrap();
///
/// let first = window.advance().unwrap();
/// assert_eq!(first.entering.len(), 1); // c2 is outside the initial window
/// ```
#[derive(Debug)]
pub struct SlidingWindow {
    change_sets: Vec<ChangeSet>,
    window: Duration,
    step: Duration,
    /// Current window end; only meaningful once `started`.
    end: DateTime<Utc>,
    /// Window end of the last possible tick.
    max_end: DateTime<Utc>,
    next_in: usize,
    next_out: usize,
    started: bool,
}

impl SlidingWindow {
    /// Create a window over a non-empty dataset.
    ///
    /// # Errors
    ///
    /// Returns [`KeydevError::Config`] if the dataset is empty or the
    /// window/step sizes are zero, and [`KeydevError::OutOfOrder`] if the
    /// change sets are not chronologically sorted.
    pub fn new(dataset: Dataset, config: &WindowConfig) -> Result<Self, KeydevError> {
        if config.window_days == 0 {
            return Err(KeydevError::Config("window_days must be positive".into()));
        }
        if config.step_days == 0 {
            return Err(KeydevError::Config("step_days must be positive".into()));
        }
        let (Some(first), Some(last)) = (dataset.first_timestamp(), dataset.last_timestamp())
        else {
            return Err(KeydevError::Config(
                "dataset contains no change sets to window over".into(),
            ));
        };

        let change_sets = dataset.into_change_sets();
        for pair in change_sets.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(KeydevError::OutOfOrder {
                    record: pair[1].commit_hash.clone(),
                    timestamp: pair[1].timestamp,
                    previous: pair[0].timestamp,
                });
            }
        }

        let window = Duration::days(i64::from(config.window_days));
        // The initial window ends at the last instant of the day
        // `window_days - 1` days after the first event's day.
        let initial_end = end_of_day(first) + Duration::days(i64::from(config.window_days) - 1);
        let max_end = end_of_day(last).max(initial_end);

        Ok(Self {
            change_sets,
            window,
            step: Duration::days(i64::from(config.step_days)),
            end: initial_end,
            max_end,
            next_in: 0,
            next_out: 0,
            started: false,
        })
    }

    /// End of the current window (inclusive).
    pub fn window_end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Total number of ticks this window will produce, counting the
    /// initial position.
    pub fn num_ticks(&self) -> u64 {
        let remaining = (self.max_end - self.end).num_days();
        let step = self.step.num_days();
        if remaining <= 0 {
            1
        } else {
            // The last tick is clamped to the end of the log, so a partial
            // step still counts.
            1 + ((remaining + step - 1) / step) as u64
        }
    }

    /// Move the window forward one tick.
    ///
    /// Returns `None` once the window has reached the end of the log; the
    /// tick sequence is the pipeline's only state machine, and `None` is
    /// its terminal state.
    pub fn advance(&mut self) -> Option<WindowDelta> {
        if self.started {
            if self.end >= self.max_end {
                return None;
            }
            // Clamp the final tick to the end of the log.
            self.end = (self.end + self.step).min(self.max_end);
        } else {
            self.started = true;
        }

        let start = self.end - self.window;

        let mut entering = Vec::new();
        while self.next_in < self.change_sets.len()
            && self.change_sets[self.next_in].timestamp <= self.end
        {
            entering.push(self.change_sets[self.next_in].clone());
            self.next_in += 1;
        }

        let mut expiring = Vec::new();
        while self.next_out < self.change_sets.len()
            && self.change_sets[self.next_out].timestamp <= start
        {
            expiring.push(self.change_sets[self.next_out].clone());
            self.next_out += 1;
        }

        Some(WindowDelta {
            window_end: self.end,
            entering,
            expiring,
        })
    }
}

/// Last representable instant of the day containing `ts`.
///
/// Aligning window ends to day boundaries keeps every event of a day on
/// the same side of the boundary regardless of its time of day.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_time(NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN))
        .and_utc()
}
