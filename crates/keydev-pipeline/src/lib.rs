//! Sliding-window scoring pipeline with JSONL checkpointing.
//!
//! Ties the graph and metrics crates together: one [`run`] call takes a
//! change-set log from disk to a per-tick developer score file, and can
//! resume a partially finished run from its own output.

pub mod checkpoint;
pub mod pipeline;

pub use checkpoint::{last_window_end, read_scores, Checkpoint};
pub use pipeline::{run, PipelineReport};
