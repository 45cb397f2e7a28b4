//! Sliding-window graph construction over version-control history.
//!
//! Loads a pre-extracted change-set log, slides a time window across it,
//! and maintains a bipartite change-set/file artifact graph plus the
//! developer graph projected from it. Each tick produces a fresh,
//! versioned artifact snapshot; the developer graph is always a pure
//! function of the snapshot it was projected from.

pub mod artifact;
pub mod dataset;
pub mod developer;
pub mod window;

pub use artifact::{ArtifactGraph, ArtifactNode, Decay, TouchEdge};
pub use dataset::Dataset;
pub use developer::DeveloperGraph;
pub use window::{end_of_day, SlidingWindow, WindowDelta};
