//! Developer role metrics computed from a projected developer graph.
//!
//! Scores three roles per window tick: jack (breadth across file areas),
//! maven (exclusive ownership of areas), and connector (weighted
//! betweenness over the collaboration graph).

pub mod areas;
pub mod betweenness;
pub mod scores;

pub use areas::area_of;
pub use betweenness::betweenness;
pub use scores::{compute_scores, ranked, Metric};
