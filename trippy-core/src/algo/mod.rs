//! Numerical building blocks shared by the KPI queries

pub mod adjacency;
pub mod statistics;
pub mod time_bins;

pub use adjacency::{AdjacentLeg, LegOrder, adjacent_legs};
pub use statistics::{DescriptiveStats, describe, describe_groups};
pub use time_bins::TimeBinning;
