//! Core of trippy: a data model for transport-simulation output
//! (trips, legs, links and network tables) and the KPI computations
//! performed on top of it.

pub mod algo;
pub mod comparison;
pub mod drt;
mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod results;
pub mod scenario;

pub use comparison::Comparison;
pub use drt::DrtScenario;
pub use error::Error;
pub use model::{
    Column, ColumnSpec, ColumnType, Crs, OperatingZone, RelationType, Settings, Table, TableKind,
    TableSpecification, Zone,
};
pub use scenario::{
    Direction, DrtDetection, LineRenamer, ModeOptions, Scenario, SplitType, StatsFor,
};

/// Time in seconds since midnight of the simulated day
pub type Seconds = f64;

/// Width of a time bin in minutes
pub type Minutes = u32;
