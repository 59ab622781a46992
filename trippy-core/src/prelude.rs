// Re-export key components
pub use crate::comparison::Comparison;
pub use crate::drt::{
    DrtScenario, drt_intermodal_analysis, drt_leg_locations, drt_occupancy_day, eta, eta_day,
    mean_drt_occupancy, n_drt_rides, pooled_distance_share, pooling_share,
};
pub use crate::loading::{
    read_csv_table, table_from_csv_reader, table_from_records, zones_from_geojson,
};
pub use crate::scenario::{
    Direction, DrtDetection, LineRenamer, ModeOptions, Scenario, SplitType, StatsFor,
};

// Data model
pub use crate::model::{
    Column, ColumnType, Crs, OperatingZone, RelationType, Settings, Table, TableKind,
    TableSpecification, Zone,
};

// Aggregation helpers
pub use crate::algo::{DescriptiveStats, LegOrder, TimeBinning};

pub use crate::Error;
pub use crate::Minutes; // minutes
pub use crate::Seconds; // seconds since midnight
