//! Flat result rows returned by the KPI queries.
//!
//! Field names are the column names consumed by reporting code, so they are
//! part of the public contract.

use serde::Serialize;

use crate::algo::{DescriptiveStats, LegOrder};

/// Total per mode, e.g. person or vehicle kilometers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeTotal {
    pub mode: String,
    pub n: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalShare {
    pub mode: String,
    pub n: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBinCount {
    pub time_index: i64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeTimeBinCount {
    pub mode: String,
    pub time_index: i64,
    pub n: usize,
}

/// Statistics of one travel time component, in minutes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelPartStats {
    pub travel_part: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessEgress {
    Access,
    Egress,
}

impl AccessEgress {
    pub fn distance_column(self) -> &'static str {
        match self {
            AccessEgress::Access => "access_distance",
            AccessEgress::Egress => "egress_distance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessEgressStats {
    pub mode: String,
    pub kind: AccessEgress,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBinStats {
    pub time_index: i64,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyCount {
    pub time_index: i64,
    /// Passengers aboard, the driver excluded
    pub occupancy: usize,
    /// Vehicles with this occupancy
    pub n: usize,
}

/// Legs connecting to a DRT leg, grouped by mode, line and position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntermodalCount {
    pub mode: Option<String>,
    pub line_id: Option<String>,
    pub order: LegOrder,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalShiftCount {
    pub base_mode: String,
    pub policy_mode: String,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneTripCount {
    pub zone_id: String,
    pub mode: Option<String>,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripLocation {
    pub trip_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegLocation {
    pub leg_id: String,
    pub trip_id: Option<String>,
    pub x: f64,
    pub y: f64,
}
