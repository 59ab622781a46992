//! Declared columns per logical table and validation of inbound tables

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use super::column::ColumnType;
use super::table::Table;
use crate::Error;

/// Logical tables a scenario can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Trips,
    Legs,
    Links,
    Network,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Trips,
        TableKind::Legs,
        TableKind::Links,
        TableKind::Network,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Trips => "trips",
            TableKind::Legs => "legs",
            TableKind::Links => "links",
            TableKind::Network => "network",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches("_df") {
            "trips" => Ok(TableKind::Trips),
            "legs" => Ok(TableKind::Legs),
            "links" => Ok(TableKind::Links),
            "network" => Ok(TableKind::Network),
            _ => Err(Error::InvalidArgument(format!(
                "Unrecognized table kind `{s}`, expected one of 'trips', 'legs', 'links', 'network'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub dtype: ColumnType,
}

impl ColumnSpec {
    fn new(name: &str, dtype: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            dtype,
        }
    }
}

/// Recognized columns for every logical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpecification {
    #[serde(alias = "trips_df", default)]
    pub trips: Vec<ColumnSpec>,
    #[serde(alias = "legs_df", default)]
    pub legs: Vec<ColumnSpec>,
    #[serde(alias = "links_df", default)]
    pub links: Vec<ColumnSpec>,
    #[serde(alias = "network_df", default)]
    pub network: Vec<ColumnSpec>,
}

const TRIP_COLUMNS: &[(&str, ColumnType)] = &[
    ("trip_id", ColumnType::Str),
    ("person_id", ColumnType::Str),
    ("main_mode", ColumnType::Str),
    ("contains_drt", ColumnType::Bool),
    ("all_modes", ColumnType::Str),
    ("from_act_type", ColumnType::Str),
    ("to_act_type", ColumnType::Str),
    ("start_time", ColumnType::Float),
    ("end_time", ColumnType::Float),
    ("travel_time", ColumnType::Float),
    ("waiting_time", ColumnType::Float),
    ("access_time", ColumnType::Float),
    ("access_waiting_time", ColumnType::Float),
    ("egress_time", ColumnType::Float),
    ("egress_waiting_time", ColumnType::Float),
    ("access_distance", ColumnType::Float),
    ("egress_distance", ColumnType::Float),
    ("routed_distance", ColumnType::Float),
    ("beeline_distance", ColumnType::Float),
    ("from_x", ColumnType::Float),
    ("from_y", ColumnType::Float),
    ("to_x", ColumnType::Float),
    ("to_y", ColumnType::Float),
    ("legs_count", ColumnType::Float),
    ("starts_in_zone", ColumnType::Bool),
    ("ends_in_zone", ColumnType::Bool),
    ("relation_type", ColumnType::Str),
];

const LEG_COLUMNS: &[(&str, ColumnType)] = &[
    ("leg_id", ColumnType::Str),
    ("trip_id", ColumnType::Str),
    ("person_id", ColumnType::Str),
    ("mode", ColumnType::Str),
    ("leg_number", ColumnType::Float),
    ("line_id", ColumnType::Str),
    ("from_act_type", ColumnType::Str),
    ("to_act_type", ColumnType::Str),
    ("start_time", ColumnType::Float),
    ("end_time", ColumnType::Float),
    ("travel_time", ColumnType::Float),
    ("waiting_time", ColumnType::Float),
    ("routed_distance", ColumnType::Float),
    ("beeline_distance", ColumnType::Float),
    ("from_x", ColumnType::Float),
    ("from_y", ColumnType::Float),
    ("to_x", ColumnType::Float),
    ("to_y", ColumnType::Float),
];

const LINK_COLUMNS: &[(&str, ColumnType)] = &[
    ("link_id", ColumnType::Str),
    ("vehicle_id", ColumnType::Str),
    ("person_id", ColumnType::Str),
    ("agent_type", ColumnType::Str),
    ("mode", ColumnType::Str),
    ("line_id", ColumnType::Str),
    ("link_enter_time", ColumnType::Float),
    ("link_leave_time", ColumnType::Float),
    ("from_stop_id", ColumnType::Str),
    ("to_stop_id", ColumnType::Str),
    ("distance_travelled", ColumnType::Float),
    ("link_enter_x", ColumnType::Float),
    ("link_enter_y", ColumnType::Float),
    ("link_leave_x", ColumnType::Float),
    ("link_leave_y", ColumnType::Float),
];

const NETWORK_COLUMNS: &[(&str, ColumnType)] = &[
    ("link_id", ColumnType::Str),
    ("from_node", ColumnType::Str),
    ("to_node", ColumnType::Str),
    ("length", ColumnType::Float),
    ("freespeed", ColumnType::Float),
    ("capacity", ColumnType::Float),
    ("lanes", ColumnType::Float),
    ("modes", ColumnType::Str),
    ("geometry", ColumnType::Str),
];

fn specs(columns: &[(&str, ColumnType)]) -> Vec<ColumnSpec> {
    columns
        .iter()
        .map(|(name, dtype)| ColumnSpec::new(name, *dtype))
        .collect()
}

impl Default for TableSpecification {
    fn default() -> Self {
        Self {
            trips: specs(TRIP_COLUMNS),
            legs: specs(LEG_COLUMNS),
            links: specs(LINK_COLUMNS),
            network: specs(NETWORK_COLUMNS),
        }
    }
}

impl TableSpecification {
    /// Load a specification from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid specification
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.display(), e),
            )
        })?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn columns(&self, kind: TableKind) -> &[ColumnSpec] {
        match kind {
            TableKind::Trips => &self.trips,
            TableKind::Legs => &self.legs,
            TableKind::Links => &self.links,
            TableKind::Network => &self.network,
        }
    }

    pub fn column_type(&self, kind: TableKind, name: &str) -> Option<ColumnType> {
        self.columns(kind)
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.dtype)
    }

    /// Columns of `table` recognized for `kind`, in specification order.
    ///
    /// Unrecognized columns are reported with a warning and kept in the
    /// table, but no KPI uses them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if no column is recognized or the table has no rows
    pub fn validate(&self, kind: TableKind, table: &Table) -> Result<Vec<ColumnSpec>, Error> {
        let recognized: Vec<ColumnSpec> = self
            .columns(kind)
            .iter()
            .filter(|spec| table.has_column(&spec.name))
            .cloned()
            .collect();

        if recognized.is_empty() || table.is_empty() {
            return Err(Error::Schema {
                table: kind,
                message: format!(
                    "{} rows, {} recognized of {} columns",
                    table.n_rows(),
                    recognized.len(),
                    table.n_columns()
                ),
            });
        }

        let not_used: Vec<&str> = table
            .column_names()
            .filter(|name| self.column_type(kind, name).is_none())
            .collect();
        if !not_used.is_empty() {
            warn!(
                "The provided `{kind}` table contains the following columns that are not \
                recognized and will not be used: {not_used:?}"
            );
        }

        Ok(recognized)
    }
}
