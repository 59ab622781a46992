//! A single simulation run: its tables, settings and the KPIs derived from them

mod ingest;
mod travel_stats;
mod volume;
mod zones;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::algo::TimeBinning;
use crate::model::{ModeRuleset, OperatingZone, Settings, Table, TableKind, TableSpecification};
use crate::{Error, Minutes};

pub(crate) use volume::LinkTraversals;

/// How trips containing a DRT leg are recognized in the trips table.
///
/// Chosen once when trips are added, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrtDetection {
    /// Boolean `contains_drt` column
    ContainsDrtColumn,
    /// Substring match of the DRT mode in `all_modes`
    AllModesColumn,
    /// Exact match of `main_mode`
    #[default]
    MainMode,
}

impl DrtDetection {
    pub fn detect(trips: &Table) -> Self {
        if trips.has_column("contains_drt") {
            DrtDetection::ContainsDrtColumn
        } else if trips.has_column("all_modes") {
            DrtDetection::AllModesColumn
        } else {
            DrtDetection::MainMode
        }
    }
}

/// Renames public transport lines for the intermodal analysis
#[derive(Clone)]
pub enum LineRenamer {
    /// Listed line ids are replaced, others are kept
    Mapping(HashMap<String, String>),
    /// Called with the line id and the raw mode of the leg
    Function(Arc<dyn Fn(&str, Option<&str>) -> String + Send + Sync>),
}

impl LineRenamer {
    pub fn rename(&self, line_id: &str, mode: Option<&str>) -> String {
        match self {
            LineRenamer::Mapping(mapping) => mapping
                .get(line_id)
                .cloned()
                .unwrap_or_else(|| line_id.to_string()),
            LineRenamer::Function(rename) => rename(line_id, mode),
        }
    }
}

impl fmt::Debug for LineRenamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRenamer::Mapping(mapping) => f.debug_tuple("Mapping").field(mapping).finish(),
            LineRenamer::Function(_) => f.write_str("Function(..)"),
        }
    }
}

macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    _ => Err(Error::InvalidArgument(format!(
                        concat!("Argument `", $what, "` has to be one of {:?}, got '{}'"),
                        [$($label),+],
                        s
                    ))),
                }
            }
        }
    };
}

/// What a modal split counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitType {
    /// Trips per main mode
    #[default]
    Volume,
    /// Person kilometers per leg mode
    Performance,
}

string_enum!(SplitType, "split_type", {
    Volume => "volume",
    Performance => "performance",
});

/// Table a statistic is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsFor {
    #[default]
    Trips,
    Legs,
}

string_enum!(StatsFor, "stats_for", {
    Trips => "trips",
    Legs => "legs",
});

impl StatsFor {
    pub(crate) fn table(self) -> TableKind {
        match self {
            StatsFor::Trips => TableKind::Trips,
            StatsFor::Legs => TableKind::Legs,
        }
    }

    pub(crate) fn mode_column(self) -> &'static str {
        match self {
            StatsFor::Trips => "main_mode",
            StatsFor::Legs => "mode",
        }
    }
}

/// Trip end used by location-based queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Origin,
    Destination,
}

string_enum!(Direction, "direction", {
    Origin => "origin",
    Destination => "destination",
});

impl Direction {
    /// Names of the x and y columns of this trip end
    pub fn coordinate_columns(self) -> (&'static str, &'static str) {
        match self {
            Direction::Origin => ("from_x", "from_y"),
            Direction::Destination => ("to_x", "to_y"),
        }
    }
}

/// Mode filtering and aggregation shared by the per-mode KPIs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeOptions {
    /// Raw mode labels to leave out, matched before aggregation
    pub exclude_modes: Vec<String>,
    /// Name of a configured mode aggregation ruleset
    pub ruleset: Option<String>,
}

impl ModeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn excluding<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_modes.extend(modes.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_ruleset(mut self, name: impl Into<String>) -> Self {
        self.ruleset = Some(name.into());
        self
    }
}

/// Resolved [`ModeOptions`]: drops excluded labels and aggregates the rest
pub(crate) struct ModeMapper<'a> {
    exclude: &'a [String],
    ruleset: Option<&'a ModeRuleset>,
}

impl<'a> ModeMapper<'a> {
    pub(crate) fn new(settings: &'a Settings, options: &'a ModeOptions) -> Result<Self, Error> {
        Ok(Self {
            exclude: &options.exclude_modes,
            ruleset: settings.optional_ruleset(options.ruleset.as_deref())?,
        })
    }

    /// Mapper that only aggregates
    pub(crate) fn ruleset(settings: &'a Settings, name: Option<&str>) -> Result<Self, Error> {
        Ok(Self {
            exclude: &[],
            ruleset: settings.optional_ruleset(name)?,
        })
    }

    /// Aggregated label, `None` if the raw label is excluded
    pub(crate) fn map<'s>(&'s self, raw: &'s str) -> Option<&'s str> {
        if self.exclude.iter().any(|m| m == raw) {
            return None;
        }
        Some(self.ruleset.map_or(raw, |ruleset| ruleset.apply(raw)))
    }

    /// Same as [`ModeMapper::map`] for possibly missing labels
    pub(crate) fn map_opt<'s>(&'s self, raw: Option<&'s str>) -> Option<&'s str> {
        raw.and_then(|raw| self.map(raw))
    }
}

/// Tables, settings and derived state of one simulation run
#[derive(Debug, Clone)]
pub struct Scenario {
    code: String,
    name: String,
    description: Option<String>,
    settings: Settings,
    specification: TableSpecification,
    trips: Option<Table>,
    legs: Option<Table>,
    links: Option<Table>,
    network: Option<Table>,
    operating_zone: Option<OperatingZone>,
    line_renamer: Option<LineRenamer>,
    drt_detection: DrtDetection,
}

impl Scenario {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: "my scenario".to_string(),
            description: None,
            settings: Settings::default(),
            specification: TableSpecification::default(),
            trips: None,
            legs: None,
            links: None,
            network: None,
            operating_zone: None,
            line_renamer: None,
            drt_detection: DrtDetection::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// # Errors
    ///
    /// Returns an error if the settings do not validate
    pub fn with_settings(mut self, settings: Settings) -> Result<Self, Error> {
        self.set_settings(settings)?;
        Ok(self)
    }

    /// Replace the table specification used to validate tables added from now on
    #[must_use]
    pub fn with_specification(mut self, specification: TableSpecification) -> Self {
        self.specification = specification;
        self
    }

    #[must_use]
    pub fn with_line_renamer(mut self, renamer: LineRenamer) -> Self {
        self.line_renamer = Some(renamer);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings. Zone membership is recomputed since it depends
    /// on the configured CRS.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings do not validate
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), Error> {
        settings.validate()?;
        let crs_changed = settings.crs != self.settings.crs;
        self.settings = settings;
        if crs_changed {
            self.annotate_operating_zone()?;
        }
        Ok(())
    }

    pub fn specification(&self) -> &TableSpecification {
        &self.specification
    }

    pub fn line_renamer(&self) -> Option<&LineRenamer> {
        self.line_renamer.as_ref()
    }

    pub fn set_line_renamer(&mut self, renamer: Option<LineRenamer>) {
        self.line_renamer = renamer;
    }

    pub fn operating_zone(&self) -> Option<&OperatingZone> {
        self.operating_zone.as_ref()
    }

    pub fn drt_detection(&self) -> DrtDetection {
        self.drt_detection
    }

    /// Stored table of `kind`, if any
    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        match kind {
            TableKind::Trips => self.trips.as_ref(),
            TableKind::Legs => self.legs.as_ref(),
            TableKind::Links => self.links.as_ref(),
            TableKind::Network => self.network.as_ref(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if no trips were added
    pub fn trips(&self) -> Result<&Table, Error> {
        self.require(TableKind::Trips, &[])
    }

    /// # Errors
    ///
    /// Returns an error if no legs were added
    pub fn legs(&self) -> Result<&Table, Error> {
        self.require(TableKind::Legs, &[])
    }

    /// # Errors
    ///
    /// Returns an error if no links were added
    pub fn links(&self) -> Result<&Table, Error> {
        self.require(TableKind::Links, &[])
    }

    /// # Errors
    ///
    /// Returns an error if no network was added
    pub fn network(&self) -> Result<&Table, Error> {
        self.require(TableKind::Network, &[])
    }

    /// Table of `kind`, checked to contain all `columns`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing table or the first missing column
    pub fn require(&self, kind: TableKind, columns: &[&str]) -> Result<&Table, Error> {
        let table = self.table(kind).ok_or(Error::MissingTable(kind))?;
        if let Some(column) = columns.iter().find(|column| !table.has_column(column)) {
            return Err(Error::MissingColumn {
                table: kind,
                column: (*column).to_string(),
            });
        }
        Ok(table)
    }

    /// Binning of `time_interval` minutes, falling back to the configured default
    pub(crate) fn time_binning(
        &self,
        time_interval: Option<Minutes>,
    ) -> Result<TimeBinning, Error> {
        match time_interval.unwrap_or(self.settings.default_time_agg_interval) {
            0 => Err(Error::InvalidArgument(
                "`time_interval` must be at least one minute".to_string(),
            )),
            minutes => Ok(TimeBinning::minutes(minutes)),
        }
    }

    pub(crate) fn mode_mapper<'a>(
        &'a self,
        options: &'a ModeOptions,
    ) -> Result<ModeMapper<'a>, Error> {
        ModeMapper::new(&self.settings, options)
    }
}
