//! Per-scenario settings

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::crs::Crs;
use crate::{Error, Minutes};

/// Mapping from raw mode labels to display/aggregate labels.
/// Labels without an entry are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeRuleset(BTreeMap<String, String>);

impl ModeRuleset {
    pub fn new(rules: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(rules.into_iter().collect())
    }

    pub fn apply<'a>(&'a self, mode: &'a str) -> &'a str {
        self.0.get(mode).map_or(mode, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ModeRuleset {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default width of time bins
    pub default_time_agg_interval: Minutes,
    pub drt_mode: String,
    pub walk_mode: String,
    /// CRS of all planar coordinates in the trips and legs tables
    pub crs: Crs,
    /// Raw mode labels of scheduled public transport
    pub pt_modes: Vec<String>,
    pub mode_aggregation_rulesets: BTreeMap<String, ModeRuleset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_time_agg_interval: 60,
            drt_mode: "drt".to_string(),
            walk_mode: "walk".to_string(),
            crs: Crs::Utm {
                zone: 33,
                north: true,
                datum: super::crs::Datum::Etrs89,
            },
            pt_modes: Vec::new(),
            mode_aggregation_rulesets: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.display(), e),
            )
        })?;
        let settings: Settings = serde_json::from_reader(std::io::BufReader::new(file))?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns an error if any setting is out of range
    pub fn validate(&self) -> Result<(), Error> {
        if self.default_time_agg_interval == 0 {
            return Err(Error::InvalidArgument(
                "`default_time_agg_interval` must be at least one minute".to_string(),
            ));
        }
        if self.drt_mode.is_empty() || self.walk_mode.is_empty() {
            return Err(Error::InvalidArgument(
                "`drt_mode` and `walk_mode` must not be empty".to_string(),
            ));
        }
        if self.drt_mode == self.walk_mode {
            return Err(Error::InvalidArgument(format!(
                "`drt_mode` and `walk_mode` are both set to `{}`",
                self.drt_mode
            )));
        }
        Ok(())
    }

    /// Look up a mode aggregation ruleset by name
    ///
    /// # Errors
    ///
    /// Returns an error if no ruleset with this name is configured
    pub fn ruleset(&self, name: &str) -> Result<&ModeRuleset, Error> {
        self.mode_aggregation_rulesets.get(name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Mode aggregation ruleset `{name}` is not configured (known: {:?})",
                self.mode_aggregation_rulesets.keys().collect::<Vec<_>>()
            ))
        })
    }

    /// Optional variant of [`Settings::ruleset`] used by the KPI methods
    ///
    /// # Errors
    ///
    /// Returns an error if a name is given but not configured
    pub fn optional_ruleset(&self, name: Option<&str>) -> Result<Option<&ModeRuleset>, Error> {
        name.map(|name| self.ruleset(name)).transpose()
    }

    pub fn with_ruleset(mut self, name: &str, ruleset: ModeRuleset) -> Self {
        self.mode_aggregation_rulesets
            .insert(name.to_string(), ruleset);
        self
    }

    pub fn is_pt_mode(&self, mode: &str) -> bool {
        self.pt_modes.iter().any(|m| m == mode)
    }
}
