use super::{ModeMapper, Scenario, StatsFor};
use crate::Error;
use crate::algo::{describe_groups, DescriptiveStats};
use crate::model::{Column, Table, TableKind};
use crate::results::{AccessEgress, AccessEgressStats, ModeStats, TravelPartStats};

/// Per row mode label used for grouping: `Some(None)` when modes are not
/// distinguished, `None` for rows to skip
fn group_modes<'a>(
    table: &'a Table,
    mode_column: &str,
    mapper: Option<&'a ModeMapper<'a>>,
) -> Result<Vec<Option<Option<&'a str>>>, Error> {
    match mapper {
        None => Ok(vec![Some(None); table.n_rows()]),
        Some(mapper) => Ok(table
            .str_column(mode_column)?
            .iter()
            .map(|mode| mapper.map_opt(mode.as_deref()).map(Some))
            .collect()),
    }
}

impl Scenario {
    /// Descriptive statistics in minutes for every travel time component
    /// (each recognized column with `time` in its name, except the start and
    /// end times), optionally per mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the table, `travel_time` or the mode column is
    /// missing or the ruleset is unknown
    pub fn travel_time_stats(
        &self,
        stats_for: StatsFor,
        distinguish_modes: bool,
        ruleset: Option<&str>,
    ) -> Result<Vec<TravelPartStats>, Error> {
        let kind = stats_for.table();
        let mode_column = stats_for.mode_column();
        let table = if distinguish_modes {
            self.require(kind, &["travel_time", mode_column])?
        } else {
            self.require(kind, &["travel_time"])?
        };
        let mapper = ModeMapper::ruleset(&self.settings, ruleset)?;
        let modes = group_modes(table, mode_column, distinguish_modes.then_some(&mapper))?;

        let mut values = Vec::new();
        for part in self.travel_time_parts(kind, table) {
            let Some(Column::Float(seconds)) = table.column(part) else {
                continue;
            };
            for (mode, seconds) in modes.iter().zip(seconds) {
                if let (Some(mode), Some(seconds)) = (mode, seconds) {
                    values.push(((part, *mode), seconds / 60.0));
                }
            }
        }

        Ok(describe_groups(values)
            .into_iter()
            .map(|((part, mode), stats)| TravelPartStats {
                travel_part: part.to_string(),
                mode: mode.map(ToString::to_string),
                stats,
            })
            .collect())
    }

    fn travel_time_parts<'a>(&'a self, kind: TableKind, table: &Table) -> Vec<&'a str> {
        self.specification
            .columns(kind)
            .iter()
            .map(|spec| spec.name.as_str())
            .filter(|name| name.contains("time") && !matches!(*name, "start_time" | "end_time"))
            .filter(|name| table.has_column(name))
            .collect()
    }

    /// Descriptive statistics of `distance_col`, optionally per mode
    ///
    /// # Errors
    ///
    /// Returns an error if the table or a required column is missing or not
    /// numeric, or the ruleset is unknown
    pub fn travel_distance_stats(
        &self,
        stats_for: StatsFor,
        distinguish_modes: bool,
        ruleset: Option<&str>,
        distance_col: &str,
    ) -> Result<Vec<ModeStats>, Error> {
        let kind = stats_for.table();
        let mode_column = stats_for.mode_column();
        let table = if distinguish_modes {
            self.require(kind, &[distance_col, mode_column])?
        } else {
            self.require(kind, &[distance_col])?
        };
        let mapper = ModeMapper::ruleset(&self.settings, ruleset)?;
        let modes = group_modes(table, mode_column, distinguish_modes.then_some(&mapper))?;
        let distances = table.float_column(distance_col)?;

        let values = modes
            .iter()
            .zip(distances)
            .filter_map(|(mode, distance)| Some(((*mode)?, (*distance)?)));

        Ok(describe_groups(values)
            .into_iter()
            .map(|(mode, stats)| ModeStats {
                mode: mode.map(ToString::to_string),
                stats,
            })
            .collect())
    }

    /// Statistics of access and egress distances of trips per main mode.
    /// Groups of a single trip report a standard deviation of 0.
    ///
    /// # Errors
    ///
    /// Returns an error if trips or required columns are missing or the ruleset is unknown
    pub fn access_egress_distances(
        &self,
        ruleset: Option<&str>,
    ) -> Result<Vec<AccessEgressStats>, Error> {
        let trips = self.require(
            TableKind::Trips,
            &["main_mode", "access_distance", "egress_distance"],
        )?;
        let mapper = ModeMapper::ruleset(&self.settings, ruleset)?;
        let modes = trips.str_column("main_mode")?;

        let mut values = Vec::new();
        for kind in [AccessEgress::Access, AccessEgress::Egress] {
            let distances = trips.float_column(kind.distance_column())?;
            for (mode, distance) in modes.iter().zip(distances) {
                if let (Some(mode), Some(distance)) = (mapper.map_opt(mode.as_deref()), distance) {
                    values.push(((mode, kind), *distance));
                }
            }
        }

        Ok(describe_groups(values)
            .into_iter()
            .map(|((mode, kind), stats)| AccessEgressStats {
                mode: mode.to_string(),
                kind,
                stats: DescriptiveStats {
                    std: stats.std.or(Some(0.0)),
                    ..stats
                },
            })
            .collect())
    }
}
