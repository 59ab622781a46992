use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

use super::{ModeMapper, ModeOptions, Scenario, SplitType};
use crate::model::{Table, TableKind};
use crate::results::{ModalShare, ModeTimeBinCount, ModeTotal, TimeBinCount};
use crate::{Error, Minutes};

/// Traversal of a link by a vehicle: `(vehicle_id, link_id, link_enter_time)`
type TraversalKey<'a> = (Option<&'a str>, Option<&'a str>, Option<u64>);

/// Link rows grouped by traversal.
///
/// The links table holds one row per person aboard, so a single traversal
/// shows up once per occupant.
pub(crate) struct LinkTraversals<'a> {
    vehicle_ids: &'a [Option<String>],
    link_ids: &'a [Option<String>],
    enter_times: &'a [Option<f64>],
}

impl<'a> LinkTraversals<'a> {
    pub(crate) const COLUMNS: [&'static str; 3] = ["vehicle_id", "link_id", "link_enter_time"];

    pub(crate) fn new(links: &'a Table) -> Result<Self, Error> {
        Ok(Self {
            vehicle_ids: links.str_column("vehicle_id")?,
            link_ids: links.str_column("link_id")?,
            enter_times: links.float_column("link_enter_time")?,
        })
    }

    pub(crate) fn key(&self, row: usize) -> TraversalKey<'a> {
        (
            self.vehicle_ids[row].as_deref(),
            self.link_ids[row].as_deref(),
            self.enter_times[row].map(f64::to_bits),
        )
    }

    /// Rows of `rows` that are the first record of their traversal
    pub(crate) fn first_rows(&self, rows: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen = HashSet::new();
        rows.into_iter()
            .filter(|&row| seen.insert(self.key(row)))
            .collect()
    }

    /// Group `rows` by traversal, in order of first appearance
    pub(crate) fn group(&self, rows: impl IntoIterator<Item = usize>) -> Vec<Vec<usize>> {
        let mut index: HashMap<TraversalKey<'a>, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for row in rows {
            let slot = *index.entry(self.key(row)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
        groups
    }
}

fn with_shares(totals: impl IntoIterator<Item = (String, f64)>) -> Vec<ModalShare> {
    let totals: Vec<(String, f64)> = totals.into_iter().collect();
    let sum: f64 = totals.iter().map(|(_, n)| n).sum();
    totals
        .into_iter()
        .map(|(mode, n)| ModalShare {
            mode,
            n,
            share: if sum > 0.0 { n / sum } else { 0.0 },
        })
        .collect()
}

/// Sum `values` per aggregated mode. Rows with an excluded or missing mode
/// are dropped, missing values count as zero.
fn sum_per_mode(
    mapper: &ModeMapper<'_>,
    modes: &[Option<String>],
    values: &[Option<f64>],
    rows: impl IntoIterator<Item = usize>,
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        if let Some(mode) = mapper.map_opt(modes[row].as_deref()) {
            *totals.entry(mode.to_string()).or_default() += values[row].unwrap_or(0.0);
        }
    }
    totals
}

impl Scenario {
    /// Number of trips
    ///
    /// # Errors
    ///
    /// Returns an error if no trips were added
    pub fn n_trips(&self) -> Result<usize, Error> {
        Ok(self.require(TableKind::Trips, &[])?.n_rows())
    }

    /// Number of distinct persons making trips
    ///
    /// # Errors
    ///
    /// Returns an error if trips or their `person_id` are missing
    pub fn n_persons(&self) -> Result<usize, Error> {
        let trips = self.require(TableKind::Trips, &["person_id"])?;
        Ok(trips.str_column("person_id")?.iter().flatten().unique().count())
    }

    /// Number of trips per time bin of `time_col`
    ///
    /// # Errors
    ///
    /// Returns an error if trips or `time_col` are missing or the interval is zero
    pub fn trips_day(
        &self,
        time_interval: Option<Minutes>,
        time_col: &str,
    ) -> Result<Vec<TimeBinCount>, Error> {
        let trips = self.require(TableKind::Trips, &[time_col])?;
        let binning = self.time_binning(time_interval)?;
        let counts = trips
            .float_column(time_col)?
            .iter()
            .filter_map(|time| binning.index_of(*time))
            .counts();

        Ok(counts
            .into_iter()
            .sorted()
            .map(|(time_index, n)| TimeBinCount { time_index, n })
            .collect())
    }

    /// Person kilometers per mode, from the legs' `routed_distance`
    ///
    /// # Errors
    ///
    /// Returns an error if legs or required columns are missing or the ruleset is unknown
    pub fn person_km(&self, options: &ModeOptions) -> Result<Vec<ModeTotal>, Error> {
        let legs = self.require(TableKind::Legs, &["routed_distance", "mode"])?;
        let mapper = self.mode_mapper(options)?;
        let totals = sum_per_mode(
            &mapper,
            legs.str_column("mode")?,
            legs.float_column("routed_distance")?,
            0..legs.n_rows(),
        );

        Ok(totals
            .into_iter()
            .map(|(mode, meters)| ModeTotal {
                mode,
                n: meters / 1000.0,
            })
            .collect())
    }

    /// Trips per main mode (`Volume`) or person kilometers per leg mode
    /// (`Performance`), each with its share of the total.
    ///
    /// Shares are computed after excluding and aggregating modes.
    ///
    /// # Errors
    ///
    /// Returns an error if the required table or columns are missing or the ruleset is unknown
    #[allow(clippy::cast_precision_loss)]
    pub fn modal_split(
        &self,
        split_type: SplitType,
        options: &ModeOptions,
    ) -> Result<Vec<ModalShare>, Error> {
        match split_type {
            SplitType::Volume => {
                let trips = self.require(TableKind::Trips, &["main_mode"])?;
                let mapper = self.mode_mapper(options)?;
                let counts = trips
                    .str_column("main_mode")?
                    .iter()
                    .filter_map(|mode| mapper.map_opt(mode.as_deref()))
                    .counts();
                Ok(with_shares(
                    counts
                        .into_iter()
                        .sorted()
                        .map(|(mode, n)| (mode.to_string(), n as f64)),
                ))
            }
            SplitType::Performance => Ok(with_shares(
                self.person_km(options)?
                    .into_iter()
                    .map(|total| (total.mode, total.n)),
            )),
        }
    }

    /// Trips per main mode and time bin of `time_col`. Only `Volume` is supported.
    ///
    /// # Errors
    ///
    /// Returns an error for `Performance` or if trips or required columns are missing
    pub fn modal_split_day(
        &self,
        split_type: SplitType,
        time_interval: Option<Minutes>,
        time_col: &str,
        options: &ModeOptions,
    ) -> Result<Vec<ModeTimeBinCount>, Error> {
        if split_type != SplitType::Volume {
            return Err(Error::InvalidArgument(
                "Only `split_type='volume'` is currently supported".to_string(),
            ));
        }
        let trips = self.require(TableKind::Trips, &["main_mode", time_col])?;
        let binning = self.time_binning(time_interval)?;
        let mapper = self.mode_mapper(options)?;

        let modes = trips.str_column("main_mode")?;
        let times = trips.float_column(time_col)?;
        let counts = modes
            .iter()
            .zip(times)
            .filter_map(|(mode, time)| {
                Some((mapper.map_opt(mode.as_deref())?, binning.index_of(*time)?))
            })
            .counts();

        Ok(counts
            .into_iter()
            .sorted()
            .map(|((mode, time_index), n)| ModeTimeBinCount {
                mode: mode.to_string(),
                time_index,
                n,
            })
            .collect())
    }

    /// Vehicle kilometers per mode from `distance_travelled` of the links,
    /// counting every traversal once
    ///
    /// # Errors
    ///
    /// Returns an error if links or required columns are missing or the ruleset is unknown
    pub fn vehicle_km(&self, options: &ModeOptions) -> Result<Vec<ModeTotal>, Error> {
        let links = self.require(
            TableKind::Links,
            &[
                "vehicle_id",
                "link_id",
                "link_enter_time",
                "mode",
                "distance_travelled",
            ],
        )?;
        let mapper = self.mode_mapper(options)?;
        let modes = links.str_column("mode")?;

        let kept =
            (0..links.n_rows()).filter(|&row| mapper.map_opt(modes[row].as_deref()).is_some());
        let rows = LinkTraversals::new(links)?.first_rows(kept);
        let totals = sum_per_mode(&mapper, modes, links.float_column("distance_travelled")?, rows);

        Ok(totals
            .into_iter()
            .map(|(mode, meters)| ModeTotal {
                mode,
                n: meters / 1000.0,
            })
            .collect())
    }

    /// Distinct vehicles per mode entering at least one link in each time bin
    ///
    /// # Errors
    ///
    /// Returns an error if links or required columns are missing or the ruleset is unknown
    pub fn n_vehicles_day(
        &self,
        time_interval: Option<Minutes>,
        options: &ModeOptions,
    ) -> Result<Vec<ModeTimeBinCount>, Error> {
        let links = self.require(TableKind::Links, &["vehicle_id", "mode", "link_enter_time"])?;
        let binning = self.time_binning(time_interval)?;
        let mapper = self.mode_mapper(options)?;

        let modes = links.str_column("mode")?;
        let vehicles = links.str_column("vehicle_id")?;
        let times = links.float_column("link_enter_time")?;

        let mut per_bin: BTreeMap<(&str, i64), HashSet<&str>> = BTreeMap::new();
        for row in 0..links.n_rows() {
            let (Some(mode), Some(time_index), Some(vehicle)) = (
                mapper.map_opt(modes[row].as_deref()),
                binning.index_of(times[row]),
                vehicles[row].as_deref(),
            ) else {
                continue;
            };
            per_bin.entry((mode, time_index)).or_default().insert(vehicle);
        }

        Ok(per_bin
            .into_iter()
            .map(|((mode, time_index), vehicles)| ModeTimeBinCount {
                mode: mode.to_string(),
                time_index,
                n: vehicles.len(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModeRuleset, Settings};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn scenario() -> Scenario {
        let settings = Settings::default().with_ruleset(
            "coarse",
            [("bus", "pt"), ("tram", "pt")].into_iter().collect::<ModeRuleset>(),
        );
        let mut scenario = Scenario::new("base").with_settings(settings).unwrap();
        scenario
            .add_data(
                TableKind::Trips,
                Table::new()
                    .with_column("trip_id", vec!["1", "2", "3", "4"])
                    .unwrap()
                    .with_column("person_id", vec![Some("a"), Some("a"), Some("b"), None])
                    .unwrap()
                    .with_column("main_mode", vec!["car", "bus", "tram", "car"])
                    .unwrap()
                    .with_column("start_time", vec![3661.0, 7200.0, 7300.0, 90000.0])
                    .unwrap(),
            )
            .unwrap();
        scenario
            .add_data(
                TableKind::Legs,
                Table::new()
                    .with_column("trip_id", vec!["1", "2", "2", "3"])
                    .unwrap()
                    .with_column("mode", vec!["car", "walk", "bus", "tram"])
                    .unwrap()
                    .with_column(
                        "routed_distance",
                        vec![Some(5000.0), Some(300.0), None, Some(2700.0)],
                    )
                    .unwrap(),
            )
            .unwrap();
        scenario
            .add_data(
                TableKind::Links,
                Table::new()
                    .with_column("vehicle_id", vec!["v1", "v1", "v1", "bus1", "bus1"])
                    .unwrap()
                    .with_column("link_id", vec!["l1", "l1", "l2", "l1", "l3"])
                    .unwrap()
                    .with_column("person_id", vec!["d1", "p1", "d1", "d2", "d2"])
                    .unwrap()
                    .with_column("mode", vec!["car", "car", "car", "bus", "bus"])
                    .unwrap()
                    .with_column("link_enter_time", vec![10.0, 10.0, 20.0, 3700.0, 10.0])
                    .unwrap()
                    .with_column("distance_travelled", vec![100.0, 100.0, 250.0, 1000.0, 500.0])
                    .unwrap(),
            )
            .unwrap();
        scenario
    }

    #[test]
    fn counts_trips_and_persons() {
        let scenario = scenario();
        assert_eq!(scenario.n_trips().unwrap(), 4);
        assert_eq!(scenario.n_persons().unwrap(), 2);
    }

    #[test]
    fn trips_per_hour_do_not_wrap() {
        let bins = scenario().trips_day(None, "start_time").unwrap();
        assert_eq!(
            bins,
            vec![
                TimeBinCount { time_index: 1, n: 1 },
                TimeBinCount { time_index: 2, n: 2 },
                TimeBinCount { time_index: 25, n: 1 },
            ]
        );
    }

    #[test]
    fn volume_split_with_ruleset_and_exclusion() {
        let scenario = scenario();
        let split = scenario
            .modal_split(
                SplitType::Volume,
                &ModeOptions::new().excluding(["tram"]).with_ruleset("coarse"),
            )
            .unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].mode, "car");
        assert!(close(split[0].n, 2.0));
        assert!(close(split[0].share, 2.0 / 3.0));
        assert_eq!(split[1].mode, "pt");
        assert!(close(split[1].share, 1.0 / 3.0));
    }

    #[test]
    fn performance_split_matches_person_km() {
        let scenario = scenario();
        let options = ModeOptions::new().with_ruleset("coarse");
        let split = scenario.modal_split(SplitType::Performance, &options).unwrap();
        let pkm = scenario.person_km(&options).unwrap();

        let split_total: f64 = split.iter().map(|row| row.n).sum();
        let pkm_total: f64 = pkm.iter().map(|row| row.n).sum();
        assert!(close(split_total, pkm_total));
        assert!(close(split.iter().map(|row| row.share).sum::<f64>(), 1.0));

        // the bus leg has no distance and adds nothing
        let pt = pkm.iter().find(|row| row.mode == "pt").unwrap();
        assert!(close(pt.n, 2.7));
    }

    #[test]
    fn modal_split_day_rejects_performance() {
        let err = scenario()
            .modal_split_day(SplitType::Performance, None, "start_time", &ModeOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn modal_split_day_groups_by_mode_and_bin() {
        let rows = scenario()
            .modal_split_day(
                SplitType::Volume,
                Some(120),
                "start_time",
                &ModeOptions::new().with_ruleset("coarse"),
            )
            .unwrap();
        let flat: Vec<_> = rows
            .iter()
            .map(|row| (row.mode.as_str(), row.time_index, row.n))
            .collect();
        assert_eq!(flat, vec![("car", 0, 1), ("car", 12, 1), ("pt", 1, 2)]);
    }

    #[test]
    fn vehicle_km_counts_each_traversal_once() {
        let vkm = scenario().vehicle_km(&ModeOptions::new()).unwrap();
        assert_eq!(vkm[0].mode, "bus");
        assert!(close(vkm[0].n, 1.5));
        assert_eq!(vkm[1].mode, "car");
        assert!(close(vkm[1].n, 0.35));
    }

    #[test]
    fn vehicles_per_bin() {
        let rows = scenario()
            .n_vehicles_day(Some(60), &ModeOptions::new())
            .unwrap();
        let flat: Vec<_> = rows
            .iter()
            .map(|row| (row.mode.as_str(), row.time_index, row.n))
            .collect();
        assert_eq!(flat, vec![("bus", 0, 1), ("bus", 1, 1), ("car", 0, 1)]);
    }

    #[test]
    fn missing_tables_are_reported() {
        let scenario = Scenario::new("empty");
        assert!(scenario.n_trips().unwrap_err().is_missing_data());
        assert!(
            scenario
                .vehicle_km(&ModeOptions::new())
                .unwrap_err()
                .is_missing_data()
        );
    }
}
