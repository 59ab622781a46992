use std::collections::BTreeMap;

use hashbrown::HashSet;
use itertools::Itertools;

use crate::algo::TimeBinning;
use crate::model::TableKind;
use crate::results::OccupancyCount;
use crate::scenario::{LinkTraversals, ModeOptions, Scenario};
use crate::Error;

/// Ratio of DRT person kilometers to DRT vehicle kilometers over the whole day
///
/// # Errors
///
/// Returns [`Error::DataNotFound`] if there are no DRT legs or no DRT links,
/// or the usual errors of [`Scenario::person_km`] and [`Scenario::vehicle_km`]
pub fn mean_drt_occupancy(scenario: &Scenario) -> Result<f64, Error> {
    let drt_mode = scenario.settings().drt_mode.as_str();
    let options = ModeOptions::new();

    let person_km = scenario
        .person_km(&options)?
        .into_iter()
        .find(|row| row.mode == drt_mode)
        .ok_or_else(|| {
            Error::DataNotFound(format!(
                "No legs with DRT mode `{drt_mode}` could be found. Make sure there are DRT legs \
                in the legs table and setting `drt_mode` is correctly specified"
            ))
        })?
        .n;

    let vehicle_km = scenario
        .vehicle_km(&options)?
        .into_iter()
        .find(|row| row.mode == drt_mode && row.n > 0.0)
        .ok_or_else(|| {
            Error::DataNotFound(format!(
                "No vehicles with DRT mode `{drt_mode}` could be found on any of the links. Make \
                sure there are DRT vehicles routed on the links in the links table and setting \
                `drt_mode` is correctly specified"
            ))
        })?
        .n;

    Ok(person_km / vehicle_km)
}

/// Pooling share of the DRT service, the mean number of persons per DRT
/// vehicle kilometer. Same value as [`mean_drt_occupancy`].
///
/// # Errors
///
/// See [`mean_drt_occupancy`]
pub fn pooling_share(scenario: &Scenario) -> Result<f64, Error> {
    mean_drt_occupancy(scenario)
}

/// Share of the distance DRT vehicles drive with at least one passenger
/// that is driven with two or more passengers.
///
/// Every person aboard a traversal except the driver is a passenger.
///
/// # Errors
///
/// Returns [`Error::DataNotFound`] if DRT vehicles never carry a passenger,
/// or an error if links or required columns are missing
pub fn pooled_distance_share(scenario: &Scenario) -> Result<f64, Error> {
    let mut columns = LinkTraversals::COLUMNS.to_vec();
    columns.extend(["person_id", "mode", "distance_travelled"]);
    let links = scenario.require(TableKind::Links, &columns)?;
    let drt_mode = scenario.settings().drt_mode.as_str();
    let modes = links.str_column("mode")?;
    let persons = links.str_column("person_id")?;
    let distances = links.float_column("distance_travelled")?;

    let drt_rows = (0..links.n_rows()).filter(|&row| modes[row].as_deref() == Some(drt_mode));
    let mut occupied = 0.0;
    let mut pooled = 0.0;
    for traversal in LinkTraversals::new(links)?.group(drt_rows) {
        let aboard = traversal
            .iter()
            .filter_map(|&row| persons[row].as_deref())
            .unique()
            .count();
        let distance = distances[traversal[0]].unwrap_or(0.0);
        let passengers = aboard.saturating_sub(1);
        if passengers >= 1 {
            occupied += distance;
        }
        if passengers >= 2 {
            pooled += distance;
        }
    }

    if occupied <= 0.0 {
        return Err(Error::DataNotFound(format!(
            "DRT vehicles with mode `{drt_mode}` never carry a passenger on any of the links"
        )));
    }
    Ok(pooled / occupied)
}

/// Number of DRT vehicles per time bin and number of passengers aboard.
///
/// Bins are `time_interval` **seconds** wide. A vehicle is seen in a bin only
/// if it enters a link during it, so its passengers are the distinct persons
/// over all links it entered there.
///
/// # Errors
///
/// Returns an error if links or required columns are missing or the interval is zero
pub fn drt_occupancy_day(
    scenario: &Scenario,
    time_interval: u32,
) -> Result<Vec<OccupancyCount>, Error> {
    if time_interval == 0 {
        return Err(Error::InvalidArgument(
            "`time_interval` must be at least one second".to_string(),
        ));
    }
    let links = scenario.require(
        TableKind::Links,
        &["link_enter_time", "person_id", "vehicle_id", "mode"],
    )?;
    let binning = TimeBinning::seconds(time_interval);
    let drt_mode = scenario.settings().drt_mode.as_str();
    let modes = links.str_column("mode")?;
    let times = links.float_column("link_enter_time")?;
    let vehicles = links.str_column("vehicle_id")?;
    let persons = links.str_column("person_id")?;

    let mut aboard: BTreeMap<(i64, &str), HashSet<&str>> = BTreeMap::new();
    for row in 0..links.n_rows() {
        if modes[row].as_deref() != Some(drt_mode) {
            continue;
        }
        let (Some(time_index), Some(vehicle)) =
            (binning.index_of(times[row]), vehicles[row].as_deref())
        else {
            continue;
        };
        let persons_aboard = aboard.entry((time_index, vehicle)).or_default();
        if let Some(person) = persons[row].as_deref() {
            persons_aboard.insert(person);
        }
    }

    let counts = aboard
        .into_iter()
        .map(|((time_index, _), persons)| (time_index, persons.len().saturating_sub(1)))
        .counts();

    Ok(counts
        .into_iter()
        .sorted()
        .map(|((time_index, occupancy), n)| OccupancyCount {
            time_index,
            occupancy,
            n,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Vehicle `d1` drives l1 alone, l2 with one passenger and l3 with two.
    /// Vehicle `d2` drives l1 with one passenger later in the day.
    fn links() -> Table {
        let rows = [
            ("d1", "l1", 10.0, "drv1", 100.0),
            ("d1", "l2", 20.0, "drv1", 200.0),
            ("d1", "l2", 20.0, "p1", 200.0),
            ("d1", "l3", 30.0, "drv1", 300.0),
            ("d1", "l3", 30.0, "p1", 300.0),
            ("d1", "l3", 30.0, "p2", 300.0),
            ("d2", "l1", 70.0, "drv2", 100.0),
            ("d2", "l1", 70.0, "p3", 100.0),
        ];
        Table::new()
            .with_column("vehicle_id", rows.iter().map(|r| r.0).collect::<Vec<_>>())
            .unwrap()
            .with_column("link_id", rows.iter().map(|r| r.1).collect::<Vec<_>>())
            .unwrap()
            .with_column("link_enter_time", rows.iter().map(|r| r.2).collect::<Vec<_>>())
            .unwrap()
            .with_column("person_id", rows.iter().map(|r| r.3).collect::<Vec<_>>())
            .unwrap()
            .with_column("mode", vec!["drt"; rows.len()])
            .unwrap()
            .with_column("distance_travelled", rows.iter().map(|r| r.4).collect::<Vec<_>>())
            .unwrap()
    }

    fn scenario() -> Scenario {
        let mut scenario = Scenario::new("drt");
        scenario.add_data(TableKind::Links, links()).unwrap();
        scenario
            .add_data(
                TableKind::Legs,
                Table::new()
                    .with_column("mode", vec!["drt", "drt", "drt", "walk"])
                    .unwrap()
                    .with_column("routed_distance", vec![500.0, 300.0, 300.0, 50.0])
                    .unwrap(),
            )
            .unwrap();
        scenario
    }

    #[test]
    fn pooling_share_is_mean_occupancy() {
        let scenario = scenario();
        let share = pooling_share(&scenario).unwrap();
        assert!(close(share, mean_drt_occupancy(&scenario).unwrap()));
        assert!(close(share, 1.1 / 0.7));
    }

    #[test]
    fn pooling_share_needs_drt_legs() {
        let mut scenario = Scenario::new("drt");
        scenario.add_data(TableKind::Links, links()).unwrap();
        scenario
            .add_data(
                TableKind::Legs,
                Table::new()
                    .with_column("mode", vec!["walk"])
                    .unwrap()
                    .with_column("routed_distance", vec![50.0])
                    .unwrap(),
            )
            .unwrap();
        assert!(matches!(pooling_share(&scenario), Err(Error::DataNotFound(_))));
        // the distance share only looks at links
        assert!(close(pooled_distance_share(&scenario).unwrap(), 0.5));
    }

    #[test]
    fn distance_share_driven_pooled() {
        // occupied: l2 + l3 of d1 and l1 of d2 = 600, pooled: l3 = 300
        assert!(close(pooled_distance_share(&scenario()).unwrap(), 0.5));
    }

    #[test]
    fn occupancy_ratio_of_person_to_vehicle_km() {
        // 1.1 person km over 0.7 vehicle km
        assert!(close(mean_drt_occupancy(&scenario()).unwrap(), 1.1 / 0.7));
    }

    #[test]
    fn missing_drt_rows_are_reported() {
        let mut scenario = scenario();
        let mut settings = scenario.settings().clone();
        settings.drt_mode = "taxi".to_string();
        scenario.set_settings(settings).unwrap();
        assert!(matches!(
            mean_drt_occupancy(&scenario),
            Err(Error::DataNotFound(_))
        ));
        assert!(matches!(pooling_share(&scenario), Err(Error::DataNotFound(_))));
        assert!(matches!(
            pooled_distance_share(&scenario),
            Err(Error::DataNotFound(_))
        ));
    }

    #[test]
    fn occupancy_per_minute() {
        let rows = drt_occupancy_day(&scenario(), 60).unwrap();
        let flat: Vec<_> = rows
            .iter()
            .map(|row| (row.time_index, row.occupancy, row.n))
            .collect();
        // first minute: d1 saw drv1, p1 and p2 across its links
        assert_eq!(flat, vec![(0, 2, 1), (1, 1, 1)]);
    }

    #[test]
    fn occupancy_per_ten_seconds() {
        let rows = drt_occupancy_day(&scenario(), 10).unwrap();
        let flat: Vec<_> = rows
            .iter()
            .map(|row| (row.time_index, row.occupancy, row.n))
            .collect();
        assert_eq!(flat, vec![(1, 0, 1), (2, 1, 1), (3, 2, 1), (7, 1, 1)]);
    }

    #[test]
    fn zero_second_bins_are_rejected() {
        assert!(drt_occupancy_day(&scenario(), 0).is_err());
    }
}
