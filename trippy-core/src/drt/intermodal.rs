//! Which legs connect to DRT rides

use std::cmp::Ordering;
use std::collections::BTreeMap;

use hashbrown::HashSet;
use log::debug;

use crate::algo::{LegOrder, adjacent_legs};
use crate::model::TableKind;
use crate::results::IntermodalCount;
use crate::scenario::{DrtDetection, ModeMapper, Scenario};
use crate::Error;

/// Count the legs directly before and after DRT legs, per mode, line and position.
///
/// Walk legs are removed before legs are renumbered, so a bus leg separated
/// from the DRT leg only by a walk still counts as adjacent. A DRT leg that
/// is the only non-walk leg of its trip is reported as `direct`. The DRT
/// mode itself and missing modes or lines are reported as `None`.
///
/// # Errors
///
/// Returns an error if legs (or trips when DRT trips are flagged there) or
/// their required columns are missing, or the ruleset is unknown
pub fn drt_intermodal_analysis(
    scenario: &Scenario,
    ruleset: Option<&str>,
) -> Result<Vec<IntermodalCount>, Error> {
    let settings = scenario.settings();
    let drt_mode = settings.drt_mode.as_str();
    let legs = scenario.require(TableKind::Legs, &["trip_id", "mode", "line_id", "leg_number"])?;
    let trip_ids = legs.str_column("trip_id")?;
    let modes = legs.str_column("mode")?;
    let line_ids = legs.str_column("line_id")?;
    let leg_numbers = legs.float_column("leg_number")?;

    let drt_trips: HashSet<&str> = if scenario.drt_detection() == DrtDetection::ContainsDrtColumn
    {
        let trips = scenario.require(TableKind::Trips, &["trip_id", "contains_drt"])?;
        trips
            .str_column("trip_id")?
            .iter()
            .zip(trips.bool_column("contains_drt")?)
            .filter(|(_, flag)| **flag == Some(true))
            .filter_map(|(trip_id, _)| trip_id.as_deref())
            .collect()
    } else {
        trip_ids
            .iter()
            .zip(modes)
            .filter(|(_, mode)| mode.as_deref() == Some(drt_mode))
            .filter_map(|(trip_id, _)| trip_id.as_deref())
            .collect()
    };
    debug!("{} trips use DRT", drt_trips.len());

    // non-walk legs of DRT trips
    let mut sequences: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for row in 0..legs.n_rows() {
        let Some(trip_id) = trip_ids[row].as_deref() else {
            continue;
        };
        if drt_trips.contains(trip_id) && modes[row].as_deref() != Some(settings.walk_mode.as_str())
        {
            sequences.entry(trip_id).or_default().push(row);
        }
    }

    let mapper = ModeMapper::ruleset(settings, ruleset)?;
    let renamer = scenario.line_renamer();
    let suppress_drt = |value: Option<String>| value.filter(|value| value != drt_mode);

    let mut counts: BTreeMap<(Option<String>, Option<String>, LegOrder), usize> = BTreeMap::new();
    for rows in sequences.values_mut() {
        rows.sort_by(|a, b| {
            match (leg_numbers[*a], leg_numbers[*b]) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        let is_drt: Vec<bool> = rows
            .iter()
            .map(|&row| modes[row].as_deref() == Some(drt_mode))
            .collect();

        for adjacent in adjacent_legs(&is_drt) {
            let row = rows[adjacent.index];
            let raw_mode = modes[row].as_deref();
            let mode = mapper.map_opt(raw_mode).map(ToString::to_string);
            let line_id = line_ids[row].as_deref().map(|line_id| match renamer {
                Some(renamer) => renamer.rename(line_id, raw_mode),
                None => line_id.to_string(),
            });
            *counts
                .entry((suppress_drt(mode), suppress_drt(line_id), adjacent.order))
                .or_default() += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|((mode, line_id, order), n)| IntermodalCount {
            mode,
            line_id,
            order,
            n,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Settings, Table};
    use crate::scenario::LineRenamer;

    fn legs(rows: &[(&str, &str, Option<&str>)]) -> Table {
        Table::new()
            .with_column("trip_id", rows.iter().map(|r| r.0).collect::<Vec<_>>())
            .unwrap()
            .with_column("mode", rows.iter().map(|r| r.1).collect::<Vec<_>>())
            .unwrap()
            .with_column("line_id", rows.iter().map(|r| r.2).collect::<Vec<_>>())
            .unwrap()
    }

    fn scenario(rows: &[(&str, &str, Option<&str>)]) -> Scenario {
        let mut scenario = Scenario::new("drt");
        scenario.add_data(TableKind::Legs, legs(rows)).unwrap();
        scenario
    }

    fn flat(rows: &[IntermodalCount]) -> Vec<(Option<&str>, Option<&str>, LegOrder, usize)> {
        rows.iter()
            .map(|row| (row.mode.as_deref(), row.line_id.as_deref(), row.order, row.n))
            .collect()
    }

    #[test]
    fn walk_legs_do_not_count_towards_adjacency() {
        let scenario = scenario(&[
            ("1", "walk", None),
            ("1", "pt", Some("S1")),
            ("1", "drt", None),
            ("1", "pt", Some("U2")),
            ("1", "walk", None),
        ]);
        let rows = drt_intermodal_analysis(&scenario, None).unwrap();
        assert_eq!(
            flat(&rows),
            vec![
                (Some("pt"), Some("S1"), LegOrder::Before, 1),
                (Some("pt"), Some("U2"), LegOrder::After, 1),
            ]
        );
    }

    #[test]
    fn sole_drt_leg_is_direct() {
        let scenario = scenario(&[
            ("1", "walk", None),
            ("1", "drt", None),
            ("1", "walk", None),
            ("2", "car", None),
        ]);
        let rows = drt_intermodal_analysis(&scenario, None).unwrap();
        assert_eq!(flat(&rows), vec![(None, None, LegOrder::Direct, 1)]);
    }

    #[test]
    fn distant_legs_are_dropped() {
        let scenario = scenario(&[
            ("1", "bus", Some("100")),
            ("1", "drt", None),
            ("1", "bus", Some("200")),
            ("1", "rail", Some("RE1")),
        ]);
        let rows = drt_intermodal_analysis(&scenario, None).unwrap();
        assert_eq!(
            flat(&rows),
            vec![
                (Some("bus"), Some("100"), LegOrder::Before, 1),
                (Some("bus"), Some("200"), LegOrder::After, 1),
            ]
        );
    }

    #[test]
    fn explicit_leg_numbers_define_order() {
        let table = legs(&[
            ("1", "bus", Some("200")),
            ("1", "drt", None),
            ("1", "bus", Some("100")),
            ("1", "rail", Some("RE1")),
        ])
        .with_column("leg_number", vec![3.0, 2.0, 1.0, 4.0])
        .unwrap();
        let mut scenario = Scenario::new("drt");
        scenario.add_data(TableKind::Legs, table).unwrap();
        let rows = drt_intermodal_analysis(&scenario, None).unwrap();
        assert_eq!(
            flat(&rows),
            vec![
                (Some("bus"), Some("100"), LegOrder::Before, 1),
                (Some("bus"), Some("200"), LegOrder::After, 1),
            ]
        );
    }

    #[test]
    fn modes_and_lines_are_renamed() {
        let settings = Settings::default()
            .with_ruleset("coarse", [("bus", "pt"), ("tram", "pt")].into_iter().collect());
        let renamer = LineRenamer::Mapping(
            [("100".to_string(), "Bus 100".to_string())]
                .into_iter()
                .collect(),
        );
        let mut scenario = Scenario::new("drt")
            .with_settings(settings)
            .unwrap()
            .with_line_renamer(renamer);
        scenario
            .add_data(
                TableKind::Legs,
                legs(&[
                    ("1", "bus", Some("100")),
                    ("1", "drt", None),
                    ("2", "drt", None),
                    ("2", "tram", Some("M1")),
                    ("3", "tram", Some("M1")),
                    ("3", "drt", None),
                ]),
            )
            .unwrap();
        let rows = drt_intermodal_analysis(&scenario, Some("coarse")).unwrap();
        assert_eq!(
            flat(&rows),
            vec![
                (Some("pt"), Some("Bus 100"), LegOrder::Before, 1),
                (Some("pt"), Some("M1"), LegOrder::Before, 1),
                (Some("pt"), Some("M1"), LegOrder::After, 1),
            ]
        );
    }

    #[test]
    fn drt_trips_from_contains_drt_flag() {
        let mut scenario = scenario(&[
            ("1", "bus", Some("100")),
            ("1", "drt", None),
            ("2", "bus", Some("200")),
            ("2", "drt", None),
        ]);
        scenario
            .add_data(
                TableKind::Trips,
                Table::new()
                    .with_column("trip_id", vec!["1", "2"])
                    .unwrap()
                    .with_column("contains_drt", vec![true, false])
                    .unwrap(),
            )
            .unwrap();
        let rows = drt_intermodal_analysis(&scenario, None).unwrap();
        assert_eq!(
            flat(&rows),
            vec![(Some("bus"), Some("100"), LegOrder::Before, 1)]
        );
    }
}
