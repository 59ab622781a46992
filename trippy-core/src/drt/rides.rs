use log::debug;

use crate::algo::{describe, describe_groups, DescriptiveStats};
use crate::model::{Table, TableKind};
use crate::results::{LegLocation, TimeBinStats};
use crate::scenario::{Direction, DrtDetection, Scenario};
use crate::{Error, Minutes};

/// Rows of `legs` travelled with the configured DRT mode
pub(super) fn drt_leg_rows<'a>(
    scenario: &Scenario,
    legs: &'a Table,
) -> Result<impl Iterator<Item = usize> + 'a, Error> {
    let drt_mode = scenario.settings().drt_mode.clone();
    let modes = legs.str_column("mode")?;
    Ok((0..legs.n_rows()).filter(move |&row| modes[row].as_deref() == Some(drt_mode.as_str())))
}

/// Number of trips using DRT.
///
/// Trips are recognized by their `contains_drt` flag, else by the DRT mode
/// appearing in `all_modes`, else by their `main_mode`. Missing values count
/// as not using DRT.
///
/// # Errors
///
/// Returns an error if trips are missing, or `main_mode` when it is needed
pub fn n_drt_rides(scenario: &Scenario) -> Result<usize, Error> {
    let drt_mode = scenario.settings().drt_mode.as_str();
    let detection = scenario.drt_detection();
    debug!("Counting DRT rides by {detection:?}");

    let rides = match detection {
        DrtDetection::ContainsDrtColumn => scenario
            .require(TableKind::Trips, &["contains_drt"])?
            .bool_column("contains_drt")?
            .iter()
            .filter(|flag| **flag == Some(true))
            .count(),
        DrtDetection::AllModesColumn => scenario
            .require(TableKind::Trips, &["all_modes"])?
            .str_column("all_modes")?
            .iter()
            .filter(|modes| modes.as_ref().is_some_and(|modes| modes.contains(drt_mode)))
            .count(),
        DrtDetection::MainMode => scenario
            .require(TableKind::Trips, &["main_mode"])?
            .str_column("main_mode")?
            .iter()
            .filter(|mode| mode.as_deref() == Some(drt_mode))
            .count(),
    };
    Ok(rides)
}

/// Statistics of the waiting time of DRT legs in minutes, `None` without
/// any DRT leg with a waiting time
///
/// # Errors
///
/// Returns an error if legs or required columns are missing
pub fn eta(scenario: &Scenario) -> Result<Option<DescriptiveStats>, Error> {
    let legs = scenario.require(TableKind::Legs, &["mode", "waiting_time"])?;
    let waiting = legs.float_column("waiting_time")?;
    let minutes: Vec<f64> = drt_leg_rows(scenario, legs)?
        .filter_map(|row| waiting[row].map(|seconds| seconds / 60.0))
        .collect();
    Ok(describe(&minutes))
}

/// [`eta`] per time bin of the legs' `start_time`
///
/// # Errors
///
/// Returns an error if legs or required columns are missing or the interval is zero
pub fn eta_day(
    scenario: &Scenario,
    time_interval: Option<Minutes>,
) -> Result<Vec<TimeBinStats>, Error> {
    let legs = scenario.require(TableKind::Legs, &["mode", "waiting_time", "start_time"])?;
    let binning = scenario.time_binning(time_interval)?;
    let waiting = legs.float_column("waiting_time")?;
    let start = legs.float_column("start_time")?;

    let values = drt_leg_rows(scenario, legs)?.filter_map(|row| {
        Some((binning.index_of(start[row])?, waiting[row]? / 60.0))
    });

    Ok(describe_groups(values)
        .into_iter()
        .map(|(time_index, stats)| TimeBinStats { time_index, stats })
        .collect())
}

/// Start (or end) points of DRT legs, in the scenario CRS
///
/// # Errors
///
/// Returns an error if legs or required columns are missing
pub fn drt_leg_locations(
    scenario: &Scenario,
    direction: Direction,
) -> Result<Vec<LegLocation>, Error> {
    let (x_column, y_column) = direction.coordinate_columns();
    let legs = scenario.require(TableKind::Legs, &["leg_id", "mode", x_column, y_column])?;
    let leg_ids = legs.str_column("leg_id")?;
    let trip_ids = legs.str_column("trip_id").ok();
    let xs = legs.float_column(x_column)?;
    let ys = legs.float_column(y_column)?;

    Ok(drt_leg_rows(scenario, legs)?
        .filter_map(|row| {
            Some(LegLocation {
                leg_id: leg_ids[row].clone()?,
                trip_id: trip_ids.and_then(|ids| ids[row].clone()),
                x: xs[row]?,
                y: ys[row]?,
            })
        })
        .collect())
}
