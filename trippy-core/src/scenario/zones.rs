use std::collections::BTreeMap;

use geo::Point;
use hashbrown::HashSet;

use super::{Direction, ModeOptions, Scenario};
use crate::model::{TableKind, Zone};
use crate::results::{TripLocation, ZoneTripCount};
use crate::Error;

impl Scenario {
    /// Number of trips starting (or ending) in each zone, optionally per mode.
    ///
    /// Zone geometries have to be given in the scenario CRS. Trips outside
    /// every zone are dropped, trips inside overlapping zones count for each.
    /// With `pt_lines`, trips whose main mode is one of the configured
    /// `pt_modes` only count if one of their legs runs on one of the lines.
    ///
    /// # Errors
    ///
    /// Returns an error if required tables or columns are missing, if
    /// `pt_lines` is used without distinguishing modes or without configured
    /// `pt_modes`, or if the ruleset is unknown
    pub fn zone_trips(
        &self,
        zones: &[Zone],
        options: &ModeOptions,
        distinguish_modes: bool,
        pt_lines: Option<&[String]>,
        direction: Direction,
    ) -> Result<Vec<ZoneTripCount>, Error> {
        let (x_column, y_column) = direction.coordinate_columns();
        let needs_modes = distinguish_modes || !options.exclude_modes.is_empty();
        let trips = if needs_modes {
            self.require(TableKind::Trips, &["trip_id", "main_mode", x_column, y_column])?
        } else {
            self.require(TableKind::Trips, &["trip_id", x_column, y_column])?
        };
        let mapper = self.mode_mapper(options)?;

        let trips_on_lines = match pt_lines {
            None => None,
            Some(_) if !distinguish_modes => {
                return Err(Error::InvalidArgument(
                    "`distinguish_modes` must be set to use `pt_lines`".to_string(),
                ));
            }
            Some(_) if self.settings.pt_modes.is_empty() => {
                return Err(Error::InvalidArgument(
                    "To use `pt_lines`, please set `pt_modes` in settings first".to_string(),
                ));
            }
            Some(lines) => {
                let legs = self.require(TableKind::Legs, &["trip_id", "line_id"])?;
                let trip_ids = legs.str_column("trip_id")?;
                let line_ids = legs.str_column("line_id")?;
                let on_lines: HashSet<&str> = trip_ids
                    .iter()
                    .zip(line_ids)
                    .filter(|(_, line)| line.as_ref().is_some_and(|line| lines.contains(line)))
                    .filter_map(|(trip, _)| trip.as_deref())
                    .collect();
                Some(on_lines)
            }
        };

        let trip_ids = trips.str_column("trip_id")?;
        let xs = trips.float_column(x_column)?;
        let ys = trips.float_column(y_column)?;
        let raw_modes = if needs_modes {
            Some(trips.str_column("main_mode")?)
        } else {
            None
        };

        let mut counts: BTreeMap<(&str, Option<&str>), usize> = BTreeMap::new();
        for row in 0..trips.n_rows() {
            let (Some(x), Some(y)) = (xs[row], ys[row]) else {
                continue;
            };

            let mode = match raw_modes {
                None => None,
                Some(modes) => {
                    let Some(raw) = modes[row].as_deref() else {
                        continue;
                    };
                    if let Some(on_lines) = &trips_on_lines {
                        let on_line = trip_ids[row]
                            .as_deref()
                            .is_some_and(|trip_id| on_lines.contains(trip_id));
                        if self.settings.is_pt_mode(raw) && !on_line {
                            continue;
                        }
                    }
                    let Some(mode) = mapper.map(raw) else {
                        continue;
                    };
                    distinguish_modes.then_some(mode)
                }
            };

            let point = Point::new(x, y);
            for zone in zones.iter().filter(|zone| zone.contains(&point)) {
                *counts.entry((zone.zone_id.as_str(), mode)).or_default() += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|((zone_id, mode), n)| ZoneTripCount {
                zone_id: zone_id.to_string(),
                mode: mode.map(ToString::to_string),
                n,
            })
            .collect())
    }

    /// Origin or destination point of every trip, in the scenario CRS.
    /// Trips with a missing coordinate are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if trips or the coordinate columns are missing
    pub fn trip_locations(&self, direction: Direction) -> Result<Vec<TripLocation>, Error> {
        let (x_column, y_column) = direction.coordinate_columns();
        let trips = self.require(TableKind::Trips, &["trip_id", x_column, y_column])?;
        let trip_ids = trips.str_column("trip_id")?;
        let xs = trips.float_column(x_column)?;
        let ys = trips.float_column(y_column)?;

        Ok(trip_ids
            .iter()
            .zip(xs.iter().zip(ys))
            .filter_map(|(trip_id, (x, y))| {
                Some(TripLocation {
                    trip_id: trip_id.clone()?,
                    x: (*x)?,
                    y: (*y)?,
                })
            })
            .collect())
    }
}
