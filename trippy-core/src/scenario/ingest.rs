use geo::Point;
use hashbrown::HashMap;
use log::{debug, info, warn};

use super::{DrtDetection, Scenario};
use crate::Error;
use crate::model::{Column, Crs, OperatingZone, RelationType, Table, TableKind};

const ZONE_COLUMNS: [&str; 3] = ["starts_in_zone", "ends_in_zone", "relation_type"];

impl Scenario {
    /// Validate `table` and store it as the scenario's table of `kind`,
    /// replacing a previously added one.
    ///
    /// Recognized columns are cast to their declared types and missing
    /// id columns are synthesized from the row position. Legs without
    /// `leg_number` are numbered per trip in input order, so the legs of a
    /// trip have to be supplied in the order they were travelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the table has no rows or no recognized column
    pub fn add_data(&mut self, kind: TableKind, mut table: Table) -> Result<(), Error> {
        let recognized = self.specification.validate(kind, &table)?;
        for spec in &recognized {
            table.cast_column(&spec.name, spec.dtype);
        }

        match kind {
            TableKind::Trips => {
                synthesize_ids(&mut table, "trip_id")?;
                self.drt_detection = DrtDetection::detect(&table);
                debug!("DRT trips are detected by {:?}", self.drt_detection);
                self.trips = Some(table);
                self.annotate_operating_zone()?;
            }
            TableKind::Legs => {
                synthesize_ids(&mut table, "leg_id")?;
                if !table.has_column("leg_number") {
                    synthesize_leg_numbers(&mut table)?;
                }
                self.legs = Some(table);
            }
            TableKind::Links => {
                synthesize_ids(&mut table, "link_id")?;
                self.links = Some(table);
            }
            TableKind::Network => {
                self.network = Some(table);
            }
        }

        if let Some(table) = self.table(kind) {
            info!(
                "Added {} table to scenario `{}`: {} rows, {} recognized columns",
                kind,
                self.code,
                table.n_rows(),
                recognized.len()
            );
        }
        Ok(())
    }

    /// Set the operating zone and annotate the trips added so far
    ///
    /// # Errors
    ///
    /// Returns an error if the trips table is inconsistent
    pub fn set_operating_zone(&mut self, zone: OperatingZone) -> Result<(), Error> {
        self.operating_zone = Some(zone);
        self.annotate_operating_zone()
    }

    /// (Re)compute `starts_in_zone`, `ends_in_zone` and `relation_type` of
    /// every trip. Does nothing without trips or without an operating zone.
    pub(super) fn annotate_operating_zone(&mut self) -> Result<(), Error> {
        let (Some(zone), Some(trips)) = (self.operating_zone.as_ref(), self.trips.as_mut()) else {
            return Ok(());
        };

        if ["from_x", "from_y", "to_x", "to_y"]
            .iter()
            .any(|column| !trips.has_column(column))
        {
            warn!(
                "Could not add information on the operating zone to the trips table because \
                columns defining trip locations were missing (`from_x`, `from_y`, `to_x`, `to_y`)"
            );
            return Ok(());
        }

        let crs = self.settings.crs;
        let starts = zone_membership(trips, zone, crs, "from_x", "from_y")?;
        let ends = zone_membership(trips, zone, crs, "to_x", "to_y")?;
        let relations: Vec<&str> = starts
            .iter()
            .zip(&ends)
            .map(|(&starts, &ends)| RelationType::classify(starts, ends).as_str())
            .collect();

        for column in ZONE_COLUMNS {
            trips.drop_column(column);
        }
        trips.insert_column("starts_in_zone", starts)?;
        trips.insert_column("ends_in_zone", ends)?;
        trips.insert_column("relation_type", relations)?;
        Ok(())
    }
}

/// Trips with a missing coordinate are treated as outside
fn zone_membership(
    trips: &Table,
    zone: &OperatingZone,
    crs: Crs,
    x_column: &str,
    y_column: &str,
) -> Result<Vec<bool>, Error> {
    let xs = trips.float_column(x_column)?;
    let ys = trips.float_column(y_column)?;
    Ok(xs
        .iter()
        .zip(ys)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => zone.contains(Point::new(*x, *y), crs),
            _ => false,
        })
        .collect())
}

/// Add `column` holding the row position as string, unless it already exists
fn synthesize_ids(table: &mut Table, column: &str) -> Result<(), Error> {
    if table.has_column(column) {
        return Ok(());
    }
    let ids: Vec<String> = (0..table.n_rows()).map(|idx| idx.to_string()).collect();
    table.insert_column(column, ids)
}

/// Number the legs of every trip 1, 2, ... in input order
#[allow(clippy::cast_precision_loss)]
fn synthesize_leg_numbers(legs: &mut Table) -> Result<(), Error> {
    if !legs.has_column("trip_id") {
        warn!("Legs have neither `leg_number` nor `trip_id`, leg order is unknown");
        return Ok(());
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let numbers: Vec<Option<f64>> = legs
        .str_column("trip_id")?
        .iter()
        .map(|trip_id| {
            trip_id.as_deref().map(|trip_id| {
                let count = seen.entry(trip_id).or_insert(0);
                *count += 1;
                *count as f64
            })
        })
        .collect();
    drop(seen);
    legs.insert_column("leg_number", Column::Float(numbers))
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::super::tests::trips_table;
    use super::*;

    fn legs_table() -> Table {
        Table::new()
            .with_column("trip_id", vec!["1", "1", "2", "1"])
            .unwrap()
            .with_column("mode", vec!["walk", "bus", "car", "walk"])
            .unwrap()
    }

    fn wgs84_settings() -> crate::Settings {
        crate::Settings {
            crs: Crs::Wgs84,
            ..crate::Settings::default()
        }
    }

    fn unit_zone() -> OperatingZone {
        OperatingZone::new(
            polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ],
            Crs::Wgs84,
        )
    }

    fn located_trips() -> Table {
        Table::new()
            .with_column("main_mode", vec!["car", "bus", "walk"])
            .unwrap()
            .with_column("from_x", vec![0.5, 0.5, 2.0])
            .unwrap()
            .with_column("from_y", vec![0.5, 0.5, 2.0])
            .unwrap()
            .with_column("to_x", vec![0.2, 3.0, 3.0])
            .unwrap()
            .with_column("to_y", vec![0.2, 3.0, 3.0])
            .unwrap()
    }

    #[test]
    fn trip_ids_are_synthesized_from_row_position() {
        let mut scenario = Scenario::new("base");
        let trips = Table::new()
            .with_column("main_mode", vec!["car", "walk"])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips).unwrap();
        let ids = scenario.trips().unwrap().str_column("trip_id").unwrap();
        assert_eq!(ids, &[Some("0".to_string()), Some("1".to_string())]);
    }

    #[test]
    fn existing_trip_ids_are_kept() {
        let mut scenario = Scenario::new("base");
        let trips = Table::new()
            .with_column("main_mode", vec!["car", "walk", "bus"])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips).unwrap();
        let first = scenario.trips().unwrap().clone();
        scenario.add_data(TableKind::Trips, first.clone()).unwrap();
        assert_eq!(scenario.trips().unwrap(), &first);
    }

    #[test]
    fn numeric_ids_are_cast_to_strings() {
        let mut scenario = Scenario::new("base");
        let trips = Table::new()
            .with_column("trip_id", vec![10.0, 11.0])
            .unwrap()
            .with_column("main_mode", vec!["car", "walk"])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips).unwrap();
        let ids = scenario.trips().unwrap().str_column("trip_id").unwrap();
        assert_eq!(ids[0].as_deref(), Some("10"));
    }

    #[test]
    fn schema_is_checked_before_synthesis() {
        let mut scenario = Scenario::new("base");
        let trips = Table::new().with_column("colour", vec!["red"]).unwrap();
        let err = scenario.add_data(TableKind::Trips, trips).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(scenario.trips().is_err());
    }

    #[test]
    fn leg_numbers_follow_input_order_per_trip() {
        let mut scenario = Scenario::new("base");
        scenario.add_data(TableKind::Legs, legs_table()).unwrap();
        let legs = scenario.legs().unwrap();
        assert_eq!(
            legs.float_column("leg_number").unwrap(),
            &[Some(1.0), Some(2.0), Some(1.0), Some(3.0)]
        );
        assert_eq!(legs.str_column("leg_id").unwrap()[3].as_deref(), Some("3"));
    }

    #[test]
    fn drt_detection_prefers_contains_drt() {
        let mut scenario = Scenario::new("base");
        let trips = trips_table()
            .with_column("all_modes", vec!["car", "walk", "drt,walk"])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips.clone()).unwrap();
        assert_eq!(scenario.drt_detection(), DrtDetection::AllModesColumn);

        let trips = trips
            .with_column("contains_drt", vec![false, false, true])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips).unwrap();
        assert_eq!(scenario.drt_detection(), DrtDetection::ContainsDrtColumn);
    }

    #[test]
    fn operating_zone_annotates_trips_in_either_order() {
        let expected = vec![
            Some("inland".to_string()),
            Some("od".to_string()),
            Some("outside".to_string()),
        ];

        let mut zone_first = Scenario::new("a").with_settings(wgs84_settings()).unwrap();
        zone_first.set_operating_zone(unit_zone()).unwrap();
        zone_first.add_data(TableKind::Trips, located_trips()).unwrap();
        assert_eq!(
            zone_first.trips().unwrap().str_column("relation_type").unwrap(),
            expected.as_slice()
        );

        let mut trips_first = Scenario::new("b").with_settings(wgs84_settings()).unwrap();
        trips_first.add_data(TableKind::Trips, located_trips()).unwrap();
        trips_first.set_operating_zone(unit_zone()).unwrap();
        let trips = trips_first.trips().unwrap();
        assert_eq!(trips.str_column("relation_type").unwrap(), expected.as_slice());
        assert_eq!(
            trips.bool_column("ends_in_zone").unwrap(),
            &[Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn zone_boundary_counts_as_outside() {
        let mut scenario = Scenario::new("a").with_settings(wgs84_settings()).unwrap();
        let trips = Table::new()
            .with_column("from_x", vec![0.0])
            .unwrap()
            .with_column("from_y", vec![0.5])
            .unwrap()
            .with_column("to_x", vec![0.5])
            .unwrap()
            .with_column("to_y", vec![0.5])
            .unwrap();
        scenario.add_data(TableKind::Trips, trips).unwrap();
        scenario.set_operating_zone(unit_zone()).unwrap();
        let relation = scenario.trips().unwrap().str_column("relation_type").unwrap();
        assert_eq!(relation[0].as_deref(), Some("od"));
    }

    #[test]
    fn trips_without_coordinates_are_not_annotated() {
        let mut scenario = Scenario::new("a");
        scenario.set_operating_zone(unit_zone()).unwrap();
        scenario.add_data(TableKind::Trips, trips_table()).unwrap();
        assert!(!scenario.trips().unwrap().has_column("relation_type"));
    }
}
