use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};
use trippy_core::prelude::*;

use crate::errors::{to_json, to_py_err};

/// Scenario
///
/// The output of a single simulation run: trips, legs, links and network
/// tables together with the settings used to interpret them.
///
/// Tables are added as JSON records (``DataFrame.to_json(orient="records")``)
/// or read from CSV files. All KPI methods return JSON records that can be
/// loaded with ``pandas.read_json``.
///
/// Example:
///
/// .. code-block:: python
///
///     scenario = Scenario("base", name="Base case")
///     scenario.add_data("trips", trips_df.to_json(orient="records"))
///     modal_split = pd.read_json(io.StringIO(scenario.modal_split()))
#[gen_stub_pyclass]
#[pyclass(name = "Scenario", subclass)]
pub struct PyScenario {
    pub(crate) inner: Scenario,
}

/// Scenario built from the constructor arguments shared with `DRTScenario`
pub(crate) fn build_scenario(
    code: &str,
    name: &str,
    description: Option<&str>,
    settings: Option<&str>,
    specification: Option<&str>,
) -> PyResult<Scenario> {
    let mut scenario = Scenario::new(code).with_name(name);
    if let Some(description) = description {
        scenario = scenario.with_description(description);
    }
    if let Some(specification) = specification {
        let specification: TableSpecification =
            serde_json::from_str(specification).map_err(|e| {
                PyErr::new::<PyValueError, _>(format!("Failed to parse table specification: {e}"))
            })?;
        scenario = scenario.with_specification(specification);
    }
    if let Some(settings) = settings {
        scenario = scenario
            .with_settings(parse_settings(settings)?)
            .map_err(to_py_err)?;
    }
    Ok(scenario)
}

fn parse_settings(settings: &str) -> PyResult<Settings> {
    serde_json::from_str(settings)
        .map_err(|e| PyErr::new::<PyValueError, _>(format!("Failed to parse settings: {e}")))
}

fn mode_options(exclude_modes: Option<Vec<String>>, ruleset: Option<String>) -> ModeOptions {
    ModeOptions {
        exclude_modes: exclude_modes.unwrap_or_default(),
        ruleset,
    }
}

fn parse<T>(value: &str) -> PyResult<T>
where
    T: std::str::FromStr<Err = Error>,
{
    value.parse().map_err(to_py_err)
}

/// Line renamer from a dict of line ids or a callable `(line_id, mode) -> str`
fn line_renamer(renamer: &Bound<'_, PyAny>) -> PyResult<LineRenamer> {
    if let Ok(mapping) = renamer.extract::<HashMap<String, String>>() {
        return Ok(LineRenamer::Mapping(mapping.into_iter().collect()));
    }
    if !renamer.is_callable() {
        return Err(PyErr::new::<PyValueError, _>(
            "`line_renamer` must be a dict or a callable",
        ));
    }

    let callable = renamer.clone().unbind();
    Ok(LineRenamer::Function(Arc::new(move |line_id, mode| {
        Python::attach(|py| {
            callable
                .bind(py)
                .call1((line_id, mode))
                .and_then(|renamed| renamed.extract::<String>().map_err(Into::into))
                .unwrap_or_else(|e| {
                    warn!("Renaming line `{line_id}` failed, keeping it: {e}");
                    line_id.to_string()
                })
        })
    })))
}

#[gen_stub_pymethods]
#[pymethods]
impl PyScenario {
    /// Create an empty scenario.
    ///
    /// Parameters
    /// ----------
    /// code : str
    ///     Short unique identifier, used to select policy scenarios
    /// name : str, default="my scenario"
    /// description : str, optional
    /// settings : str, optional
    ///     Settings as JSON; missing keys keep their defaults
    /// specification : str, optional
    ///     Table specification as JSON, replaces the built-in one
    #[new]
    #[pyo3(signature = (code, name="my scenario", description=None, settings=None, specification=None))]
    pub fn new(
        code: &str,
        name: &str,
        description: Option<&str>,
        settings: Option<&str>,
        specification: Option<&str>,
    ) -> PyResult<Self> {
        Ok(PyScenario {
            inner: build_scenario(code, name, description, settings, specification)?,
        })
    }

    #[getter]
    fn code(&self) -> &str {
        self.inner.code()
    }

    #[getter]
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[getter]
    fn description(&self) -> Option<&str> {
        self.inner.description()
    }

    /// Current settings as JSON
    pub fn settings(&self) -> PyResult<String> {
        to_json(self.inner.settings())
    }

    /// Replace the settings, given as JSON
    pub fn set_settings(&mut self, settings: &str) -> PyResult<()> {
        self.inner
            .set_settings(parse_settings(settings)?)
            .map_err(to_py_err)
    }

    /// Load settings from a JSON file
    pub fn load_settings(&mut self, path: PathBuf) -> PyResult<()> {
        let settings = Settings::from_json_file(&path).map_err(to_py_err)?;
        self.inner.set_settings(settings).map_err(to_py_err)
    }

    /// Set how lines are renamed in the intermodal analysis: a dict from
    /// line id to new name, a callable ``(line_id, mode) -> str`` or None
    #[pyo3(signature = (renamer=None))]
    pub fn set_line_renamer(&mut self, renamer: Option<Bound<'_, PyAny>>) -> PyResult<()> {
        let renamer = renamer.map(|renamer| line_renamer(&renamer)).transpose()?;
        self.inner.set_line_renamer(renamer);
        Ok(())
    }

    /// Add a table given as JSON records.
    ///
    /// Parameters
    /// ----------
    /// table_name : str
    ///     One of "trips", "legs", "links" or "network" (a "_df" suffix is accepted)
    /// records : str
    ///     Output of ``DataFrame.to_json(orient="records")``
    ///
    /// Raises
    /// ------
    /// SchemaError
    ///     If the table has no rows or none of its columns is recognized
    pub fn add_data(&mut self, py: Python<'_>, table_name: &str, records: &str) -> PyResult<()> {
        let kind: TableKind = parse(table_name)?;
        let specification = self.inner.specification();
        let table = py
            .detach(|| table_from_records(records, kind, specification))
            .map_err(to_py_err)?;
        self.inner.add_data(kind, table).map_err(to_py_err)
    }

    /// Read a table from a CSV file with a header row
    pub fn read_csv(&mut self, py: Python<'_>, table_name: &str, path: PathBuf) -> PyResult<()> {
        let kind: TableKind = parse(table_name)?;
        let specification = self.inner.specification();
        let table = py
            .detach(|| read_csv_table(&path, kind, specification))
            .map_err(to_py_err)?;
        self.inner.add_data(kind, table).map_err(to_py_err)
    }

    /// Set the operating zone from a GeoJSON or WKT polygon in the scenario CRS
    /// and annotate the trips with their relation to it
    #[pyo3(signature = (geojson=None, wkt=None))]
    pub fn set_operating_zone(&mut self, geojson: Option<&str>, wkt: Option<&str>) -> PyResult<()> {
        let crs = self.inner.settings().crs;
        let zone = match (geojson, wkt) {
            (Some(geojson), None) => OperatingZone::from_geojson(geojson, crs),
            (None, Some(wkt)) => OperatingZone::from_wkt(wkt, crs),
            _ => {
                return Err(PyErr::new::<PyValueError, _>(
                    "Pass exactly one of `geojson` and `wkt`",
                ));
            }
        }
        .map_err(to_py_err)?;
        self.inner.set_operating_zone(zone).map_err(to_py_err)
    }

    pub fn n_trips(&self) -> PyResult<usize> {
        self.inner.n_trips().map_err(to_py_err)
    }

    pub fn n_persons(&self) -> PyResult<usize> {
        self.inner.n_persons().map_err(to_py_err)
    }

    /// Number of trips per time bin
    #[pyo3(signature = (time_interval=None, time_col="start_time"))]
    pub fn trips_day(&self, time_interval: Option<Minutes>, time_col: &str) -> PyResult<String> {
        to_json(
            &self
                .inner
                .trips_day(time_interval, time_col)
                .map_err(to_py_err)?,
        )
    }

    /// Person kilometers per leg mode
    #[pyo3(signature = (exclude_modes=None, ruleset=None))]
    pub fn person_km(
        &self,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        to_json(&self.inner.person_km(&options).map_err(to_py_err)?)
    }

    /// Modal split by number of trips ("volume") or person kilometers ("performance")
    #[pyo3(signature = (split_type="volume", exclude_modes=None, ruleset=None))]
    pub fn modal_split(
        &self,
        split_type: &str,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        to_json(
            &self
                .inner
                .modal_split(parse(split_type)?, &options)
                .map_err(to_py_err)?,
        )
    }

    /// Trips per main mode and time bin
    #[pyo3(signature = (split_type="volume", time_interval=None, time_col="start_time", exclude_modes=None, ruleset=None))]
    pub fn modal_split_day(
        &self,
        split_type: &str,
        time_interval: Option<Minutes>,
        time_col: &str,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        to_json(
            &self
                .inner
                .modal_split_day(parse(split_type)?, time_interval, time_col, &options)
                .map_err(to_py_err)?,
        )
    }

    /// Vehicle kilometers per mode from the links table
    #[pyo3(signature = (exclude_modes=None, ruleset=None))]
    pub fn vehicle_km(
        &self,
        py: Python<'_>,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        let rows = py
            .detach(|| self.inner.vehicle_km(&options))
            .map_err(to_py_err)?;
        to_json(&rows)
    }

    /// Distinct vehicles in service per mode and time bin
    #[pyo3(signature = (time_interval=None, exclude_modes=None, ruleset=None))]
    pub fn n_vehicles_day(
        &self,
        py: Python<'_>,
        time_interval: Option<Minutes>,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        let rows = py
            .detach(|| self.inner.n_vehicles_day(time_interval, &options))
            .map_err(to_py_err)?;
        to_json(&rows)
    }

    /// Statistics in minutes of every travel time component of trips or legs
    #[pyo3(signature = (stats_for="trips", distinguish_modes=false, ruleset=None))]
    pub fn travel_time_stats(
        &self,
        stats_for: &str,
        distinguish_modes: bool,
        ruleset: Option<&str>,
    ) -> PyResult<String> {
        to_json(
            &self
                .inner
                .travel_time_stats(parse(stats_for)?, distinguish_modes, ruleset)
                .map_err(to_py_err)?,
        )
    }

    /// Statistics of a distance column of trips or legs
    #[pyo3(signature = (stats_for="trips", distinguish_modes=false, ruleset=None, distance_col="routed_distance"))]
    pub fn travel_distance_stats(
        &self,
        stats_for: &str,
        distinguish_modes: bool,
        ruleset: Option<&str>,
        distance_col: &str,
    ) -> PyResult<String> {
        to_json(
            &self
                .inner
                .travel_distance_stats(parse(stats_for)?, distinguish_modes, ruleset, distance_col)
                .map_err(to_py_err)?,
        )
    }

    /// Access and egress distance statistics per main mode
    #[pyo3(signature = (ruleset=None))]
    pub fn access_egress_distances(&self, ruleset: Option<&str>) -> PyResult<String> {
        to_json(
            &self
                .inner
                .access_egress_distances(ruleset)
                .map_err(to_py_err)?,
        )
    }

    /// Trips per zone of origin or destination.
    ///
    /// Parameters
    /// ----------
    /// zones : str
    ///     GeoJSON FeatureCollection of (multi)polygons in the scenario CRS
    /// id_property : str, default="zone_id"
    ///     Feature property holding the zone id
    /// pt_lines : list[str], optional
    ///     Only count public transport trips using one of these lines;
    ///     requires ``distinguish_modes``
    /// direction : str, default="origin"
    ///     "origin" or "destination"
    #[pyo3(signature = (zones, id_property="zone_id", exclude_modes=None, ruleset=None, distinguish_modes=false, pt_lines=None, direction="origin"))]
    #[allow(clippy::too_many_arguments)]
    pub fn zone_trips(
        &self,
        py: Python<'_>,
        zones: &str,
        id_property: &str,
        exclude_modes: Option<Vec<String>>,
        ruleset: Option<String>,
        distinguish_modes: bool,
        pt_lines: Option<Vec<String>>,
        direction: &str,
    ) -> PyResult<String> {
        let options = mode_options(exclude_modes, ruleset);
        let direction: Direction = parse(direction)?;
        let rows = py
            .detach(|| {
                let zones = zones_from_geojson(zones, id_property)?;
                self.inner.zone_trips(
                    &zones,
                    &options,
                    distinguish_modes,
                    pt_lines.as_deref(),
                    direction,
                )
            })
            .map_err(to_py_err)?;
        to_json(&rows)
    }

    /// Trip ids with the coordinates of their origin or destination
    #[pyo3(signature = (direction="origin"))]
    pub fn trip_locations(&self, direction: &str) -> PyResult<String> {
        to_json(
            &self
                .inner
                .trip_locations(parse(direction)?)
                .map_err(to_py_err)?,
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "Scenario(code='{}', name='{}')",
            self.inner.code(),
            self.inner.name()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}
