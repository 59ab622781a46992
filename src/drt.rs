use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};
use trippy_core::prelude::*;

use crate::errors::{to_json, to_py_err};
use crate::scenario::{PyScenario, build_scenario};

/// DRTScenario
///
/// A scenario with a demand responsive transport service. Supports every
/// `Scenario` method plus the DRT specific KPIs.
///
/// Example:
///
/// .. code-block:: python
///
///     drt = DRTScenario("drt", fleet_size=20)
///     drt.add_data("legs", legs_df.to_json(orient="records"))
///     eta = json.loads(drt.eta())
#[gen_stub_pyclass]
#[pyclass(name = "DRTScenario", extends = PyScenario)]
pub struct PyDrtScenario {
    fleet_size: Option<u32>,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyDrtScenario {
    #[new]
    #[pyo3(signature = (code, fleet_size=None, name="my scenario", description=None, settings=None, specification=None))]
    pub fn new(
        code: &str,
        fleet_size: Option<u32>,
        name: &str,
        description: Option<&str>,
        settings: Option<&str>,
        specification: Option<&str>,
    ) -> PyResult<(PyDrtScenario, PyScenario)> {
        let inner = build_scenario(code, name, description, settings, specification)?;
        Ok((PyDrtScenario { fleet_size }, PyScenario { inner }))
    }

    #[getter]
    fn fleet_size(slf: PyRef<'_, Self>) -> Option<u32> {
        Self::drt(&slf).fleet_size()
    }

    #[setter]
    fn set_fleet_size(&mut self, fleet_size: Option<u32>) {
        self.fleet_size = fleet_size;
    }

    /// Number of trips using DRT
    pub fn n_drt_rides(slf: PyRef<'_, Self>) -> PyResult<usize> {
        Self::drt(&slf).n_drt_rides().map_err(to_py_err)
    }

    /// Waiting time statistics of DRT legs in minutes, None without DRT legs
    pub fn eta(slf: PyRef<'_, Self>) -> PyResult<String> {
        to_json(&Self::drt(&slf).eta().map_err(to_py_err)?)
    }

    /// Waiting time statistics of DRT legs per time bin of their start
    #[pyo3(signature = (time_interval=None))]
    pub fn eta_day(slf: PyRef<'_, Self>, time_interval: Option<Minutes>) -> PyResult<String> {
        to_json(&Self::drt(&slf).eta_day(time_interval).map_err(to_py_err)?)
    }

    /// Legs directly before and after DRT legs per mode, line and position
    #[pyo3(signature = (ruleset=None))]
    pub fn drt_intermodal_analysis(
        slf: PyRef<'_, Self>,
        ruleset: Option<&str>,
    ) -> PyResult<String> {
        to_json(&Self::drt(&slf).drt_intermodal_analysis(ruleset).map_err(to_py_err)?)
    }

    /// Passenger kilometers over vehicle kilometers of DRT vehicles
    pub fn mean_drt_occupancy(slf: PyRef<'_, Self>) -> PyResult<f64> {
        Self::drt(&slf).mean_drt_occupancy().map_err(to_py_err)
    }

    /// Pooling share of the DRT service, same value as `mean_drt_occupancy`
    pub fn pooling_share(slf: PyRef<'_, Self>) -> PyResult<f64> {
        Self::drt(&slf).pooling_share().map_err(to_py_err)
    }

    /// Share of the occupied DRT distance driven with two or more passengers
    pub fn pooled_distance_share(slf: PyRef<'_, Self>) -> PyResult<f64> {
        Self::drt(&slf).pooled_distance_share().map_err(to_py_err)
    }

    /// DRT vehicles per occupancy and time bin
    ///
    /// Parameters
    /// ----------
    /// time_interval : int, default=3600
    ///     Width of the time bins in seconds
    #[pyo3(signature = (time_interval=3600))]
    pub fn drt_occupancy_day(slf: PyRef<'_, Self>, time_interval: u32) -> PyResult<String> {
        to_json(&Self::drt(&slf).drt_occupancy_day(time_interval).map_err(to_py_err)?)
    }

    /// Leg ids with the coordinates of the start or end of DRT legs
    #[pyo3(signature = (direction="origin"))]
    pub fn drt_leg_locations(slf: PyRef<'_, Self>, direction: &str) -> PyResult<String> {
        let direction: Direction = direction.parse().map_err(to_py_err)?;
        to_json(&Self::drt(&slf).drt_leg_locations(direction).map_err(to_py_err)?)
    }

    fn __repr__(slf: PyRef<'_, Self>) -> String {
        let drt = Self::drt(&slf);
        let scenario = drt.scenario();
        match drt.fleet_size() {
            Some(fleet_size) => format!(
                "DRTScenario(code='{}', name='{}', fleet_size={fleet_size})",
                scenario.code(),
                scenario.name()
            ),
            None => format!(
                "DRTScenario(code='{}', name='{}')",
                scenario.code(),
                scenario.name()
            ),
        }
    }
}

impl PyDrtScenario {
    fn drt<'a>(slf: &'a PyRef<'_, Self>) -> DrtScenario<&'a Scenario> {
        DrtScenario::new(&slf.as_super().inner, slf.fleet_size)
    }
}
