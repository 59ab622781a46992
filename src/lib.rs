use pyo3::prelude::*;
use pyo3_stub_gen::define_stub_info_gatherer;

use comparison::PyComparison;
use drt::PyDrtScenario;
use errors::{DataNotFoundError, MissingDataError, ScenarioNotFoundError, SchemaError};
use scenario::PyScenario;

pub mod comparison;
pub mod drt;
pub mod errors;
pub mod scenario;

/// KPIs of transport simulation output, implemented in Rust.
#[pymodule]
fn trippy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyScenario>()?;
    m.add_class::<PyDrtScenario>()?;
    m.add_class::<PyComparison>()?;

    let py = m.py();
    m.add("SchemaError", py.get_type::<SchemaError>())?;
    m.add("MissingDataError", py.get_type::<MissingDataError>())?;
    m.add("DataNotFoundError", py.get_type::<DataNotFoundError>())?;
    m.add("ScenarioNotFoundError", py.get_type::<ScenarioNotFoundError>())?;
    Ok(())
}

define_stub_info_gatherer!(stub_info);
