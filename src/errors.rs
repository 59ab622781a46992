use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::Serialize;
use trippy_core::Error;

create_exception!(
    trippy,
    SchemaError,
    PyException,
    "A table has no recognized columns or no rows."
);
create_exception!(
    trippy,
    MissingDataError,
    PyException,
    "A table or column required by the method was not added to the scenario."
);
create_exception!(
    trippy,
    DataNotFoundError,
    PyException,
    "The data needed for a ratio or lookup is empty."
);
create_exception!(
    trippy,
    ScenarioNotFoundError,
    PyException,
    "No policy scenario with the requested code."
);

/// Map a core error to the matching Python exception
pub(crate) fn to_py_err(err: Error) -> PyErr {
    let message = err.to_string();
    match err {
        Error::Schema { .. } => SchemaError::new_err(message),
        Error::MissingTable(_) | Error::MissingColumn { .. } => MissingDataError::new_err(message),
        Error::DataNotFound(_) => DataNotFoundError::new_err(message),
        Error::ScenarioNotFound(_) => ScenarioNotFoundError::new_err(message),
        Error::InvalidArgument(_)
        | Error::InvalidData(_)
        | Error::CsvError(_)
        | Error::JsonError(_) => PyValueError::new_err(message),
        Error::IoError(_) => PyIOError::new_err(message),
    }
}

/// Serialize result rows as a JSON list of records
pub(crate) fn to_json<T: Serialize + ?Sized>(rows: &T) -> PyResult<String> {
    serde_json::to_string(rows).map_err(|e| {
        PyErr::new::<PyRuntimeError, _>(format!("Failed to serialize result to JSON: {e}"))
    })
}
