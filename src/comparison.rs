use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};
use trippy_core::prelude::*;

use crate::errors::{to_json, to_py_err};
use crate::scenario::PyScenario;

/// Comparison
///
/// A base scenario and policy scenarios simulated on the same population.
/// The scenarios are copied, later changes to them are not reflected.
#[gen_stub_pyclass]
#[pyclass(name = "Comparison")]
pub struct PyComparison {
    inner: Comparison,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyComparison {
    #[new]
    pub fn new(
        base: PyRef<'_, PyScenario>,
        policies: Vec<PyRef<'_, PyScenario>>,
    ) -> PyResult<Self> {
        let policies = policies
            .iter()
            .map(|policy| policy.inner.clone())
            .collect();
        let inner = Comparison::new(base.inner.clone(), policies).map_err(to_py_err)?;
        Ok(PyComparison { inner })
    }

    #[getter]
    fn base_code(&self) -> &str {
        self.inner.base().code()
    }

    #[getter]
    fn policy_codes(&self) -> Vec<String> {
        self.inner
            .policies()
            .iter()
            .map(|policy| policy.code().to_string())
            .collect()
    }

    /// Trips per pair of base and policy main mode.
    ///
    /// Parameters
    /// ----------
    /// policy_code : str, optional
    ///     Code of the policy scenario, the first one if None
    /// ruleset : str, optional
    ///     Mode aggregation ruleset of the base scenario's settings
    ///
    /// Raises
    /// ------
    /// ScenarioNotFoundError
    ///     If no policy scenario has this code
    #[pyo3(signature = (policy_code=None, ruleset=None))]
    pub fn modal_shift(
        &self,
        policy_code: Option<&str>,
        ruleset: Option<&str>,
    ) -> PyResult<String> {
        to_json(
            &self
                .inner
                .modal_shift(policy_code, ruleset)
                .map_err(to_py_err)?,
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "Comparison(base='{}', policies={:?})",
            self.base_code(),
            self.policy_codes()
        )
    }
}
