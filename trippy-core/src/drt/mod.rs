//! Analysis of demand responsive transport (DRT)
//!
//! The queries are free functions over a [`Scenario`] so that any scenario
//! can be analysed. [`DrtScenario`] bundles a scenario with the fleet size and
//! exposes the same queries as methods. It either owns the scenario or
//! borrows one that lives elsewhere, e.g. `DrtScenario<&Scenario>`.

mod intermodal;
mod occupancy;
mod rides;

use std::borrow::{Borrow, BorrowMut};
use std::ops::{Deref, DerefMut};

pub use intermodal::drt_intermodal_analysis;
pub use occupancy::{drt_occupancy_day, mean_drt_occupancy, pooled_distance_share, pooling_share};
pub use rides::{drt_leg_locations, eta, eta_day, n_drt_rides};

use crate::algo::DescriptiveStats;
use crate::results::{IntermodalCount, LegLocation, OccupancyCount, TimeBinStats};
use crate::scenario::{Direction, Scenario};
use crate::{Error, Minutes};

/// Scenario with a DRT service
#[derive(Debug, Clone)]
pub struct DrtScenario<S = Scenario> {
    scenario: S,
    fleet_size: Option<u32>,
}

impl<S: Borrow<Scenario>> DrtScenario<S> {
    pub fn new(scenario: S, fleet_size: Option<u32>) -> Self {
        Self {
            scenario,
            fleet_size,
        }
    }

    pub fn fleet_size(&self) -> Option<u32> {
        self.fleet_size
    }

    pub fn set_fleet_size(&mut self, fleet_size: Option<u32>) {
        self.fleet_size = fleet_size;
    }

    pub fn scenario(&self) -> &Scenario {
        self.scenario.borrow()
    }

    pub fn into_scenario(self) -> S {
        self.scenario
    }

    /// # Errors
    ///
    /// See [`n_drt_rides`]
    pub fn n_drt_rides(&self) -> Result<usize, Error> {
        n_drt_rides(self.scenario())
    }

    /// # Errors
    ///
    /// See [`eta`]
    pub fn eta(&self) -> Result<Option<DescriptiveStats>, Error> {
        eta(self.scenario())
    }

    /// # Errors
    ///
    /// See [`eta_day`]
    pub fn eta_day(&self, time_interval: Option<Minutes>) -> Result<Vec<TimeBinStats>, Error> {
        eta_day(self.scenario(), time_interval)
    }

    /// # Errors
    ///
    /// See [`drt_intermodal_analysis`]
    pub fn drt_intermodal_analysis(
        &self,
        ruleset: Option<&str>,
    ) -> Result<Vec<IntermodalCount>, Error> {
        drt_intermodal_analysis(self.scenario(), ruleset)
    }

    /// # Errors
    ///
    /// See [`mean_drt_occupancy`]
    pub fn mean_drt_occupancy(&self) -> Result<f64, Error> {
        mean_drt_occupancy(self.scenario())
    }

    /// # Errors
    ///
    /// See [`pooling_share`]
    pub fn pooling_share(&self) -> Result<f64, Error> {
        pooling_share(self.scenario())
    }

    /// # Errors
    ///
    /// See [`pooled_distance_share`]
    pub fn pooled_distance_share(&self) -> Result<f64, Error> {
        pooled_distance_share(self.scenario())
    }

    /// # Errors
    ///
    /// See [`drt_occupancy_day`]
    pub fn drt_occupancy_day(&self, time_interval: u32) -> Result<Vec<OccupancyCount>, Error> {
        drt_occupancy_day(self.scenario(), time_interval)
    }

    /// # Errors
    ///
    /// See [`drt_leg_locations`]
    pub fn drt_leg_locations(&self, direction: Direction) -> Result<Vec<LegLocation>, Error> {
        drt_leg_locations(self.scenario(), direction)
    }
}

impl From<Scenario> for DrtScenario {
    fn from(scenario: Scenario) -> Self {
        Self::new(scenario, None)
    }
}

impl<S: Borrow<Scenario>> Deref for DrtScenario<S> {
    type Target = Scenario;

    fn deref(&self) -> &Self::Target {
        self.scenario.borrow()
    }
}

impl<S: BorrowMut<Scenario>> DerefMut for DrtScenario<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scenario.borrow_mut()
    }
}
