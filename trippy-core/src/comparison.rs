//! Comparison of policy scenarios against a base scenario

use std::collections::BTreeMap;

use hashbrown::HashMap;
use log::info;

use crate::model::TableKind;
use crate::results::ModalShiftCount;
use crate::scenario::{ModeMapper, Scenario};
use crate::Error;

const JOIN_COLUMNS: [&str; 3] = ["trip_id", "person_id", "main_mode"];

/// A base scenario and one or more policy scenarios simulated on the same population
#[derive(Debug, Clone)]
pub struct Comparison {
    base: Scenario,
    policies: Vec<Scenario>,
}

impl Comparison {
    /// # Errors
    ///
    /// Returns an error if no policy scenario is given or two share a code
    pub fn new(base: Scenario, policies: Vec<Scenario>) -> Result<Self, Error> {
        if policies.is_empty() {
            return Err(Error::InvalidArgument(
                "A comparison needs at least one policy scenario".to_string(),
            ));
        }
        for (idx, policy) in policies.iter().enumerate() {
            if policies[..idx].iter().any(|other| other.code() == policy.code()) {
                return Err(Error::InvalidArgument(format!(
                    "Policy scenario code '{}' is used more than once",
                    policy.code()
                )));
            }
        }
        Ok(Self { base, policies })
    }

    pub fn base(&self) -> &Scenario {
        &self.base
    }

    pub fn policies(&self) -> &[Scenario] {
        &self.policies
    }

    /// Policy scenario with `code`, or the first one registered
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScenarioNotFound`] for an unknown code
    pub fn policy(&self, code: Option<&str>) -> Result<&Scenario, Error> {
        match code {
            Some(code) => self
                .policies
                .iter()
                .find(|policy| policy.code() == code)
                .ok_or_else(|| Error::ScenarioNotFound(code.to_string())),
            None => {
                let policy = self
                    .policies
                    .first()
                    .ok_or_else(|| Error::ScenarioNotFound(String::new()))?;
                info!("Using scenario with code '{}'", policy.code());
                Ok(policy)
            }
        }
    }

    /// Number of trips per pair of base and policy main mode.
    ///
    /// Trips are matched on `trip_id` and `person_id`; policy trips without
    /// a match in the base scenario are dropped. Both modes are aggregated
    /// with the base scenario's ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown policy code or ruleset, or if trips
    /// or their required columns are missing in either scenario
    pub fn modal_shift(
        &self,
        policy_code: Option<&str>,
        ruleset: Option<&str>,
    ) -> Result<Vec<ModalShiftCount>, Error> {
        let policy = self.policy(policy_code)?;
        let policy_trips = policy.require(TableKind::Trips, &JOIN_COLUMNS)?;
        let base_trips = self.base.require(TableKind::Trips, &JOIN_COLUMNS)?;
        let mapper = ModeMapper::ruleset(self.base.settings(), ruleset)?;

        let base_modes: HashMap<(Option<&str>, Option<&str>), &str> = base_trips
            .str_column("trip_id")?
            .iter()
            .zip(base_trips.str_column("person_id")?)
            .zip(base_trips.str_column("main_mode")?)
            .filter_map(|((trip, person), mode)| {
                Some(((trip.as_deref(), person.as_deref()), mode.as_deref()?))
            })
            .collect();

        let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        let rows = policy_trips
            .str_column("trip_id")?
            .iter()
            .zip(policy_trips.str_column("person_id")?)
            .zip(policy_trips.str_column("main_mode")?);
        for ((trip, person), policy_mode) in rows {
            let Some(base_mode) = base_modes.get(&(trip.as_deref(), person.as_deref())) else {
                continue;
            };
            let Some(policy_mode) = policy_mode.as_deref() else {
                continue;
            };
            if let (Some(base_mode), Some(policy_mode)) =
                (mapper.map(base_mode), mapper.map(policy_mode))
            {
                *counts.entry((base_mode, policy_mode)).or_default() += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|((base_mode, policy_mode), n)| ModalShiftCount {
                base_mode: base_mode.to_string(),
                policy_mode: policy_mode.to_string(),
                n,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Settings, Table};

    fn scenario(code: &str, modes: Vec<&str>) -> Scenario {
        let settings = Settings::default()
            .with_ruleset("coarse", [("bus", "pt"), ("tram", "pt")].into_iter().collect());
        let mut scenario = Scenario::new(code).with_settings(settings).unwrap();
        let n = modes.len();
        scenario
            .add_data(
                TableKind::Trips,
                Table::new()
                    .with_column("trip_id", (0..n).map(|i| i.to_string()).collect::<Vec<_>>())
                    .unwrap()
                    .with_column("person_id", vec!["p"; n])
                    .unwrap()
                    .with_column("main_mode", modes)
                    .unwrap(),
            )
            .unwrap();
        scenario
    }

    fn comparison() -> Comparison {
        Comparison::new(
            scenario("base", vec!["car", "car", "bus", "walk"]),
            vec![
                scenario("drt", vec!["drt", "car", "tram", "walk", "drt"]),
                scenario("tram", vec!["tram", "tram", "tram", "walk"]),
            ],
        )
        .unwrap()
    }

    fn flat(rows: &[ModalShiftCount]) -> Vec<(&str, &str, usize)> {
        rows.iter()
            .map(|row| (row.base_mode.as_str(), row.policy_mode.as_str(), row.n))
            .collect()
    }

    #[test]
    fn transitions_of_first_policy() {
        let rows = comparison().modal_shift(None, None).unwrap();
        // trip 4 only exists in the policy scenario
        assert_eq!(
            flat(&rows),
            vec![
                ("bus", "tram", 1),
                ("car", "car", 1),
                ("car", "drt", 1),
                ("walk", "walk", 1),
            ]
        );
    }

    #[test]
    fn transitions_with_ruleset() {
        let rows = comparison()
            .modal_shift(Some("tram"), Some("coarse"))
            .unwrap();
        assert_eq!(
            flat(&rows),
            vec![("car", "pt", 2), ("pt", "pt", 1), ("walk", "walk", 1)]
        );
    }

    #[test]
    fn unknown_policy_code() {
        let err = comparison().modal_shift(Some("bike"), None).unwrap_err();
        assert!(matches!(err, Error::ScenarioNotFound(code) if code == "bike"));
    }

    #[test]
    fn policy_codes_must_be_unique() {
        let result = Comparison::new(
            scenario("base", vec!["car"]),
            vec![scenario("a", vec!["car"]), scenario("a", vec!["bus"])],
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
