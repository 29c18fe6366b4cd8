//! Planner configuration.
//!
//! Everything here is loaded once, up front, and then only borrowed by the
//! pipeline stages. Defaults are built in; a JSON document may override any
//! subset of fields.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{PlannerError, ProviderError};
use crate::matrix::MatrixOptions;
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::schedule::ScheduleConfig;
use crate::solver::SolveOptions;
use crate::travel_impact::TravelImpactTables;

/// How many candidate places a trip of a given length should consider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaceLimits {
    pub short_trip_days: u32,
    pub short_trip_places: usize,
    pub medium_trip_days: u32,
    pub medium_trip_places: usize,
    pub long_trip_places: usize,
}

impl Default for PlaceLimits {
    fn default() -> Self {
        Self {
            short_trip_days: 2,
            short_trip_places: 5,
            medium_trip_days: 5,
            medium_trip_places: 10,
            long_trip_places: 15,
        }
    }
}

impl PlaceLimits {
    pub fn max_places(&self, days: u32) -> usize {
        if days <= self.short_trip_days {
            self.short_trip_places
        } else if days <= self.medium_trip_days {
            self.medium_trip_places
        } else {
            self.long_trip_places
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub routing: MatrixOptions,
    pub osrm: OsrmConfig,
    pub solver: SolveOptions,
    pub schedule: ScheduleConfig,
    pub travel_impact: TravelImpactTables,
    pub place_limits: PlaceLimits,
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PlannerError> {
        let config: PlannerConfig =
            serde_json::from_str(json).map_err(|err| PlannerError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| PlannerError::Config(format!("{}: {}", path.display(), err)))?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "planner configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.routing.max_batch_origins == 0 {
            return Err(PlannerError::Config(
                "routing.max_batch_origins must be positive".to_string(),
            ));
        }
        if self.schedule.lunch_window_start >= self.schedule.lunch_window_end {
            return Err(PlannerError::Config(
                "schedule lunch window must start before it ends".to_string(),
            ));
        }
        let penalty = self.solver.penalty_factor;
        if penalty.is_nan() || penalty < 0.0 {
            return Err(PlannerError::Config(
                "solver.penalty_factor must be non-negative".to_string(),
            ));
        }
        let limits = &self.place_limits;
        for (name, places) in [
            ("short_trip_places", limits.short_trip_places),
            ("medium_trip_places", limits.medium_trip_places),
            ("long_trip_places", limits.long_trip_places),
        ] {
            if places == 0 {
                return Err(PlannerError::Config(format!(
                    "place_limits.{} must allow at least one place",
                    name
                )));
            }
        }
        Ok(())
    }

    /// OSRM routing provider for the `osrm` section.
    pub fn osrm_client(&self) -> Result<OsrmClient, PlannerError> {
        OsrmClient::new(self.osrm.clone()).map_err(|err| PlannerError::from(ProviderError::Http(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schedule::ClockTime;
    use crate::traits::TravelMode;

    #[test]
    fn empty_document_gives_defaults() {
        let config = PlannerConfig::from_json_str("{}").unwrap();
        assert_eq!(config.solver.exact_threshold, 12);
        assert_eq!(config.schedule.dwell_for(Some("museum")), 120);
        assert_eq!(config.routing.mode, TravelMode::Driving);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = PlannerConfig::from_json_str(
            r#"{
                "routing": {"mode": "walking"},
                "solver": {"time_limit_ms": 250},
                "schedule": {"day_start": "09:30", "dwell_minutes": {"temple": 20}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.routing.mode, TravelMode::Walking);
        assert_eq!(config.routing.max_batch_origins, 25);
        assert_eq!(config.solver.time_limit_ms, 250);
        assert_eq!(config.solver.max_iterations, 1_000);
        assert_eq!(config.schedule.day_start, ClockTime::from_hm(9, 30));
        assert_eq!(config.schedule.dwell_for(Some("temple")), 20);
        assert_eq!(config.schedule.dwell_for(Some("museum")), 75);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = PlannerConfig::from_json_str(r#"{"routing": {"max_batch_origins": 0}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = PlannerConfig::from_json_str(r#"{"schedule": {"day_start": "noon"}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn every_place_limit_must_be_positive() {
        for section in [
            r#"{"place_limits": {"short_trip_places": 0}}"#,
            r#"{"place_limits": {"medium_trip_places": 0}}"#,
            r#"{"place_limits": {"long_trip_places": 0}}"#,
        ] {
            let err = PlannerConfig::from_json_str(section).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{}", section);
        }
    }

    #[test]
    fn osrm_section_configures_the_client() {
        let config = PlannerConfig::from_json_str(
            r#"{"osrm": {"base_url": "http://osrm.internal:5001", "driving_profile": "driving", "timeout_secs": 3}}"#,
        )
        .unwrap();

        let client = config.osrm_client().unwrap();

        assert_eq!(client.config().base_url, "http://osrm.internal:5001");
        assert_eq!(client.config().driving_profile, "driving");
        assert_eq!(client.config().walking_profile, "foot");
        assert_eq!(client.config().timeout_secs, 3);
    }

    #[test]
    fn place_limits_follow_trip_length() {
        let limits = PlaceLimits::default();
        assert_eq!(limits.max_places(1), 5);
        assert_eq!(limits.max_places(2), 5);
        assert_eq!(limits.max_places(4), 10);
        assert_eq!(limits.max_places(9), 15);
    }
}
