//! OSRM HTTP adapter for travel-cost tables.

use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::matrix::TravelCost;
use crate::place::Coordinates;
use crate::traits::{RoutingProvider, TravelMode};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub driving_profile: String,
    pub walking_profile: String,
    pub cycling_profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            driving_profile: "car".to_string(),
            walking_profile: "foot".to_string(),
            cycling_profile: "bike".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    fn profile_for(&self, mode: TravelMode) -> Option<&str> {
        match mode {
            TravelMode::Driving => Some(&self.driving_profile),
            TravelMode::Walking => Some(&self.walking_profile),
            TravelMode::Cycling => Some(&self.cycling_profile),
            // OSRM has no public-transport profile.
            TravelMode::Transit => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn table_url(&self, profile: &str, origins: &[Coordinates], destinations: &[Coordinates]) -> String {
        let coords = origins
            .iter()
            .chain(destinations)
            .map(|c| format!("{:.6},{:.6}", c.longitude, c.latitude))
            .collect::<Vec<_>>()
            .join(";");
        let sources = index_list(0..origins.len());
        let targets = index_list(origins.len()..origins.len() + destinations.len());

        format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=duration,distance",
            self.config.base_url.trim_end_matches('/'),
            profile,
            coords,
            sources,
            targets
        )
    }
}

impl RoutingProvider for OsrmClient {
    fn table(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(Vec::new());
        }
        let profile = self
            .config
            .profile_for(mode)
            .ok_or(ProviderError::UnsupportedMode(mode))?;

        let url = self.table_url(profile, origins, destinations);
        debug!(origins = origins.len(), destinations = destinations.len(), "requesting OSRM table");

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        body.into_table(origins.len(), destinations.len())
    }
}

fn index_list(range: std::ops::Range<usize>) -> String {
    range.map(|i| i.to_string()).collect::<Vec<_>>().join(";")
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_table(self, rows: usize, cols: usize) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError> {
        if self.code != "Ok" {
            return Err(ProviderError::MalformedResponse(format!(
                "OSRM returned {}: {}",
                self.code,
                self.message.unwrap_or_default()
            )));
        }
        let durations = self
            .durations
            .ok_or_else(|| ProviderError::MalformedResponse("missing durations".to_string()))?;
        let distances = self.distances.unwrap_or_default();

        if durations.len() != rows || durations.iter().any(|row| row.len() != cols) {
            return Err(ProviderError::MalformedResponse(format!(
                "expected a {}x{} table",
                rows, cols
            )));
        }

        Ok(durations
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(j, duration)| {
                        let duration = duration?;
                        let distance = distances
                            .get(i)
                            .and_then(|r| r.get(j).copied().flatten())
                            .unwrap_or(0.0);
                        Some(TravelCost::new(
                            distance.round() as u32,
                            duration.round() as u32,
                        ))
                    })
                    .collect()
            })
            .collect())
    }
}
