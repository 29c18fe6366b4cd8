//! Seams to the external collaborators of the planner.
//!
//! These are intentionally minimal. The planner core never talks to a network
//! service directly; it is handed an implementation of these traits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::matrix::TravelCost;
use crate::place::{Coordinates, Place};

/// How the traveller moves between places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
    Transit,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Transit => "transit",
        };
        f.write_str(name)
    }
}

/// Provides directed travel costs between sets of coordinates.
///
/// The returned table is indexed `[origin][destination]` in the order given.
/// A `None` cell means the provider has no route for that pair.
pub trait RoutingProvider {
    fn table(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError>;
}

/// Finds candidate places for a free-text query, e.g. "temples in Coorg".
pub trait PlaceSearchProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, ProviderError>;
}

impl<T: RoutingProvider + ?Sized> RoutingProvider for &T {
    fn table(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError> {
        (**self).table(origins, destinations, mode)
    }
}
