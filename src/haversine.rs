//! Haversine routing provider (fallback when no road network is available).
//!
//! Uses great-circle distance and an assumed speed per travel mode.
//! Less accurate than OSRM (ignores roads) but always available.

use crate::error::ProviderError;
use crate::matrix::TravelCost;
use crate::place::Coordinates;
use crate::traits::{RoutingProvider, TravelMode};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based routing provider.
///
/// Estimates travel time using straight-line distance and an assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    pub driving_kmh: f64,
    pub walking_kmh: f64,
    pub cycling_kmh: f64,
    pub transit_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            driving_kmh: 40.0,
            walking_kmh: 5.0,
            cycling_kmh: 15.0,
            transit_kmh: 25.0,
        }
    }
}

impl HaversineMatrix {
    /// Same speed for every mode.
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            driving_kmh: speed_kmh,
            walking_kmh: speed_kmh,
            cycling_kmh: speed_kmh,
            transit_kmh: speed_kmh,
        }
    }

    fn speed_for(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Driving => self.driving_kmh,
            TravelMode::Walking => self.walking_kmh,
            TravelMode::Cycling => self.cycling_kmh,
            TravelMode::Transit => self.transit_kmh,
        }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
        let lat1_rad = from.latitude.to_radians();
        let lat2_rad = to.latitude.to_radians();
        let delta_lat = (to.latitude - from.latitude).to_radians();
        let delta_lng = (to.longitude - from.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(km: f64, speed_kmh: f64) -> u32 {
        let hours = km / speed_kmh;
        (hours * 3600.0).round() as u32
    }

    fn cost(&self, from: Coordinates, to: Coordinates, mode: TravelMode) -> TravelCost {
        let km = Self::haversine_km(from, to);
        TravelCost::new(
            (km * 1000.0).round() as u32,
            Self::km_to_seconds(km, self.speed_for(mode)),
        )
    }
}

impl RoutingProvider for HaversineMatrix {
    fn table(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Option<TravelCost>>>, ProviderError> {
        let speed = self.speed_for(mode);
        if speed.is_nan() || speed <= 0.0 {
            return Err(ProviderError::UnsupportedMode(mode));
        }

        Ok(origins
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| Some(self.cost(*from, *to, mode)))
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng)
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineMatrix::haversine_km(point(12.42, 75.74), point(12.42, 75.74));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bengaluru (12.97, 77.59) to Mysuru (12.30, 76.64)
        // Actual distance ~127 km
        let dist = HaversineMatrix::haversine_km(point(12.97, 77.59), point(12.30, 76.64));
        assert!(dist > 115.0 && dist < 140.0, "Bengaluru to Mysuru should be ~127km, got {}", dist);
    }

    #[test]
    fn test_table_diagonal_is_zero() {
        let provider = HaversineMatrix::default();
        let locations = vec![point(12.1, 75.1), point(12.2, 75.2), point(12.3, 75.3)];
        let table = provider.table(&locations, &locations, TravelMode::Driving).unwrap();

        for i in 0..locations.len() {
            assert_eq!(table[i][i], Some(TravelCost::ZERO), "Diagonal should be zero");
        }
    }

    #[test]
    fn test_table_symmetric() {
        let provider = HaversineMatrix::default();
        let locations = vec![point(12.1, 75.1), point(12.2, 75.2)];
        let table = provider.table(&locations, &locations, TravelMode::Driving).unwrap();

        // Haversine is symmetric
        assert_eq!(table[0][1], table[1][0], "Matrix should be symmetric");
    }

    #[test]
    fn test_reasonable_travel_time() {
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert_eq!(HaversineMatrix::km_to_seconds(10.0, 40.0), 900);
    }

    #[test]
    fn test_walking_is_slower_than_driving() {
        let provider = HaversineMatrix::default();
        let locations = vec![point(12.1, 75.1), point(12.2, 75.2)];
        let drive = provider.table(&locations, &locations, TravelMode::Driving).unwrap();
        let walk = provider.table(&locations, &locations, TravelMode::Walking).unwrap();
        let (drive, walk) = (drive[0][1].unwrap(), walk[0][1].unwrap());
        assert_eq!(drive.distance_meters, walk.distance_meters);
        assert!(walk.duration_seconds > drive.duration_seconds);
    }

    #[test]
    fn test_zero_speed_is_unsupported() {
        let provider = HaversineMatrix {
            transit_kmh: 0.0,
            ..HaversineMatrix::default()
        };
        let locations = vec![point(12.1, 75.1)];
        assert!(provider.table(&locations, &locations, TravelMode::Transit).is_err());
    }
}
