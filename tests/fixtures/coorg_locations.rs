//! Real Kodagu (Coorg) and Bengaluru locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Close enough to the real sites
//! that great-circle estimates and OSRM Southern Zone data agree on ordering.

#![allow(dead_code)]

use trip_planner::traits::PlaceSearchProvider;
use trip_planner::{Place, ProviderError};

/// A named attraction with coordinates and category.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub category: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, category: &'static str, lat: f64, lng: f64) -> Self {
        Self {
            name,
            category,
            lat,
            lng,
        }
    }

    pub fn to_place(&self) -> Place {
        Place::new(self.name)
            .at(self.lat, self.lng)
            .with_category(self.category)
    }
}

// ============================================================================
// Madikeri town
// ============================================================================

pub const MADIKERI: &[Location] = &[
    Location::new("Raja's Seat", "viewpoint", 12.4209, 75.7386),
    Location::new("Madikeri Fort", "fort", 12.4214, 75.7398),
    Location::new("Omkareshwara Temple", "temple", 12.4233, 75.7388),
    Location::new("Gaddige Raja's Tomb", "monument", 12.4308, 75.7475),
];

// ============================================================================
// Around Madikeri
// ============================================================================

pub const NORTH_KODAGU: &[Location] = &[
    Location::new("Abbey Falls", "waterfall", 12.4581, 75.7190),
    Location::new("Mandalpatti Viewpoint", "viewpoint", 12.5497, 75.7193),
    Location::new("Talakaveri", "religious_site", 12.3858, 75.4926),
    Location::new("Bhagamandala Temple", "temple", 12.3870, 75.5330),
];

// ============================================================================
// Kushalnagar side
// ============================================================================

pub const KUSHALNAGAR: &[Location] = &[
    Location::new("Dubare Elephant Camp", "wildlife_sanctuary", 12.3693, 75.9012),
    Location::new("Namdroling Monastery", "temple", 12.4303, 75.9664),
    Location::new("Nisargadhama", "park", 12.4986, 75.9396),
    Location::new("Harangi Dam", "lake", 12.4938, 75.9063),
    Location::new("Chiklihole Reservoir", "lake", 12.4810, 75.9250),
];

// ============================================================================
// South Kodagu
// ============================================================================

pub const SOUTH_KODAGU: &[Location] = &[
    Location::new("Iruppu Falls", "waterfall", 11.9600, 75.9850),
    Location::new("Nagarhole National Park", "national_park", 12.0500, 76.1500),
];

// ============================================================================
// Bengaluru (origin city)
// ============================================================================

pub const BENGALURU: &[Location] = &[
    Location::new("Lalbagh Botanical Garden", "garden", 12.9507, 77.5848),
    Location::new("Cubbon Park", "park", 12.9763, 77.5929),
    Location::new("Bangalore Palace", "palace", 12.9988, 77.5921),
];

/// Every Kodagu attraction, grouped by area.
pub fn all_coorg() -> Vec<Location> {
    MADIKERI
        .iter()
        .chain(NORTH_KODAGU)
        .chain(KUSHALNAGAR)
        .chain(SOUTH_KODAGU)
        .cloned()
        .collect()
}

/// Kodagu attractions interleaved across areas, so that search order is a
/// poor visiting order.
pub fn shuffled_coorg() -> Vec<Place> {
    let areas = [MADIKERI, NORTH_KODAGU, KUSHALNAGAR, SOUTH_KODAGU];
    let longest = areas.iter().map(|area| area.len()).max().unwrap_or(0);
    (0..longest)
        .flat_map(|i| areas.iter().filter_map(move |area| area.get(i)))
        .map(Location::to_place)
        .collect()
}

/// Place search that answers from the fixture tables.
pub struct FixtureSearch;

impl PlaceSearchProvider for FixtureSearch {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, ProviderError> {
        let query = query.to_lowercase();
        let pool: Vec<Location> = if query.contains("coorg") {
            all_coorg()
        } else if query.contains("bangalore") || query.contains("bengaluru") {
            BENGALURU.to_vec()
        } else {
            Vec::new()
        };
        Ok(pool.iter().take(limit).map(Location::to_place).collect())
    }
}
