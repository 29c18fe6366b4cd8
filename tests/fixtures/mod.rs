//! Test fixtures for trip-planner.
//!
//! Provides realistic test data including:
//! - Real Kodagu (Coorg) and Bengaluru attractions (from OpenStreetMap)
//! - A fake place search backed by those locations

pub mod coorg_locations;

pub use coorg_locations::*;
