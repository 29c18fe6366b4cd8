//! trip-planner core
//!
//! Route optimisation and scheduling for multi-day itineraries: cost matrix,
//! fixed-endpoint path solver, daily scheduler, and travel-impact estimate.

pub mod config;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod osrm;
pub mod place;
pub mod planner;
pub mod schedule;
pub mod solver;
pub mod traits;
pub mod travel_impact;

pub use config::PlannerConfig;
pub use error::{ErrorKind, PlannerError, ProviderError};
pub use matrix::{CostMatrix, DistanceMatrixBuilder, MatrixOptions, TravelCost};
pub use place::{Coordinates, Place};
pub use planner::{PlanRequest, Planner, TripPlan};
pub use schedule::{ClockTime, DailyScheduler, ItinerarySchedule};
pub use solver::{Route, RouteOutcome, SolveOptions, solve_route};
pub use travel_impact::TravelImpactEstimator;
