//! End-to-end planning pipeline.
//!
//! travel impact → effective days → place selection → cost matrix → route →
//! daily schedule. Each stage is a pure function of its inputs plus the
//! routing provider; nothing is shared between requests.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::matrix::{CostMatrix, DistanceMatrixBuilder, TravelCost};
use crate::place::{Place, partition_located};
use crate::schedule::{ClockTime, DailyScheduler, ItinerarySchedule, travel_legs_from_matrix};
use crate::solver::{Route, RouteOutcome, solve_route};
use crate::traits::{PlaceSearchProvider, RoutingProvider};
use crate::travel_impact::{TravelClass, TravelImpact, TravelImpactEstimator, effective_days};

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub origin: Option<String>,
    pub destination: String,
    pub total_days: u32,
    #[serde(default)]
    pub theme: Option<String>,
    /// Index into the located, capped place list where the route starts.
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: Option<usize>,
    #[serde(default)]
    pub start_time: Option<ClockTime>,
}

impl PlanRequest {
    pub fn new(destination: impl Into<String>, total_days: u32) -> Self {
        Self {
            origin: None,
            destination: destination.into(),
            total_days,
            theme: None,
            start_index: 0,
            end_index: None,
            start_time: None,
        }
    }

    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn search_query(&self) -> String {
        let theme = self.theme.as_deref().unwrap_or("tourist attractions");
        format!("{} in {}", theme, self.destination)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub travel_impact: TravelImpact,
    pub effective_days: u32,
    /// Places in visiting order.
    pub places: Vec<Place>,
    /// `None` when the solver found no route and input order was kept.
    pub route: Option<Route>,
    pub optimized: bool,
    /// Places left out: no coordinates, or beyond the trip's place limit.
    pub skipped: Vec<Place>,
    pub schedule: ItinerarySchedule,
}

pub struct Planner<'a, P> {
    config: &'a PlannerConfig,
    matrix_builder: DistanceMatrixBuilder<P>,
}

impl<'a, P> Planner<'a, P>
where
    P: RoutingProvider + Sync,
{
    pub fn new(config: &'a PlannerConfig, provider: P) -> Self {
        Self {
            config,
            matrix_builder: DistanceMatrixBuilder::new(provider, config.routing.clone()),
        }
    }

    fn travel_impact(&self, request: &PlanRequest) -> TravelImpact {
        match &request.origin {
            Some(origin) => TravelImpactEstimator::new(&self.config.travel_impact)
                .assess(origin, &request.destination),
            None => TravelImpact {
                days: 0,
                class: TravelClass::MissingEndpoint,
            },
        }
    }

    /// Look up candidate places with `search`, then [`plan`](Self::plan).
    pub fn plan_with_search<S>(&self, request: &PlanRequest, search: &S) -> Result<TripPlan, PlannerError>
    where
        S: PlaceSearchProvider + ?Sized,
    {
        let impact = self.travel_impact(request);
        let days = effective_days(request.total_days, impact.days);
        let limit = self.config.place_limits.max_places(days);
        let places = search.search(&request.search_query(), limit)?;
        self.plan(request, places)
    }

    #[instrument(skip_all, fields(destination = %request.destination, days = request.total_days))]
    pub fn plan(&self, request: &PlanRequest, places: Vec<Place>) -> Result<TripPlan, PlannerError> {
        if request.total_days == 0 {
            return Err(PlannerError::input("trip must last at least one day"));
        }

        let travel_impact = self.travel_impact(request);
        let days = effective_days(request.total_days, travel_impact.days);

        let (mut located, mut skipped) = partition_located(places);
        if !skipped.is_empty() {
            warn!(count = skipped.len(), "dropping places without coordinates");
        }
        let limit = self.config.place_limits.max_places(days);
        if located.len() > limit {
            skipped.extend(located.split_off(limit));
        }
        if located.is_empty() {
            return Err(PlannerError::scheduling("no located places to plan"));
        }
        if request.start_index >= located.len() {
            return Err(PlannerError::input(format!(
                "start index {} out of range for {} places",
                request.start_index,
                located.len()
            )));
        }

        let matrix = if located.len() == 1 {
            CostMatrix::from_rows(vec![vec![TravelCost::ZERO]])?
        } else {
            self.matrix_builder.build(&located)?
        };

        let outcome = solve_route(&matrix, request.start_index, request.end_index, &self.config.solver)?;
        let (ordered, route, legs) = match outcome {
            RouteOutcome::Solved(route) => {
                let ordered: Vec<Place> = route.order.iter().map(|&i| located[i].clone()).collect();
                let legs = travel_legs_from_matrix(&matrix, &route.order);
                (ordered, Some(route), legs)
            }
            RouteOutcome::NoRoute => {
                warn!("no feasible route; keeping search order");
                let identity: Vec<usize> = (0..located.len()).collect();
                let legs = travel_legs_from_matrix(&matrix, &identity);
                (located, None, legs)
            }
        };

        let schedule = DailyScheduler::new(&self.config.schedule).create_daily_schedule(
            &ordered,
            days,
            request.start_time,
            Some(legs.as_slice()),
        )?;

        let optimized = route.is_some();
        info!(
            places = ordered.len(),
            effective_days = days,
            optimized,
            "trip planned"
        );

        Ok(TripPlan {
            travel_impact,
            effective_days: days,
            places: ordered,
            route,
            optimized,
            skipped,
            schedule,
        })
    }
}
