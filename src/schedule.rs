//! Day-by-day visit scheduling.
//!
//! Takes places already in visiting order and lays them out over the trip:
//! meals at fixed points of the day, a travel buffer between consecutive
//! places, and a dwell time per place looked up by category.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument, warn};

use crate::error::PlannerError;
use crate::matrix::CostMatrix;
use crate::place::Place;

/// Wall-clock time of day as minutes past midnight.
///
/// Values may run past 24:00 when a day overruns; they still order
/// correctly but print modulo 24 hours, so check
/// [`ClockTime::is_past_midnight`] (or [`DaySchedule::overruns_midnight`])
/// before trusting the printed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const fn from_hm(hour: u32, minute: u32) -> Self {
        Self(hour * 60 + minute)
    }

    /// Parse `HH:MM` (24-hour).
    pub fn parse(input: &str) -> Result<Self, PlannerError> {
        let time = jiff::civil::Time::strptime("%H:%M", input.trim())
            .map_err(|err| PlannerError::input(format!("invalid time '{}': {}", input, err)))?;
        Ok(Self::from_hm(time.hour() as u32, time.minute() as u32))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0 + minutes)
    }

    pub fn is_past_midnight(&self) -> bool {
        self.0 >= 24 * 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", (self.0 / 60) % 24, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl Meal {
    pub fn label(&self) -> &'static str {
        match self {
            Meal::Breakfast => "Breakfast",
            Meal::Lunch => "Lunch",
            Meal::Snack => "Evening Snack",
            Meal::Dinner => "Dinner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Meal { meal: Meal },
    Travel { destination: String },
    Sightseeing { place: Place },
}

/// One entry on a day's timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub time: ClockTime,
    pub label: String,
    pub duration_minutes: u32,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

impl Activity {
    pub fn end(&self) -> ClockTime {
        self.time.plus_minutes(self.duration_minutes)
    }

    pub fn place(&self) -> Option<&Place> {
        match &self.kind {
            ActivityKind::Sightseeing { place } => Some(place),
            _ => None,
        }
    }

    pub fn is_meal(&self) -> bool {
        matches!(self.kind, ActivityKind::Meal { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    /// 1-based.
    pub day: u32,
    pub activities: Vec<Activity>,
    pub total_places: usize,
    pub total_travel_minutes: u32,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    /// The day ends at or after midnight; `end_time` and late activity times
    /// print wrapped.
    pub overruns_midnight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItinerarySchedule {
    pub total_days: u32,
    pub total_places_scheduled: usize,
    pub days: Vec<DaySchedule>,
}

/// Meal lengths, day anchors, and the dwell-time table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub day_start: ClockTime,
    pub breakfast_minutes: u32,
    pub lunch_minutes: u32,
    pub snack_minutes: u32,
    pub dinner_minutes: u32,
    /// Lunch is taken the first time the clock is in `[start, end)`.
    pub lunch_window_start: ClockTime,
    pub lunch_window_end: ClockTime,
    pub snack_after: ClockTime,
    pub dinner_not_before: ClockTime,
    /// Used between consecutive places when no leg time is known.
    pub default_travel_minutes: u32,
    pub default_dwell_minutes: u32,
    /// Dwell minutes keyed by lowercase category.
    pub dwell_minutes: HashMap<String, u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let dwell_minutes = [
            ("temple", 45),
            ("church", 30),
            ("mosque", 30),
            ("religious_site", 45),
            ("museum", 120),
            ("historical_site", 90),
            ("monument", 60),
            ("palace", 120),
            ("fort", 90),
            ("viewpoint", 45),
            ("scenic_spot", 60),
            ("waterfall", 90),
            ("lake", 60),
            ("park", 75),
            ("garden", 60),
            ("hill_station", 120),
            ("wildlife_sanctuary", 180),
            ("national_park", 240),
            ("beach", 120),
            ("market", 60),
            ("shopping", 90),
            ("restaurant", 90),
            ("cafe", 45),
            ("resort", 60),
            ("hotel", 30),
        ]
        .into_iter()
        .map(|(category, minutes)| (category.to_string(), minutes))
        .collect();

        Self {
            day_start: ClockTime::from_hm(8, 0),
            breakfast_minutes: 45,
            lunch_minutes: 60,
            snack_minutes: 30,
            dinner_minutes: 75,
            lunch_window_start: ClockTime::from_hm(12, 0),
            lunch_window_end: ClockTime::from_hm(14, 0),
            snack_after: ClockTime::from_hm(16, 0),
            dinner_not_before: ClockTime::from_hm(19, 30),
            default_travel_minutes: 30,
            default_dwell_minutes: 75,
            dwell_minutes,
        }
    }
}

impl ScheduleConfig {
    /// Dwell time for a category; matching ignores case and treats spaces
    /// and dashes as underscores.
    pub fn dwell_for(&self, category: Option<&str>) -> u32 {
        category
            .map(|raw| raw.trim().to_lowercase().replace([' ', '-'], "_"))
            .and_then(|key| self.dwell_minutes.get(&key).copied())
            .unwrap_or(self.default_dwell_minutes)
    }

    fn in_lunch_window(&self, clock: ClockTime) -> bool {
        clock >= self.lunch_window_start && clock < self.lunch_window_end
    }
}

/// Per-leg travel minutes along `order`, rounded up. Unreachable legs are
/// `None` so the scheduler falls back to its default buffer.
pub fn travel_legs_from_matrix(matrix: &CostMatrix, order: &[usize]) -> Vec<Option<u32>> {
    order
        .windows(2)
        .map(|leg| {
            let cost = matrix.get(leg[0], leg[1]);
            cost.is_reachable()
                .then(|| cost.duration_seconds.div_ceil(60))
        })
        .collect()
}

/// Lays out an ordered route over the trip's days.
#[derive(Debug, Clone, Copy)]
pub struct DailyScheduler<'a> {
    config: &'a ScheduleConfig,
}

impl<'a> DailyScheduler<'a> {
    pub fn new(config: &'a ScheduleConfig) -> Self {
        Self { config }
    }

    /// Schedule `route` over `total_days` days.
    ///
    /// `travel_legs[k]` is the travel time in minutes from `route[k]` to
    /// `route[k + 1]`. The first `route.len() % total_days` days take one
    /// extra place.
    #[instrument(skip_all, fields(places = route.len(), total_days = total_days))]
    pub fn create_daily_schedule(
        &self,
        route: &[Place],
        total_days: u32,
        start_time: Option<ClockTime>,
        travel_legs: Option<&[Option<u32>]>,
    ) -> Result<ItinerarySchedule, PlannerError> {
        if route.is_empty() {
            return Err(PlannerError::scheduling("no places in the route"));
        }
        if total_days == 0 {
            return Err(PlannerError::scheduling("trip must last at least one day"));
        }

        let start = start_time.unwrap_or(self.config.day_start);
        let days = total_days as usize;
        let base = route.len() / days;
        let extra = route.len() % days;

        let mut cursor = 0;
        let mut schedules = Vec::with_capacity(days);
        for day in 1..=total_days {
            let count = base + usize::from((day as usize) <= extra);
            let assigned = &route[cursor..cursor + count];
            schedules.push(self.lay_out_day(day, assigned, cursor, start, travel_legs));
            cursor += count;
        }

        debug!(scheduled = cursor, "schedule created");
        Ok(ItinerarySchedule {
            total_days,
            total_places_scheduled: cursor,
            days: schedules,
        })
    }

    fn lay_out_day(
        &self,
        day: u32,
        places: &[Place],
        first_index: usize,
        start: ClockTime,
        travel_legs: Option<&[Option<u32>]>,
    ) -> DaySchedule {
        let config = self.config;
        let mut timeline = Timeline::new(start);
        let mut lunch_taken = false;

        timeline.meal(Meal::Breakfast, config.breakfast_minutes);

        for (offset, place) in places.iter().enumerate() {
            if offset > 0 {
                let leg = first_index + offset - 1;
                let minutes = travel_legs
                    .and_then(|legs| legs.get(leg).copied().flatten())
                    .unwrap_or(config.default_travel_minutes);
                timeline.push(
                    format!("Travel to {}", place.name),
                    minutes,
                    ActivityKind::Travel {
                        destination: place.name.clone(),
                    },
                );
                timeline.travel_minutes += minutes;
            }

            if !lunch_taken && config.in_lunch_window(timeline.clock) {
                timeline.meal(Meal::Lunch, config.lunch_minutes);
                lunch_taken = true;
            }

            timeline.push(
                format!("Visit {}", place.name),
                config.dwell_for(place.category.as_deref()),
                ActivityKind::Sightseeing {
                    place: place.clone(),
                },
            );
        }

        if timeline.clock >= config.snack_after {
            timeline.meal(Meal::Snack, config.snack_minutes);
        }

        timeline.clock = timeline.clock.max(config.dinner_not_before);
        timeline.meal(Meal::Dinner, config.dinner_minutes);

        let overruns_midnight = timeline.clock.is_past_midnight();
        if overruns_midnight {
            warn!(day, end_minutes = timeline.clock.minutes(), "day runs past midnight");
        }

        DaySchedule {
            day,
            total_places: places.len(),
            total_travel_minutes: timeline.travel_minutes,
            start_time: start,
            end_time: timeline.clock,
            overruns_midnight,
            activities: timeline.activities,
        }
    }
}

struct Timeline {
    clock: ClockTime,
    travel_minutes: u32,
    activities: Vec<Activity>,
}

impl Timeline {
    fn new(start: ClockTime) -> Self {
        Self {
            clock: start,
            travel_minutes: 0,
            activities: Vec::new(),
        }
    }

    fn push(&mut self, label: String, duration_minutes: u32, kind: ActivityKind) {
        self.activities.push(Activity {
            time: self.clock,
            label,
            duration_minutes,
            kind,
        });
        self.clock = self.clock.plus_minutes(duration_minutes);
    }

    fn meal(&mut self, meal: Meal, duration_minutes: u32) {
        self.push(meal.label().to_string(), duration_minutes, ActivityKind::Meal { meal });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_parses_and_prints() {
        let t = ClockTime::parse("08:05").unwrap();
        assert_eq!(t.minutes(), 8 * 60 + 5);
        assert_eq!(t.to_string(), "08:05");
        assert_eq!(t.plus_minutes(16 * 60).to_string(), "00:05");
        assert!(!t.is_past_midnight());
        assert!(t.plus_minutes(16 * 60).is_past_midnight());
        assert!(!ClockTime::from_hm(23, 59).is_past_midnight());
    }

    #[test]
    fn clock_rejects_garbage() {
        assert!(ClockTime::parse("8 o'clock").is_err());
        assert!("25:00".parse::<ClockTime>().is_err());
    }

    #[test]
    fn clock_serializes_as_string() {
        let json = serde_json::to_string(&ClockTime::from_hm(19, 30)).unwrap();
        assert_eq!(json, "\"19:30\"");
        let back: ClockTime = serde_json::from_str("\"07:45\"").unwrap();
        assert_eq!(back, ClockTime::from_hm(7, 45));
    }

    #[test]
    fn dwell_lookup_normalises_category() {
        let config = ScheduleConfig::default();
        assert_eq!(config.dwell_for(Some("Museum")), 120);
        assert_eq!(config.dwell_for(Some("national park")), 240);
        assert_eq!(config.dwell_for(Some("attraction")), 75);
        assert_eq!(config.dwell_for(None), 75);
    }

    #[test]
    fn legs_from_matrix_round_up_and_skip_unreachable() {
        let matrix = CostMatrix::from_durations(&[
            vec![Some(0), Some(61), None],
            vec![Some(30), Some(0), None],
            vec![Some(5), Some(5), Some(0)],
        ])
        .unwrap();
        assert_eq!(travel_legs_from_matrix(&matrix, &[0, 1, 2]), vec![Some(2), None]);
    }

    #[test]
    fn sightseeing_serializes_with_type_tag() {
        let activity = Activity {
            time: ClockTime::from_hm(9, 0),
            label: "Visit Abbey Falls".to_string(),
            duration_minutes: 90,
            kind: ActivityKind::Sightseeing {
                place: Place::new("Abbey Falls").with_category("waterfall"),
            },
        };
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["type"], "sightseeing");
        assert_eq!(value["time"], "09:00");
        assert_eq!(value["place"]["name"], "Abbey Falls");
    }
}
