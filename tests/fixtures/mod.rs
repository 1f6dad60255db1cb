//! Test fixtures for commute-planner.
//!
//! Provides realistic test data including:
//! - Campinas area locations
//! - Builders for passengers, fleets and plan requests
//! - Observers and oracles that record what the planner did

#![allow(dead_code)]

pub mod campinas_locations;

pub use campinas_locations::*;

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use commute_planner::error::OracleError;
use commute_planner::model::{AreaClass, Coordinate, LegDirection, Passenger, Route, Vehicle, VehicleType};
use commute_planner::solver::{PlanOptions, PlanRequest};
use commute_planner::traits::{OracleEstimate, PlanEvent, PlanObserver, RouteOracle};

// ============================================================================
// Builders
// ============================================================================

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::from(self.coords())
    }

    pub fn passenger(&self, id: &str) -> Passenger {
        Passenger::new(id, self.name, self.coordinate())
    }
}

/// Passengers `p0..pN` at the given locations.
pub fn passengers_at(locations: &[Location]) -> Vec<Passenger> {
    locations
        .iter()
        .enumerate()
        .map(|(i, loc)| loc.passenger(&format!("p{i}")))
        .collect()
}

/// `count` passengers on a small grid (3 per row) anchored at `origin`.
pub fn grid(prefix: &str, origin: Coordinate, count: usize, spacing: f64) -> Vec<Passenger> {
    (0..count)
        .map(|i| {
            let location = Coordinate::new(
                origin.lat + spacing * (i % 3) as f64,
                origin.lng + spacing * (i / 3) as f64,
            );
            Passenger::new(format!("{prefix}{i}"), format!("{prefix} {i}"), location)
        })
        .collect()
}

/// `count` identical vehicles.
pub fn fleet(model: &str, seats: u32, count: usize) -> Vec<Vehicle> {
    (0..count).map(|i| Vehicle::new(format!("v{i}"), model, seats)).collect()
}

/// Builder for plan requests with sensible defaults: arrival leg into Centro,
/// urban traffic, 60 minute bound, one 15-seat van.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: PlanRequest,
}

impl RequestBuilder {
    pub fn new(passengers: Vec<Passenger>) -> Self {
        let centro = COMPANY_SITES[0].coordinate();
        Self {
            request: PlanRequest {
                start: centro,
                end: Some(centro),
                passengers,
                max_duration_minutes: 60.0,
                vehicles: vec![Vehicle::new("van-1", "Mercedes Sprinter", 15)],
                leg: LegDirection::Arrival,
                area: AreaClass::Urban,
            },
        }
    }

    pub fn start(mut self, start: Coordinate) -> Self {
        self.request.start = start;
        self
    }

    pub fn end(mut self, end: Option<Coordinate>) -> Self {
        self.request.end = end;
        self
    }

    pub fn departure(mut self) -> Self {
        self.request.leg = LegDirection::Departure;
        self
    }

    pub fn area(mut self, area: AreaClass) -> Self {
        self.request.area = area;
        self
    }

    pub fn max_minutes(mut self, minutes: f64) -> Self {
        self.request.max_duration_minutes = minutes;
        self
    }

    pub fn vehicles(mut self, vehicles: Vec<Vehicle>) -> Self {
        self.request.vehicles = vehicles;
        self
    }

    pub fn build(self) -> PlanRequest {
        self.request
    }
}

/// Default options at a fixed hour so the traffic factor is known.
pub fn options_at(hour: u8) -> PlanOptions {
    PlanOptions {
        hour: Some(hour),
        ..PlanOptions::default()
    }
}

pub fn car_options_at(hour: u8) -> PlanOptions {
    PlanOptions {
        vehicle_types: vec![VehicleType::Car],
        ..options_at(hour)
    }
}

// ============================================================================
// Assertions
// ============================================================================

/// Sorted passenger ids across all routes, failing on duplicates.
pub fn routed_ids(routes: &[Route]) -> Vec<String> {
    let mut ids: Vec<String> = routes.iter().flat_map(|r| r.passenger_ids().map(str::to_string)).collect();
    let unique: BTreeSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "a passenger appears in more than one route");
    ids.sort();
    ids
}

pub fn input_ids(passengers: &[Passenger]) -> Vec<String> {
    let mut ids: Vec<String> = passengers.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    ids
}

// ============================================================================
// Observers and oracles
// ============================================================================

/// Observer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PlanEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PlanEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PlanObserver for RecordingObserver {
    fn on_event(&self, event: &PlanEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Oracle that always fails, counting how often it was asked.
#[derive(Debug, Default)]
pub struct FailingOracle {
    pub calls: AtomicUsize,
}

impl RouteOracle for FailingOracle {
    fn estimate(&self, _stops: &[Coordinate], _vehicle_type: VehicleType) -> Result<OracleEstimate, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OracleError::Status {
            code: "TooBig".to_string(),
            message: "too many coordinates".to_string(),
        })
    }
}

/// Oracle answering a fixed travel time, counting how often it was asked.
#[derive(Debug)]
pub struct FixedOracle {
    pub minutes: f64,
    pub calls: AtomicUsize,
}

impl FixedOracle {
    pub fn new(minutes: f64) -> Self {
        Self {
            minutes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteOracle for FixedOracle {
    fn estimate(&self, stops: &[Coordinate], _vehicle_type: VehicleType) -> Result<OracleEstimate, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if stops.len() < 2 {
            return Err(OracleError::TooFewStops(stops.len()));
        }
        Ok(OracleEstimate {
            duration_minutes: self.minutes,
            distance_km: 1.0,
        })
    }
}
