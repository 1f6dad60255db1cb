//! Planning orchestrator.
//!
//! Validates a request, clusters passengers, sequences and splits each
//! cluster (in parallel), then hands every route to the vehicle assigner.

use std::collections::HashSet;

use chrono::Timelike;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assigner::{assign_vehicles, force_include, select_fleet};
use crate::cluster::{ClusterParams, cluster_passengers};
use crate::error::PlanError;
use crate::haversine::{estimate_duration, round_tenth};
use crate::model::{AreaClass, Coordinate, LegDirection, Passenger, Route, TripContext, Vehicle, VehicleType};
use crate::sequencer::{SequencerOptions, sequence};
use crate::splitter::split_by_duration;
use crate::traits::{NoopObserver, PlanEvent, PlanObserver, PlanPhase, RouteOracle};

/// One planning request: who rides, with what, and for which leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Origin of every route (the company on departure legs).
    pub start: Coordinate,
    /// Fixed destination. Required for arrival legs, ignored for departures.
    pub end: Option<Coordinate>,
    pub passengers: Vec<Passenger>,
    pub max_duration_minutes: f64,
    pub vehicles: Vec<Vehicle>,
    pub leg: LegDirection,
    pub area: AreaClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Vehicle-type hints, used round-robin per cluster. Empty means car.
    pub vehicle_types: Vec<VehicleType>,
    /// Hour of day for the traffic factor. `None` reads the local clock.
    pub hour: Option<u8>,
    pub sequencer: SequencerOptions,
    /// Fixed clustering parameters instead of the automatic ones.
    pub cluster: Option<ClusterParams>,
    /// Overload assigned vehicles rather than leave passengers without one.
    pub force_include_all: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            vehicle_types: vec![VehicleType::Car],
            hour: None,
            sequencer: SequencerOptions::default(),
            cluster: None,
            force_include_all: false,
        }
    }
}

/// Plan routes with default options, no oracle and no observer.
pub fn plan_routes(request: &PlanRequest) -> Result<Vec<Route>, PlanError> {
    Planner::new(PlanOptions::default()).plan(request)
}

pub struct Planner<'a> {
    options: PlanOptions,
    oracle: Option<&'a dyn RouteOracle>,
    observer: &'a dyn PlanObserver,
}

impl<'a> Planner<'a> {
    pub fn new(options: PlanOptions) -> Self {
        Self {
            options,
            oracle: None,
            observer: &NoopObserver,
        }
    }

    /// Ask `oracle` for multi-stop cluster durations before falling back to
    /// local estimation.
    pub fn with_oracle(mut self, oracle: &'a dyn RouteOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn PlanObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Run the full pipeline.
    ///
    /// Only invalid input is an error. Passengers who cannot meet the bound
    /// and routes no vehicle fits come back as flagged routes.
    pub fn plan(&self, request: &PlanRequest) -> Result<Vec<Route>, PlanError> {
        validate(request)?;
        let hour = self.resolve_hour()?;

        let ctx = TripContext {
            start: request.start,
            end: request.end,
            leg: request.leg,
            area: request.area,
            hour,
        };

        let fleet = select_fleet(request.passengers.len(), &request.vehicles);
        if !fleet.is_sufficient {
            warn!(
                passengers = request.passengers.len(),
                capacity = fleet.total_capacity,
                short_by = fleet.remaining_passengers,
                "fleet cannot seat every passenger"
            );
        }

        self.emit(PlanEvent::PhaseStarted { phase: PlanPhase::Clustering });
        let params = self
            .options
            .cluster
            .unwrap_or_else(|| ClusterParams::for_passengers(&request.passengers));
        let clusters = cluster_passengers(&request.passengers, params);
        info!(clusters = clusters.len(), passengers = request.passengers.len(), "clustered passengers");

        self.emit(PlanEvent::PhaseStarted { phase: PlanPhase::Sequencing });
        let vehicle_types: &[VehicleType] = if self.options.vehicle_types.is_empty() {
            &[VehicleType::Car]
        } else {
            &self.options.vehicle_types
        };
        let total = clusters.len();
        let max_minutes = request.max_duration_minutes;

        let per_cluster: Vec<Vec<Route>> = clusters
            .into_par_iter()
            .enumerate()
            .map(|(index, cluster)| {
                let vehicle_type = vehicle_types[index % vehicle_types.len()];
                self.plan_cluster(&ctx, index, total, cluster, vehicle_type, max_minutes)
            })
            .collect();
        let routes: Vec<Route> = per_cluster.into_iter().flatten().collect();

        self.emit(PlanEvent::PhaseStarted { phase: PlanPhase::Assigning });
        let mut routes = assign_vehicles(routes, &request.vehicles, &ctx, &self.options.sequencer);
        if self.options.force_include_all {
            routes = force_include(routes, &ctx, &self.options.sequencer);
        }
        for route in routes.iter().filter(|r| !r.is_assigned()) {
            self.emit(PlanEvent::UnassignedRoute { passengers: route.len() });
        }

        routes.sort_by(|a, b| b.estimated_minutes.total_cmp(&a.estimated_minutes));

        info!(
            routes = routes.len(),
            unassigned = routes.iter().filter(|r| !r.is_assigned()).count(),
            longest_minutes = routes.first().map_or(0.0, |r| r.estimated_minutes),
            "planning finished"
        );
        self.emit(PlanEvent::PhaseStarted { phase: PlanPhase::Finished });

        Ok(routes)
    }

    fn emit(&self, event: PlanEvent) {
        self.observer.on_event(&event);
    }

    fn resolve_hour(&self) -> Result<u8, PlanError> {
        match self.options.hour {
            Some(hour) if hour > 23 => Err(PlanError::InvalidHour(hour)),
            Some(hour) => Ok(hour),
            None => Ok(chrono::Local::now().hour() as u8),
        }
    }

    fn plan_cluster(
        &self,
        ctx: &TripContext,
        index: usize,
        total: usize,
        cluster: Vec<Passenger>,
        vehicle_type: VehicleType,
        max_minutes: f64,
    ) -> Vec<Route> {
        self.emit(PlanEvent::ClusterStarted {
            index,
            total,
            passengers: cluster.len(),
        });

        let ordered = sequence(ctx.start, ctx.terminal(), cluster, &self.options.sequencer);

        let routes = match self.oracle_minutes(ctx, index, &ordered, vehicle_type) {
            Some(minutes) if minutes <= max_minutes => {
                let mut route = Route::unassigned(ordered, minutes, vehicle_type);
                route.api_optimized = true;
                vec![route]
            }
            oracle => {
                if let Some(minutes) = oracle {
                    debug!(cluster = index, minutes, max_minutes, "oracle duration over bound, splitting locally");
                }
                let minutes = estimate_duration(ctx, &ordered, vehicle_type);
                if minutes <= max_minutes {
                    vec![Route::unassigned(ordered, minutes, vehicle_type)]
                } else {
                    split_by_duration(ctx, ordered, max_minutes, vehicle_type)
                }
            }
        };

        for route in routes.iter().filter(|r| r.solo_overflow) {
            for passenger in &route.passengers {
                self.emit(PlanEvent::InfeasiblePassenger {
                    passenger_id: passenger.id.clone(),
                    estimated_minutes: route.estimated_minutes,
                });
            }
        }

        self.emit(PlanEvent::ClusterFinished {
            index,
            routes: routes.len(),
        });
        routes
    }

    /// Oracle travel time plus local dwell time, or `None` when no oracle is
    /// configured, the cluster is a single stop, or the oracle failed.
    fn oracle_minutes(
        &self,
        ctx: &TripContext,
        index: usize,
        ordered: &[Passenger],
        vehicle_type: VehicleType,
    ) -> Option<f64> {
        let oracle = self.oracle?;
        if ordered.len() < 2 {
            return None;
        }

        let mut stops = Vec::with_capacity(ordered.len() + 2);
        stops.push(ctx.start);
        stops.extend(ordered.iter().map(|p| p.location));
        stops.extend(ctx.terminal());

        match oracle.estimate(&stops, vehicle_type) {
            Ok(estimate) => {
                let dwell = ordered.len() as f64 * vehicle_type.dwell_minutes();
                Some(round_tenth(estimate.duration_minutes + dwell))
            }
            Err(err) => {
                warn!(cluster = index, error = %err, "route oracle failed, using local estimate");
                self.emit(PlanEvent::OracleFallback {
                    cluster: index,
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

fn check_coordinate(what: impl Into<String>, point: Coordinate) -> Result<(), PlanError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate {
            what: what.into(),
            lat: point.lat,
            lng: point.lng,
        })
    }
}

fn validate(request: &PlanRequest) -> Result<(), PlanError> {
    if request.passengers.is_empty() {
        return Err(PlanError::NoPassengers);
    }

    check_coordinate("start", request.start)?;
    if let Some(end) = request.end {
        check_coordinate("destination", end)?;
    }
    if request.leg == LegDirection::Arrival && request.end.is_none() {
        return Err(PlanError::MissingDestination);
    }

    let mut seen = HashSet::with_capacity(request.passengers.len());
    for passenger in &request.passengers {
        check_coordinate(format!("passenger {}", passenger.id), passenger.location)?;
        if !seen.insert(passenger.id.as_str()) {
            return Err(PlanError::DuplicatePassenger {
                passenger_id: passenger.id.clone(),
            });
        }
    }

    let max = request.max_duration_minutes;
    if !(max.is_finite() && max > 0.0) {
        return Err(PlanError::NonPositiveDuration(max));
    }

    if request.vehicles.is_empty() {
        return Err(PlanError::NoVehicles);
    }
    if let Some(vehicle) = request.vehicles.iter().find(|v| v.seats == 0) {
        return Err(PlanError::ZeroCapacity {
            vehicle_id: vehicle.id.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            start: Coordinate::new(-22.90, -47.06),
            end: Some(Coordinate::new(-22.90, -47.06)),
            passengers: vec![
                Passenger::new("p1", "Ana", Coordinate::new(-22.901, -47.050)),
                Passenger::new("p2", "Bruno", Coordinate::new(-22.902, -47.051)),
                Passenger::new("p3", "Carla", Coordinate::new(-22.903, -47.052)),
            ],
            max_duration_minutes: 60.0,
            vehicles: vec![Vehicle::new("v1", "Onix", 4)],
            leg: LegDirection::Arrival,
            area: AreaClass::Urban,
        }
    }

    fn noon() -> PlanOptions {
        PlanOptions {
            hour: Some(12),
            ..PlanOptions::default()
        }
    }

    #[test]
    fn test_rejects_empty_passengers() {
        let mut req = request();
        req.passengers.clear();
        assert_eq!(validate(&req), Err(PlanError::NoPassengers));
    }

    #[test]
    fn test_rejects_empty_vehicles() {
        let mut req = request();
        req.vehicles.clear();
        assert_eq!(validate(&req), Err(PlanError::NoVehicles));
    }

    #[test]
    fn test_rejects_bad_duration() {
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut req = request();
            req.max_duration_minutes = bad;
            assert!(matches!(validate(&req), Err(PlanError::NonPositiveDuration(_))));
        }
    }

    #[test]
    fn test_rejects_non_finite_coordinate() {
        let mut req = request();
        req.passengers[1].location = Coordinate::new(f64::NAN, -47.0);
        match validate(&req) {
            Err(PlanError::InvalidCoordinate { what, .. }) => assert_eq!(what, "passenger p2"),
            other => panic!("expected InvalidCoordinate, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut req = request();
        req.passengers[2].id = "p1".to_string();
        assert_eq!(
            validate(&req),
            Err(PlanError::DuplicatePassenger {
                passenger_id: "p1".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_zero_seat_vehicle() {
        let mut req = request();
        req.vehicles.push(Vehicle::new("broken", "Onix", 0));
        assert_eq!(
            validate(&req),
            Err(PlanError::ZeroCapacity {
                vehicle_id: "broken".to_string()
            })
        );
    }

    #[test]
    fn test_arrival_requires_destination() {
        let mut req = request();
        req.end = None;
        assert_eq!(validate(&req), Err(PlanError::MissingDestination));

        req.leg = LegDirection::Departure;
        assert_eq!(validate(&req), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_hour() {
        let planner = Planner::new(PlanOptions {
            hour: Some(24),
            ..PlanOptions::default()
        });
        assert_eq!(planner.plan(&request()), Err(PlanError::InvalidHour(24)));
    }

    #[test]
    fn test_small_request_single_route() {
        let routes = Planner::new(noon()).plan(&request()).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 3);
        assert_eq!(routes[0].vehicle.as_ref().map(|v| v.id.as_str()), Some("v1"));
        assert!(!routes[0].api_optimized);
    }

    #[test]
    fn test_empty_type_hints_default_to_car() {
        let options = PlanOptions {
            vehicle_types: Vec::new(),
            ..noon()
        };
        let routes = Planner::new(options).plan(&request()).unwrap();
        assert!(routes.iter().all(|r| r.vehicle_type == VehicleType::Car));
    }

    #[test]
    fn test_default_options() {
        let planner = Planner::new(PlanOptions::default());
        let options = planner.options();
        assert_eq!(options.vehicle_types, vec![VehicleType::Car]);
        assert_eq!(options.hour, None);
        assert_eq!(options.sequencer, SequencerOptions::default());
        assert!(options.cluster.is_none());
        assert!(!options.force_include_all);
    }
}
