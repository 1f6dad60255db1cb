//! Local geo metrics: great-circle distance, traffic factor and route
//! duration estimates.
//!
//! Less accurate than a road-network oracle (ignores roads) but always
//! available, so every other stage can rely on it.

use crate::error::OracleError;
use crate::model::{AreaClass, Coordinate, Passenger, TripContext, VehicleType};
use crate::traits::{OracleEstimate, RouteOracle};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Half-open hour band `[start, end)`.
#[derive(Debug, Clone, Copy)]
struct Band {
    start: u8,
    end: u8,
    factor: f64,
}

impl Band {
    const fn contains(&self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }
}

#[derive(Debug, Clone, Copy)]
struct TrafficProfile {
    morning_peak: Band,
    evening_peak: Band,
    /// Wraps midnight: applies when `hour >= start || hour < end`.
    night: Band,
    default: f64,
}

const fn profile(area: AreaClass) -> TrafficProfile {
    match area {
        AreaClass::Urban => TrafficProfile {
            morning_peak: Band { start: 7, end: 10, factor: 1.5 },
            evening_peak: Band { start: 16, end: 20, factor: 1.6 },
            night: Band { start: 22, end: 5, factor: 1.1 },
            default: 1.3,
        },
        AreaClass::Suburban => TrafficProfile {
            morning_peak: Band { start: 7, end: 9, factor: 1.4 },
            evening_peak: Band { start: 16, end: 19, factor: 1.5 },
            night: Band { start: 22, end: 5, factor: 1.05 },
            default: 1.2,
        },
        AreaClass::Rural => TrafficProfile {
            morning_peak: Band { start: 7, end: 9, factor: 1.2 },
            evening_peak: Band { start: 16, end: 19, factor: 1.3 },
            night: Band { start: 22, end: 5, factor: 1.0 },
            default: 1.1,
        },
    }
}

/// Travel-time multiplier for the given hour of day and area class.
pub fn traffic_factor(hour: u8, area: AreaClass) -> f64 {
    let hour = hour % 24;
    let profile = profile(area);

    if profile.morning_peak.contains(hour) {
        profile.morning_peak.factor
    } else if profile.evening_peak.contains(hour) {
        profile.evening_peak.factor
    } else if hour >= profile.night.start || hour < profile.night.end {
        profile.night.factor
    } else {
        profile.default
    }
}

/// Length in km of `start -> stops... [-> terminal]`.
pub fn path_distance_km(start: Coordinate, terminal: Option<Coordinate>, stops: &[Passenger]) -> f64 {
    let Some(last) = stops.last() else {
        return 0.0;
    };

    let mut total = 0.0;
    let mut prev = start;
    for stop in stops {
        total += haversine_km(prev, stop.location);
        prev = stop.location;
    }
    if let Some(end) = terminal {
        total += haversine_km(last.location, end);
    }
    total
}

/// Round to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Estimated minutes to drive the passengers in order.
///
/// Arrival legs include the final leg to the destination; departure legs end
/// at the last drop-off. Travel time is scaled by the traffic factor and each
/// stop adds the vehicle's dwell time.
pub fn estimate_duration(ctx: &TripContext, passengers: &[Passenger], vehicle_type: VehicleType) -> f64 {
    if passengers.is_empty() {
        return 0.0;
    }

    let distance_km = path_distance_km(ctx.start, ctx.terminal(), passengers);
    let travel = distance_km / vehicle_type.speed_kmh() * 60.0 * traffic_factor(ctx.hour, ctx.area);
    let dwell = passengers.len() as f64 * vehicle_type.dwell_minutes();

    round_tenth(travel + dwell)
}

/// Haversine-based `RouteOracle`.
///
/// Converts straight-line distance to minutes with the vehicle's average
/// speed, without traffic or dwell adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineEstimator;

impl RouteOracle for HaversineEstimator {
    fn estimate(
        &self,
        stops: &[Coordinate],
        vehicle_type: VehicleType,
    ) -> Result<OracleEstimate, OracleError> {
        if stops.len() < 2 {
            return Err(OracleError::TooFewStops(stops.len()));
        }

        let distance_km: f64 = stops.windows(2).map(|leg| haversine_km(leg[0], leg[1])).sum();
        let hours = distance_km / vehicle_type.speed_kmh();

        Ok(OracleEstimate {
            duration_minutes: round_tenth(hours * 60.0),
            distance_km,
        })
    }
}
