//! Cuts an ordered passenger list into routes that respect a duration bound.

use tracing::warn;

use crate::haversine::estimate_duration;
use crate::model::{Passenger, Route, TripContext, VehicleType};

/// Greedily split `ordered` into unassigned routes.
///
/// Passengers are appended in order while the re-estimated duration stays
/// within `max_minutes`; the first passenger that does not fit closes the
/// current route and opens the next one. A passenger whose own trip already
/// exceeds the bound rides alone in a route flagged `solo_overflow`.
pub fn split_by_duration(
    ctx: &TripContext,
    ordered: Vec<Passenger>,
    max_minutes: f64,
    vehicle_type: VehicleType,
) -> Vec<Route> {
    let mut routes = Vec::new();
    let mut current: Vec<Passenger> = Vec::new();
    let mut current_minutes = 0.0;

    for passenger in ordered {
        current.push(passenger);
        let extended = estimate_duration(ctx, &current, vehicle_type);
        if extended <= max_minutes {
            current_minutes = extended;
            continue;
        }

        // Does not fit: take it back out and start a fresh route with it.
        let Some(passenger) = current.pop() else {
            continue;
        };
        if !current.is_empty() {
            routes.push(Route::unassigned(std::mem::take(&mut current), current_minutes, vehicle_type));
        }

        let solo = std::slice::from_ref(&passenger);
        let solo_minutes = estimate_duration(ctx, solo, vehicle_type);
        if solo_minutes > max_minutes {
            warn!(
                passenger = %passenger.id,
                estimated_minutes = solo_minutes,
                max_minutes,
                "passenger exceeds duration bound on their own, routing alone"
            );
            let mut overflow = Route::unassigned(vec![passenger], solo_minutes, vehicle_type);
            overflow.solo_overflow = true;
            routes.push(overflow);
        } else {
            current.push(passenger);
            current_minutes = solo_minutes;
        }
    }

    if !current.is_empty() {
        routes.push(Route::unassigned(current, current_minutes, vehicle_type));
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AreaClass, Coordinate, LegDirection};

    fn ctx(leg: LegDirection) -> TripContext {
        TripContext {
            start: Coordinate::new(0.0, 0.0),
            end: Some(Coordinate::new(0.0, 0.0)),
            leg,
            area: AreaClass::Rural,
            hour: 23,
        }
    }

    fn line(count: usize, spacing: f64) -> Vec<Passenger> {
        (0..count)
            .map(|i| Passenger::new(format!("p{i}"), "", Coordinate::new(0.0, spacing * (i + 1) as f64)))
            .collect()
    }

    #[test]
    fn test_everything_fits_in_one_route() {
        let routes = split_by_duration(&ctx(LegDirection::Arrival), line(4, 0.001), 60.0, VehicleType::Car);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 4);
        assert!(!routes[0].solo_overflow);
        assert!(routes[0].vehicle.is_none());
    }

    #[test]
    fn test_splits_preserve_order_and_bound() {
        let ordered = line(12, 0.01);
        let routes = split_by_duration(&ctx(LegDirection::Arrival), ordered.clone(), 15.0, VehicleType::Car);

        assert!(routes.len() > 1);
        let flattened: Vec<&Passenger> = routes.iter().flat_map(|r| r.passengers.iter()).collect();
        assert_eq!(flattened, ordered.iter().collect::<Vec<_>>());

        for route in &routes {
            assert!(route.estimated_minutes <= 15.0 || (route.len() == 1 && route.solo_overflow));
            let recomputed = estimate_duration(&ctx(LegDirection::Arrival), &route.passengers, VehicleType::Car);
            assert_eq!(route.estimated_minutes, recomputed);
        }
    }

    #[test]
    fn test_far_passenger_rides_alone() {
        let mut ordered = line(2, 0.001);
        ordered.insert(1, Passenger::new("far", "", Coordinate::new(0.0, 1.0)));

        let routes = split_by_duration(&ctx(LegDirection::Departure), ordered, 20.0, VehicleType::Car);
        let ids: Vec<Vec<&str>> = routes.iter().map(|r| r.passenger_ids().collect()).collect();

        assert_eq!(ids, vec![vec!["p0"], vec!["far"], vec!["p1"]]);
        assert!(routes[1].solo_overflow);
        assert!(routes[1].estimated_minutes > 20.0);
        assert!(!routes[0].solo_overflow && !routes[2].solo_overflow);
    }

    #[test]
    fn test_empty_input_yields_no_routes() {
        let routes = split_by_duration(&ctx(LegDirection::Arrival), Vec::new(), 30.0, VehicleType::Car);
        assert!(routes.is_empty());
    }
}
