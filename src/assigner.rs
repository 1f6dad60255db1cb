//! Vehicle assignment by seat-capacity fit.
//!
//! Pass 1 gives every route (largest first) its best-fitting free vehicle.
//! Routes left over go through reallocation (spare vehicles, or merging two
//! routes onto one vehicle) and then rebalancing (moving passengers into
//! assigned vehicles running under half full). Whatever still has no vehicle
//! is returned unassigned, unless the caller forces inclusion with
//! [`force_include`].

use tracing::{debug, info, warn};

use crate::haversine::estimate_duration;
use crate::model::{Route, TripContext, Vehicle, VehicleType};
use crate::sequencer::{SequencerOptions, sequence};

/// Score of a vehicle too small for the route.
pub const REJECTED_FIT: f64 = -100.0;

/// Multiplier applied to vehicles of a different type than the route's hint.
pub const CROSS_TYPE_PENALTY: f64 = 0.95;

/// Assigned vehicles below this share of their seats can absorb passengers.
const UNDERUTILIZED_SHARE: f64 = 0.5;

/// How well `capacity` seats fit `needed` passengers.
///
/// Higher is better: 95-100 for near-full vehicles, down to 0 for empty
/// ones, and [`REJECTED_FIT`] when the vehicle is too small.
pub fn fit_score(capacity: u32, needed: usize) -> f64 {
    let capacity = capacity as usize;
    if capacity < needed {
        return REJECTED_FIT;
    }
    if capacity == 0 {
        return 0.0;
    }

    let utilization = needed as f64 / capacity as f64;
    if utilization > 0.85 {
        95.0 + 5.0 * utilization
    } else if utilization > 0.70 {
        80.0 + 15.0 * utilization
    } else if utilization > 0.50 {
        50.0 + 30.0 * utilization
    } else {
        50.0 * utilization
    }
}

/// Fit score including the cross-type penalty.
pub fn typed_fit_score(vehicle: &Vehicle, route_type: VehicleType, needed: usize) -> f64 {
    let score = fit_score(vehicle.seats, needed);
    if vehicle.vehicle_type() == route_type {
        score
    } else {
        score * CROSS_TYPE_PENALTY
    }
}

/// Best free vehicle for a route: same type first, other types only when no
/// same-type vehicle fits. Only non-negative scores are accepted.
fn best_fit(pool: &[Vehicle], route_type: VehicleType, needed: usize) -> Option<(usize, f64)> {
    fn consider(best: &mut Option<(usize, f64)>, index: usize, score: f64) {
        if best.is_none_or(|(_, top)| score > top) {
            *best = Some((index, score));
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, vehicle) in pool.iter().enumerate() {
        if vehicle.vehicle_type() == route_type {
            consider(&mut best, index, fit_score(vehicle.seats, needed));
        }
    }

    if best.is_none_or(|(_, top)| top < 0.0) {
        for (index, vehicle) in pool.iter().enumerate() {
            if vehicle.vehicle_type() != route_type {
                consider(&mut best, index, fit_score(vehicle.seats, needed) * CROSS_TYPE_PENALTY);
            }
        }
    }

    best.filter(|&(_, score)| score >= 0.0)
}

/// Free vehicle with the fewest spare seats that still holds `needed`.
fn closest_capacity(pool: &[Vehicle], needed: usize) -> Option<usize> {
    pool.iter()
        .enumerate()
        .filter(|(_, v)| v.seats as usize >= needed)
        .min_by_key(|(_, v)| v.seats as usize - needed)
        .map(|(index, _)| index)
}

fn attach(route: &mut Route, vehicle: Vehicle, score: f64) {
    route.vehicle = Some(vehicle);
    route.fit_score = Some(score);
}

/// Re-sequence a route whose passengers changed and recompute everything
/// derived from the sequence.
fn refresh(route: &mut Route, ctx: &TripContext, options: &SequencerOptions) {
    let passengers = std::mem::take(&mut route.passengers);
    route.passengers = sequence(ctx.start, ctx.terminal(), passengers, options);
    route.estimated_minutes = estimate_duration(ctx, &route.passengers, route.vehicle_type);
    route.api_optimized = false;
    route.solo_overflow = route.solo_overflow && route.len() == 1;
    route.fit_score = route
        .vehicle
        .as_ref()
        .map(|vehicle| typed_fit_score(vehicle, route.vehicle_type, route.len()));
    route.overloaded = route.vehicle.as_ref().is_some_and(|v| route.len() > v.seats as usize);
}

/// Attach vehicles to routes.
///
/// Returns every input passenger exactly once: assigned routes first (in
/// assignment order), then routes no pass could place, with `vehicle: None`.
pub fn assign_vehicles(
    routes: Vec<Route>,
    vehicles: &[Vehicle],
    ctx: &TripContext,
    options: &SequencerOptions,
) -> Vec<Route> {
    let mut pool: Vec<Vehicle> = vehicles.to_vec();
    pool.sort_by_key(|v| v.seats);

    let mut pending = routes;
    pending.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut assigned: Vec<Route> = Vec::with_capacity(pending.len());
    let mut unassigned: Vec<Route> = Vec::new();

    for mut route in pending {
        match best_fit(&pool, route.vehicle_type, route.len()) {
            Some((index, score)) => {
                let vehicle = pool.remove(index);
                attach(&mut route, vehicle, score);
                assigned.push(route);
            }
            None => unassigned.push(route),
        }
    }

    if !unassigned.is_empty() {
        let spare: u64 = pool.iter().map(|v| u64::from(v.seats)).sum();
        let demand: u64 = unassigned.iter().map(|r| r.len() as u64).sum();
        debug!(unassigned = unassigned.len(), spare, demand, "first pass left routes without vehicles");

        if spare >= demand {
            unassigned = reallocate(unassigned, &mut assigned, &mut pool, ctx, options);
        }
    }

    if !unassigned.is_empty() {
        unassigned = rebalance(&mut assigned, unassigned, ctx, options);
    }

    for route in &unassigned {
        warn!(passengers = route.len(), "no vehicle fits route");
    }

    fleet_utilization(&assigned);
    assigned.extend(unassigned);
    assigned
}

/// Place leftover routes on spare vehicles, or merge a leftover route with
/// another route when one vehicle can carry both.
///
/// Placed and merged routes are appended to `assigned`; the routes that
/// stay without a vehicle are returned.
fn reallocate(
    unassigned: Vec<Route>,
    assigned: &mut Vec<Route>,
    pool: &mut Vec<Vehicle>,
    ctx: &TripContext,
    options: &SequencerOptions,
) -> Vec<Route> {
    let mut stranded: Vec<Route> = Vec::new();

    for mut route in unassigned {
        // Pass 1 already took every free vehicle that fits, so this finds
        // nothing unless the pool changed in between.
        if let Some(index) = closest_capacity(pool, route.len()) {
            let vehicle = pool.remove(index);
            let score = typed_fit_score(&vehicle, route.vehicle_type, route.len());
            attach(&mut route, vehicle, score);
            assigned.push(route);
            continue;
        }

        match combine(route, &mut stranded, assigned, pool, ctx, options) {
            Ok(combined) => assigned.push(combined),
            Err(route) => stranded.push(route),
        }
    }

    stranded
}

/// Merge `route` with a partner when a single vehicle can carry both.
///
/// Partners are tried in order: routes stranded earlier in this pass (on a
/// spare vehicle), then routes already holding a vehicle with room for both.
/// Hands `route` back when no merge is possible.
fn combine(
    route: Route,
    stranded: &mut Vec<Route>,
    assigned: &mut Vec<Route>,
    pool: &mut Vec<Vehicle>,
    ctx: &TripContext,
    options: &SequencerOptions,
) -> Result<Route, Route> {
    // Stranded routes each outgrew every spare vehicle in pass 1; only the
    // assigned-partner merge below places routes after an unchanged pass 1.
    for k in 0..stranded.len() {
        let merged = route.len() + stranded[k].len();
        if let Some(index) = closest_capacity(pool, merged) {
            let other = stranded.remove(k);
            let vehicle = pool.remove(index);
            return Ok(merge(route, other, Some(vehicle), ctx, options));
        }
    }

    let partner = assigned
        .iter()
        .enumerate()
        .filter(|(_, other)| {
            other
                .vehicle
                .as_ref()
                .is_some_and(|v| v.seats as usize >= route.len() + other.len())
        })
        .min_by_key(|(_, other)| other.vehicle.as_ref().map_or(0, |v| v.seats as usize - other.len()))
        .map(|(k, _)| k);

    let Some(k) = partner else {
        return Err(route);
    };
    let mut other = assigned.remove(k);
    let vehicle = other.vehicle.take();
    Ok(merge(other, route, vehicle, ctx, options))
}

fn merge(
    first: Route,
    second: Route,
    vehicle: Option<Vehicle>,
    ctx: &TripContext,
    options: &SequencerOptions,
) -> Route {
    let mut passengers = first.passengers;
    passengers.extend(second.passengers);

    let mut combined = Route::unassigned(passengers, 0.0, first.vehicle_type);
    combined.combined = true;
    combined.vehicle = vehicle;
    refresh(&mut combined, ctx, options);

    info!(
        passengers = combined.len(),
        seats = combined.vehicle.as_ref().map_or(0, |v| v.seats),
        "combined two routes onto one vehicle"
    );
    combined
}

fn has_room(route: &Route) -> bool {
    route.vehicle.as_ref().is_some_and(|v| route.len() < v.seats as usize)
}

/// Move passengers from unassigned routes into assigned vehicles that run
/// under half full. Returns the routes that still have passengers left.
fn rebalance(
    assigned: &mut [Route],
    unassigned: Vec<Route>,
    ctx: &TripContext,
    options: &SequencerOptions,
) -> Vec<Route> {
    let targets: Vec<usize> = assigned
        .iter()
        .enumerate()
        .filter(|(_, route)| {
            route
                .vehicle
                .as_ref()
                .is_some_and(|v| (route.len() as f64) < f64::from(v.seats) * UNDERUTILIZED_SHARE)
        })
        .map(|(index, _)| index)
        .collect();

    if targets.is_empty() {
        return unassigned;
    }

    let mut touched = vec![false; assigned.len()];
    let mut remaining = Vec::with_capacity(unassigned.len());
    let mut moved = 0usize;

    for mut source in unassigned {
        let before = source.len();
        let mut kept = Vec::new();

        for passenger in std::mem::take(&mut source.passengers) {
            match targets.iter().copied().find(|&t| has_room(&assigned[t])) {
                Some(target) => {
                    assigned[target].passengers.push(passenger);
                    touched[target] = true;
                    moved += 1;
                }
                None => kept.push(passenger),
            }
        }

        source.passengers = kept;
        if source.is_empty() {
            continue;
        }
        if source.len() != before {
            refresh(&mut source, ctx, options);
        }
        remaining.push(source);
    }

    for (route, changed) in assigned.iter_mut().zip(touched) {
        if changed {
            refresh(route, ctx, options);
        }
    }

    info!(moved, still_unassigned = remaining.len(), "rebalanced passengers into underused vehicles");
    remaining
}

/// Deal the passengers of unassigned routes round-robin onto assigned
/// vehicles, largest vehicle first, ignoring seat limits.
///
/// Routes pushed past their seat count are flagged `overloaded`. When no
/// route holds a vehicle the input comes back unchanged.
pub fn force_include(routes: Vec<Route>, ctx: &TripContext, options: &SequencerOptions) -> Vec<Route> {
    let (mut assigned, unassigned): (Vec<Route>, Vec<Route>) = routes.into_iter().partition(Route::is_assigned);
    if unassigned.is_empty() || assigned.is_empty() {
        assigned.extend(unassigned);
        return assigned;
    }

    let mut order: Vec<usize> = (0..assigned.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(assigned[i].vehicle.as_ref().map_or(0, |v| v.seats)));

    let mut touched = vec![false; assigned.len()];
    let leftovers = unassigned.into_iter().flat_map(|route| route.passengers);
    let mut moved = 0usize;
    for (passenger, &target) in leftovers.zip(order.iter().cycle()) {
        assigned[target].passengers.push(passenger);
        touched[target] = true;
        moved += 1;
    }

    for (route, changed) in assigned.iter_mut().zip(touched) {
        if changed {
            refresh(route, ctx, options);
        }
    }

    let overloaded = assigned.iter().filter(|r| r.overloaded).count();
    warn!(moved, overloaded, "forced leftover passengers onto assigned vehicles");
    assigned
}

/// Share of assigned seats actually occupied, logged per vehicle.
pub fn fleet_utilization(routes: &[Route]) -> f64 {
    let mut seats = 0u64;
    let mut riders = 0u64;

    for route in routes {
        let Some(vehicle) = &route.vehicle else {
            continue;
        };
        debug!(
            vehicle = %vehicle.id,
            model = %vehicle.model,
            passengers = route.len(),
            seats = vehicle.seats,
            utilization = route.len() as f64 / f64::from(vehicle.seats.max(1)),
            "vehicle utilization"
        );
        seats += u64::from(vehicle.seats);
        riders += route.len() as u64;
    }

    let utilization = if seats == 0 { 0.0 } else { riders as f64 / seats as f64 };
    info!(utilization, passengers = riders, seats, "fleet utilization");
    utilization
}

/// Vehicles picked largest-first until everyone has a seat.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSelection {
    pub vehicles: Vec<Vehicle>,
    pub remaining_passengers: usize,
    pub total_capacity: u64,
    pub is_sufficient: bool,
}

/// Choose the fewest large vehicles that seat `total_passengers`.
pub fn select_fleet(total_passengers: usize, vehicles: &[Vehicle]) -> FleetSelection {
    let mut sorted: Vec<Vehicle> = vehicles.to_vec();
    sorted.sort_by(|a, b| b.seats.cmp(&a.seats));

    let mut selected = Vec::new();
    let mut remaining = total_passengers;
    for vehicle in sorted {
        if remaining == 0 {
            break;
        }
        remaining = remaining.saturating_sub(vehicle.seats as usize);
        selected.push(vehicle);
    }

    let total_capacity = selected.iter().map(|v| u64::from(v.seats)).sum();
    FleetSelection {
        vehicles: selected,
        remaining_passengers: remaining,
        total_capacity,
        is_sufficient: remaining == 0,
    }
}
