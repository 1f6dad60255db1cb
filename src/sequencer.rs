//! Stop ordering: exact search for small clusters, nearest-neighbor plus
//! 2-opt local search otherwise.

use crate::haversine::haversine_km;
use crate::model::{Coordinate, Passenger};

/// Exhaustive search above this many stops is never attempted.
pub const MAX_EXACT_STOPS: usize = 8;

/// Moves must shorten the path by more than this (km) to be accepted.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerOptions {
    /// Clusters up to this size are ordered by exhaustive search.
    /// Capped at [`MAX_EXACT_STOPS`].
    pub exact_threshold: usize,
    /// Maximum 2-opt improvement passes.
    pub max_two_opt_passes: usize,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            exact_threshold: 5,
            max_two_opt_passes: 100,
        }
    }
}

/// Order passengers to minimize `start -> stops [-> terminal]`.
///
/// `terminal` is `None` for departure legs, where the route ends at the last
/// stop.
pub fn sequence(
    start: Coordinate,
    terminal: Option<Coordinate>,
    passengers: Vec<Passenger>,
    options: &SequencerOptions,
) -> Vec<Passenger> {
    if passengers.len() <= 1 {
        return passengers;
    }

    if passengers.len() <= options.exact_threshold.min(MAX_EXACT_STOPS) {
        return brute_force(start, terminal, passengers);
    }

    let initial = nearest_neighbor(start, passengers);
    two_opt(start, terminal, initial, options.max_two_opt_passes)
}

/// Best ordering over every permutation.
///
/// Permutations are visited in lexicographic order of input positions and
/// only a strictly shorter path replaces the incumbent, so ties resolve to
/// the earliest ordering.
pub fn brute_force(start: Coordinate, terminal: Option<Coordinate>, passengers: Vec<Passenger>) -> Vec<Passenger> {
    if passengers.len() <= 1 {
        return passengers;
    }

    let best = {
        let mut search = ExactSearch {
            stops: &passengers,
            terminal,
            used: vec![false; passengers.len()],
            current: Vec::with_capacity(passengers.len()),
            best: None,
        };
        search.extend(start, 0.0);
        search.best
    };

    match best {
        Some((_, order)) => {
            let mut slots: Vec<Option<Passenger>> = passengers.into_iter().map(Some).collect();
            order.into_iter().filter_map(|i| slots[i].take()).collect()
        }
        None => passengers,
    }
}

struct ExactSearch<'a> {
    stops: &'a [Passenger],
    terminal: Option<Coordinate>,
    used: Vec<bool>,
    current: Vec<usize>,
    best: Option<(f64, Vec<usize>)>,
}

impl ExactSearch<'_> {
    fn extend(&mut self, at: Coordinate, so_far: f64) {
        if self.current.len() == self.stops.len() {
            let total = so_far + self.terminal.map_or(0.0, |end| haversine_km(at, end));
            let improves = self.best.as_ref().is_none_or(|(best, _)| total < *best);
            if improves {
                self.best = Some((total, self.current.clone()));
            }
            return;
        }

        for i in 0..self.stops.len() {
            if self.used[i] {
                continue;
            }
            let next = self.stops[i].location;
            self.used[i] = true;
            self.current.push(i);
            self.extend(next, so_far + haversine_km(at, next));
            self.current.pop();
            self.used[i] = false;
        }
    }
}

/// Greedy tour: repeatedly visit the closest unvisited passenger.
pub fn nearest_neighbor(start: Coordinate, passengers: Vec<Passenger>) -> Vec<Passenger> {
    let mut unvisited = passengers;
    let mut route = Vec::with_capacity(unvisited.len());
    let mut current = start;

    while !unvisited.is_empty() {
        let mut closest = 0;
        let mut min_dist = f64::INFINITY;
        for (i, candidate) in unvisited.iter().enumerate() {
            let dist = haversine_km(current, candidate.location);
            if dist < min_dist {
                min_dist = dist;
                closest = i;
            }
        }

        let next = unvisited.remove(closest);
        current = next.location;
        route.push(next);
    }

    route
}

/// 2-opt local search over an open path with fixed endpoints.
///
/// Reverses blocks `route[i..=j]` while doing so strictly shortens the
/// path. Stops after a pass without improvement or after `max_passes`.
pub fn two_opt(
    start: Coordinate,
    terminal: Option<Coordinate>,
    mut route: Vec<Passenger>,
    max_passes: usize,
) -> Vec<Passenger> {
    let n = route.len();
    if n < 2 {
        return route;
    }

    for _ in 0..max_passes {
        let mut improved = false;

        for i in 0..n - 1 {
            for j in i + 1..n {
                if reversal_gain(start, terminal, &route, i, j) > IMPROVEMENT_EPSILON {
                    route[i..=j].reverse();
                    improved = true;
                }
            }
        }

        if !improved {
            break;
        }
    }

    route
}

/// Distance saved by reversing `route[i..=j]`. Positive means shorter.
fn reversal_gain(start: Coordinate, terminal: Option<Coordinate>, route: &[Passenger], i: usize, j: usize) -> f64 {
    let before = if i == 0 { start } else { route[i - 1].location };
    let after = if j + 1 < route.len() {
        Some(route[j + 1].location)
    } else {
        terminal
    };
    let first = route[i].location;
    let last = route[j].location;

    let old = haversine_km(before, first) + after.map_or(0.0, |a| haversine_km(last, a));
    let new = haversine_km(before, last) + after.map_or(0.0, |a| haversine_km(first, a));
    old - new
}
