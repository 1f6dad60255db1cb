//! Density-based grouping of passengers by spatial proximity.
//!
//! DBSCAN over planar distance in degrees. Points that cannot join a dense
//! group come back as singleton clusters rather than being discarded.

use std::collections::VecDeque;

use tracing::info;

use crate::model::Passenger;

/// Footprint divisor used to derive epsilon from the instance extent.
const EPSILON_DIVISOR: f64 = 50.0;
const MIN_EPSILON: f64 = 0.005;
const MAX_EPSILON: f64 = 0.02;
/// One extra required neighbor per this many passengers.
const PASSENGERS_PER_SAMPLE: usize = 25;

/// DBSCAN parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Neighborhood radius in degrees.
    pub epsilon: f64,
    /// Points (including the point itself) needed for a dense neighborhood.
    pub min_samples: usize,
}

impl ClusterParams {
    /// Derive parameters from the geographic footprint and size of the input.
    pub fn for_passengers(passengers: &[Passenger]) -> Self {
        Self {
            epsilon: auto_epsilon(passengers),
            min_samples: auto_min_samples(passengers.len()),
        }
    }
}

/// Latitude span plus longitude span, scaled and clamped.
pub fn auto_epsilon(passengers: &[Passenger]) -> f64 {
    if passengers.is_empty() {
        return MIN_EPSILON;
    }

    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in passengers {
        min_lat = min_lat.min(p.location.lat);
        max_lat = max_lat.max(p.location.lat);
        min_lng = min_lng.min(p.location.lng);
        max_lng = max_lng.max(p.location.lng);
    }

    let span = (max_lat - min_lat) + (max_lng - min_lng);
    (span / EPSILON_DIVISOR).clamp(MIN_EPSILON, MAX_EPSILON)
}

pub fn auto_min_samples(passenger_count: usize) -> usize {
    (passenger_count / PASSENGERS_PER_SAMPLE).max(1)
}

fn planar_distance(a: &Passenger, b: &Passenger) -> f64 {
    let d_lat = a.location.lat - b.location.lat;
    let d_lng = a.location.lng - b.location.lng;
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

fn neighbors(passengers: &[Passenger], index: usize, epsilon: f64) -> Vec<usize> {
    let point = &passengers[index];
    passengers
        .iter()
        .enumerate()
        .filter(|(_, other)| planar_distance(point, other) <= epsilon)
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Cluster label per input index; `None` marks noise.
fn dbscan(passengers: &[Passenger], params: ClusterParams) -> Vec<Option<usize>> {
    let min_samples = params.min_samples.max(1);
    let mut labels = vec![Label::Unvisited; passengers.len()];
    let mut next_cluster = 0;

    for index in 0..passengers.len() {
        if labels[index] != Label::Unvisited {
            continue;
        }

        let seeds = neighbors(passengers, index, params.epsilon);
        if seeds.len() < min_samples {
            labels[index] = Label::Noise;
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[index] = Label::Cluster(cluster);

        let mut queue: VecDeque<usize> = seeds.into_iter().filter(|&i| i != index).collect();
        while let Some(candidate) = queue.pop_front() {
            match labels[candidate] {
                Label::Cluster(_) => continue,
                // Border point: reachable but not dense itself.
                Label::Noise => {
                    labels[candidate] = Label::Cluster(cluster);
                    continue;
                }
                Label::Unvisited => labels[candidate] = Label::Cluster(cluster),
            }

            let reach = neighbors(passengers, candidate, params.epsilon);
            if reach.len() >= min_samples {
                queue.extend(reach.into_iter().filter(|&i| labels[i] == Label::Unvisited || labels[i] == Label::Noise));
            }
        }
    }

    labels
        .into_iter()
        .map(|label| match label {
            Label::Cluster(c) => Some(c),
            Label::Noise | Label::Unvisited => None,
        })
        .collect()
}

/// Group passengers into clusters.
///
/// Every passenger lands in exactly one non-empty cluster. Clusters are
/// ordered by the first appearance of one of their members in the input;
/// noise points become singletons at their own position.
pub fn cluster_passengers(passengers: &[Passenger], params: ClusterParams) -> Vec<Vec<Passenger>> {
    if passengers.is_empty() {
        return Vec::new();
    }

    info!(
        epsilon = params.epsilon,
        min_samples = params.min_samples,
        passengers = passengers.len(),
        "clustering passengers"
    );

    let labels = dbscan(passengers, params);
    let mut clusters: Vec<Vec<Passenger>> = Vec::new();
    let mut slot_for_label: Vec<Option<usize>> = Vec::new();

    for (passenger, label) in passengers.iter().zip(labels) {
        match label {
            Some(cluster) => {
                if slot_for_label.len() <= cluster {
                    slot_for_label.resize(cluster + 1, None);
                }
                match slot_for_label[cluster] {
                    Some(slot) => clusters[slot].push(passenger.clone()),
                    None => {
                        slot_for_label[cluster] = Some(clusters.len());
                        clusters.push(vec![passenger.clone()]);
                    }
                }
            }
            None => clusters.push(vec![passenger.clone()]),
        }
    }

    clusters
}
