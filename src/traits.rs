//! Seams between the planner core and its collaborators.
//!
//! A `RouteOracle` supplies authoritative travel estimates (for example an
//! OSRM server). A `PlanObserver` receives progress events so callers can
//! render progress without the core knowing about presentation.

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::model::{Coordinate, VehicleType};

/// Travel estimate for an ordered stop list, excluding dwell time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleEstimate {
    pub duration_minutes: f64,
    pub distance_km: f64,
}

/// Provides distance/duration for an ordered list of stops.
///
/// `stops` is visited in the given order; the first entry is where the
/// vehicle starts and the last is where it finishes.
pub trait RouteOracle: Send + Sync {
    fn estimate(
        &self,
        stops: &[Coordinate],
        vehicle_type: VehicleType,
    ) -> Result<OracleEstimate, OracleError>;
}

impl<O: RouteOracle + ?Sized> RouteOracle for &O {
    fn estimate(
        &self,
        stops: &[Coordinate],
        vehicle_type: VehicleType,
    ) -> Result<OracleEstimate, OracleError> {
        (**self).estimate(stops, vehicle_type)
    }
}

/// Stage of the planning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanPhase {
    Clustering,
    Sequencing,
    Assigning,
    Finished,
}

impl PlanPhase {
    pub const fn name(self) -> &'static str {
        match self {
            PlanPhase::Clustering => "clustering",
            PlanPhase::Sequencing => "sequencing",
            PlanPhase::Assigning => "assigning",
            PlanPhase::Finished => "finished",
        }
    }
}

/// Progress and diagnostics emitted while planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    PhaseStarted {
        phase: PlanPhase,
    },
    ClusterStarted {
        index: usize,
        total: usize,
        passengers: usize,
    },
    ClusterFinished {
        index: usize,
        routes: usize,
    },
    /// A passenger's own trip exceeds the duration bound; it rides alone.
    InfeasiblePassenger {
        passenger_id: String,
        estimated_minutes: f64,
    },
    /// The oracle failed for a cluster and local estimation was used.
    OracleFallback {
        cluster: usize,
        reason: String,
    },
    /// No vehicle could be found for a route after every assignment pass.
    UnassignedRoute {
        passengers: usize,
    },
}

/// Receives planning events. Events from different clusters may interleave.
pub trait PlanObserver: Sync {
    fn on_event(&self, event: &PlanEvent);
}

impl<F> PlanObserver for F
where
    F: Fn(&PlanEvent) + Sync,
{
    fn on_event(&self, event: &PlanEvent) {
        self(event)
    }
}

/// Observer that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlanObserver for NoopObserver {
    fn on_event(&self, _event: &PlanEvent) {}
}
