//! Error types for planning and for external duration oracles.

use thiserror::Error;

/// Input rejected before any planning work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("at least one passenger is required")]
    NoPassengers,

    #[error("at least one vehicle is required")]
    NoVehicles,

    /// A coordinate is non-finite or outside the geographic ranges.
    #[error("invalid coordinate for {what}: ({lat}, {lng})")]
    InvalidCoordinate { what: String, lat: f64, lng: f64 },

    #[error("max duration must be a positive number of minutes, got {0}")]
    NonPositiveDuration(f64),

    #[error("vehicle {vehicle_id} has no seats")]
    ZeroCapacity { vehicle_id: String },

    #[error("passenger {passenger_id} appears more than once")]
    DuplicatePassenger { passenger_id: String },

    /// Arrival legs finish at the destination, so one must be given.
    #[error("arrival legs require a destination")]
    MissingDestination,

    #[error("hour of day must be within 0..=23, got {0}")]
    InvalidHour(u8),
}

/// Failure of an external duration oracle.
///
/// The planner never surfaces these; it logs them and falls back to local
/// estimation.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing service returned {code}: {message}")]
    Status { code: String, message: String },

    #[error("routing service found no route")]
    NoRoute,

    #[error("a route needs at least two stops, got {0}")]
    TooFewStops(usize),
}
