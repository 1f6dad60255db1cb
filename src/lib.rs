//! commute-planner core
//!
//! Groups commuters into vehicle routes that respect a maximum trip
//! duration, then matches routes to a heterogeneous fleet by seat count.

pub mod model;
pub mod error;
pub mod traits;
pub mod haversine;
pub mod cluster;
pub mod sequencer;
pub mod splitter;
pub mod assigner;
pub mod solver;
pub mod osrm;
pub mod rate_limit;
pub mod cache;

pub use error::{OracleError, PlanError};
pub use model::{AreaClass, Coordinate, LegDirection, Passenger, Route, TripContext, Vehicle, VehicleType};
pub use solver::{PlanOptions, PlanRequest, Planner, plan_routes};
