//! Value types shared by every planning stage.
//!
//! Passengers and vehicles come from upstream (already geocoded); routes are
//! produced by the splitter and finalized by the assigner.

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the geographic ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// A person to be picked up (arrival leg) or dropped off (departure leg).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
}

impl Passenger {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
        }
    }
}

/// Vehicle class used for speed, dwell time and fit scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Van,
    Bus,
    Truck,
    Motorcycle,
    Other,
}

impl VehicleType {
    /// Average speed in km/h.
    pub const fn speed_kmh(self) -> f64 {
        match self {
            VehicleType::Car => 40.0,
            VehicleType::Van => 35.0,
            VehicleType::Bus => 30.0,
            VehicleType::Truck => 25.0,
            VehicleType::Motorcycle => 45.0,
            VehicleType::Other => 35.0,
        }
    }

    /// Minutes spent at each stop boarding or alighting.
    pub const fn dwell_minutes(self) -> f64 {
        match self {
            VehicleType::Car => 1.0,
            VehicleType::Van => 1.5,
            VehicleType::Bus => 2.5,
            VehicleType::Truck => 2.0,
            VehicleType::Motorcycle => 0.5,
            VehicleType::Other => 1.0,
        }
    }

    /// Parse an operator-supplied type hint such as `"van"`.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_lowercase().as_str() {
            "car" => VehicleType::Car,
            "van" => VehicleType::Van,
            "bus" => VehicleType::Bus,
            "truck" => VehicleType::Truck,
            "motorcycle" | "moto" => VehicleType::Motorcycle,
            _ => VehicleType::Other,
        }
    }

    /// Classify a vehicle by keywords in its model string.
    ///
    /// Anything unrecognised is treated as a car.
    pub fn from_model(model: &str) -> Self {
        const BUS: &[&str] = &["bus", "ônibus", "onibus"];
        const VAN: &[&str] = &["van", "sprint", "ducato", "boxer", "kombi"];
        const TRUCK: &[&str] = &["truck", "caminhão", "caminhao"];
        const MOTORCYCLE: &[&str] = &["moto", "motorcycle"];

        let model = model.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| model.contains(k));

        if has_any(BUS) {
            VehicleType::Bus
        } else if has_any(VAN) {
            VehicleType::Van
        } else if has_any(TRUCK) {
            VehicleType::Truck
        } else if has_any(MOTORCYCLE) {
            VehicleType::Motorcycle
        } else {
            VehicleType::Car
        }
    }
}

/// A fleet vehicle. Read-only input; the planner only records assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub model: String,
    pub seats: u32,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, model: impl Into<String>, seats: u32) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            seats,
        }
    }

    pub fn vehicle_type(&self) -> VehicleType {
        VehicleType::from_model(&self.model)
    }
}

/// Coarse traffic-density class driving the traffic multiplier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaClass {
    #[default]
    Urban,
    Suburban,
    Rural,
}

/// Whether a route ends at the destination or starts at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegDirection {
    /// Collect passengers and finish at the destination.
    #[default]
    Arrival,
    /// Leave the origin and finish at the last drop-off.
    Departure,
}

/// Per-request parameters shared by every estimate made during one plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    pub start: Coordinate,
    pub end: Option<Coordinate>,
    pub leg: LegDirection,
    pub area: AreaClass,
    /// Hour of day (0..=23) used for the traffic factor.
    pub hour: u8,
}

impl TripContext {
    /// Point the route must finish at, if any.
    pub fn terminal(&self) -> Option<Coordinate> {
        match self.leg {
            LegDirection::Arrival => self.end,
            LegDirection::Departure => None,
        }
    }
}

/// A stop-ordered route, optionally carrying its assigned vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub passengers: Vec<Passenger>,
    pub estimated_minutes: f64,
    /// Vehicle class the route was planned for.
    pub vehicle_type: VehicleType,
    pub vehicle: Option<Vehicle>,
    pub fit_score: Option<f64>,
    /// Built by merging two routes during reallocation.
    pub combined: bool,
    /// Duration came from an external oracle rather than local estimation.
    pub api_optimized: bool,
    /// Single passenger whose own trip already exceeds the duration bound.
    pub solo_overflow: bool,
    /// Carries more passengers than its vehicle has seats (forced inclusion).
    #[serde(default)]
    pub overloaded: bool,
}

impl Route {
    pub fn unassigned(passengers: Vec<Passenger>, estimated_minutes: f64, vehicle_type: VehicleType) -> Self {
        Self {
            passengers,
            estimated_minutes,
            vehicle_type,
            vehicle: None,
            fit_score: None,
            combined: false,
            api_optimized: false,
            solo_overflow: false,
            overloaded: false,
        }
    }

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    pub fn is_assigned(&self) -> bool {
        self.vehicle.is_some()
    }

    pub fn passenger_ids(&self) -> impl Iterator<Item = &str> {
        self.passengers.iter().map(|p| p.id.as_str())
    }
}
