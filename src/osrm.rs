//! OSRM HTTP adapter for multi-stop route durations.

use serde::Deserialize;
use tracing::debug;

use crate::error::OracleError;
use crate::model::{Coordinate, VehicleType};
use crate::traits::{OracleEstimate, RouteOracle};

/// Road profile family requested from the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelMode {
    Drive,
    Truck,
    Motorcycle,
}

impl From<VehicleType> for TravelMode {
    fn from(vehicle_type: VehicleType) -> Self {
        match vehicle_type {
            VehicleType::Truck => TravelMode::Truck,
            VehicleType::Motorcycle => TravelMode::Motorcycle,
            VehicleType::Car | VehicleType::Van | VehicleType::Bus | VehicleType::Other => TravelMode::Drive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// Profile used for [`TravelMode::Drive`] and as the fallback.
    pub profile: String,
    pub truck_profile: Option<String>,
    pub motorcycle_profile: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            truck_profile: None,
            motorcycle_profile: None,
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Defaults overridden by `OSRM_BASE_URL`, `OSRM_PROFILE` and
    /// `OSRM_TIMEOUT_SECS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OSRM_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(profile) = std::env::var("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Some(secs) = std::env::var("OSRM_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }
        config
    }

    pub fn profile_for(&self, mode: TravelMode) -> &str {
        let specific = match mode {
            TravelMode::Drive => None,
            TravelMode::Truck => self.truck_profile.as_deref(),
            TravelMode::Motorcycle => self.motorcycle_profile.as_deref(),
        };
        specific.unwrap_or(&self.profile)
    }

    fn route_url(&self, stops: &[Coordinate], mode: TravelMode) -> String {
        let coords = stops
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=false",
            self.base_url,
            self.profile_for(mode),
            coords
        )
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }
}

impl RouteOracle for OsrmClient {
    fn estimate(&self, stops: &[Coordinate], vehicle_type: VehicleType) -> Result<OracleEstimate, OracleError> {
        if stops.len() < 2 {
            return Err(OracleError::TooFewStops(stops.len()));
        }

        let url = self.config.route_url(stops, TravelMode::from(vehicle_type));
        debug!(stops = stops.len(), %url, "requesting OSRM route");

        // OSRM reports "NoRoute" and friends with a 400 and a JSON body, so
        // the body is parsed before looking at the status.
        let body: OsrmRouteResponse = self.client.get(url).send()?.json()?;
        body.into_estimate()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Seconds.
    duration: f64,
    /// Meters.
    distance: f64,
}

impl OsrmRouteResponse {
    fn into_estimate(self) -> Result<OracleEstimate, OracleError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" => return Err(OracleError::NoRoute),
            _ => {
                return Err(OracleError::Status {
                    code: self.code,
                    message: self.message.unwrap_or_default(),
                });
            }
        }

        let route = self.routes.into_iter().next().ok_or(OracleError::NoRoute)?;
        Ok(OracleEstimate {
            duration_minutes: route.duration / 60.0,
            distance_km: route.distance / 1000.0,
        })
    }
}
