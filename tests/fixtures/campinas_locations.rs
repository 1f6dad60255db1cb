//! Campinas (SP) area locations for realistic test fixtures.
//!
//! Approximate neighborhood centroids, rounded to four decimal places.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Company sites (route start / destination)
// ============================================================================

pub const COMPANY_SITES: &[Location] = &[
    Location::new("Centro", -22.9056, -47.0608),
    Location::new("Unicamp", -22.8170, -47.0690),
    Location::new("Distrito Industrial", -22.9960, -47.1170),
    Location::new("Polo de Alta Tecnologia", -22.8390, -47.0480),
];

// ============================================================================
// Central neighborhoods (within a few km of Centro)
// ============================================================================

pub const CENTRAL_NEIGHBORHOODS: &[Location] = &[
    Location::new("Cambuí", -22.8936, -47.0510),
    Location::new("Nova Campinas", -22.8990, -47.0420),
    Location::new("Guanabara", -22.8900, -47.0670),
    Location::new("Bosque", -22.9060, -47.0530),
    Location::new("Bonfim", -22.8950, -47.0720),
    Location::new("Vila Industrial", -22.9130, -47.0700),
    Location::new("Jardim Proença", -22.9120, -47.0490),
    Location::new("São Bernardo", -22.9200, -47.0600),
    Location::new("Taquaral", -22.8750, -47.0560),
    Location::new("Castelo", -22.8860, -47.0760),
    Location::new("Jardim Chapadão", -22.8800, -47.0800),
    Location::new("Botafogo", -22.9000, -47.0720),
];

// ============================================================================
// Barão Geraldo (tight cluster north of the city)
// ============================================================================

pub const BARAO_GERALDO: &[Location] = &[
    Location::new("Barão Geraldo Centro", -22.8270, -47.0830),
    Location::new("Cidade Universitária", -22.8240, -47.0780),
    Location::new("Vila Santa Isabel", -22.8300, -47.0800),
    Location::new("Jardim América", -22.8260, -47.0870),
    Location::new("Real Parque", -22.8220, -47.0850),
    Location::new("Bosque de Barão", -22.8290, -47.0760),
];

// ============================================================================
// Outlying districts and neighboring towns
// ============================================================================

pub const OUTLYING: &[Location] = &[
    Location::new("Sousas", -22.8800, -46.9700),
    Location::new("Joaquim Egídio", -22.8900, -46.9300),
    Location::new("Valinhos", -22.9700, -46.9960),
    Location::new("Hortolândia", -22.8580, -47.2200),
    Location::new("Sumaré", -22.8210, -47.2670),
    Location::new("Paulínia", -22.7610, -47.1540),
    Location::new("Ouro Verde", -22.9650, -47.1250),
    Location::new("Campo Grande", -22.9000, -47.1600),
];

// ============================================================================
// All Locations Combined
// ============================================================================

/// Every residential location (company sites excluded).
pub fn all_locations() -> Vec<Location> {
    let mut all = Vec::with_capacity(32);
    all.extend_from_slice(CENTRAL_NEIGHBORHOODS);
    all.extend_from_slice(BARAO_GERALDO);
    all.extend_from_slice(OUTLYING);
    all
}

/// Returns a subset of locations for smaller tests.
pub fn sample_locations(count: usize) -> Vec<Location> {
    all_locations().into_iter().take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations_are_in_campinas_region() {
        for loc in all_locations().iter().chain(COMPANY_SITES) {
            assert!(loc.lat > -23.1 && loc.lat < -22.7, "{} lat out of range", loc.name);
            assert!(loc.lng > -47.3 && loc.lng < -46.9, "{} lng out of range", loc.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let all = all_locations();
        let mut names: Vec<&str> = all.iter().map(|l| l.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }
}
