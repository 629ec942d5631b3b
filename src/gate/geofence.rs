use std::collections::HashSet;

use tracing::debug;

use crate::error::ZoneError;
use crate::model::{Coordinate, ProximityMatch, Zone};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Finds the nearest configured zone within the permitted radius.
#[derive(Debug, Clone)]
pub struct GeofenceResolver {
    zones: Vec<Zone>,
    radius_meters: f64,
}

impl GeofenceResolver {
    /// Zones keep their configuration order; it breaks distance ties.
    pub fn new(zones: Vec<Zone>, radius_meters: f64) -> Result<Self, ZoneError> {
        let mut seen = HashSet::new();
        for zone in &zones {
            if !zone.coordinate().is_valid() {
                return Err(ZoneError::InvalidCoordinate(zone.name.clone()));
            }
            if !seen.insert(zone.name.as_str()) {
                return Err(ZoneError::DuplicateName(zone.name.clone()));
            }
        }

        Ok(Self {
            zones,
            radius_meters,
        })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// `None` when no zone is within the radius or the input is not a
    /// usable coordinate.
    pub fn resolve(&self, at: Coordinate) -> Option<ProximityMatch> {
        if !at.is_valid() {
            debug!("Rejected non-geographic coordinate");
            return None;
        }

        let mut best: Option<(&Zone, f64)> = None;
        for zone in &self.zones {
            let distance = haversine_distance(at, zone.coordinate());
            if distance > self.radius_meters {
                continue;
            }
            // strict: the earlier zone wins a tie
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((zone, distance));
            }
        }

        best.map(|(zone, distance_meters)| ProximityMatch {
            zone: zone.clone(),
            distance_meters,
        })
    }
}
