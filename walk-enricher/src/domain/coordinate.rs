//! Geographic coordinate type.

use std::fmt;

/// Error returned when constructing a coordinate from invalid values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A latitude/longitude pair in decimal degrees.
///
/// Both components are guaranteed finite, so distance comparisons between
/// coordinates always have a total order. No range check is applied: stores
/// may hold projected or synthetic values and the routing service is the
/// authority on whether a point is reachable.
///
/// # Examples
///
/// ```
/// use walk_enricher::domain::Coordinate;
///
/// let c = Coordinate::new(51.5, -0.12).unwrap();
/// assert_eq!(c.latitude(), 51.5);
///
/// // NaN and infinities are rejected
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting NaN and infinite components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !latitude.is_finite() {
            return Err(InvalidCoordinate {
                reason: "latitude must be finite",
            });
        }
        if !longitude.is_finite() {
            return Err(InvalidCoordinate {
                reason: "longitude must be finite",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Straight-line distance to `other` on raw degree values.
    ///
    /// This is `sqrt(Δlat² + Δlon²)` with no geodesic correction, so the
    /// result is in degrees, not meters. It is only good for ranking nearby
    /// points against each other.
    pub fn planar_distance(&self, other: &Coordinate) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    /// Exact bit pattern of both components, usable as a hash key.
    pub fn to_bits(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}
