//! Spherical-earth helpers shared by the topology resolver and the exporters.
//!
//! Coordinates follow the GeoJSON axis order: `[lng, lat, alt?]`.

use serde::{Deserialize, Serialize};

/// Mean earth radius used by every distance in the crate (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Decimal places kept for horizontal components (~0.1 m).
pub const HORIZONTAL_PRECISION: i32 = 6;
/// Decimal places kept for altitude.
pub const ALTITUDE_PRECISION: i32 = 1;
/// Decimal places kept by the spatial hash (~1 m cells).
pub const HASH_PRECISION: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl Coordinates {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat, alt: None }
    }

    pub fn with_altitude(lng: f64, lat: f64, alt: f64) -> Self {
        Self {
            lng,
            lat,
            alt: Some(alt),
        }
    }

    /// Builds coordinates from a GeoJSON position. Missing horizontal
    /// components become `0.0`; anything past the third is ignored.
    pub fn from_position(position: &[f64]) -> Self {
        Self {
            lng: position.first().copied().unwrap_or(0.0),
            lat: position.get(1).copied().unwrap_or(0.0),
            alt: position.get(2).copied(),
        }
    }

    pub fn to_position(&self) -> Vec<f64> {
        match self.alt {
            Some(alt) => vec![self.lng, self.lat, alt],
            None => vec![self.lng, self.lat],
        }
    }

    pub fn to_point(&self) -> geo_types::Point<f64> {
        geo_types::Point::new(self.lng, self.lat)
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Great-circle distance in meters between two coordinates, rounded to 0.1 m.
/// Altitude is ignored.
pub fn distance(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    round_to(EARTH_RADIUS_M * c, 1)
}

/// Rounds horizontal components to 6 places and altitude to 1 place.
pub fn normalize_precision(coords: &Coordinates) -> Coordinates {
    Coordinates {
        lng: round_to(coords.lng, HORIZONTAL_PRECISION),
        lat: round_to(coords.lat, HORIZONTAL_PRECISION),
        alt: coords.alt.map(|alt| round_to(alt, ALTITUDE_PRECISION)),
    }
}

/// Integer cell a coordinate falls into once truncated to the hash precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpatialCell {
    pub lat: i64,
    pub lng: i64,
    pub alt: i64,
}

impl SpatialCell {
    pub fn of(coords: &Coordinates) -> Self {
        let scale = 10f64.powi(HASH_PRECISION);
        Self {
            lat: truncate_scaled(coords.lat, scale),
            lng: truncate_scaled(coords.lng, scale),
            alt: coords.alt.unwrap_or(0.0).trunc() as i64,
        }
    }

    /// The 3x3 block of horizontal cells centred on this one, self included.
    pub fn neighbourhood(&self) -> impl Iterator<Item = SpatialCell> + '_ {
        (-1..=1).flat_map(move |d_lat| {
            (-1..=1).map(move |d_lng| SpatialCell {
                lat: self.lat + d_lat,
                lng: self.lng + d_lng,
                alt: self.alt,
            })
        })
    }

    pub fn key(&self) -> String {
        let scale = 10f64.powi(HASH_PRECISION);
        format!(
            "{:.5}_{:.5}_{}",
            self.lat as f64 / scale,
            self.lng as f64 / scale,
            self.alt
        )
    }
}

// The epsilon absorbs binary representation error, e.g. 40.00001 * 1e5
// landing a hair below 4000001.
fn truncate_scaled(value: f64, scale: f64) -> i64 {
    let scaled = value * scale;
    (scaled + 1e-6 * scaled.signum()).trunc() as i64
}

/// Stable string key for approximate-equality grouping: lat and lng truncated
/// to 5 places, altitude truncated to whole meters (default 0).
pub fn spatial_hash(coords: &Coordinates) -> String {
    SpatialCell::of(coords).key()
}

/// Parses a coordinate component, falling back to `0.0` for blank or
/// unparsable text. The second value reports whether the fallback was used.
pub fn parse_component(raw: &str) -> (f64, bool) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (0.0, true);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => (v, false),
        _ => (0.0, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinates::new(-73.98, 40.75);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(-122.4194, 37.7749);
        let b = Coordinates::new(-118.2437, 34.0522);
        assert_eq!(distance(&a, &b), distance(&b, &a));
        // SF to LA is roughly 559 km
        let d = distance(&a, &b);
        assert!(d > 550_000.0 && d < 570_000.0, "got {d}");
    }

    #[test]
    fn distance_ignores_altitude_and_rounds() {
        let a = Coordinates::with_altitude(0.0, 0.0, 100.0);
        let b = Coordinates::new(0.0, 0.001);
        let d = distance(&a, &b);
        assert_eq!(d, 111.2);
        assert_eq!((d * 10.0).round(), d * 10.0);
    }

    #[test]
    fn normalize_precision_rounds_components() {
        let c = Coordinates::with_altitude(-73.123456789, 40.987654321, 12.345);
        let n = normalize_precision(&c);
        assert_eq!(n.lng, -73.123457);
        assert_eq!(n.lat, 40.987654);
        assert_eq!(n.alt, Some(12.3));

        let flat = normalize_precision(&Coordinates::new(1.0000004, 2.0));
        assert_eq!(flat.lng, 1.0);
        assert_eq!(flat.alt, None);
    }

    #[test]
    fn spatial_hash_truncates() {
        let a = Coordinates::new(-73.000011, 40.000019);
        let b = Coordinates::new(-73.000019, 40.000011);
        assert_eq!(spatial_hash(&a), spatial_hash(&b));
        assert_eq!(spatial_hash(&a), "40.00001_-73.00001_0");

        let c = Coordinates::new(-73.00003, 40.00001);
        assert_ne!(spatial_hash(&a), spatial_hash(&c));
    }

    #[test]
    fn spatial_hash_uses_whole_meter_altitude() {
        let a = Coordinates::with_altitude(1.0, 1.0, 12.9);
        let b = Coordinates::with_altitude(1.0, 1.0, 12.1);
        let c = Coordinates::with_altitude(1.0, 1.0, 13.0);
        assert_eq!(spatial_hash(&a), spatial_hash(&b));
        assert_ne!(spatial_hash(&a), spatial_hash(&c));
        assert!(spatial_hash(&Coordinates::new(1.0, 1.0)).ends_with("_0"));
    }

    #[test]
    fn neighbourhood_has_nine_cells() {
        let cell = SpatialCell::of(&Coordinates::new(0.0, 0.0));
        let cells: Vec<_> = cell.neighbourhood().collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&cell));
    }

    #[test]
    fn parse_component_defaults_to_zero() {
        assert_eq!(parse_component(" 12.5 "), (12.5, false));
        assert_eq!(parse_component(""), (0.0, true));
        assert_eq!(parse_component("north"), (0.0, true));
        assert_eq!(parse_component("NaN"), (0.0, true));
    }
}
