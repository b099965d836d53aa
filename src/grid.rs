//! Deterministic 50m grid index over a Web-Mercator projection.
//!
//! [`cell_of`] is the single source of truth for "where" throughout the
//! library: dwell accumulation, score keys and path simplification all derive
//! their cell keys from it.
//!
//! ## Algorithm Notes
//!
//! Coordinates are projected with the spherical Web-Mercator formula
//! (radius 6,378,137m) and bucketed by flooring the projected x/y into 50m
//! steps. Latitude is clamped to ±85° first; the projection diverges toward
//! the poles. Same input, same cell, always — but no overlap guarantee is
//! made for inputs a meter apart across a cell boundary.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Web-Mercator sphere radius in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Fixed grid cell edge length in meters.
pub const CELL_SIZE_M: f64 = 50.0;

/// Latitude clamp bound, in degrees, on either side of the equator.
const MAX_ABS_LAT_DEG: f64 = 85.0;

/// Scheme tag embedded in the canonical string encoding.
const ENCODING_TAG: &str = "g50";

/// Identifier of one 50m square cell of the projected plane.
///
/// The canonical string encoding is `g50:<gx>:<gy>`; distinct grid
/// coordinates never collide. Serializes as that string so cell-keyed maps
/// stay readable in JSON.
///
/// # Example
/// ```
/// use walk_analytics::grid::cell_of;
///
/// let cell = cell_of(51.5074, -0.1278);
/// assert_eq!(cell, cell_of(51.5074, -0.1278));
/// assert_eq!(cell.to_string().parse::<walk_analytics::CellId>().unwrap(), cell);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId {
    pub gx: i64,
    pub gy: i64,
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", ENCODING_TAG, self.gx, self.gy)
    }
}

impl FromStr for CellId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidCellId(s.to_string());

        let rest = s
            .strip_prefix(ENCODING_TAG)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(invalid)?;
        let (gx, gy) = rest.split_once(':').ok_or_else(invalid)?;

        Ok(Self {
            gx: gx.parse().map_err(|_| invalid())?,
            gy: gy.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Map a coordinate to its grid cell.
///
/// Pure and total: every `(lat, lon)` pair yields a cell, deterministically,
/// with latitude clamped to ±85° before projection. There is no error path.
///
/// # Example
/// ```
/// use walk_analytics::grid::cell_of;
///
/// // Clamping makes the poles collapse onto the ±85° rows.
/// assert_eq!(cell_of(90.0, 0.0), cell_of(85.0, 0.0));
/// assert_eq!(cell_of(-90.0, 0.0), cell_of(-85.0, 0.0));
/// ```
pub fn cell_of(lat: f64, lon: f64) -> CellId {
    let lat = lat.clamp(-MAX_ABS_LAT_DEG, MAX_ABS_LAT_DEG);

    let x = lon.to_radians() * EARTH_RADIUS_M;
    let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;

    CellId {
        gx: (x / CELL_SIZE_M).floor() as i64,
        gy: (y / CELL_SIZE_M).floor() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_of_deterministic() {
        let a = cell_of(40.4168, -3.7038);
        let b = cell_of(40.4168, -3.7038);
        assert_eq!(a, b);
    }

    #[test]
    fn test_latitude_clamping() {
        assert_eq!(cell_of(90.0, 10.0), cell_of(85.0, 10.0));
        assert_eq!(cell_of(-90.0, 10.0), cell_of(-85.0, 10.0));
        assert_ne!(cell_of(84.0, 10.0), cell_of(85.0, 10.0));
    }

    #[test]
    fn test_nearby_points_share_a_cell() {
        // ~1m apart, well inside a 50m cell interior
        let a = cell_of(40.41680, -3.70380);
        let b = cell_of(40.41681, -3.70380);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distant_points_get_distinct_cells() {
        // ~111m of latitude apart, always more than one 50m cell
        let a = cell_of(40.4168, -3.7038);
        let b = cell_of(40.4178, -3.7038);
        assert_ne!(a, b);
    }

    #[test]
    fn test_encoding_roundtrip() {
        let cell = CellId { gx: -123, gy: 98765 };
        assert_eq!(cell.to_string(), "g50:-123:98765");
        assert_eq!("g50:-123:98765".parse::<CellId>().unwrap(), cell);
    }

    #[test]
    fn test_encoding_rejects_garbage() {
        assert!("".parse::<CellId>().is_err());
        assert!("g50:1".parse::<CellId>().is_err());
        assert!("g100:1:2".parse::<CellId>().is_err());
        assert!("g50:a:b".parse::<CellId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let cell = cell_of(51.5074, -0.1278);
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, format!("\"{}\"", cell));
        let back: CellId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn test_distinct_grid_coords_never_collide() {
        let a = CellId { gx: 1, gy: 23 };
        let b = CellId { gx: 12, gy: 3 };
        assert_ne!(a.to_string(), b.to_string());
    }
}
