//! Coordinate systems and geodesic metrics.
//!
//! Every component that measures distance or converts a heading into a
//! velocity carries a [`CoordKind`] tag. Planar problems use plain
//! Euclidean geometry in consistent length units; geodesic problems use
//! (longitude, latitude) in radians with spherical trigonometry on a
//! fixed Earth radius. The tag changes numerical results, not just
//! formatting, so it is threaded explicitly rather than defaulted.

use serde::{Deserialize, Serialize};

use crate::core_types::Vec2;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Coordinate system tag.
///
/// `Cartesian` positions are planar `(x, y)` in meters (or any consistent
/// length unit). `Gcs` positions are `(longitude, latitude)` in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordKind {
    Cartesian,
    Gcs,
}

impl CoordKind {
    /// Distance between two positions under this coordinate system.
    ///
    /// Euclidean norm for `Cartesian`; great-circle (haversine) distance
    /// in meters for `Gcs`.
    #[must_use]
    pub fn distance(self, a: Vec2, b: Vec2) -> f64 {
        match self {
            CoordKind::Cartesian => (a - b).norm(),
            CoordKind::Gcs => {
                let (lon1, lat1) = (a.x, a.y);
                let (lon2, lat2) = (b.x, b.y);
                let sin_dlat = ((lat2 - lat1) / 2.0).sin();
                let sin_dlon = ((lon2 - lon1) / 2.0).sin();
                let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
                2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
            }
        }
    }

    /// Heading from `a` toward `b`.
    ///
    /// For `Cartesian` this is the trigonometric angle from the x-axis.
    /// For `Gcs` it is the initial great-circle bearing, measured from
    /// north in clockwise order (the convention used for control angles
    /// in geodesic problems).
    #[must_use]
    pub fn heading(self, a: Vec2, b: Vec2) -> f64 {
        match self {
            CoordKind::Cartesian => (b.y - a.y).atan2(b.x - a.x),
            CoordKind::Gcs => {
                let dlon = b.x - a.x;
                let y = dlon.sin() * b.y.cos();
                let x = a.y.cos() * b.y.sin() - a.y.sin() * b.y.cos() * dlon.cos();
                y.atan2(x)
            }
        }
    }

    /// Whether a lon/lat point lies inside the axis-aligned box `[bl, tr]`.
    ///
    /// Used by zone-gated obstacles; closed on all sides.
    #[must_use]
    pub fn in_lonlat_box(bl: Vec2, tr: Vec2, x: Vec2) -> bool {
        x.x >= bl.x && x.x <= tr.x && x.y >= bl.y && x.y <= tr.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cartesian_distance_is_euclidean() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_relative_eq!(CoordKind::Cartesian.distance(a, b), 5.0);
    }

    #[test]
    fn gcs_distance_quarter_meridian() {
        // Pole to equator along a meridian is a quarter great circle
        let equator = Vec2::new(0.0, 0.0);
        let pole = Vec2::new(0.0, std::f64::consts::FRAC_PI_2);
        let expected = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS;
        assert_relative_eq!(
            CoordKind::Gcs.distance(equator, pole),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn gcs_bearing_due_north_and_east() {
        let origin = Vec2::new(0.0, 0.0);
        let north = Vec2::new(0.0, 0.1);
        let east = Vec2::new(0.1, 0.0);
        assert_relative_eq!(CoordKind::Gcs.heading(origin, north), 0.0);
        assert_relative_eq!(
            CoordKind::Gcs.heading(origin, east),
            std::f64::consts::FRAC_PI_2
        );
    }

    #[test]
    fn lonlat_box_is_closed() {
        let bl = Vec2::new(-1.0, -1.0);
        let tr = Vec2::new(1.0, 1.0);
        assert!(CoordKind::in_lonlat_box(bl, tr, Vec2::new(0.0, 0.0)));
        assert!(CoordKind::in_lonlat_box(bl, tr, Vec2::new(1.0, -1.0)));
        assert!(!CoordKind::in_lonlat_box(bl, tr, Vec2::new(1.01, 0.0)));
    }
}
