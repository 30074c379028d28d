/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
//! Component B: converts a planar EPSG:3857 polyline to WGS84 and sums
//! ellipsoidal distances. Only the reflected-ray path length used in
//! acoustic attenuation needs this — everything else in the core stays
//! in the planar CRS.
use geo::algorithm::geodesic_length::GeodesicLength;
use geo::{Coordinate, LineString};

/// Semi-major axis used by the spherical Web Mercator (EPSG:3857) projection.
/// EPSG:3857 is defined against a sphere of this radius even though its
/// datum is WGS84 — this is the closed-form inverse every Web Mercator
/// implementation uses, not an approximation we invented.
const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Converts points from a base CRS to WGS84 and measures geodesic length on
/// the ellipsoid. Constructed once per batch (the base CRS doesn't change
/// mid-run) and passed down to the reflection engine.
#[derive(Debug, Clone, Copy)]
pub struct GeodesicConverter {
    base_crs_epsg: u32,
}

impl GeodesicConverter {
    pub fn new(base_crs_epsg: u32) -> Self {
        GeodesicConverter { base_crs_epsg }
    }

    pub fn web_mercator_to_wgs84(&self, c: Coordinate<f64>) -> Coordinate<f64> {
        assert_eq!(
            self.base_crs_epsg, 3857,
            "only EPSG:3857 is supported as a base CRS"
        );

        let lon = c.x / WEB_MERCATOR_RADIUS_M * 180.0 / std::f64::consts::PI;
        let lat = (2.0 * (c.y / WEB_MERCATOR_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
            * 180.0
            / std::f64::consts::PI;

        Coordinate { x: lon, y: lat }
    }

    /// Sums ellipsoidal (geodesic) distance along a planar polyline.
    pub fn geodesic_length(&self, line: &LineString<f64>) -> f64 {
        if line.0.len() < 2 {
            return 0.0;
        }

        let wgs84: Vec<Coordinate<f64>> = line
            .0
            .iter()
            .map(|c| self.web_mercator_to_wgs84(*c))
            .collect();

        LineString(wgs84).geodesic_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_origin_maps_to_origin() {
        let conv = GeodesicConverter::new(3857);
        let p = conv.web_mercator_to_wgs84(Coordinate { x: 0.0, y: 0.0 });
        assert!(approx_eq!(f64, p.x, 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, p.y, 0.0, epsilon = 1e-9));
    }

    #[test]
    fn test_short_segment_length_is_close_to_planar_length() {
        // Over a few tens of metres near the equator, geodesic and planar
        // length should agree to within a few millimetres.
        let conv = GeodesicConverter::new(3857);
        let line = LineString(vec![
            Coordinate { x: 0.0, y: 0.0 },
            Coordinate { x: 30.0, y: 0.0 },
        ]);
        let len = conv.geodesic_length(&line);
        assert!(approx_eq!(f64, len, 30.0, epsilon = 1e-2));
    }

    #[test]
    fn test_degenerate_line_has_zero_length() {
        let conv = GeodesicConverter::new(3857);
        let line = LineString(vec![Coordinate { x: 1.0, y: 1.0 }]);
        assert_eq!(conv.geodesic_length(&line), 0.0);
    }
}
