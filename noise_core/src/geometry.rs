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
//! Component A: 2D point/segment/polyline algebra.
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coordinate, Line, LineString};

pub fn planar_distance(a: Coordinate<f64>, b: Coordinate<f64>) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Resamples `line` so that no constituent edge exceeds `step` in length.
/// Each original edge is subdivided independently (collinear interpolation);
/// every original vertex, including the two endpoints, is preserved.
pub fn segmentize(line: &LineString<f64>, step: f64) -> LineString<f64> {
    assert!(step > 0.0);

    let coords = &line.0;
    if coords.len() < 2 {
        return line.clone();
    }

    let mut out = Vec::with_capacity(coords.len());
    out.push(coords[0]);

    for pair in coords.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let edge_len = planar_distance(a, b);

        let n_subsegments = (edge_len / step).ceil().max(1.0) as usize;

        for i in 1..=n_subsegments {
            let t = i as f64 / n_subsegments as f64;
            out.push(Coordinate {
                x: a.x + (b.x - a.x) * t,
                y: a.y + (b.y - a.y) * t,
            });
        }
    }

    LineString(out)
}

/// Splits a (possibly multi-edge) segmentized linestring into its 2-point
/// subsegments.
pub fn into_subsegments(line: &LineString<f64>) -> Vec<Line<f64>> {
    line.0
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect()
}

/// Squared distance from `point` to the closest point on `seg`. Used by the
/// spatial index's `PointDistance` implementation, where the square root is
/// deferred to the caller.
pub fn point_segment_distance_sq(point: Coordinate<f64>, seg: Line<f64>) -> f64 {
    let (a, b) = (seg.start, seg.end);
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;

    if len_sq == 0.0 {
        return planar_distance(point, a).powi(2);
    }

    let t = (((point.x - a.x) * abx + (point.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    let closest = Coordinate {
        x: a.x + abx * t,
        y: a.y + aby * t,
    };
    planar_distance(point, closest).powi(2)
}

/// Mirrors `point` across the infinite line containing `wall`. This formula
/// is the defined contract: a vertical wall reflects only the x coordinate;
/// otherwise the point is projected onto the wall's line and doubled past it.
pub fn reflect(point: Coordinate<f64>, wall: Line<f64>) -> Coordinate<f64> {
    let (x1, y1) = (wall.start.x, wall.start.y);
    let (x2, y2) = (wall.end.x, wall.end.y);

    if x1 == x2 {
        return Coordinate {
            x: 2.0 * x1 - point.x,
            y: point.y,
        };
    }

    let m = (y2 - y1) / (x2 - x1);
    let c = y1 - m * x1;
    let d = (point.x + (point.y - c) * m) / (1.0 + m * m);

    Coordinate {
        x: 2.0 * d - point.x,
        y: 2.0 * d * m - point.y + 2.0 * c,
    }
}

/// The collapse policy of a segment-segment intersection: a geometry library
/// in general can return Point / MultiPoint / LineString / MultiLineString /
/// GeometryCollection / Empty. For two *straight* 2-point segments only
/// `Empty`, `Point`, and `Collinear` (a linestring) are actually reachable,
/// but the variant names mirror the full contract so a caller reasons about
/// the policy, not about what this particular geometry pair can produce.
#[derive(Debug, Clone, Copy)]
pub enum SegmentIntersection {
    Empty,
    Point(Coordinate<f64>),
    /// An overlapping collinear run; collapsed to its centroid per policy.
    Collinear(Coordinate<f64>),
}

impl SegmentIntersection {
    /// Applies the collapse policy: the final retained result is always a
    /// single point, or nothing.
    pub fn collapsed_point(&self) -> Option<Coordinate<f64>> {
        match self {
            SegmentIntersection::Empty => None,
            SegmentIntersection::Point(p) => Some(*p),
            SegmentIntersection::Collinear(p) => Some(*p),
        }
    }
}

pub fn intersect_segments(a: Line<f64>, b: Line<f64>) -> SegmentIntersection {
    match line_intersection(a, b) {
        None => SegmentIntersection::Empty,
        Some(LineIntersection::SinglePoint { intersection, .. }) => {
            SegmentIntersection::Point(intersection)
        }
        Some(LineIntersection::Collinear { intersection }) => {
            let centroid = Coordinate {
                x: (intersection.start.x + intersection.end.x) / 2.0,
                y: (intersection.start.y + intersection.end.y) / 2.0,
            };
            SegmentIntersection::Collinear(centroid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_reflect_across_vertical_wall() {
        let wall = Line::new(Coordinate { x: 5.0, y: 0.0 }, Coordinate { x: 5.0, y: 10.0 });
        let p = Coordinate { x: 2.0, y: 3.0 };
        let r = reflect(p, wall);
        assert!(approx_eq!(f64, r.x, 8.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, r.y, 3.0, epsilon = 1e-9));
    }

    #[test]
    fn test_mirror_law_is_involutive() {
        let wall = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 4.0, y: 2.0 });
        let p = Coordinate { x: 7.0, y: -3.0 };
        let once = reflect(p, wall);
        let twice = reflect(once, wall);
        assert!(approx_eq!(f64, twice.x, p.x, epsilon = 1e-6));
        assert!(approx_eq!(f64, twice.y, p.y, epsilon = 1e-6));
    }

    #[test]
    fn test_segmentize_preserves_endpoints_and_caps_edge_length() {
        let line = LineString(vec![
            Coordinate { x: 0.0, y: 0.0 },
            Coordinate { x: 10.0, y: 0.0 },
        ]);
        let out = segmentize(&line, 3.0);
        assert_eq!(out.0[0], Coordinate { x: 0.0, y: 0.0 });
        assert_eq!(*out.0.last().unwrap(), Coordinate { x: 10.0, y: 0.0 });
        for pair in out.0.windows(2) {
            assert!(planar_distance(pair[0], pair[1]) <= 3.0 + 1e-9);
        }
    }

    #[test]
    fn test_segmentize_keeps_original_vertices() {
        let line = LineString(vec![
            Coordinate { x: 0.0, y: 0.0 },
            Coordinate { x: 4.0, y: 0.0 },
            Coordinate { x: 4.0, y: 4.0 },
        ]);
        let out = segmentize(&line, 3.0);
        assert!(out.0.contains(&Coordinate { x: 4.0, y: 0.0 }));
    }

    #[test]
    fn test_intersect_crossing_segments() {
        let a = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        let b = Line::new(Coordinate { x: 5.0, y: -5.0 }, Coordinate { x: 5.0, y: 5.0 });
        let result = intersect_segments(a, b);
        let p = result.collapsed_point().unwrap();
        assert!(approx_eq!(f64, p.x, 5.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, p.y, 0.0, epsilon = 1e-9));
    }

    #[test]
    fn test_intersect_parallel_non_crossing_is_empty() {
        let a = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        let b = Line::new(Coordinate { x: 0.0, y: 1.0 }, Coordinate { x: 10.0, y: 1.0 });
        assert!(matches!(intersect_segments(a, b), SegmentIntersection::Empty));
    }

    #[test]
    fn test_point_segment_distance_sq_perpendicular() {
        let seg = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        let p = Coordinate { x: 5.0, y: 4.0 };
        assert!(approx_eq!(f64, point_segment_distance_sq(p, seg), 16.0, epsilon = 1e-9));
    }

    #[test]
    fn test_point_segment_distance_sq_beyond_endpoint() {
        let seg = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        let p = Coordinate { x: 13.0, y: 0.0 };
        assert!(approx_eq!(f64, point_segment_distance_sq(p, seg), 9.0, epsilon = 1e-9));
    }

    #[test]
    fn test_intersect_collinear_overlap_collapses_to_centroid() {
        let a = Line::new(Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        let b = Line::new(Coordinate { x: 4.0, y: 0.0 }, Coordinate { x: 6.0, y: 0.0 });
        let result = intersect_segments(a, b);
        match result {
            SegmentIntersection::Collinear(p) => {
                assert!(approx_eq!(f64, p.x, 5.0, epsilon = 1e-9));
            }
            other => panic!("expected collinear overlap, got {:?}", other),
        }
    }
}
