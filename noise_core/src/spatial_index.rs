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
//! Component E: an R-tree of barrier segments, partitioned by floor level so
//! a ray at height layer `h` only ever searches the barriers that actually
//! exist at that floor.
use std::collections::HashMap;

use geo::Coordinate;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::point_segment_distance_sq;
use crate::model::BarrierSegment;

/// Wraps a `BarrierSegment` so it can live inside an `rstar::RTree`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedBarrier(pub BarrierSegment);

impl RTreeObject for IndexedBarrier {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let (a, b) = (self.0.geometry.start, self.0.geometry.end);
        AABB::from_corners([a.x.min(b.x), a.y.min(b.y)], [a.x.max(b.x), a.y.max(b.y)])
    }
}

impl PointDistance for IndexedBarrier {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let p = Coordinate {
            x: point[0],
            y: point[1],
        };
        point_segment_distance_sq(p, self.0.geometry)
    }
}

/// Builds the envelope of a ray's last leg, widened to a hair so axis-aligned
/// rays still get a non-degenerate query box.
fn envelope_of(a: Coordinate<f64>, b: Coordinate<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([a.x.min(b.x), a.y.min(b.y)], [a.x.max(b.x), a.y.max(b.y)])
}

/// One R-tree per floor level. Reflection lookups stay proportional to the
/// number of barriers that actually occupy the ray's floor.
pub struct BarrierIndex {
    by_floor: HashMap<u32, RTree<IndexedBarrier>>,
}

impl BarrierIndex {
    pub fn build(segments: &[BarrierSegment]) -> Self {
        let mut grouped: HashMap<u32, Vec<IndexedBarrier>> = HashMap::new();
        for seg in segments {
            grouped
                .entry(seg.floor_level)
                .or_insert_with(Vec::new)
                .push(IndexedBarrier(*seg));
        }

        let by_floor = grouped
            .into_iter()
            .map(|(level, items)| (level, RTree::bulk_load(items)))
            .collect();

        BarrierIndex { by_floor }
    }

    /// Barriers at `floor_level` whose bounding box intersects the segment
    /// `a`-`b`. A cheap prefilter; the caller still runs the exact
    /// segment-segment intersection test.
    pub fn candidates_crossing(
        &self,
        floor_level: u32,
        a: Coordinate<f64>,
        b: Coordinate<f64>,
    ) -> Vec<BarrierSegment> {
        match self.by_floor.get(&floor_level) {
            None => Vec::new(),
            Some(tree) => tree
                .locate_in_envelope_intersecting(&envelope_of(a, b))
                .map(|ib| ib.0)
                .collect(),
        }
    }

    pub fn floor_count(&self) -> usize {
        self.by_floor.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Line;

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64, floor: u32) -> BarrierSegment {
        BarrierSegment {
            geometry: Line::new(Coordinate { x: x1, y: y1 }, Coordinate { x: x2, y: y2 }),
            floor_level: floor,
            building_id: 1,
            source_polygon_id: 0,
        }
    }

    #[test]
    fn test_partitions_by_floor_level() {
        let segments = vec![segment(0.0, 0.0, 1.0, 0.0, 1), segment(0.0, 0.0, 1.0, 0.0, 2)];
        let index = BarrierIndex::build(&segments);
        assert_eq!(index.floor_count(), 2);
    }

    #[test]
    fn test_candidates_crossing_finds_overlapping_box() {
        let segments = vec![segment(5.0, -1.0, 5.0, 1.0, 1)];
        let index = BarrierIndex::build(&segments);

        let hits = index.candidates_crossing(1, Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_candidates_crossing_empty_for_unindexed_floor() {
        let segments = vec![segment(5.0, -1.0, 5.0, 1.0, 1)];
        let index = BarrierIndex::build(&segments);
        let hits = index.candidates_crossing(7, Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        assert!(hits.is_empty());
    }

    #[test]
    fn test_candidates_crossing_skips_disjoint_box() {
        let segments = vec![segment(100.0, 100.0, 101.0, 101.0, 1)];
        let index = BarrierIndex::build(&segments);
        let hits = index.candidates_crossing(1, Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 10.0, y: 0.0 });
        assert!(hits.is_empty());
    }
}
