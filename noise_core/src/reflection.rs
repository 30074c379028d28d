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
//! Component F: bounces rays off barriers and attenuates the level that
//! reaches each wall.
use std::collections::HashMap;

use geo::{Coordinate, Line, LineString};
use rayon::prelude::*;

use crate::geodesic::GeodesicConverter;
use crate::geometry::{intersect_segments, planar_distance, reflect};
use crate::model::{BarrierSegment, ImpactedWall, OutputRay, Ray, ReflectedRay};
use crate::spatial_index::BarrierIndex;

/// Hits closer than this to the start of a leg are treated as the wall the
/// leg just reflected off of, not a new impact — floating point keeps the
/// reflected origin exactly on the wall's line.
const MIN_HIT_DISTANCE_M: f64 = 0.1;

/// The nearest barrier a leg crosses, if any, starting the search distance
/// at infinity as usual for a nearest-candidate scan.
fn nearest_barrier_hit(
    leg_start: Coordinate<f64>,
    leg_end: Coordinate<f64>,
    floor_level: u32,
    index: &BarrierIndex,
) -> Option<(BarrierSegment, Coordinate<f64>)> {
    let leg = Line::new(leg_start, leg_end);
    let candidates = index.candidates_crossing(floor_level, leg_start, leg_end);

    let mut best: Option<(BarrierSegment, Coordinate<f64>)> = None;
    let mut best_dist = f64::INFINITY;

    for barrier in candidates {
        let point = match intersect_segments(leg, barrier.geometry).collapsed_point() {
            Some(p) => p,
            None => continue,
        };

        let dist = planar_distance(leg_start, point);
        if dist >= MIN_HIT_DISTANCE_M && dist < best_dist {
            best_dist = dist;
            best = Some((barrier, point));
        }
    }

    best
}

/// The dB level that reaches a point at `height_layer` metres after
/// travelling `path_length_m` along the (possibly bounced) ray, under the
/// inverse-square-in-dB falloff: level(d) = emission - 10*log10(d).
fn incident_db(emission_db: i32, path_length_m: f64, height_layer: u32) -> f64 {
    let slant = (path_length_m.powi(2) + (height_layer as f64).powi(2))
        .sqrt()
        .max(MIN_HIT_DISTANCE_M);
    emission_db as f64 - 10.0 * slant.log10()
}

fn path_length_to(vertices: &[Coordinate<f64>], impact: Coordinate<f64>, converter: &GeodesicConverter) -> f64 {
    let mut pts = vertices[..vertices.len() - 1].to_vec();
    pts.push(impact);
    converter.geodesic_length(&LineString(pts))
}

/// Outcome of tracing a single ray: the (possibly reflected) ray geometry,
/// plus every wall it struck along the way.
pub struct TraceOutcome {
    pub output_ray: OutputRay,
    pub impacted_walls: Vec<ImpactedWall>,
}

/// Traces one ray against the barrier index, reflecting up to
/// `max_reflections` times. A ray that never crosses a barrier is returned
/// untouched with no impacted walls.
pub fn trace_ray(
    ray: &Ray,
    index: &BarrierIndex,
    max_reflections: u32,
    converter: &GeodesicConverter,
) -> TraceOutcome {
    let floor_level = ray.floor_level();
    let mut vertices = vec![ray.origin, ray.endpoint];
    let mut impacted = Vec::new();
    let mut bounce_count: u32 = 0;

    while bounce_count < max_reflections {
        let leg_start = vertices[vertices.len() - 2];
        let leg_end = vertices[vertices.len() - 1];

        let hit = match nearest_barrier_hit(leg_start, leg_end, floor_level, index) {
            Some(h) => h,
            None => break,
        };

        let (barrier, impact_point) = hit;
        let path_len = path_length_to(&vertices, impact_point, converter);
        impacted.push(ImpactedWall {
            barrier,
            incident_db: incident_db(ray.emission_db, path_len, ray.height_layer),
        });

        let last = vertices.len() - 1;
        vertices[last] = impact_point;
        let reflected_end = reflect(leg_end, barrier.geometry);
        vertices.push(reflected_end);
        bounce_count += 1;
    }

    let reflected_ray = ReflectedRay {
        vertices,
        height_layer: ray.height_layer,
        azimuth_deg: ray.azimuth_deg,
        emission_db: ray.emission_db,
        bounce_count,
    };

    TraceOutcome {
        output_ray: reflected_ray.into(),
        impacted_walls: impacted,
    }
}

/// Traces a full ray set in parallel, one trace per ray.
pub fn trace_rays(
    rays: &[Ray],
    index: &BarrierIndex,
    max_reflections: u32,
    converter: &GeodesicConverter,
) -> Vec<TraceOutcome> {
    rays.par_iter()
        .map(|r| trace_ray(r, index, max_reflections, converter))
        .collect()
}

fn barrier_key(b: &BarrierSegment) -> (i64, usize, u32, u64, u64, u64, u64) {
    (
        b.building_id,
        b.source_polygon_id,
        b.floor_level,
        b.geometry.start.x.to_bits(),
        b.geometry.start.y.to_bits(),
        b.geometry.end.x.to_bits(),
        b.geometry.end.y.to_bits(),
    )
}

/// Collapses repeated impacts on the same wall (from different rays or
/// different bounce paths) down to the single loudest incident level.
pub fn aggregate_impacted_walls(walls: Vec<ImpactedWall>) -> Vec<ImpactedWall> {
    let mut best: HashMap<_, ImpactedWall> = HashMap::new();

    for w in walls {
        best.entry(barrier_key(&w.barrier))
            .and_modify(|existing| {
                if w.incident_db > existing.incident_db {
                    *existing = w;
                }
            })
            .or_insert(w);
    }

    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn flat_wall(x: f64, floor: u32) -> BarrierSegment {
        BarrierSegment {
            geometry: Line::new(Coordinate { x, y: -50.0 }, Coordinate { x, y: 50.0 }),
            floor_level: floor,
            building_id: 1,
            source_polygon_id: 0,
        }
    }

    #[test]
    fn test_untouched_ray_has_no_impacted_walls() {
        let index = BarrierIndex::build(&[]);
        let converter = GeodesicConverter::new(3857);
        let ray = Ray {
            origin: Coordinate { x: 0.0, y: 0.0 },
            endpoint: Coordinate { x: 10.0, y: 0.0 },
            height_layer: 0,
            azimuth_deg: 20,
            emission_db: 65,
            bounce_index: 0,
        };
        let outcome = trace_ray(&ray, &index, 3, &converter);
        assert!(outcome.impacted_walls.is_empty());
        assert_eq!(outcome.output_ray.bounce_count, 0);
    }

    #[test]
    fn test_single_wall_hit_attenuates_with_distance() {
        let index = BarrierIndex::build(&[flat_wall(10.0, 0)]);
        let converter = GeodesicConverter::new(3857);
        let ray = Ray {
            origin: Coordinate { x: 0.0, y: 0.0 },
            endpoint: Coordinate { x: 20.0, y: 0.0 },
            height_layer: 0,
            azimuth_deg: 20,
            emission_db: 65,
            bounce_index: 0,
        };
        let outcome = trace_ray(&ray, &index, 3, &converter);
        assert_eq!(outcome.impacted_walls.len(), 1);
        let w = &outcome.impacted_walls[0];
        assert!(w.incident_db < 65.0);
    }

    #[test]
    fn test_reflection_count_never_exceeds_bound() {
        // Two parallel walls close together force repeated bouncing.
        let index = BarrierIndex::build(&[flat_wall(5.0, 0), flat_wall(-5.0, 0)]);
        let converter = GeodesicConverter::new(3857);
        let ray = Ray {
            origin: Coordinate { x: 0.0, y: 0.0 },
            endpoint: Coordinate { x: 5.0, y: 0.001 },
            height_layer: 0,
            azimuth_deg: 20,
            emission_db: 90,
            bounce_index: 0,
        };
        let outcome = trace_ray(&ray, &index, 3, &converter);
        assert!(outcome.output_ray.bounce_count <= 3);
    }

    #[test]
    fn test_aggregation_keeps_max_incident_db() {
        let barrier = flat_wall(10.0, 0);
        let walls = vec![
            ImpactedWall { barrier, incident_db: 40.0 },
            ImpactedWall { barrier, incident_db: 55.0 },
            ImpactedWall { barrier, incident_db: 20.0 },
        ];
        let aggregated = aggregate_impacted_walls(walls);
        assert_eq!(aggregated.len(), 1);
        assert!(approx_eq!(f64, aggregated[0].incident_db, 55.0, epsilon = 1e-9));
    }

    #[test]
    fn test_aggregation_keeps_distinct_walls_separate() {
        let a = flat_wall(10.0, 0);
        let b = flat_wall(20.0, 0);
        let walls = vec![
            ImpactedWall { barrier: a, incident_db: 40.0 },
            ImpactedWall { barrier: b, incident_db: 30.0 },
        ];
        let aggregated = aggregate_impacted_walls(walls);
        assert_eq!(aggregated.len(), 2);
    }
}
