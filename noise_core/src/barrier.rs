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
//! Component C: turns building footprints into per-floor wall segments.
use geo::{Geometry, LineString, Polygon};
use rayon::prelude::*;

use crate::error::NoiseCoreError;
use crate::geometry::{into_subsegments, segmentize};
use crate::model::{BarrierSegment, Building};

/// Explodes a building's geometry into its constituent polygons, rejecting
/// anything else.
fn explode_to_polygons(building: &Building) -> Result<Vec<&Polygon<f64>>, NoiseCoreError> {
    match &building.geometry {
        Geometry::Polygon(p) => Ok(vec![p]),
        Geometry::MultiPolygon(mp) => Ok(mp.0.iter().collect()),
        other => Err(NoiseCoreError::InputShapeError {
            expected: "Polygon or MultiPolygon",
            found: geometry_type_name(other),
        }),
    }
}

fn geometry_type_name(g: &Geometry<f64>) -> &'static str {
    match g {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// The exterior ring plus every interior ring of a polygon, as standalone
/// linestrings.
fn polygon_boundary_rings(polygon: &Polygon<f64>) -> Vec<LineString<f64>> {
    let mut rings = vec![polygon.exterior().clone()];
    rings.extend(polygon.interiors().iter().cloned());
    rings
}

/// Builds the full BarrierSegment multiset for a batch of buildings.
/// Guarantee: `|output| == sum_i(|source_segments_i| * floors_i)`.
pub fn buildings_to_barrier_segments(
    buildings: &[Building],
    step: f64,
) -> Result<Vec<BarrierSegment>, NoiseCoreError> {
    // Each building is independent; only the final Vec needs collecting.
    let per_building: Result<Vec<Vec<BarrierSegment>>, NoiseCoreError> = buildings
        .par_iter()
        .map(|b| barrier_segments_for_building(b, step))
        .collect();

    Ok(per_building?.into_iter().flatten().collect())
}

fn barrier_segments_for_building(
    building: &Building,
    step: f64,
) -> Result<Vec<BarrierSegment>, NoiseCoreError> {
    let floors = building.floor_count();
    let polygons = explode_to_polygons(building)?;

    let mut out = Vec::new();

    for (poly_idx, polygon) in polygons.into_iter().enumerate() {
        for ring in polygon_boundary_rings(polygon) {
            let densified = segmentize(&ring, step);

            for subsegment in into_subsegments(&densified) {
                for floor_level in 1..=floors {
                    out.push(BarrierSegment {
                        geometry: subsegment,
                        floor_level,
                        building_id: building.id,
                        source_polygon_id: poly_idx,
                    });
                }
            }
        }
    }

    Ok(out)
}
