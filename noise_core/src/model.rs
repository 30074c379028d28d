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
use geo::{Coordinate, Geometry, Line, LineString};

pub type Coord = Coordinate<f64>;

/// Read-only input: an oriented road centreline. The core never mutates this.
#[derive(Debug, Clone)]
pub struct Road {
    pub id: i64,
    pub geometry: LineString<f64>,
    pub category: String,
    pub emission_db: i32,
    pub finished: bool,
}

/// Read-only input: a building footprint, possibly with disjoint parts.
///
/// `geometry` is a generic `Geometry` rather than `MultiPolygon` because the
/// decomposer's first step is an explicit runtime check: a Polygon or
/// MultiPolygon is accepted, anything else is an `InputShapeError`.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: i64,
    pub geometry: Geometry<f64>,
    /// Positive floor count; `None`/NaN in the source is treated as 1 floor.
    pub floors: Option<u32>,
}

impl Building {
    pub fn floor_count(&self) -> u32 {
        self.floors.filter(|f| *f > 0).unwrap_or(1)
    }
}

/// A single straight wall segment acting as a ray barrier at one floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierSegment {
    pub geometry: Line<f64>,
    pub floor_level: u32,
    pub building_id: i64,
    pub source_polygon_id: usize,
}

/// A point sampled along a road centreline, annotated with the acoustic reach
/// of the road's emission at that point.
#[derive(Debug, Clone, Copy)]
pub struct NoisePoint {
    pub origin: Coord,
    pub emission_db: i32,
    pub reach_radius: f64,
}

/// A single ray of a noise star, before any intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Coord,
    pub endpoint: Coord,
    pub height_layer: u32,
    pub azimuth_deg: i32,
    pub emission_db: i32,
    pub bounce_index: u32,
}

impl Ray {
    pub fn as_line(&self) -> Line<f64> {
        Line::new(self.origin, self.endpoint)
    }

    pub fn floor_level(&self) -> u32 {
        self.height_layer / 3
    }
}

/// A ray after one or more mirror reflections: the original leg up to the
/// first impact, followed by reflected legs, bounded by `R` reflections.
#[derive(Debug, Clone)]
pub struct ReflectedRay {
    /// At least 3 vertices: origin, first impact, ..., final tip.
    pub vertices: Vec<Coord>,
    pub height_layer: u32,
    pub azimuth_deg: i32,
    pub emission_db: i32,
    pub bounce_count: u32,
}

impl ReflectedRay {
    pub fn to_line_string(&self) -> LineString<f64> {
        LineString(self.vertices.clone())
    }

    /// The last leg of the (possibly already reflected) polyline — the one
    /// that the reflection engine tests against barriers next.
    pub fn last_leg(&self) -> Line<f64> {
        let n = self.vertices.len();
        Line::new(self.vertices[n - 2], self.vertices[n - 1])
    }
}

/// A BarrierSegment struck by at least one ray, with the attenuated level
/// that reached it.
#[derive(Debug, Clone, Copy)]
pub struct ImpactedWall {
    pub barrier: BarrierSegment,
    pub incident_db: f64,
}

/// Output representation of a ray (untouched or reflected) ready for
/// persistence.
#[derive(Debug, Clone)]
pub struct OutputRay {
    pub geometry: LineString<f64>,
    pub emission_db: i32,
    pub height_layer: u32,
    pub azimuth_deg: i32,
    pub bounce_count: u32,
}

impl From<Ray> for OutputRay {
    fn from(r: Ray) -> Self {
        OutputRay {
            geometry: LineString(vec![r.origin, r.endpoint]),
            emission_db: r.emission_db,
            height_layer: r.height_layer,
            azimuth_deg: r.azimuth_deg,
            bounce_count: 0,
        }
    }
}

impl From<ReflectedRay> for OutputRay {
    fn from(r: ReflectedRay) -> Self {
        OutputRay {
            geometry: r.to_line_string(),
            emission_db: r.emission_db,
            height_layer: r.height_layer,
            azimuth_deg: r.azimuth_deg,
            bounce_count: r.bounce_count,
        }
    }
}
