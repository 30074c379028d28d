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
//! Component D: converts one road into a dense fan of rays.
use geo::{Coordinate, LineString};
use rayon::prelude::*;

use crate::geometry::planar_distance;
use crate::model::{NoisePoint, Ray, Road};

/// The acoustic model's level step: one barrier floor per height layer.
const LEVEL_STEP_M: u32 = 3;

/// The angular sweep is `[20°, 380°)`, not `[0°, 360°)` — a deliberate
/// overlap window covering the 0°/360° seam. Not configurable.
const AZIMUTH_START_DEG: i32 = 20;
const AZIMUTH_END_EXCLUSIVE_DEG: i32 = 380;

/// The planar distance at which `emission_db` falls to `noise_limit_db`
/// under the inverse-square-in-dB falloff model.
pub fn reach_radius(emission_db: i32, noise_limit_db: f64) -> f64 {
    10f64.powf((emission_db as f64 - noise_limit_db) / 10.0)
}

fn line_length(line: &LineString<f64>) -> f64 {
    line.0.windows(2).map(|p| planar_distance(p[0], p[1])).sum()
}

/// Walks `line` to the point `distance` metres from its start, or `None`
/// once `distance` exceeds the line's length.
fn point_along_line(line: &LineString<f64>, distance: f64) -> Option<Coordinate<f64>> {
    if line.0.len() < 2 || distance < 0.0 {
        return None;
    }

    let mut remaining = distance;
    for pair in line.0.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_len = planar_distance(a, b);

        if remaining <= seg_len {
            let t = if seg_len == 0.0 { 0.0 } else { remaining / seg_len };
            return Some(Coordinate {
                x: a.x + (b.x - a.x) * t,
                y: a.y + (b.y - a.y) * t,
            });
        }

        remaining -= seg_len;
    }

    None
}

/// NoisePoints along a road's centreline, spaced `point_interval` apart
/// starting at that same offset.
pub fn noise_points_along_road(
    road_line: &LineString<f64>,
    emission_db: i32,
    point_interval: f64,
    noise_limit_db: f64,
) -> Vec<NoisePoint> {
    let length = line_length(road_line);
    let reach = reach_radius(emission_db, noise_limit_db);

    let mut points = Vec::new();
    let mut d = point_interval;
    while d <= length + 1e-9 {
        if let Some(origin) = point_along_line(road_line, d) {
            points.push(NoisePoint {
                origin,
                emission_db,
                reach_radius: reach,
            });
        }
        d += point_interval;
    }
    points
}

/// Produces the full star of rays for one NoisePoint: every (height_layer,
/// azimuth) combination up to its reach radius.
pub fn make_noise_star(point: &NoisePoint, stars_line_step_deg: i32) -> Vec<Ray> {
    let mut rays = Vec::new();
    let mut level: u32 = 0;

    while (level as f64) < point.reach_radius {
        let r_planar = (point.reach_radius.powi(2) - (level as f64).powi(2))
            .max(0.0)
            .sqrt();

        let mut angle = AZIMUTH_START_DEG;
        while angle < AZIMUTH_END_EXCLUSIVE_DEG {
            let theta = (angle as f64).to_radians();
            let endpoint = Coordinate {
                x: point.origin.x + r_planar * theta.cos(),
                y: point.origin.y + r_planar * theta.sin(),
            };

            rays.push(Ray {
                origin: point.origin,
                endpoint,
                height_layer: level,
                azimuth_deg: angle,
                emission_db: point.emission_db,
                bounce_index: 0,
            });

            angle += stars_line_step_deg;
        }

        level += LEVEL_STEP_M;
    }

    rays
}

/// Builds the full ray set for one road: NoisePoints fan out in parallel,
/// each NoisePoint's star independent of every other's.
pub fn generate_star_rays_for_road(
    road: &Road,
    point_interval: f64,
    noise_limit_db: f64,
    stars_line_step_deg: i32,
) -> Vec<Ray> {
    let noise_points =
        noise_points_along_road(&road.geometry, road.emission_db, point_interval, noise_limit_db);

    noise_points
        .par_iter()
        .flat_map(|p| make_noise_star(p, stars_line_step_deg))
        .collect()
}
