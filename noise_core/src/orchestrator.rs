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
//! Component G: drives A-F over a batch of roads.
use anyhow::Result;
use log::{info, warn};

use geo_util::Config;

use crate::barrier::buildings_to_barrier_segments;
use crate::geodesic::GeodesicConverter;
use crate::noise_star::generate_star_rays_for_road;
use crate::reflection::{aggregate_impacted_walls, trace_rays};
use crate::spatial_index::BarrierIndex;
use crate::store::{NoiseDataSource, NoisePersistence};

/// Processes up to `max_roads` unfinished roads: builds each road's barrier
/// set from the building table, fans out a ray star, traces every ray, and
/// persists the untouched/reflected rays plus the aggregated wall impacts.
pub fn run_batch(
    ds: &mut impl NoiseDataSource,
    persist: &mut impl NoisePersistence,
    cfg: &Config,
    max_roads: u32,
) -> Result<()> {
    let converter = GeodesicConverter::new(cfg.base_crs_epsg);
    let buildings = ds.fetch_buildings()?;
    let mut processed = 0u32;

    while processed < max_roads {
        let road = match ds.fetch_next_road()? {
            Some(r) => r,
            None => break,
        };

        if !cfg.road_category_allowlist.iter().any(|c| c == &road.category) {
            warn!(
                "road {} has category {:?} outside the allowlist, skipping",
                road.id, road.category
            );
            persist.mark_road_processed(road.id)?;
            persist.delete_duplicate_barriers()?;
            processed += 1;
            continue;
        }

        info!("processing road {}", road.id);

        let barriers = match buildings_to_barrier_segments(&buildings, cfg.noise_segment_size_m) {
            Ok(b) => b,
            Err(e) => {
                warn!("road {}: skipping, barrier decomposition failed: {}", road.id, e);
                persist.mark_road_processed(road.id)?;
                persist.delete_duplicate_barriers()?;
                processed += 1;
                continue;
            }
        };

        // No barrier reaches above the tallest building on record; rays
        // above that height layer can never be struck.
        let max_floor = barriers.iter().map(|b| b.floor_level).max().unwrap_or(0);

        let index = BarrierIndex::build(&barriers);

        let mut rays = generate_star_rays_for_road(
            &road,
            cfg.point_interval_m,
            cfg.noise_limit_db,
            cfg.stars_line_step_deg,
        );
        rays.retain(|r| r.floor_level() <= max_floor);

        let outcomes = trace_rays(&rays, &index, cfg.amount_of_reflections, &converter);

        let mut output_rays = Vec::with_capacity(outcomes.len());
        let mut impacted_walls = Vec::new();
        for outcome in outcomes {
            output_rays.push(outcome.output_ray);
            impacted_walls.extend(outcome.impacted_walls);
        }
        let impacted_walls = aggregate_impacted_walls(impacted_walls);

        persist.persist_noise_lines(&output_rays)?;
        persist.persist_impacted_walls(&impacted_walls)?;
        persist.mark_road_processed(road.id)?;
        persist.delete_duplicate_barriers()?;

        processed += 1;
    }

    info!("batch finished: {} road(s) processed", processed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, ImpactedWall, OutputRay, Road};
    use geo::{Coordinate, LineString};

    struct FakeSource {
        roads: Vec<Road>,
        buildings: Vec<Building>,
    }

    impl NoiseDataSource for FakeSource {
        fn fetch_next_road(&mut self) -> Result<Option<Road>> {
            Ok(self.roads.pop())
        }

        fn fetch_buildings(&mut self) -> Result<Vec<Building>> {
            Ok(self.buildings.clone())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        noise_lines: Vec<OutputRay>,
        impacted_walls: Vec<ImpactedWall>,
        marked_roads: Vec<i64>,
        dedup_called: bool,
    }

    impl NoisePersistence for FakeSink {
        fn persist_noise_lines(&mut self, items: &[OutputRay]) -> Result<()> {
            self.noise_lines.extend_from_slice(items);
            Ok(())
        }

        fn persist_impacted_walls(&mut self, items: &[ImpactedWall]) -> Result<()> {
            self.impacted_walls.extend_from_slice(items);
            Ok(())
        }

        fn mark_road_processed(&mut self, road_id: i64) -> Result<()> {
            self.marked_roads.push(road_id);
            Ok(())
        }

        fn delete_duplicate_barriers(&mut self) -> Result<()> {
            self.dedup_called = true;
            Ok(())
        }
    }

    fn straight_road(id: i64, category: &str) -> Road {
        Road {
            id,
            geometry: LineString(vec![Coordinate { x: 0.0, y: 0.0 }, Coordinate { x: 30.0, y: 0.0 }]),
            category: category.to_string(),
            emission_db: 65,
            finished: false,
        }
    }

    #[test]
    fn test_scenario_single_road_no_buildings_produces_only_untouched_rays() {
        let mut source = FakeSource {
            roads: vec![straight_road(1, "residential")],
            buildings: vec![],
        };
        let mut sink = FakeSink::default();
        let cfg = Config::default();

        run_batch(&mut source, &mut sink, &cfg, 10).unwrap();

        assert!(!sink.noise_lines.is_empty());
        assert!(sink.impacted_walls.is_empty());
        assert_eq!(sink.marked_roads, vec![1]);
        assert!(sink.dedup_called);
        assert!(sink.noise_lines.iter().all(|r| r.bounce_count == 0));
    }

    #[test]
    fn test_unrecognised_category_is_skipped_without_rays() {
        let mut source = FakeSource {
            roads: vec![straight_road(2, "motorway")],
            buildings: vec![],
        };
        let mut sink = FakeSink::default();
        let cfg = Config::default();

        run_batch(&mut source, &mut sink, &cfg, 10).unwrap();

        assert!(sink.noise_lines.is_empty());
        assert_eq!(sink.marked_roads, vec![2]);
    }

    #[test]
    fn test_max_roads_bounds_the_loop() {
        let mut source = FakeSource {
            roads: vec![
                straight_road(1, "residential"),
                straight_road(2, "residential"),
                straight_road(3, "residential"),
            ],
            buildings: vec![],
        };
        let mut sink = FakeSink::default();
        let cfg = Config::default();

        run_batch(&mut source, &mut sink, &cfg, 2).unwrap();

        assert_eq!(sink.marked_roads.len(), 2);
    }
}
