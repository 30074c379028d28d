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
use std::fs::read_to_string;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunable constants threaded through a batch run. The angular sweep range
/// used by the noise star generator is not here: it's part of the contract,
/// not a knob (see noise_core::noise_star).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub noise_limit_db: f64,
    pub point_interval_m: f64,
    pub stars_line_step_deg: i32,
    pub noise_segment_size_m: f64,
    pub amount_of_reflections: u32,
    pub base_crs_epsg: u32,
    pub road_category_allowlist: Vec<String>,

    /// Postgres schema holding the street/building/output tables.
    pub schema: String,
    pub street_table_name: String,
    pub building_table_name: String,
    pub noise_lines_table_name: String,
    pub barrier_noise_table_name: String,
    pub geometry_column: String,
    pub noise_level_column: String,
    pub building_level_column: String,
    pub barrier_noise_level_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            noise_limit_db: 45.0,
            point_interval_m: 3.0,
            stars_line_step_deg: 3,
            noise_segment_size_m: 3.0,
            amount_of_reflections: 3,
            base_crs_epsg: 3857,
            road_category_allowlist: vec![
                "living_street".to_string(),
                "trunk".to_string(),
                "trunk_link".to_string(),
                "primary".to_string(),
                "primary_link".to_string(),
                "secondary".to_string(),
                "secondary_link".to_string(),
                "tertiary".to_string(),
                "tertiary_link".to_string(),
                "unclassified".to_string(),
                "residential".to_string(),
            ],
            schema: "public".to_string(),
            street_table_name: "highway".to_string(),
            building_table_name: "building".to_string(),
            noise_lines_table_name: "noise_lines".to_string(),
            barrier_noise_table_name: "barrier_noise".to_string(),
            geometry_column: "geometry".to_string(),
            noise_level_column: "level".to_string(),
            building_level_column: "floors".to_string(),
            barrier_noise_level_column: "noise_level".to_string(),
        }
    }
}

impl Config {
    /// Loads defaults overlaid with whatever fields are present in a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {:?}", path))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.noise_limit_db, 45.0);
        assert_eq!(cfg.point_interval_m, 3.0);
        assert_eq!(cfg.stars_line_step_deg, 3);
        assert_eq!(cfg.noise_segment_size_m, 3.0);
        assert_eq!(cfg.amount_of_reflections, 3);
        assert_eq!(cfg.base_crs_epsg, 3857);
        assert!(cfg.road_category_allowlist.contains(&"residential".to_string()));
    }

    #[test]
    fn test_partial_toml_overlay_keeps_other_defaults() {
        let toml_str = "noise_limit_db = 50.0\n";
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.noise_limit_db, 50.0);
        // everything else falls back to Default via #[serde(default)]
        assert_eq!(cfg.point_interval_m, 3.0);
        assert_eq!(cfg.amount_of_reflections, 3);
    }
}
