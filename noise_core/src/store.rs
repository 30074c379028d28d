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
//! The external collaborators the orchestrator drives: where roads and
//! buildings come from, and where results go. Kept as traits in the core so
//! `noise_batch`'s Postgres implementation and a test double can both satisfy
//! `run_batch` without the core depending on either.
use anyhow::Result;

use crate::model::{Building, ImpactedWall, OutputRay, Road};

/// Supplies the batch loop with unprocessed roads and the buildings along
/// them.
pub trait NoiseDataSource {
    /// The next unprocessed road, or `None` once the batch is exhausted.
    fn fetch_next_road(&mut self) -> Result<Option<Road>>;

    /// The full building table. The original system loads it once per run
    /// rather than per road, and every road's barrier set is a filter over
    /// the same buildings, so callers are expected to fetch this once and
    /// reuse it across roads.
    fn fetch_buildings(&mut self) -> Result<Vec<Building>>;
}

/// Receives the batch loop's output and tracks which roads are done.
pub trait NoisePersistence {
    fn persist_noise_lines(&mut self, items: &[OutputRay]) -> Result<()>;

    fn persist_impacted_walls(&mut self, items: &[ImpactedWall]) -> Result<()>;

    fn mark_road_processed(&mut self, road_id: i64) -> Result<()>;

    /// Removes cross-road duplicate barrier impacts left behind once a batch
    /// finishes. A second, persistence-layer dedup pass: the orchestrator
    /// already aggregates per-road, but two different roads can illuminate
    /// the same wall and neither knows about the other.
    fn delete_duplicate_barriers(&mut self) -> Result<()>;
}
