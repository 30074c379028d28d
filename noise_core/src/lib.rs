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
//! Geometric/acoustic kernel for the noise exposure batch: turns a road and
//! its surrounding buildings into attenuated wall impacts. Talks to the
//! outside world only through the [`store`] traits; `noise_batch` supplies
//! the concrete Postgres collaborator and CLI.
pub mod barrier;
pub mod error;
pub mod geodesic;
pub mod geometry;
pub mod model;
pub mod noise_star;
pub mod orchestrator;
pub mod reflection;
pub mod spatial_index;
pub mod store;

pub use error::NoiseCoreError;
pub use orchestrator::run_batch;
pub use store::{NoiseDataSource, NoisePersistence};
