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
use thiserror::Error;

/// The error taxonomy of the geometric/acoustic kernel.
///
/// `InputShapeError` and `ExternalError` are fatal for the road being processed
/// and propagate to the orchestrator. `DegenerateGeometry` and `NumericError`
/// are recovered locally by the reflection engine: the ray just stops bouncing.
#[derive(Error, Debug)]
pub enum NoiseCoreError {
    #[error("expected {expected} geometry, found {found}")]
    InputShapeError {
        expected: &'static str,
        found: &'static str,
    },

    #[error("degenerate intersection: {0}")]
    DegenerateGeometry(String),

    #[error("numeric error: {0}")]
    NumericError(String),

    #[error("external collaborator failure: {0}")]
    ExternalError(String),
}

impl NoiseCoreError {
    /// True for the two per-ray conditions the reflection engine recovers from
    /// locally, as opposed to propagating.
    pub fn is_recoverable_per_ray(&self) -> bool {
        matches!(
            self,
            NoiseCoreError::DegenerateGeometry(_) | NoiseCoreError::NumericError(_)
        )
    }
}
