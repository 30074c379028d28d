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
//! Concrete `NoiseDataSource`/`NoisePersistence` backed by Postgres/PostGIS.
//! Schema and table names come from `Config`, set by whoever runs the batch,
//! not from untrusted input, so they're interpolated into the SQL text the
//! same way the original SQLAlchemy layer did.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, LineString};
use geo_util::Config;
use postgres::{Client, NoTls};

use noise_core::model::{Building, ImpactedWall, OutputRay, Road};
use noise_core::{NoiseDataSource, NoisePersistence};

struct Inner {
    client: Client,
    cfg: Config,
}

/// Owns the live connection; `split` hands out the two trait-scoped handles
/// `run_batch` needs as independent `&mut` borrows.
pub struct PostgresStore {
    inner: Rc<RefCell<Inner>>,
}

impl PostgresStore {
    pub fn connect(conn_str: &str, cfg: Config) -> Result<Self> {
        let client = Client::connect(conn_str, NoTls).context("connecting to postgres")?;
        Ok(PostgresStore {
            inner: Rc::new(RefCell::new(Inner { client, cfg })),
        })
    }

    pub fn split(&self) -> (DataSourceHandle, PersistenceHandle) {
        (
            DataSourceHandle(self.inner.clone()),
            PersistenceHandle(self.inner.clone()),
        )
    }
}

pub struct DataSourceHandle(Rc<RefCell<Inner>>);
pub struct PersistenceHandle(Rc<RefCell<Inner>>);

fn geometry_to_linestring(g: Geometry<f64>) -> Result<LineString<f64>> {
    match g {
        Geometry::LineString(ls) => Ok(ls),
        other => bail!("expected LineString road geometry, found {:?}", geometry_kind(&other)),
    }
}

fn geometry_kind(g: &Geometry<f64>) -> &'static str {
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

impl NoiseDataSource for DataSourceHandle {
    fn fetch_next_road(&mut self) -> Result<Option<Road>> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let category_list = inner
            .cfg
            .road_category_allowlist
            .iter()
            .map(|c| format!("'{}'", c.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "SELECT id, {geom}, highway, noise_from_type \
             FROM {schema}.{table} \
             WHERE highway IN ({categories}) AND finished IS NOT TRUE \
             ORDER BY id ASC LIMIT 1",
            geom = inner.cfg.geometry_column,
            schema = inner.cfg.schema,
            table = inner.cfg.street_table_name,
            categories = category_list,
        );

        let row = inner.client.query_opt(query.as_str(), &[]).context("fetching next road")?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let id: i64 = row.get("id");
        let geometry: Geometry<f64> = row.get(inner.cfg.geometry_column.as_str());
        let category: String = row.get("highway");
        let emission_db: i32 = row.get("noise_from_type");

        Ok(Some(Road {
            id,
            geometry: geometry_to_linestring(geometry)?,
            category,
            emission_db,
            finished: false,
        }))
    }

    fn fetch_buildings(&mut self) -> Result<Vec<Building>> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let query = format!(
            "SELECT id, {geom}, {floors} FROM {schema}.{table}",
            geom = inner.cfg.geometry_column,
            floors = inner.cfg.building_level_column,
            schema = inner.cfg.schema,
            table = inner.cfg.building_table_name,
        );

        let rows = inner.client.query(query.as_str(), &[]).context("fetching buildings")?;

        rows.into_iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let geometry: Geometry<f64> = row.get(inner.cfg.geometry_column.as_str());
                let floors: Option<i32> = row.get(inner.cfg.building_level_column.as_str());
                Ok(Building {
                    id,
                    geometry,
                    floors: floors.and_then(|f| u32::try_from(f).ok()),
                })
            })
            .collect()
    }
}

impl NoisePersistence for PersistenceHandle {
    fn persist_noise_lines(&mut self, items: &[OutputRay]) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let mut transaction = inner.client.transaction().context("opening noise-lines transaction")?;
        let insert = format!(
            "INSERT INTO {schema}.{table} ({geom}, height_layer, azimuth_deg, bounce_count, emission_db) \
             VALUES ($1, $2, $3, $4, $5)",
            schema = inner.cfg.schema,
            table = inner.cfg.noise_lines_table_name,
            geom = inner.cfg.geometry_column,
        );
        for item in items {
            let geometry: Geometry<f64> = Geometry::LineString(item.geometry.clone());
            transaction
                .execute(
                    insert.as_str(),
                    &[
                        &geometry,
                        &(item.height_layer as i32),
                        &item.azimuth_deg,
                        &(item.bounce_count as i32),
                        &item.emission_db,
                    ],
                )
                .context("inserting a noise line")?;
        }
        transaction.commit().context("committing noise-lines transaction")
    }

    fn persist_impacted_walls(&mut self, items: &[ImpactedWall]) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let mut transaction = inner
            .client
            .transaction()
            .context("opening impacted-walls transaction")?;
        let insert = format!(
            "INSERT INTO {schema}.{table} ({geom}, {floor_col}, {level_col}) VALUES ($1, $2, $3)",
            schema = inner.cfg.schema,
            table = inner.cfg.barrier_noise_table_name,
            geom = inner.cfg.geometry_column,
            floor_col = inner.cfg.building_level_column,
            level_col = inner.cfg.barrier_noise_level_column,
        );
        for item in items {
            let geometry: Geometry<f64> = Geometry::Line(item.barrier.geometry);
            transaction
                .execute(
                    insert.as_str(),
                    &[&geometry, &(item.barrier.floor_level as i32), &item.incident_db],
                )
                .context("inserting an impacted wall")?;
        }
        transaction.commit().context("committing impacted-walls transaction")
    }

    fn mark_road_processed(&mut self, road_id: i64) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let update = format!(
            "UPDATE {schema}.{table} SET finished = true WHERE id = $1",
            schema = inner.cfg.schema,
            table = inner.cfg.street_table_name,
        );
        inner
            .client
            .execute(update.as_str(), &[&road_id])
            .map(|_| ())
            .map_err(|e| anyhow!("marking road {} processed: {}", road_id, e))
    }

    fn delete_duplicate_barriers(&mut self) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        let inner = &mut *inner;

        let statement = format!(
            "WITH duplicates AS ( \
                SELECT {geom}, {floor_col}, MAX({level_col}) AS max_value \
                FROM {schema}.{table} \
                GROUP BY {geom}, {floor_col} \
                HAVING COUNT(*) > 1 \
            ), \
            records_to_keep AS ( \
                SELECT DISTINCT ON ({geom}, {floor_col}) id \
                FROM {schema}.{table} \
                WHERE ({geom}, {floor_col}) IN (SELECT {geom}, {floor_col} FROM duplicates) \
                ORDER BY {geom}, {floor_col}, {level_col} DESC \
            ) \
            DELETE FROM {schema}.{table} \
            WHERE ({geom}, {floor_col}) IN (SELECT {geom}, {floor_col} FROM duplicates) \
            AND id NOT IN (SELECT id FROM records_to_keep)",
            schema = inner.cfg.schema,
            table = inner.cfg.barrier_noise_table_name,
            geom = inner.cfg.geometry_column,
            floor_col = inner.cfg.building_level_column,
            level_col = inner.cfg.barrier_noise_level_column,
        );

        inner
            .client
            .execute(statement.as_str(), &[])
            .map(|_| ())
            .context("deleting duplicate barriers")
    }
}
