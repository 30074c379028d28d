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
//! `run-batch`: drives the noise-exposure core end to end against Postgres.
use std::path::PathBuf;

use anyhow::Result;
use log::info;
use structopt::StructOpt;

use geo_util::Config;
use noise_core::run_batch;

use crate::postgres_store::PostgresStore;

#[derive(StructOpt)]
pub struct RunBatchArgs {
    /// Postgres connection string, e.g. "host=localhost user=postgres dbname=noise"
    #[structopt(long)]
    db_conn: String,

    /// Schema holding the street/building/output tables; overrides the config file value.
    #[structopt(long)]
    schema: Option<String>,

    /// Optional TOML file overlaying the default tunable constants.
    #[structopt(parse(from_os_str), long)]
    config: Option<PathBuf>,

    /// Maximum number of unfinished roads to process in this run.
    #[structopt(long, default_value = "100")]
    max_roads: u32,
}

pub fn run_batch_cmd(args: &RunBatchArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    if let Some(schema) = &args.schema {
        cfg.schema = schema.clone();
    }

    let store = PostgresStore::connect(&args.db_conn, cfg.clone())?;
    let (mut data_source, mut persistence) = store.split();

    info!("starting batch run: max_roads={}", args.max_roads);
    run_batch(&mut data_source, &mut persistence, &cfg, args.max_roads)
}
