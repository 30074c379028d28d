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
use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use crate::cmd_run_batch::{run_batch_cmd, RunBatchArgs};

mod cmd_run_batch;
mod postgres_store;

#[derive(StructOpt)]
struct Cli {
    #[structopt(long, default_value = "Warn")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    #[structopt(help = "Computes and persists the noise exposure map for up to N unfinished roads")]
    RunBatch(RunBatchArgs),
}

fn run() -> Result<()> {
    let args = Cli::from_args();

    SimpleLogger::new().with_level(args.log_level).init()?;

    match &args.cmd {
        Command::RunBatch(r) => {
            run_batch_cmd(r)?;
        }
    }

    Ok(())
}

fn main() {
    run().unwrap();
}
