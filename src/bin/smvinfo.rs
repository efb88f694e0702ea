/**************************************************************************/
/*  This file is part of SMOKEPREP.                                       */
/*                                                                        */
/*  Copyright (C) 2025                                                    */
/*    CEA (Commissariat à l'énergie atomique et aux énergies              */
/*         alternatives)                                                  */
/*                                                                        */
/*  you can redistribute it and/or modify it under the terms of the GNU   */
/*  Lesser General Public License as published by the Free Software       */
/*  Foundation, version 2.1.                                              */
/*                                                                        */
/*  It is distributed in the hope that it will be useful,                 */
/*  but WITHOUT ANY WARRANTY; without even the implied warranty of        */
/*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the         */
/*  GNU Lesser General Public License for more details.                   */
/*                                                                        */
/*  See the GNU Lesser General Public License version 2.1                 */
/*  for more details (enclosed in the file licenses/LGPLv2.1).            */
/*                                                                        */
/**************************************************************************/

use anyhow::Context;
use smokeprep::settings::ReaderSettings;
use smokeprep::simulation::Simulation;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "smvinfo",
    about = "Prints the meshes and exportable entities of an FDS simulation as YAML"
)]
struct Opt {
    /// Simulation directory containing one .smv file, or the .smv file itself
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Fail on the first unreadable record instead of skipping it
    #[structopt(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    let opts = Opt::from_args();
    let settings = ReaderSettings {
        ignore_errors: !opts.strict,
        ..ReaderSettings::default()
    };
    let sim = Simulation::open(&opts.input, settings).context("opening simulation")?;
    let text = serde_yaml::to_string(&sim.summary()).context("serializing summary")?;
    print!("{}", text);
    Ok(())
}
