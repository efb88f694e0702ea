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

#![warn(missing_docs)]

//! Conversion of FDS simulation output to raw arrays with YAML headers, for visualization

pub mod data;
pub mod export;
pub mod fortran;
pub mod manifest;
pub mod mesh;
pub mod obstruction;
pub mod quantity;
pub mod settings;
pub mod simulation;
pub mod slice;
pub mod smoke3d;
pub mod smv;
#[cfg(test)]
mod testutil;

use anyhow::Context;
use data::ArrayOrder;
use manifest::Manifest;
use serde::Serialize;
use settings::ReaderSettings;
use simulation::Simulation;
use std::cell::RefCell;
use std::fs::File;
use std::ops::DerefMut;
use std::path::PathBuf;
use structopt::StructOpt;

/// Writes the run summary as json (`--json`)
#[derive(Debug)]
pub struct ResultWriter {
    file: RefCell<File>,
    path: PathBuf,
}

impl ResultWriter {
    fn write<R: serde::Serialize>(&self, result: &R) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(self.file.borrow_mut().deref_mut(), result)
            .with_context(|| format!("writing result to {}", self.path.display()))
    }
}

impl From<&std::ffi::OsStr> for ResultWriter {
    fn from(path: &std::ffi::OsStr) -> ResultWriter {
        let path: PathBuf = path.into();
        let file = match File::create(&path) {
            Ok(f) => RefCell::new(f),
            Err(e) => {
                tracing::error!(
                    "failed to open {} to write results (--json option): {}",
                    path.display(),
                    e
                );
                std::process::exit(1);
            }
        };
        ResultWriter { path, file }
    }
}

/// Configuration options
#[derive(Debug, StructOpt)]
#[structopt(
    name = "smokeprep",
    about = "Exports FDS obstructions, slices and smoke to raw arrays with YAML headers"
)]
pub struct Opt {
    /// Simulation directory containing one .smv file, or the .smv file itself
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Output directory
    #[structopt(parse(from_os_str))]
    output: PathBuf,

    #[structopt(possible_values = &ArrayOrder::variants(), case_insensitive = true, default_value="F", short, long)]
    /// Memory layout of the exported arrays: F puts x fastest, C puts z fastest
    order: ArrayOrder,

    /// Fail on the first unreadable record instead of skipping it
    #[structopt(long)]
    strict: bool,

    /// Enable debug logging and per file reader diagnostics
    #[structopt(short, long)]
    debug: bool,

    /// Directory of the manifest. Defaults to the output directory
    #[structopt(long, parse(from_os_str))]
    base_path: Option<PathBuf>,

    /// Name of the manifest, written as <case>-smv.yaml. Defaults to the case id of the
    /// simulation
    #[structopt(long)]
    case: Option<String>,

    #[structopt(short, long, parse(from_os_str))]
    /// Write a summary of the run to this file as json
    json: Option<ResultWriter>,
}

impl Opt {
    fn settings(&self) -> ReaderSettings {
        ReaderSettings {
            ignore_errors: !self.strict,
            debug: self.debug,
        }
    }

    fn job(&self) -> Job {
        Job {
            input: self.input.clone(),
            output: self.output.clone(),
            order: self.order,
            settings: self.settings(),
            base_path: self.base_path.clone(),
            case: self.case.clone(),
        }
    }
}

/// One post-processing run
#[derive(Debug, Clone)]
pub struct Job {
    /// Simulation directory or `.smv` file
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Layout of the exported arrays
    pub order: ArrayOrder,
    /// Reader behaviour
    pub settings: ReaderSettings,
    /// Directory of the manifest, the output directory when unset
    pub base_path: Option<PathBuf>,
    /// Name stem of the manifest, the case id when unset
    pub case: Option<String>,
}

/// What a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Path of the manifest
    pub manifest_file: PathBuf,
    /// Content of the manifest
    pub manifest: Manifest,
    /// Records skipped because they could not be read
    pub skipped: Vec<String>,
}

/// Loads the simulation, exports every entity and writes the manifest once everything is
/// exported.
pub fn postprocess(job: &Job) -> anyhow::Result<RunSummary> {
    let sim = Simulation::open(&job.input, job.settings)
        .with_context(|| format!("loading simulation {}", job.input.display()))?;
    let mut location = export::default_location(&sim, &job.output);
    if let Some(base) = &job.base_path {
        location.base = base.clone();
    }
    if let Some(case) = &job.case {
        location.case = case.clone();
    }
    let manifest = export::export_entities(&sim, &job.output, job.order, &location.base)?;
    let manifest_file = manifest.write(&location)?;
    Ok(RunSummary {
        manifest_file,
        manifest,
        skipped: sim.skipped,
    })
}

fn setup_tracing(opt: &Opt) -> anyhow::Result<()> {
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::prelude::*;
    let min_level = if opt.debug { Level::TRACE } else { Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::filter_fn(move |metadata| {
            *metadata.level() <= min_level
        }));
    let subscriber = tracing_subscriber::Registry::default().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing collector")?;
    Ok(())
}

/// entrypoint of the binary
pub fn run() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    setup_tracing(&opt)?;
    let summary = postprocess(&opt.job())?;
    if !summary.skipped.is_empty() {
        tracing::warn!("{} unreadable records were skipped", summary.skipped.len());
    }
    if let Some(writer) = &opt.json {
        writer.write(&summary)?;
    }
    println!("{}", summary.manifest_file.display());
    Ok(())
}
