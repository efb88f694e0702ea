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

//! 2D slices of field data

use crate::data::Frames;
use crate::fortran::RecordReader;
use crate::mesh::Mesh;
use crate::quantity::Quantity;
use crate::settings::ReaderSettings;
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Number of nodes along each axis of an index extent `i1 i2 j1 j2 k1 k2`
pub fn extent_shape(extent: &[i32; 6]) -> [usize; 3] {
    let n = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1).max(0) as usize;
    [
        n(extent[0], extent[1]),
        n(extent[2], extent[3]),
        n(extent[4], extent[5]),
    ]
}

/// The part of a slice lying in one mesh, stored in one file.
#[derive(Debug, Clone)]
pub struct SubSlice {
    /// Mesh the file belongs to
    pub mesh: Arc<Mesh>,
    /// Path of the `.sf` file
    pub file: PathBuf,
    /// `i1 i2 j1 j2 k1 k2`
    pub extent: [i32; 6],
}

/// A slice, possibly spanning several meshes.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Id of the slice in the simulation
    pub id: usize,
    /// Quantity of the values
    pub quantity: Quantity,
    /// Values at cell centers instead of nodes
    pub cell_centered: bool,
    /// Parts, in `.smv` order
    pub subslices: Vec<SubSlice>,
}

fn read_header<R: Read>(reader: &mut RecordReader<R>) -> anyhow::Result<(String, [i32; 6])> {
    let name = reader.string().context("reading quantity")?;
    reader.string().context("reading short name")?;
    reader.string().context("reading unit")?;
    let ext = reader.i32s().context("reading index ranges")?;
    anyhow::ensure!(ext.len() == 6, "expected 6 index ranges, found {}", ext.len());
    let mut extent = [0; 6];
    extent.copy_from_slice(&ext);
    Ok((name, extent))
}

impl SubSlice {
    /// Number of values along x, y, z
    pub fn shape(&self) -> [usize; 3] {
        extent_shape(&self.extent)
    }

    /// Position of the first node
    pub fn origin(&self) -> anyhow::Result<[f32; 3]> {
        self.mesh
            .position([self.extent[0], self.extent[2], self.extent[4]])
    }

    fn open(&self) -> anyhow::Result<RecordReader<BufReader<File>>> {
        let file = File::open(&self.file)
            .with_context(|| format!("opening slice file {}", self.file.display()))?;
        let mut reader = RecordReader::new(BufReader::new(file));
        let (name, extent) = read_header(&mut reader)
            .with_context(|| format!("reading header of {}", self.file.display()))?;
        anyhow::ensure!(
            extent == self.extent,
            "{}: index ranges {:?} differ from the .smv declaration {:?}",
            self.file.display(),
            extent,
            self.extent
        );
        tracing::trace!("opened slice file {} of {}", self.file.display(), name);
        Ok(reader)
    }

    /// Checks that the file exists and that its header matches the declaration.
    pub fn check(&self) -> anyhow::Result<()> {
        self.open().map(|_| ())
    }

    /// Reads all frames. With `ignore_errors`, a damaged tail is dropped and the frames before
    /// it are kept.
    pub fn load(&self, settings: &ReaderSettings) -> anyhow::Result<Frames<f32>> {
        let mut reader = self.open()?;
        let mut frames = Frames::new(self.shape());
        let res = (|| -> anyhow::Result<()> {
            while let Some(time) = reader.next_record()? {
                let time = crate::fortran::decode_f32s(&time)?;
                anyhow::ensure!(time.len() == 1, "time record with {} values", time.len());
                let values = reader.f32s()?;
                frames.push(time[0], &values)?;
            }
            Ok(())
        })();
        let what = format!(
            "end of slice file {} after {} frames",
            self.file.display(),
            frames.len()
        );
        settings.recover(what, res.context("reading slice frames"))?;
        if settings.debug {
            tracing::debug!(
                "read {} frames of shape {:?} ({} records) from {}",
                frames.len(),
                frames.shape,
                reader.records(),
                self.file.display()
            );
        }
        Ok(frames)
    }
}
