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

//! Obstructions and the boundary data on their faces

use crate::data::Frames;
use crate::fortran::RecordReader;
use crate::mesh::Mesh;
use crate::quantity::Quantity;
use crate::settings::ReaderSettings;
use crate::slice::extent_shape;
use anyhow::Context;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One rectangular patch of a boundary file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// `i1 i2 j1 j2 k1 k2`
    pub extent: [i32; 6],
    /// Outward normal: `±1` for x, `±2` for y, `±3` for z
    pub orientation: i32,
    /// 1-based index of the obstruction in the OBST block of the mesh, 0 for walls of the
    /// domain
    pub obst_index: usize,
}

impl Patch {
    /// Number of values along the two axes of the face. The frames of the patch use this
    /// as `[n1, n2, 1]`.
    pub fn face_shape(&self) -> [usize; 2] {
        let [ni, nj, nk] = extent_shape(&self.extent);
        match self.orientation.abs() {
            1 => [nj, nk],
            2 => [ni, nk],
            _ => [ni, nj],
        }
    }

    /// The two axes spanning the face
    pub fn face_axes(&self) -> [usize; 2] {
        match self.orientation.abs() {
            1 => [1, 2],
            2 => [0, 2],
            _ => [0, 1],
        }
    }
}

/// A boundary file: the values of one quantity on every patch of one mesh
#[derive(Debug, Clone)]
pub struct BoundaryFile {
    /// Mesh the file belongs to
    pub mesh: Arc<Mesh>,
    /// Path of the `.bf` file
    pub file: PathBuf,
    /// Quantity on the patches
    pub quantity: Quantity,
    /// BNDC instead of BNDF
    pub cell_centered: bool,
    /// Patches, in file order
    pub patches: Vec<Patch>,
}

fn read_patches<R: Read>(reader: &mut RecordReader<R>) -> anyhow::Result<Vec<Patch>> {
    for what in &["quantity", "short name", "unit"] {
        reader
            .string()
            .with_context(|| format!("reading {}", what))?;
    }
    let npatch = reader.i32s().context("reading patch count")?;
    anyhow::ensure!(npatch.len() == 1, "patch count record with {} values", npatch.len());
    let npatch = usize::try_from(npatch[0])
        .map_err(|_| anyhow::anyhow!("negative patch count {}", npatch[0]))?;
    let mut patches = Vec::new();
    for i in 0..npatch {
        let v = reader
            .i32s()
            .with_context(|| format!("reading patch {}", i))?;
        anyhow::ensure!(v.len() >= 7, "patch {} has {} integers, expected at least 7", i, v.len());
        anyhow::ensure!(
            (1..=3).contains(&v[6].abs()),
            "patch {} has orientation {}",
            i,
            v[6]
        );
        let mut extent = [0; 6];
        extent.copy_from_slice(&v[..6]);
        patches.push(Patch {
            extent,
            orientation: v[6],
            obst_index: v.get(7).copied().unwrap_or(0).max(0) as usize,
        });
    }
    Ok(patches)
}

impl BoundaryFile {
    /// Opens the file to read its patch table.
    pub fn new(
        mesh: Arc<Mesh>,
        file: PathBuf,
        quantity: Quantity,
        cell_centered: bool,
    ) -> anyhow::Result<Self> {
        let (_, patches) = Self::open(&file)?;
        Ok(BoundaryFile {
            mesh,
            file,
            quantity,
            cell_centered,
            patches,
        })
    }

    fn open(file: &Path) -> anyhow::Result<(RecordReader<BufReader<File>>, Vec<Patch>)> {
        let f = File::open(file)
            .with_context(|| format!("opening boundary file {}", file.display()))?;
        let mut reader = RecordReader::new(BufReader::new(f));
        let patches = read_patches(&mut reader)
            .with_context(|| format!("reading header of {}", file.display()))?;
        Ok((reader, patches))
    }

    /// Reads all time steps, one series of frames per patch. A time step is kept only when
    /// every patch of it could be read. With `ignore_errors`, a damaged tail is dropped.
    pub fn load(&self, settings: &ReaderSettings) -> anyhow::Result<Vec<Frames<f32>>> {
        let (mut reader, patches) = Self::open(&self.file)?;
        anyhow::ensure!(
            patches == self.patches,
            "{} changed since it was opened",
            self.file.display()
        );
        let mut res: Vec<Frames<f32>> = patches
            .iter()
            .map(|p| {
                let [a, b] = p.face_shape();
                Frames::new([a, b, 1])
            })
            .collect();
        let read = (|| -> anyhow::Result<()> {
            while let Some(time) = reader.next_record()? {
                let time = crate::fortran::decode_f32s(&time)?;
                anyhow::ensure!(time.len() == 1, "time record with {} values", time.len());
                let mut step = Vec::with_capacity(patches.len());
                for i in 0..patches.len() {
                    let values = reader
                        .f32s()
                        .with_context(|| format!("patch {} at t={}", i, time[0]))?;
                    anyhow::ensure!(
                        values.len() == res[i].frame_len(),
                        "patch {} at t={} has {} values, expected {}",
                        i,
                        time[0],
                        values.len(),
                        res[i].frame_len()
                    );
                    step.push(values);
                }
                for (frames, values) in res.iter_mut().zip(step) {
                    frames.push(time[0], &values)?;
                }
            }
            Ok(())
        })();
        let steps = res.first().map_or(0, |f| f.len());
        let what = format!(
            "end of boundary file {} after {} time steps",
            self.file.display(),
            steps
        );
        settings.recover(what, read.context("reading boundary data"))?;
        if settings.debug {
            tracing::debug!(
                "read {} time steps of {} patches from {}",
                steps,
                patches.len(),
                self.file.display()
            );
        }
        Ok(res)
    }
}

/// The part of an obstruction lying in one mesh
#[derive(Debug, Clone)]
pub struct SubObstruction {
    /// Mesh of this part
    pub mesh: Arc<Mesh>,
    /// 1-based position in the OBST block of the mesh
    pub local_index: usize,
    /// `x1 x2 y1 y2 z1 z2`
    pub bounds: [f32; 6],
    /// `i1 i2 j1 j2 k1 k2`
    pub extent: [i32; 6],
}

/// A face of an obstruction carrying boundary data: one patch of a boundary file
#[derive(Debug, Clone)]
pub struct FaceData {
    /// File holding the data
    pub source: Arc<BoundaryFile>,
    /// Index of the patch in `source.patches`
    pub patch: usize,
}

impl FaceData {
    /// The patch of this face
    pub fn patch(&self) -> &Patch {
        &self.source.patches[self.patch]
    }

    /// Quantity of the values
    pub fn quantity(&self) -> &Quantity {
        &self.source.quantity
    }

    /// Outward normal of the face
    pub fn orientation(&self) -> i32 {
        self.patch().orientation
    }
}

/// An obstruction, possibly spanning several meshes.
#[derive(Debug, Clone)]
pub struct Obstruction {
    /// Id shared by all parts
    pub id: i64,
    /// Parts, in `.smv` order
    pub subobstructions: Vec<SubObstruction>,
    /// Faces with boundary data, in `.smv` order of their files
    pub faces: Vec<FaceData>,
}

impl Obstruction {
    /// Union of the bounds of all parts
    pub fn bounding_box(&self) -> [f32; 6] {
        let mut parts = self.subobstructions.iter().map(|s| s.bounds);
        let first = match parts.next() {
            Some(b) => b,
            None => return [0.; 6],
        };
        parts.fold(first, |mut acc, b| {
            for axis in 0..3 {
                acc[2 * axis] = acc[2 * axis].min(b[2 * axis]);
                acc[2 * axis + 1] = acc[2 * axis + 1].max(b[2 * axis + 1]);
            }
            acc
        })
    }

    /// Quantities available on the faces, in order of first appearance
    pub fn quantities(&self) -> Vec<&Quantity> {
        let mut res: Vec<&Quantity> = Vec::new();
        for face in &self.faces {
            if !res.contains(&face.quantity()) {
                res.push(face.quantity());
            }
        }
        res
    }

    /// Orientations of the faces, in order of first appearance
    pub fn orientations(&self) -> Vec<i32> {
        let mut res = Vec::new();
        for face in &self.faces {
            if !res.contains(&face.orientation()) {
                res.push(face.orientation());
            }
        }
        res
    }
}
