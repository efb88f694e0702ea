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

//! 3D smoke volumes

use crate::data::Frames;
use crate::fortran::RecordReader;
use crate::mesh::Mesh;
use crate::quantity::Quantity;
use crate::settings::ReaderSettings;
use crate::slice::extent_shape;
use anyhow::Context;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte announcing a run in run-length encoded smoke data
const RLE_MARK: u8 = 255;

/// Decodes run-length encoded smoke data: `RLE_MARK value count` is `count` times `value`,
/// any other byte stands for itself.
pub fn decode_rle(input: &[u8], expected: usize) -> anyhow::Result<Vec<u8>> {
    let mut res = Vec::with_capacity(expected.min(input.len().saturating_mul(255)));
    let mut i = 0;
    while i < input.len() {
        if input[i] == RLE_MARK {
            anyhow::ensure!(i + 2 < input.len(), "truncated run at byte {}", i);
            let (value, count) = (input[i + 1], input[i + 2]);
            res.extend(std::iter::repeat(value).take(count as usize));
            i += 3;
        } else {
            res.push(input[i]);
            i += 1;
        }
    }
    anyhow::ensure!(
        res.len() == expected,
        "decoded {} bytes, expected {}",
        res.len(),
        expected
    );
    Ok(res)
}

/// The part of a smoke volume lying in one mesh
#[derive(Debug, Clone)]
pub struct SubSmoke {
    /// Mesh the file belongs to
    pub mesh: Arc<Mesh>,
    /// Path of the `.s3d` file
    pub file: PathBuf,
    /// `i1 i2 j1 j2 k1 k2`, from the file header
    pub extent: [i32; 6],
}

/// A 3D smoke volume of one quantity, possibly spanning several meshes.
#[derive(Debug, Clone)]
pub struct Smoke3D {
    /// What the volume holds
    pub quantity: Quantity,
    /// Parts, in `.smv` order
    pub subsmokes: Vec<SubSmoke>,
}

fn open(file: &Path) -> anyhow::Result<(RecordReader<BufReader<File>>, [i32; 6])> {
    let f = File::open(file).with_context(|| format!("opening smoke file {}", file.display()))?;
    let mut reader = RecordReader::new(BufReader::new(f));
    let header = reader
        .i32s()
        .with_context(|| format!("reading header of {}", file.display()))?;
    anyhow::ensure!(
        header.len() == 8,
        "{}: header has {} integers, expected 8",
        file.display(),
        header.len()
    );
    anyhow::ensure!(
        header[0] == 1,
        "{}: not a little endian smoke file",
        file.display()
    );
    anyhow::ensure!(
        header[1] == 0,
        "{}: unsupported smoke file version {}",
        file.display(),
        header[1]
    );
    let mut extent = [0; 6];
    extent.copy_from_slice(&header[2..]);
    Ok((reader, extent))
}

impl SubSmoke {
    /// Opens the file to read its index extent.
    pub fn new(mesh: Arc<Mesh>, file: PathBuf) -> anyhow::Result<Self> {
        let (_, extent) = open(&file)?;
        Ok(SubSmoke { mesh, file, extent })
    }

    /// Number of voxels along x, y, z
    pub fn shape(&self) -> [usize; 3] {
        extent_shape(&self.extent)
    }

    /// Position of the first voxel
    pub fn origin(&self) -> anyhow::Result<[f32; 3]> {
        self.mesh
            .position([self.extent[0], self.extent[2], self.extent[4]])
    }

    /// Reads and decodes all frames. With `ignore_errors`, a damaged tail is dropped.
    pub fn load(&self, settings: &ReaderSettings) -> anyhow::Result<Frames<u8>> {
        let (mut reader, extent) = open(&self.file)?;
        anyhow::ensure!(
            extent == self.extent,
            "{} changed since it was opened",
            self.file.display()
        );
        let mut frames = Frames::new(self.shape());
        let expected = frames.frame_len();
        let res = (|| -> anyhow::Result<()> {
            while let Some(time) = reader.next_record()? {
                let time = crate::fortran::decode_f32s(&time)?;
                anyhow::ensure!(time.len() == 1, "time record with {} values", time.len());
                let sizes = reader.i32s()?;
                anyhow::ensure!(sizes.len() == 2, "size record with {} values", sizes.len());
                anyhow::ensure!(
                    sizes[0] as usize == expected,
                    "frame at t={} has {} voxels, expected {}",
                    time[0],
                    sizes[0],
                    expected
                );
                let encoded = reader.record()?;
                anyhow::ensure!(
                    encoded.len() == sizes[1] as usize,
                    "frame at t={} has {} compressed bytes, header says {}",
                    time[0],
                    encoded.len(),
                    sizes[1]
                );
                let decoded = decode_rle(&encoded, expected)
                    .with_context(|| format!("decoding frame at t={}", time[0]))?;
                frames.push(time[0], &decoded)?;
            }
            Ok(())
        })();
        let what = format!(
            "end of smoke file {} after {} frames",
            self.file.display(),
            frames.len()
        );
        settings.recover(what, res.context("reading smoke frames"))?;
        if settings.debug {
            tracing::debug!(
                "read {} frames of shape {:?} from {}",
                frames.len(),
                frames.shape,
                self.file.display()
            );
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil;

    #[test]
    fn rle() -> anyhow::Result<()> {
        assert_eq!(decode_rle(&[1, 255, 7, 3, 2], 5)?, vec![1, 7, 7, 7, 2]);
        assert_eq!(decode_rle(&[255, 255, 2], 2)?, vec![255, 255]);
        assert!(decode_rle(&[1, 255, 7], 4).is_err());
        assert!(decode_rle(&[1, 2], 3).is_err());
        let data: Vec<u8> = vec![0, 0, 0, 0, 9, 255, 3, 3, 3, 3, 3, 1];
        assert_eq!(decode_rle(&testutil::encode_rle(&data), data.len())?, data);
        Ok(())
    }

    #[test]
    fn load_frames() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut mesh = Mesh::new("m", 0, [1, 1, 1]);
        mesh.bounds = [0., 1., 0., 2., 0., 3.];
        mesh.finish()?;
        let file = dir.path().join("a.s3d");
        let extent = [0, 1, 0, 1, 0, 1];
        let frames = vec![(0., vec![0u8; 8]), (0.5, vec![0, 0, 10, 10, 10, 10, 200, 255])];
        testutil::write_smoke_file(&file, extent, &frames)?;
        let sub = SubSmoke::new(Arc::new(mesh), file)?;
        assert_eq!(sub.extent, extent);
        assert_eq!(sub.shape(), [2, 2, 2]);
        let data = sub.load(&ReaderSettings::strict())?;
        assert_eq!(data.times, vec![0., 0.5]);
        assert_eq!(data.frame(1), &[0, 0, 10, 10, 10, 10, 200, 255][..]);
        assert_eq!(sub.origin()?, [0., 0., 0.]);
        Ok(())
    }

    #[test]
    fn rejects_other_versions() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("b.s3d");
        let mut w = testutil::RecordWriter::new();
        w.i32s(&[1, 1, 0, 1, 0, 1, 0, 1]);
        std::fs::write(&file, w.into_bytes())?;
        assert!(open(&file).is_err());
        Ok(())
    }
}
