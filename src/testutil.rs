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

//! Fixtures shared by the tests: writers for FDS binary files and a small sample case.

use std::path::Path;

/// Writes Fortran sequential unformatted records.
pub struct RecordWriter {
    bytes: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        RecordWriter { bytes: Vec::new() }
    }

    pub fn bytes(&mut self, payload: &[u8]) {
        let len = (payload.len() as u32).to_le_bytes();
        self.bytes.extend_from_slice(&len);
        self.bytes.extend_from_slice(payload);
        self.bytes.extend_from_slice(&len);
    }

    /// A string padded to 30 characters, as FDS writes labels
    pub fn string30(&mut self, s: &str) {
        self.bytes(format!("{:<30}", s).as_bytes());
    }

    pub fn i32s(&mut self, values: &[i32]) {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.bytes(&payload);
    }

    pub fn f32s(&mut self, values: &[f32]) {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.bytes(&payload);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub fn write_slice_file(
    path: &Path,
    quantity: &str,
    extent: [i32; 6],
    frames: &[(f32, Vec<f32>)],
) -> anyhow::Result<()> {
    let mut w = RecordWriter::new();
    w.string30(quantity);
    w.string30("q");
    w.string30("u");
    w.i32s(&extent);
    for (time, values) in frames {
        w.f32s(&[*time]);
        w.f32s(values);
    }
    std::fs::write(path, w.into_bytes())?;
    Ok(())
}

/// Run-length encoding as FDS does for smoke: runs longer than 3 and every 255 byte go
/// through the marker.
pub fn encode_rle(data: &[u8]) -> Vec<u8> {
    let mut res = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let value = data[i];
        let mut run = 1;
        while i + run < data.len() && data[i + run] == value && run < 255 {
            run += 1;
        }
        if run > 3 || value == 255 {
            res.extend_from_slice(&[255, value, run as u8]);
        } else {
            res.extend(std::iter::repeat(value).take(run));
        }
        i += run;
    }
    res
}

pub fn write_smoke_file(
    path: &Path,
    extent: [i32; 6],
    frames: &[(f32, Vec<u8>)],
) -> anyhow::Result<()> {
    let mut w = RecordWriter::new();
    let mut header = vec![1, 0];
    header.extend_from_slice(&extent);
    w.i32s(&header);
    for (time, values) in frames {
        let encoded = encode_rle(values);
        w.f32s(&[*time]);
        w.i32s(&[values.len() as i32, encoded.len() as i32]);
        w.bytes(&encoded);
    }
    std::fs::write(path, w.into_bytes())?;
    Ok(())
}

/// `patches` are `(extent, orientation, obstruction index)`, each time step holds the values of
/// every patch.
pub fn write_boundary_file(
    path: &Path,
    quantity: &str,
    patches: &[([i32; 6], i32, i32)],
    steps: &[(f32, Vec<Vec<f32>>)],
) -> anyhow::Result<()> {
    let mut w = RecordWriter::new();
    w.string30(quantity);
    w.string30("q");
    w.string30("u");
    w.i32s(&[patches.len() as i32]);
    for (extent, orientation, obst) in patches {
        let mut v = extent.to_vec();
        v.extend_from_slice(&[*orientation, *obst, 1]);
        w.i32s(&v);
    }
    for (time, values) in steps {
        w.f32s(&[*time]);
        for v in values {
            w.f32s(v);
        }
    }
    std::fs::write(path, w.into_bytes())?;
    Ok(())
}

/// Removes the last `n` bytes of a file
pub fn chop(path: &Path, n: usize) -> anyhow::Result<()> {
    let mut bytes = std::fs::read(path)?;
    bytes.truncate(bytes.len().saturating_sub(n));
    std::fs::write(path, bytes)?;
    Ok(())
}

/// One mesh of 4x4x2 cells over 1m x 1m x 0.5m with two obstructions, two slices, one boundary
/// file and one smoke volume.
pub const SAMPLE_SMV: &str = "\
CHID
 sample

GRID  MESH_1
    4    4    2    0

PDIM
 0.0000 1.0000 0.0000 1.0000 0.0000 0.5000 0.0 0.0 0.0

TRNX
   0
    0  0.00000
    1  0.25000
    2  0.50000
    3  0.75000
    4  1.00000

TRNY
   0
    0  0.00000
    1  0.25000
    2  0.50000
    3  0.75000
    4  1.00000

TRNZ
   0
    0  0.00000
    1  0.25000
    2  0.50000

OBST
   2
 0.250000 0.500000 0.250000 0.500000 0.000000 0.250000 1 0 0 0 0 0
 0.500000 0.750000 0.500000 0.750000 0.000000 0.500000 2 0 0 0 0 0
    1    2    1    2    0    1   -1   -1
    2    3    2    3    0    2   -1   -1

VENT
   1   0
  0.0 1.0 0.0 1.0 0.0 0.0 1 0 0 0
    0 4 0 4 0 0 -99 -99

SLCF     1 # STRUCTURED &     0     4     0     4     1     1 ! 1
 sample_0001_01.sf
 TEMPERATURE
 temp
 C
SLCF     1 # STRUCTURED &     2     2     0     4     0     2 ! 2
 sample_0001_02.sf
 MASS FRACTION
 Y_SOOT
 kg/kg
BNDF     1     1
 sample_0001_01.bf
 WALL TEMPERATURE
 wall_temp
 C
SMOKF3D     1     1.0
 sample_0001.s3d
 SOOT DENSITY
 rho_C0.9H0.1
 mg/m3
";

/// Boundary patches of the sample case: top and x- face of obstruction 1, top of obstruction 2
pub const SAMPLE_PATCHES: [([i32; 6], i32, i32); 3] = [
    ([1, 2, 1, 2, 1, 1], 3, 1),
    ([1, 1, 1, 2, 0, 1], -1, 1),
    ([2, 3, 2, 3, 2, 2], 3, 2),
];

/// Writes the sample case in `dir`, with three time steps everywhere but two for smoke.
pub fn write_sample_simulation(dir: &Path) -> anyhow::Result<()> {
    std::fs::write(dir.join("sample.smv"), SAMPLE_SMV)?;
    let times = [0., 0.5, 1.];
    let temperature: Vec<(f32, Vec<f32>)> = times
        .iter()
        .map(|&t| (t, (0..25).map(|i| 20. + i as f32 + 10. * t).collect()))
        .collect();
    write_slice_file(
        &dir.join("sample_0001_01.sf"),
        "TEMPERATURE",
        [0, 4, 0, 4, 1, 1],
        &temperature,
    )?;
    let fraction: Vec<(f32, Vec<f32>)> = times
        .iter()
        .map(|&t| (t, (0..15).map(|i| i as f32 * 0.01 * t).collect()))
        .collect();
    write_slice_file(
        &dir.join("sample_0001_02.sf"),
        "MASS FRACTION",
        [2, 2, 0, 4, 0, 2],
        &fraction,
    )?;
    let steps: Vec<(f32, Vec<Vec<f32>>)> = times
        .iter()
        .map(|&t| {
            let values = (0..3)
                .map(|p| (0..4).map(|i| 100. * p as f32 + i as f32 + t).collect())
                .collect();
            (t, values)
        })
        .collect();
    write_boundary_file(
        &dir.join("sample_0001_01.bf"),
        "WALL TEMPERATURE",
        &SAMPLE_PATCHES,
        &steps,
    )?;
    let smoke: Vec<(f32, Vec<u8>)> = [0., 0.5]
        .iter()
        .map(|&t| (t, (0..75).map(|i| if i < 40 { 0 } else { (i * 3) as u8 }).collect()))
        .collect();
    write_smoke_file(&dir.join("sample_0001.s3d"), [0, 4, 0, 4, 0, 2], &smoke)?;
    Ok(())
}

/// Two meshes of 2x2x1 cells side by side along x, over 0..1 and 1..2. Obstruction 10 spans both
/// meshes, where it is the first obstruction of mesh 1 and the second of mesh 2. Slice 1 and the
/// smoke volume cover both meshes.
pub const TWO_MESH_SMV: &str = "\
CHID
 two

GRID  MESH_1
    2    2    1    0

PDIM
 0.0000 1.0000 0.0000 1.0000 0.0000 1.0000 0.0 0.0 0.0

OBST
   2
 0.500000 1.000000 0.000000 0.500000 0.000000 1.000000 10 0 0 0 0 0
 0.000000 0.500000 0.500000 1.000000 0.000000 1.000000 11 0 0 0 0 0
    1    2    0    1    0    1   -1   -1
    0    1    1    2    0    1   -1   -1

GRID  MESH_2
    2    2    1    0

PDIM
 1.0000 2.0000 0.0000 1.0000 0.0000 1.0000 0.0 0.0 0.0

OBST
   2
 1.500000 2.000000 0.500000 1.000000 0.000000 1.000000 12 0 0 0 0 0
 1.000000 1.500000 0.000000 0.500000 0.000000 1.000000 10 0 0 0 0 0
    1    2    1    2    0    1   -1   -1
    0    1    0    1    0    1   -1   -1

SLCF     1 # STRUCTURED &     0     2     0     2     0     0 ! 1
 two_0001_01.sf
 TEMPERATURE
 temp
 C
SLCF     2 # STRUCTURED &     0     2     0     2     0     0 ! 1
 two_0002_01.sf
 TEMPERATURE
 temp
 C
BNDF     1     1
 two_0001_01.bf
 WALL TEMPERATURE
 wall_temp
 C
BNDF     2     1
 two_0002_01.bf
 WALL TEMPERATURE
 wall_temp
 C
SMOKF3D     1     1.0
 two_0001.s3d
 SOOT DENSITY
 rho_C0.9H0.1
 mg/m3
SMOKF3D     2     1.0
 two_0002.s3d
 SOOT DENSITY
 rho_C0.9H0.1
 mg/m3
";

/// Boundary patches of mesh 1 of the two mesh case: tops of its obstructions 1 and 2
pub const TWO_MESH_PATCHES_1: [([i32; 6], i32, i32); 2] =
    [([1, 2, 0, 1, 1, 1], 3, 1), ([0, 1, 1, 2, 1, 1], 3, 2)];

/// Boundary patches of mesh 2: top of its obstruction 1, top and x- face of its obstruction 2
pub const TWO_MESH_PATCHES_2: [([i32; 6], i32, i32); 3] = [
    ([1, 2, 1, 2, 1, 1], 3, 1),
    ([0, 1, 0, 1, 1, 1], 3, 2),
    ([0, 0, 0, 1, 0, 1], -1, 2),
];

/// Writes the two mesh case in `dir`, with two time steps everywhere. Mesh 2 holds the larger
/// slice values.
pub fn write_two_mesh_simulation(dir: &Path) -> anyhow::Result<()> {
    std::fs::write(dir.join("two.smv"), TWO_MESH_SMV)?;
    let times = [0., 1.];
    for &(mesh, offset) in &[(1usize, 20f32), (2, 40.)] {
        let values: Vec<(f32, Vec<f32>)> = times
            .iter()
            .map(|&t| (t, (0..9).map(|i| offset + i as f32 + t).collect()))
            .collect();
        write_slice_file(
            &dir.join(format!("two_000{}_01.sf", mesh)),
            "TEMPERATURE",
            [0, 2, 0, 2, 0, 0],
            &values,
        )?;
        let smoke: Vec<(f32, Vec<u8>)> = times
            .iter()
            .map(|&t| (t, (0..18).map(|i| (i * mesh) as u8).collect()))
            .collect();
        write_smoke_file(&dir.join(format!("two_000{}.s3d", mesh)), [0, 2, 0, 2, 0, 1], &smoke)?;
    }
    let patches: [&[([i32; 6], i32, i32)]; 2] = [&TWO_MESH_PATCHES_1, &TWO_MESH_PATCHES_2];
    for (mesh, patches) in patches.iter().enumerate() {
        let steps: Vec<(f32, Vec<Vec<f32>>)> = times
            .iter()
            .map(|&t| {
                let values = (0..patches.len())
                    .map(|p| {
                        let base = 100. * mesh as f32 + 10. * p as f32;
                        (0..4).map(|i| base + i as f32 + t).collect()
                    })
                    .collect();
                (t, values)
            })
            .collect();
        write_boundary_file(
            &dir.join(format!("two_000{}_01.bf", mesh + 1)),
            "WALL TEMPERATURE",
            patches,
            &steps,
        )?;
    }
    Ok(())
}
