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

//! Computational meshes

use anyhow::Context;
use serde::Serialize;
use std::convert::TryFrom;

/// A rectilinear mesh of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    /// Name given in the input file
    pub id: String,
    /// 0-based position in the `.smv` file
    pub index: usize,
    /// Number of cells along x, y and z
    pub cells: [usize; 3],
    /// Physical extent `xmin xmax ymin ymax zmin zmax`
    pub bounds: [f32; 6],
    /// Cell boundary coordinates along each axis, `cells[axis] + 1` each.
    pub coordinates: [Vec<f32>; 3],
}

impl Mesh {
    /// A mesh without coordinates, to be completed by `finish`.
    pub fn new(id: &str, index: usize, cells: [usize; 3]) -> Self {
        Mesh {
            id: id.trim().to_owned(),
            index,
            cells,
            bounds: [0.; 6],
            coordinates: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Fills the coordinates that were not given explicitly with a uniform grid over `bounds`
    /// and checks their lengths.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        for axis in 0..3 {
            let n = self.cells[axis];
            if self.coordinates[axis].is_empty() {
                let (lo, hi) = (self.bounds[2 * axis], self.bounds[2 * axis + 1]);
                let step = if n == 0 { 0. } else { (hi - lo) / n as f32 };
                self.coordinates[axis] = (0..=n).map(|i| lo + step * i as f32).collect();
            }
            anyhow::ensure!(
                self.coordinates[axis].len() == n + 1,
                "mesh {}: {} coordinates along axis {} for {} cells",
                self.id,
                self.coordinates[axis].len(),
                axis,
                n
            );
        }
        Ok(())
    }

    /// Coordinate of the cell boundary `index` along `axis`
    pub fn coordinate(&self, axis: usize, index: i32) -> anyhow::Result<f32> {
        let coords = &self.coordinates[axis];
        usize::try_from(index)
            .ok()
            .and_then(|i| coords.get(i))
            .copied()
            .with_context(|| {
                format!(
                    "index {} out of mesh {} along axis {} ({} cells)",
                    index, self.id, axis, self.cells[axis]
                )
            })
    }

    /// Position of the node `(i, j, k)`
    pub fn position(&self, ijk: [i32; 3]) -> anyhow::Result<[f32; 3]> {
        Ok([
            self.coordinate(0, ijk[0])?,
            self.coordinate(1, ijk[1])?,
            self.coordinate(2, ijk[2])?,
        ])
    }

    /// Mean cell size along each axis
    pub fn spacing(&self) -> [f32; 3] {
        let mut res = [0.; 3];
        for (axis, r) in res.iter_mut().enumerate() {
            let coords = &self.coordinates[axis];
            if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
                if coords.len() > 1 {
                    *r = (last - first) / (coords.len() - 1) as f32;
                }
            }
        }
        res
    }
}

#[test]
fn uniform_coordinates_from_bounds() -> anyhow::Result<()> {
    let mut mesh = Mesh::new("MESH_1", 0, [4, 2, 1]);
    mesh.bounds = [0., 1., -1., 1., 0., 0.5];
    mesh.finish()?;
    assert_eq!(mesh.coordinates[0], vec![0., 0.25, 0.5, 0.75, 1.]);
    assert_eq!(mesh.coordinates[1], vec![-1., 0., 1.]);
    assert_eq!(mesh.spacing(), [0.25, 1., 0.5]);
    assert_eq!(mesh.position([1, 2, 0])?, [0.25, 1., 0.]);
    assert!(mesh.coordinate(0, 5).is_err());
    assert!(mesh.coordinate(0, -1).is_err());
    Ok(())
}

#[test]
fn explicit_coordinates_must_match_cells() {
    let mut mesh = Mesh::new("m", 0, [2, 1, 1]);
    mesh.coordinates[0] = vec![0., 1.];
    assert!(mesh.finish().is_err());
}
