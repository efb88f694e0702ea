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

//! A simulation: the `.smv` index and the data files it references

use crate::mesh::Mesh;
use crate::obstruction::{BoundaryFile, FaceData, Obstruction, SubObstruction};
use crate::settings::ReaderSettings;
use crate::slice::{Slice, SubSlice};
use crate::smoke3d::{Smoke3D, SubSmoke};
use crate::smv::{parse_smv, SmvFile};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything that can be exported from a simulation.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Directory of the `.smv` file, against which data files are resolved
    pub root: PathBuf,
    /// The `.smv` file
    pub smv_file: PathBuf,
    /// Case id
    pub chid: String,
    /// Meshes, in `.smv` order
    pub meshes: Vec<Arc<Mesh>>,
    /// Obstructions, in order of first appearance
    pub obstructions: Vec<Obstruction>,
    /// Slices, in order of first appearance
    pub slices: Vec<Slice>,
    /// 3D smoke volumes, in order of first appearance
    pub smoke_3d: Vec<Smoke3D>,
    /// Settings the simulation was read with
    pub settings: ReaderSettings,
    /// Records that were skipped because they could not be read
    pub skipped: Vec<String>,
}

/// Finds the `.smv` file: `path` itself, or the only one in directory `path`.
pub fn locate_smv(path: &Path) -> anyhow::Result<PathBuf> {
    if !path.is_dir() {
        anyhow::ensure!(path.exists(), "{} does not exist", path.display());
        return Ok(path.to_owned());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("listing simulation directory {}", path.display()))?
    {
        let entry = entry.with_context(|| format!("listing {}", path.display()))?;
        let p = entry.path();
        if p.extension().map_or(false, |e| e == "smv") && p.is_file() {
            found.push(p);
        }
    }
    found.sort();
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => anyhow::bail!("no .smv file in {}", path.display()),
        n => anyhow::bail!(
            "{} .smv files in {}, pass the one to use: {:?}",
            n,
            path.display(),
            found
        ),
    }
}

/// Collects records skipped under `ignore_errors`
struct Skipper<'a> {
    settings: &'a ReaderSettings,
    skipped: Vec<String>,
}

impl<'a> Skipper<'a> {
    fn check<T>(&mut self, what: String, res: anyhow::Result<T>) -> anyhow::Result<Option<T>> {
        let res = self.settings.recover(&what, res)?;
        if res.is_none() {
            self.skipped.push(what);
        }
        Ok(res)
    }
}

impl Simulation {
    /// Reads the `.smv` file at `path`, or the only one in directory `path`, and opens the data
    /// files it references.
    pub fn open(path: impl AsRef<Path>, settings: ReaderSettings) -> anyhow::Result<Self> {
        let smv_file = locate_smv(path.as_ref())?;
        let _span = tracing::info_span!("open", smv = %smv_file.display()).entered();
        let bytes = std::fs::read(&smv_file)
            .with_context(|| format!("reading {}", smv_file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let smv = parse_smv(&text, &settings)
            .with_context(|| format!("parsing {}", smv_file.display()))?;
        let root = smv_file
            .parent()
            .map(Path::to_owned)
            .unwrap_or_else(|| PathBuf::from("."));
        let sim = Self::from_smv(smv, root, smv_file, settings)?;
        tracing::info!(
            "{}: {} meshes, {} obstructions, {} slices, {} smoke volumes",
            sim.chid,
            sim.meshes.len(),
            sim.obstructions.len(),
            sim.slices.len(),
            sim.smoke_3d.len()
        );
        Ok(sim)
    }

    fn from_smv(
        smv: SmvFile,
        root: PathBuf,
        smv_file: PathBuf,
        settings: ReaderSettings,
    ) -> anyhow::Result<Self> {
        let mut skipper = Skipper {
            settings: &settings,
            skipped: Vec::new(),
        };
        let meshes: Vec<Arc<Mesh>> = smv.meshes.into_iter().map(Arc::new).collect();

        let mut boundaries = Vec::new();
        for decl in smv.boundaries {
            let file = root.join(&decl.file);
            let res = BoundaryFile::new(
                meshes[decl.mesh].clone(),
                file,
                decl.quantity,
                decl.cell_centered,
            );
            if let Some(bf) = skipper.check(format!("boundary file {}", decl.file), res)? {
                boundaries.push(Arc::new(bf));
            }
        }

        let mut obstructions: Vec<Obstruction> = Vec::new();
        for decl in smv.obstructions {
            let sub = SubObstruction {
                mesh: meshes[decl.mesh].clone(),
                local_index: decl.local_index,
                bounds: decl.bounds,
                extent: decl.extent,
            };
            match obstructions.iter_mut().find(|o| o.id == decl.id) {
                Some(obst) => obst.subobstructions.push(sub),
                None => obstructions.push(Obstruction {
                    id: decl.id,
                    subobstructions: vec![sub],
                    faces: Vec::new(),
                }),
            }
        }
        for obst in obstructions.iter_mut() {
            for bf in &boundaries {
                for (i, patch) in bf.patches.iter().enumerate() {
                    let on_obst = obst
                        .subobstructions
                        .iter()
                        .any(|s| s.mesh.index == bf.mesh.index && s.local_index == patch.obst_index);
                    if on_obst {
                        obst.faces.push(FaceData {
                            source: bf.clone(),
                            patch: i,
                        });
                    }
                }
            }
        }

        let mut next_id = smv.slices.iter().filter_map(|s| s.id).max().unwrap_or(0) + 1;
        let mut slices: Vec<Slice> = Vec::new();
        for decl in smv.slices {
            let id = decl.id.unwrap_or_else(|| {
                next_id += 1;
                next_id - 1
            });
            let sub = SubSlice {
                mesh: meshes[decl.mesh].clone(),
                file: root.join(&decl.file),
                extent: decl.extent,
            };
            let res = sub.check().map(|_| sub);
            let sub = match skipper.check(format!("slice file {}", decl.file), res)? {
                Some(sub) => sub,
                None => continue,
            };
            match slices.iter_mut().find(|s| s.id == id) {
                Some(slice) => slice.subslices.push(sub),
                None => slices.push(Slice {
                    id,
                    quantity: decl.quantity,
                    cell_centered: decl.cell_centered,
                    subslices: vec![sub],
                }),
            }
        }

        let mut smoke_3d: Vec<Smoke3D> = Vec::new();
        for decl in smv.smoke3d {
            let res = SubSmoke::new(meshes[decl.mesh].clone(), root.join(&decl.file));
            let sub = match skipper.check(format!("smoke file {}", decl.file), res)? {
                Some(sub) => sub,
                None => continue,
            };
            match smoke_3d
                .iter_mut()
                .find(|s| s.quantity.name == decl.quantity.name)
            {
                Some(smoke) => smoke.subsmokes.push(sub),
                None => smoke_3d.push(Smoke3D {
                    quantity: decl.quantity,
                    subsmokes: vec![sub],
                }),
            }
        }

        let skipped = skipper.skipped;
        Ok(Simulation {
            root,
            smv_file,
            chid: smv.chid,
            meshes,
            obstructions,
            slices,
            smoke_3d,
            settings,
            skipped,
        })
    }

    /// A short description of the simulation
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            chid: self.chid.clone(),
            smv_file: self.smv_file.clone(),
            meshes: self
                .meshes
                .iter()
                .map(|m| MeshSummary {
                    id: m.id.clone(),
                    cells: m.cells,
                    bounds: m.bounds,
                })
                .collect(),
            obstructions: self.obstructions.len(),
            boundary_faces: self.obstructions.iter().map(|o| o.faces.len()).sum(),
            slices: self
                .slices
                .iter()
                .map(|s| format!("{} ({})", s.quantity, s.subslices.len()))
                .collect(),
            volumes: self
                .smoke_3d
                .iter()
                .map(|s| format!("{} ({})", s.quantity, s.subsmokes.len()))
                .collect(),
            skipped: self.skipped.clone(),
        }
    }
}

/// Overview of a mesh, as printed by `smvinfo`
#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    /// Name of the mesh
    pub id: String,
    /// Cells along x, y, z
    pub cells: [usize; 3],
    /// `xmin xmax ymin ymax zmin zmax`
    pub bounds: [f32; 6],
}

/// Overview of a simulation, as printed by `smvinfo`
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    /// Case id
    pub chid: String,
    /// Index file
    pub smv_file: PathBuf,
    /// Meshes
    pub meshes: Vec<MeshSummary>,
    /// Number of obstructions
    pub obstructions: usize,
    /// Number of obstruction faces with boundary data
    pub boundary_faces: usize,
    /// Quantity and number of meshes of every slice
    pub slices: Vec<String>,
    /// Quantity and number of meshes of every smoke volume
    pub volumes: Vec<String>,
    /// Unreadable records
    pub skipped: Vec<String>,
}
