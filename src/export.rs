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

//! Export of simulation entities to raw byte arrays described by YAML headers

use crate::data::{join, union_range, ArrayOrder, Frames, Quantizer};
use crate::manifest::{relative_ref, Manifest, ManifestLocation};
use crate::obstruction::{FaceData, Obstruction};
use crate::settings::ReaderSettings;
use crate::simulation::Simulation;
use crate::slice::Slice;
use crate::smoke3d::Smoke3D;
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One mesh of a slice or smoke volume
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshEntry {
    /// Data file name, next to the header
    pub data_file: String,
    /// `nt nx ny nz`
    pub dim_size: String,
    /// Mesh name
    pub mesh: String,
    /// Position of the first value, `x y z`
    pub mesh_pos: String,
    /// `dt dx dy dz`
    pub spacing: String,
}

/// Header of an exported slice
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SliceHeader {
    /// Values at cell centers, written as `0` or `1`
    #[serde(serialize_with = "as_flag")]
    pub cell_centered: bool,
    /// Value mapped to byte 255
    pub data_val_max: f32,
    /// Value mapped to byte 0
    pub data_val_min: f32,
    /// Number of meshes
    pub mesh_num: usize,
    /// One entry per mesh
    pub meshes: Vec<MeshEntry>,
    /// `C` or `F`
    pub ordering: String,
    /// Quantity name
    pub quantity: String,
    /// Value of one byte step
    pub scale_factor: f32,
}

/// Header of an exported smoke volume
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeHeader {
    /// Largest byte
    pub data_val_max: f32,
    /// Smallest byte
    pub data_val_min: f32,
    /// Number of meshes
    pub mesh_num: usize,
    /// One entry per mesh
    pub meshes: Vec<MeshEntry>,
    /// `C` or `F`
    pub ordering: String,
    /// Quantity name
    pub quantity: String,
    /// Always 1, bytes are stored as is
    pub scale_factor: f32,
}

/// One face orientation of an exported obstruction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrientationEntry {
    /// `±1`, `±2` or `±3`
    pub boundary_orientation: i32,
    /// `n1 n2`
    pub dim_size: String,
    /// `dt d1 d2`
    pub spacing: String,
}

/// One quantity of an exported obstruction. The quantity name comes first, which is the order
/// importers read these entries in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuantityEntry {
    /// Quantity name
    pub quantity: String,
    /// Data file name, next to the header
    pub data_file: String,
    /// Value mapped to byte 255
    pub data_val_max: f32,
    /// Value mapped to byte 0
    pub data_val_min: f32,
    /// Value of one byte step
    pub scale_factor: f32,
}

/// Header of an exported obstruction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObstHeader {
    /// `x1 x2 y1 y2 z1 z2`
    pub bounding_box: String,
    /// Number of face orientations
    pub num_orientations: usize,
    /// Number of quantities
    pub num_quantities: usize,
    /// Face orientations
    pub orientations: Vec<OrientationEntry>,
    /// Quantities, one data file each
    pub quantities: Vec<QuantityEntry>,
    /// Number of frames of every orientation
    pub time_steps: usize,
}

fn as_flag<S: serde::Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

fn write_header<H: Serialize>(path: &Path, header: &H) -> anyhow::Result<()> {
    let text = serde_yaml::to_string(header)
        .with_context(|| format!("serializing header {}", path.display()))?;
    std::fs::write(path, text).with_context(|| format!("writing header {}", path.display()))
}

fn write_data(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing data file {}", path.display()))
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))
}

fn mesh_entry<T: Copy + Default>(
    data_file: String,
    frames: &Frames<T>,
    mesh: &crate::mesh::Mesh,
    origin: [f32; 3],
) -> MeshEntry {
    let [nx, ny, nz] = frames.shape;
    let [dx, dy, dz] = mesh.spacing();
    MeshEntry {
        data_file,
        dim_size: join(&[frames.len(), nx, ny, nz]),
        mesh: mesh.id.clone(),
        mesh_pos: join(&origin),
        spacing: join(&[frames.time_step(), dx, dy, dz]),
    }
}

/// Exports a slice to `out_dir/slice-<id>.yaml` and one `.dat` file per mesh. Values are
/// quantized to bytes over the range of all meshes. Returns the header path.
pub fn export_slcf_raw(
    slice: &Slice,
    out_dir: &Path,
    order: ArrayOrder,
    settings: &ReaderSettings,
) -> anyhow::Result<PathBuf> {
    let _span = tracing::debug_span!("export_slice", id = slice.id).entered();
    create_dir(out_dir)?;
    let mut loaded = Vec::with_capacity(slice.subslices.len());
    for sub in &slice.subslices {
        let frames = sub
            .load(settings)
            .with_context(|| format!("loading slice {} of {}", slice.id, slice.quantity))?;
        loaded.push(frames);
    }
    let range = union_range(loaded.iter().map(|f| f.value_range()));
    let quantizer = Quantizer::new(range);
    let mut meshes = Vec::with_capacity(loaded.len());
    for (sub, frames) in slice.subslices.iter().zip(&loaded) {
        let name = format!("slice-{}_mesh-{}.dat", slice.id, sub.mesh.index + 1);
        write_data(&out_dir.join(&name), &quantizer.quantize(&frames.ordered(order)))?;
        meshes.push(mesh_entry(name, frames, &sub.mesh, sub.origin()?));
    }
    let header = SliceHeader {
        cell_centered: slice.cell_centered,
        data_val_max: quantizer.max,
        data_val_min: quantizer.min,
        mesh_num: meshes.len(),
        meshes,
        ordering: order.to_string(),
        quantity: slice.quantity.name.clone(),
        scale_factor: quantizer.scale_factor(),
    };
    let path = out_dir.join(format!("slice-{}.yaml", slice.id));
    write_header(&path, &header)?;
    tracing::debug!("exported slice {} to {}", slice.quantity, path.display());
    Ok(path)
}

/// Exports a smoke volume to `out_dir/smoke-<quantity>.yaml` and one `.dat` file per mesh.
/// Bytes are written as stored by FDS. Returns the header path.
pub fn export_smoke_raw(
    smoke: &Smoke3D,
    out_dir: &Path,
    order: ArrayOrder,
    settings: &ReaderSettings,
) -> anyhow::Result<PathBuf> {
    let stem = format!("smoke-{}", smoke.quantity.dir_name());
    let _span = tracing::debug_span!("export_smoke", quantity = %smoke.quantity).entered();
    create_dir(out_dir)?;
    let mut meshes = Vec::with_capacity(smoke.subsmokes.len());
    let mut range: Option<(u8, u8)> = None;
    for sub in &smoke.subsmokes {
        let frames = sub
            .load(settings)
            .with_context(|| format!("loading smoke of {}", smoke.quantity))?;
        if let (Some(&lo), Some(&hi)) = (frames.values.iter().min(), frames.values.iter().max()) {
            range = Some(match range {
                None => (lo, hi),
                Some((a, b)) => (a.min(lo), b.max(hi)),
            });
        }
        let name = format!("{}_mesh-{}.dat", stem, sub.mesh.index + 1);
        write_data(&out_dir.join(&name), &frames.ordered(order))?;
        meshes.push(mesh_entry(name, &frames, &sub.mesh, sub.origin()?));
    }
    let (min, max) = range.unwrap_or((0, 0));
    let header = VolumeHeader {
        data_val_max: max as f32,
        data_val_min: min as f32,
        mesh_num: meshes.len(),
        meshes,
        ordering: order.to_string(),
        quantity: smoke.quantity.name.clone(),
        scale_factor: 1.,
    };
    let path = out_dir.join(format!("{}.yaml", stem));
    write_header(&path, &header)?;
    tracing::debug!("exported smoke {} to {}", smoke.quantity, path.display());
    Ok(path)
}

/// Boundary data of an obstruction, loaded once per boundary file
struct FaceLoader<'a> {
    settings: &'a ReaderSettings,
    files: HashMap<PathBuf, Vec<Frames<f32>>>,
}

impl<'a> FaceLoader<'a> {
    fn frames(&mut self, face: &FaceData) -> anyhow::Result<&Frames<f32>> {
        let file = &face.source.file;
        if !self.files.contains_key(file) {
            let data = face
                .source
                .load(self.settings)
                .with_context(|| format!("loading boundary data of {}", face.quantity()))?;
            self.files.insert(file.clone(), data);
        }
        Ok(&self.files[file][face.patch])
    }
}

/// Exports an obstruction to `out_dir/obst-<id>.yaml` and one `.dat` file per quantity holding
/// the frames of every orientation in turn. Returns the header path.
///
/// Each orientation is described by its first face. For every quantity, the face with the same
/// orientation, mesh and extent provides the values, and the orientation is filled with zeros
/// when there is none. All faces are cut to the shortest time series.
pub fn export_obst_raw(
    obst: &Obstruction,
    out_dir: &Path,
    order: ArrayOrder,
    settings: &ReaderSettings,
) -> anyhow::Result<PathBuf> {
    let _span = tracing::debug_span!("export_obst", id = obst.id).entered();
    create_dir(out_dir)?;
    let orientations: Vec<&FaceData> = obst
        .orientations()
        .into_iter()
        .filter_map(|o| obst.faces.iter().find(|f| f.orientation() == o))
        .collect();
    let quantities = obst.quantities();
    let mut loader = FaceLoader {
        settings,
        files: HashMap::new(),
    };

    // faces[q][o]: the face providing quantity q on orientation o
    let mut faces: Vec<Vec<Option<Frames<f32>>>> = Vec::with_capacity(quantities.len());
    for q in &quantities {
        let mut row = Vec::with_capacity(orientations.len());
        for repr in &orientations {
            let face = obst.faces.iter().find(|f| {
                f.quantity() == *q
                    && f.orientation() == repr.orientation()
                    && f.source.mesh.index == repr.source.mesh.index
                    && f.patch().extent == repr.patch().extent
            });
            row.push(match face {
                Some(face) => Some(loader.frames(face)?.clone()),
                None => {
                    tracing::debug!(
                        "obstruction {}: no {} on orientation {}",
                        obst.id,
                        q,
                        repr.orientation()
                    );
                    None
                }
            });
        }
        faces.push(row);
    }
    let time_steps = faces
        .iter()
        .flatten()
        .flatten()
        .map(|f| f.len())
        .min()
        .unwrap_or(0);
    let mut dt = 0.;
    for frames in faces.iter_mut().flatten().flatten() {
        frames.truncate(time_steps);
        if dt == 0. {
            dt = frames.time_step();
        }
    }

    let orientation_entries: Vec<OrientationEntry> = orientations
        .iter()
        .map(|face| {
            let patch = face.patch();
            let spacing = face.source.mesh.spacing();
            let [a1, a2] = patch.face_axes();
            OrientationEntry {
                boundary_orientation: patch.orientation,
                dim_size: join(&patch.face_shape()),
                spacing: join(&[dt, spacing[a1], spacing[a2]]),
            }
        })
        .collect();

    let mut quantity_entries = Vec::with_capacity(quantities.len());
    for (q, row) in quantities.iter().zip(&faces) {
        let quantizer = Quantizer::new(union_range(
            row.iter().flatten().map(|f| f.value_range()),
        ));
        let mut bytes = Vec::new();
        for (repr, frames) in orientations.iter().zip(row) {
            match frames {
                Some(frames) => bytes.extend(quantizer.quantize(&frames.ordered(order))),
                None => {
                    let [a, b] = repr.patch().face_shape();
                    bytes.extend(std::iter::repeat(0u8).take(time_steps * a * b));
                }
            }
        }
        let name = format!("obst-{}_{}.dat", obst.id, q.dir_name());
        write_data(&out_dir.join(&name), &bytes)?;
        quantity_entries.push(QuantityEntry {
            quantity: q.name.clone(),
            data_file: name,
            data_val_max: quantizer.max,
            data_val_min: quantizer.min,
            scale_factor: quantizer.scale_factor(),
        });
    }

    let header = ObstHeader {
        bounding_box: join(&obst.bounding_box()),
        num_orientations: orientations.len(),
        num_quantities: quantity_entries.len(),
        orientations: orientation_entries,
        quantities: quantity_entries,
        time_steps,
    };
    let path = out_dir.join(format!("obst-{}.yaml", obst.id));
    write_header(&path, &header)?;
    tracing::debug!("exported obstruction {} to {}", obst.id, path.display());
    Ok(path)
}

/// Exports every obstruction to `out/obst`, every slice to `out/slices/<quantity>` and every
/// smoke volume to `out/smoke/<quantity>`, in collection order. Returns the headers, relative
/// to `manifest_dir`.
pub fn export_entities(
    sim: &Simulation,
    out: &Path,
    order: ArrayOrder,
    manifest_dir: &Path,
) -> anyhow::Result<Manifest> {
    let mut manifest = Manifest::default();
    let obst_dir = out.join("obst");
    for obst in &sim.obstructions {
        let header = export_obst_raw(obst, &obst_dir, order, &sim.settings)
            .with_context(|| format!("exporting obstruction {}", obst.id))?;
        manifest.obstructions.push(relative_ref(manifest_dir, &header)?);
    }
    for slice in &sim.slices {
        let dir = out.join("slices").join(slice.quantity.dir_name());
        let header = export_slcf_raw(slice, &dir, order, &sim.settings)
            .with_context(|| format!("exporting slice {} of {}", slice.id, slice.quantity))?;
        manifest.slices.push(relative_ref(manifest_dir, &header)?);
    }
    for smoke in &sim.smoke_3d {
        let dir = out.join("smoke").join(smoke.quantity.dir_name());
        let header = export_smoke_raw(smoke, &dir, order, &sim.settings)
            .with_context(|| format!("exporting smoke of {}", smoke.quantity))?;
        manifest.volumes.push(relative_ref(manifest_dir, &header)?);
    }
    tracing::info!(
        "exported {} obstructions, {} slices and {} smoke volumes to {}",
        manifest.obstructions.len(),
        manifest.slices.len(),
        manifest.volumes.len(),
        out.display()
    );
    Ok(manifest)
}

/// Where the manifest of `sim` goes by default: in `out`, named after the case id, or after the
/// `.smv` file when the case id is missing.
pub fn default_location(sim: &Simulation, out: &Path) -> ManifestLocation {
    let case = if sim.chid.is_empty() {
        sim.smv_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "simulation".to_owned())
    } else {
        sim.chid.clone()
    };
    ManifestLocation {
        base: out.to_owned(),
        case,
    }
}

/// Exports all entities of `sim` to `out` and writes the manifest next to them. Returns the
/// manifest path.
pub fn export_sim(sim: &Simulation, out: &Path, order: ArrayOrder) -> anyhow::Result<PathBuf> {
    let location = default_location(sim, out);
    let manifest = export_entities(sim, out, order, &location.base)?;
    manifest.write(&location)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil;

    fn sample() -> anyhow::Result<(tempfile::TempDir, Simulation)> {
        let dir = tempfile::tempdir()?;
        testutil::write_sample_simulation(dir.path())?;
        let sim = Simulation::open(dir.path(), ReaderSettings::strict())?;
        Ok((dir, sim))
    }

    fn yaml(path: &Path) -> anyhow::Result<serde_yaml::Value> {
        Ok(serde_yaml::from_str(&std::fs::read_to_string(path)?)?)
    }

    #[test]
    fn slice_export() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let out = dir.path().join("out");
        let header = export_slcf_raw(&sim.slices[0], &out, ArrayOrder::F, &sim.settings)?;
        assert_eq!(header, out.join("slice-1.yaml"));
        let h = yaml(&header)?;
        assert_eq!(h["CellCentered"].as_u64(), Some(0));
        assert_eq!(h["DataValMin"].as_f64(), Some(20.));
        assert_eq!(h["DataValMax"].as_f64(), Some(54.));
        assert_eq!(h["MeshNum"].as_u64(), Some(1));
        assert_eq!(h["Ordering"].as_str(), Some("F"));
        assert_eq!(h["Quantity"].as_str(), Some("TEMPERATURE"));
        let mesh = &h["Meshes"][0];
        assert_eq!(mesh["DataFile"].as_str(), Some("slice-1_mesh-1.dat"));
        assert_eq!(mesh["DimSize"].as_str(), Some("3 5 5 1"));
        assert_eq!(mesh["Mesh"].as_str(), Some("MESH_1"));
        assert_eq!(mesh["MeshPos"].as_str(), Some("0 0 0.25"));
        assert_eq!(mesh["Spacing"].as_str(), Some("0.5 0.25 0.25 0.25"));
        let data = std::fs::read(out.join("slice-1_mesh-1.dat"))?;
        assert_eq!(data.len(), 75);
        assert_eq!(data[0], 0);
        assert_eq!(data[74], 255);
        Ok(())
    }

    #[test]
    fn row_major_slice() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let f = dir.path().join("f");
        let c = dir.path().join("c");
        // 1 x 5 x 3 values: the two orders differ
        export_slcf_raw(&sim.slices[1], &f, ArrayOrder::F, &sim.settings)?;
        export_slcf_raw(&sim.slices[1], &c, ArrayOrder::C, &sim.settings)?;
        let f_data = std::fs::read(f.join("slice-2_mesh-1.dat"))?;
        let c_data = std::fs::read(c.join("slice-2_mesh-1.dat"))?;
        assert_eq!(f_data.len(), c_data.len());
        assert_ne!(f_data, c_data);
        assert_eq!(yaml(&c.join("slice-2.yaml"))?["Ordering"].as_str(), Some("C"));
        Ok(())
    }

    #[test]
    fn smoke_export() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let out = dir.path().join("out");
        let header = export_smoke_raw(&sim.smoke_3d[0], &out, ArrayOrder::F, &sim.settings)?;
        assert_eq!(header, out.join("smoke-soot_density.yaml"));
        let h = yaml(&header)?;
        assert_eq!(h["ScaleFactor"].as_f64(), Some(1.));
        assert_eq!(h["DataValMax"].as_f64(), Some(222.));
        assert_eq!(h["Meshes"][0]["DimSize"].as_str(), Some("2 5 5 3"));
        assert!(h.get("CellCentered").is_none());
        let data = std::fs::read(out.join("smoke-soot_density_mesh-1.dat"))?;
        assert_eq!(data.len(), 150);
        Ok(())
    }

    #[test]
    fn obstruction_export() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let out = dir.path().join("out");
        let header = export_obst_raw(&sim.obstructions[0], &out, ArrayOrder::F, &sim.settings)?;
        assert_eq!(header, out.join("obst-1.yaml"));
        let h = yaml(&header)?;
        assert_eq!(h["BoundingBox"].as_str(), Some("0.25 0.5 0.25 0.5 0 0.25"));
        assert_eq!(h["NumOrientations"].as_u64(), Some(2));
        assert_eq!(h["NumQuantities"].as_u64(), Some(1));
        assert_eq!(h["TimeSteps"].as_u64(), Some(3));
        assert_eq!(h["Orientations"][0]["BoundaryOrientation"].as_i64(), Some(3));
        assert_eq!(h["Orientations"][1]["BoundaryOrientation"].as_i64(), Some(-1));
        assert_eq!(h["Orientations"][1]["DimSize"].as_str(), Some("2 2"));
        assert_eq!(h["Orientations"][1]["Spacing"].as_str(), Some("0.5 0.25 0.25"));
        let q = &h["Quantities"][0];
        assert_eq!(q["Quantity"].as_str(), Some("WALL TEMPERATURE"));
        assert_eq!(q["DataFile"].as_str(), Some("obst-1_wall_temperature.dat"));
        assert_eq!(q["DataValMin"].as_f64(), Some(0.));
        assert_eq!(q["DataValMax"].as_f64(), Some(104.));
        let data = std::fs::read(out.join("obst-1_wall_temperature.dat"))?;
        assert_eq!(data.len(), 2 * 3 * 4);
        assert_eq!(*data.last().unwrap(), 255);
        Ok(())
    }

    #[test]
    fn missing_faces_are_zero() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let mut obst = sim.obstructions[0].clone();
        // a second quantity on the top face only
        let mut other = (*obst.faces[0].source).clone();
        other.quantity = crate::quantity::Quantity::new("HEAT FLUX", "q", "kW/m2");
        obst.faces.push(FaceData {
            source: std::sync::Arc::new(other),
            patch: 0,
        });
        let out = dir.path().join("out");
        export_obst_raw(&obst, &out, ArrayOrder::F, &sim.settings)?;
        let data = std::fs::read(out.join("obst-1_heat_flux.dat"))?;
        assert_eq!(data.len(), 24);
        assert!(data[12..].iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn two_meshes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        testutil::write_two_mesh_simulation(dir.path())?;
        let sim = Simulation::open(dir.path(), ReaderSettings::strict())?;
        let out = dir.path().join("out");
        let m = yaml(&export_sim(&sim, &out, ArrayOrder::F)?)?;
        assert_eq!(m["NumObstructions"].as_u64(), Some(3));
        assert_eq!(m["NumSlices"].as_u64(), Some(1));
        assert_eq!(m["NumVolumes"].as_u64(), Some(1));

        let h = yaml(&out.join("slices/temperature/slice-1.yaml"))?;
        assert_eq!(h["MeshNum"].as_u64(), Some(2));
        assert_eq!(h["DataValMin"].as_f64(), Some(20.));
        assert_eq!(h["DataValMax"].as_f64(), Some(49.));
        assert_eq!(h["Meshes"][1]["DataFile"].as_str(), Some("slice-1_mesh-2.dat"));
        assert_eq!(h["Meshes"][1]["Mesh"].as_str(), Some("MESH_2"));
        assert_eq!(h["Meshes"][1]["MeshPos"].as_str(), Some("1 0 0"));
        let first = std::fs::read(out.join("slices/temperature/slice-1_mesh-1.dat"))?;
        let second = std::fs::read(out.join("slices/temperature/slice-1_mesh-2.dat"))?;
        assert_eq!((first.len(), second.len()), (18, 18));
        assert_eq!((first[0], second[17]), (0, 255));

        let h = yaml(&out.join("smoke/soot_density/smoke-soot_density.yaml"))?;
        assert_eq!(h["MeshNum"].as_u64(), Some(2));
        assert_eq!(h["DataValMax"].as_f64(), Some(34.));
        assert_eq!(
            h["Meshes"][1]["DataFile"].as_str(),
            Some("smoke-soot_density_mesh-2.dat")
        );
        assert!(out.join("smoke/soot_density/smoke-soot_density_mesh-2.dat").exists());

        let h = yaml(&out.join("obst/obst-10.yaml"))?;
        assert_eq!(h["BoundingBox"].as_str(), Some("0.5 1.5 0 0.5 0 1"));
        assert_eq!(h["NumOrientations"].as_u64(), Some(2));
        assert_eq!(h["TimeSteps"].as_u64(), Some(2));
        let data = std::fs::read(out.join("obst/obst-10_wall_temperature.dat"))?;
        assert_eq!(data.len(), 2 * 2 * 4);
        Ok(())
    }

    #[test]
    fn whole_simulation() -> anyhow::Result<()> {
        let (dir, sim) = sample()?;
        let out = dir.path().join("out");
        let path = export_sim(&sim, &out, ArrayOrder::F)?;
        assert_eq!(path, out.join("sample-smv.yaml"));
        let m = yaml(&path)?;
        assert_eq!(m["NumObstructions"].as_u64(), Some(2));
        assert_eq!(m["Obstructions"][1].as_str(), Some("obst/obst-2.yaml"));
        assert_eq!(m["Slices"][0].as_str(), Some("slices/temperature/slice-1.yaml"));
        assert_eq!(m["Slices"][1].as_str(), Some("slices/mass_fraction/slice-2.yaml"));
        assert_eq!(m["Volumes"][0].as_str(), Some("smoke/soot_density/smoke-soot_density.yaml"));
        assert!(out.join("slices/mass_fraction/slice-2_mesh-1.dat").exists());
        Ok(())
    }
}
