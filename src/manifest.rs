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

//! The simulation manifest listing every exported header

use anyhow::Context;
use serde::{Serialize, Serializer};
use std::path::{Component, Path, PathBuf};

/// Headers of the exported entities, relative to the directory of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Obstruction headers
    pub obstructions: Vec<String>,
    /// Slice headers
    pub slices: Vec<String>,
    /// 3D smoke headers
    pub volumes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ManifestFile<'a> {
    num_obstructions: usize,
    num_slices: usize,
    num_volumes: usize,
    obstructions: &'a [String],
    slices: &'a [String],
    volumes: &'a [String],
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ManifestFile {
            num_obstructions: self.obstructions.len(),
            num_slices: self.slices.len(),
            num_volumes: self.volumes.len(),
            obstructions: &self.obstructions,
            slices: &self.slices,
            volumes: &self.volumes,
        }
        .serialize(serializer)
    }
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_owned())
    } else {
        let cwd = std::env::current_dir().context("getting the current directory")?;
        Ok(cwd.join(path))
    }
}

/// Path of `header` relative to the directory `base`, with `/` separators and `..` steps when
/// `header` is outside `base`. Both paths are compared lexically, without resolving links.
pub fn relative_ref(base: &Path, header: &Path) -> anyhow::Result<String> {
    let (base, header) = (absolute(base)?, absolute(header)?);
    let from: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = header
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    anyhow::ensure!(
        common > 0,
        "{} and {} have no common root",
        header.display(),
        base.display()
    );
    let mut parts = Vec::new();
    for c in &from[common..] {
        match c {
            Component::Normal(_) => parts.push("..".to_owned()),
            _ => anyhow::bail!(
                "cannot reach {} from {}",
                header.display(),
                base.display()
            ),
        }
    }
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    Ok(parts.join("/"))
}

/// Where the manifest goes: `<base>/<case>-smv.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    /// Directory of the manifest
    pub base: PathBuf,
    /// Name stem of the manifest
    pub case: String,
}

impl ManifestLocation {
    /// Path of the manifest file
    pub fn path(&self) -> PathBuf {
        self.base.join(format!("{}-smv.yaml", self.case))
    }
}

impl Manifest {
    /// Writes the manifest, creating its directory if needed, and returns its path.
    pub fn write(&self, location: &ManifestLocation) -> anyhow::Result<PathBuf> {
        let path = location.path();
        std::fs::create_dir_all(&location.base)
            .with_context(|| format!("creating {}", location.base.display()))?;
        let text = serde_yaml::to_string(self).context("serializing manifest")?;
        std::fs::write(&path, text)
            .with_context(|| format!("writing manifest {}", path.display()))?;
        tracing::info!(
            "wrote manifest {} ({} obstructions, {} slices, {} volumes)",
            path.display(),
            self.obstructions.len(),
            self.slices.len(),
            self.volumes.len()
        );
        Ok(path)
    }
}
