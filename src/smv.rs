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

//! Parser for the `.smv` index file written by FDS.
//!
//! The file is a sequence of blocks. A block starts with a keyword in the first column and
//! continues with indented data lines. Only the blocks needed to locate obstructions, slices,
//! boundary files and 3D smoke are interpreted; all others are skipped.

use crate::mesh::Mesh;
use crate::quantity::Quantity;
use crate::settings::ReaderSettings;
use anyhow::Context;
use std::convert::TryFrom;

/// An obstruction as declared in one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct ObstDecl {
    /// 0-based mesh index
    pub mesh: usize,
    /// 1-based position in the OBST block of its mesh, as referenced by boundary files
    pub local_index: usize,
    /// Id shared by the parts of an obstruction across meshes
    pub id: i64,
    /// `x1 x2 y1 y2 z1 z2`
    pub bounds: [f32; 6],
    /// `i1 i2 j1 j2 k1 k2`
    pub extent: [i32; 6],
}

/// A slice file declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SliceDecl {
    /// 0-based mesh index
    pub mesh: usize,
    /// Id shared by the parts of a slice across meshes, when FDS wrote one
    pub id: Option<usize>,
    /// SLCC instead of SLCF
    pub cell_centered: bool,
    /// `i1 i2 j1 j2 k1 k2`
    pub extent: [i32; 6],
    /// File name relative to the `.smv` file
    pub file: String,
    /// What is sliced
    pub quantity: Quantity,
}

/// A 3D smoke file declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Smoke3dDecl {
    /// 0-based mesh index
    pub mesh: usize,
    /// File name relative to the `.smv` file
    pub file: String,
    /// What the volume holds
    pub quantity: Quantity,
}

/// A boundary file declaration
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryDecl {
    /// 0-based mesh index
    pub mesh: usize,
    /// BNDC instead of BNDF
    pub cell_centered: bool,
    /// File name relative to the `.smv` file
    pub file: String,
    /// Quantity on the walls
    pub quantity: Quantity,
}

/// Everything interpreted from a `.smv` file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmvFile {
    /// Case id
    pub chid: String,
    /// Meshes
    pub meshes: Vec<Mesh>,
    /// Obstructions, per mesh
    pub obstructions: Vec<ObstDecl>,
    /// Slice files
    pub slices: Vec<SliceDecl>,
    /// 3D smoke files
    pub smoke3d: Vec<Smoke3dDecl>,
    /// Boundary files
    pub boundaries: Vec<BoundaryDecl>,
}

/// Parses a keyword at the start of a line
fn keyword(input: &str) -> nom::IResult<&str, &str> {
    nom::bytes::complete::take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parses a space separated list of signed integers, after optional spaces
fn int_list(input: &str) -> nom::IResult<&str, Vec<i64>> {
    use nom::*;
    sequence::preceded(
        character::complete::space0,
        multi::separated_list1(
            character::complete::space1,
            combinator::map_res(
                combinator::recognize(
                    combinator::opt(character::complete::one_of("+-"))
                        .and(character::complete::digit1),
                ),
                |s: &str| s.parse::<i64>(),
            ),
        ),
    )(input)
}

/// Parses a space separated list of floats, after optional spaces
fn float_list(input: &str) -> nom::IResult<&str, Vec<f32>> {
    use nom::*;
    sequence::preceded(
        character::complete::space0,
        multi::separated_list1(character::complete::space1, number::complete::float),
    )(input)
}

fn ints(line: &str, lineno: usize, at_least: usize) -> anyhow::Result<Vec<i64>> {
    let (_, values) = int_list(line)
        .map_err(|_| anyhow::anyhow!("expected a list of integers line {}", lineno))?;
    anyhow::ensure!(
        values.len() >= at_least,
        "expected at least {} integers line {}, found {}",
        at_least,
        lineno,
        values.len()
    );
    Ok(values)
}

fn floats(line: &str, lineno: usize, at_least: usize) -> anyhow::Result<Vec<f32>> {
    let (_, values) = float_list(line)
        .map_err(|_| anyhow::anyhow!("expected a list of numbers line {}", lineno))?;
    anyhow::ensure!(
        values.len() >= at_least,
        "expected at least {} numbers line {}, found {}",
        at_least,
        lineno,
        values.len()
    );
    Ok(values)
}

fn count(value: i64, lineno: usize) -> anyhow::Result<usize> {
    usize::try_from(value)
        .map_err(|_| anyhow::anyhow!("negative count {} line {}", value, lineno))
}

fn extent(values: &[i64], lineno: usize) -> anyhow::Result<[i32; 6]> {
    let mut res = [0i32; 6];
    for (r, &v) in res.iter_mut().zip(values) {
        *r = i32::try_from(v)
            .map_err(|_| anyhow::anyhow!("index {} out of range line {}", v, lineno))?;
    }
    Ok(res)
}

/// Line cursor, 1-based line numbers
struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line))
    }

    /// next data line of a block
    fn data(&mut self, block: &str) -> anyhow::Result<(usize, &'a str)> {
        let after = self.pos;
        self.next_line()
            .with_context(|| format!("end of file in {} block after line {}", block, after))
    }

    /// the four lines following file declarations: file, quantity name, short name, unit
    fn file_and_quantity(&mut self, block: &str) -> anyhow::Result<(String, Quantity)> {
        let (lineno, file) = self.data(block)?;
        let file = file.trim();
        anyhow::ensure!(!file.is_empty(), "empty file name line {}", lineno);
        let (_, name) = self.data(block)?;
        let (_, short_name) = self.data(block)?;
        let (_, unit) = self.data(block)?;
        Ok((file.to_owned(), Quantity::new(name, short_name, unit)))
    }
}

/// Converts a 1-based mesh number to an index into the meshes declared so far
fn mesh_index(header: &str, lineno: usize, nmeshes: usize) -> anyhow::Result<usize> {
    let number = ints(header, lineno, 1)?[0];
    anyhow::ensure!(
        number >= 1 && number as usize <= nmeshes,
        "mesh number {} line {} but {} meshes are declared",
        number,
        lineno,
        nmeshes
    );
    Ok(number as usize - 1)
}

fn current_mesh<'m>(meshes: &'m mut Vec<Mesh>, block: &str) -> anyhow::Result<&'m mut Mesh> {
    meshes
        .last_mut()
        .with_context(|| format!("{} block before any GRID", block))
}

fn parse_grid(cursor: &mut Cursor, name: &str, smv: &mut SmvFile) -> anyhow::Result<()> {
    let (lineno, line) = cursor.data("GRID")?;
    let v = ints(line, lineno, 3)?;
    let cells = [count(v[0], lineno)?, count(v[1], lineno)?, count(v[2], lineno)?];
    let index = smv.meshes.len();
    smv.meshes.push(Mesh::new(name, index, cells));
    Ok(())
}

fn parse_pdim(cursor: &mut Cursor, mesh: &mut Mesh) -> anyhow::Result<()> {
    let (lineno, line) = cursor.data("PDIM")?;
    let v = floats(line, lineno, 6)?;
    mesh.bounds.copy_from_slice(&v[..6]);
    Ok(())
}

fn parse_trn(cursor: &mut Cursor, mesh: &mut Mesh, axis: usize) -> anyhow::Result<()> {
    let (lineno, line) = cursor.data("TRN")?;
    let special = count(ints(line, lineno, 1)?[0], lineno)?;
    for _ in 0..special {
        cursor.data("TRN")?;
    }
    let n = mesh.cells[axis] + 1;
    let mut coords = Vec::new();
    for _ in 0..n {
        let (lineno, line) = cursor.data("TRN")?;
        coords.push(floats(line, lineno, 2)?[1]);
    }
    mesh.coordinates[axis] = coords;
    Ok(())
}

fn parse_obst(cursor: &mut Cursor, mesh: usize) -> anyhow::Result<Vec<ObstDecl>> {
    let (lineno, line) = cursor.data("OBST")?;
    let n = count(ints(line, lineno, 1)?[0], lineno)?;
    let mut decls = Vec::new();
    for local in 0..n {
        let (lineno, line) = cursor.data("OBST")?;
        let v = floats(line, lineno, 7)?;
        let mut bounds = [0.; 6];
        bounds.copy_from_slice(&v[..6]);
        decls.push(ObstDecl {
            mesh,
            local_index: local + 1,
            id: v[6] as i64,
            bounds,
            extent: [0; 6],
        });
    }
    for decl in decls.iter_mut() {
        let (lineno, line) = cursor.data("OBST")?;
        decl.extent = extent(&ints(line, lineno, 6)?, lineno)?;
    }
    Ok(decls)
}

/// `SLCF     1 # STRUCTURED &     0    20     0    20    10    10 ! 1`
fn parse_slice(
    cursor: &mut Cursor,
    header: &str,
    lineno: usize,
    nmeshes: usize,
    cell_centered: bool,
) -> anyhow::Result<SliceDecl> {
    let mesh = mesh_index(header, lineno, nmeshes)?;
    let (_, ranges) = header
        .split_once('&')
        .with_context(|| format!("missing index ranges line {}", lineno))?;
    let (ranges, id) = match ranges.split_once('!') {
        Some((ranges, id)) => (ranges, Some(count(ints(id, lineno, 1)?[0], lineno)?)),
        None => (ranges, None),
    };
    let extent = extent(&ints(ranges, lineno, 6)?, lineno)?;
    let (file, quantity) = cursor.file_and_quantity("SLCF")?;
    Ok(SliceDecl {
        mesh,
        id,
        cell_centered,
        extent,
        file,
        quantity,
    })
}

/// Parses the content of a `.smv` file. Malformed blocks are skipped when
/// `settings.ignore_errors` is set, otherwise they are an error.
pub fn parse_smv(text: &str, settings: &ReaderSettings) -> anyhow::Result<SmvFile> {
    let mut smv = SmvFile::default();
    let mut cursor = Cursor::new(text);
    while let Some((lineno, line)) = cursor.next_line() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let (rest, kw) = match keyword(line) {
            Ok(x) => x,
            Err(_) => continue,
        };
        let nmeshes = smv.meshes.len();
        let res: anyhow::Result<()> = match kw {
            "CHID" => cursor.data(kw).map(|(_, chid)| smv.chid = chid.trim().to_owned()),
            "GRID" => parse_grid(&mut cursor, rest, &mut smv),
            "PDIM" => current_mesh(&mut smv.meshes, kw).and_then(|m| parse_pdim(&mut cursor, m)),
            "TRNX" | "TRNY" | "TRNZ" => {
                let axis = match kw {
                    "TRNX" => 0,
                    "TRNY" => 1,
                    _ => 2,
                };
                current_mesh(&mut smv.meshes, kw).and_then(|m| parse_trn(&mut cursor, m, axis))
            }
            "OBST" if nmeshes == 0 => Err(anyhow::anyhow!("OBST block before any GRID")),
            "OBST" => parse_obst(&mut cursor, nmeshes - 1).map(|d| smv.obstructions.extend(d)),
            "SLCF" | "SLCC" => parse_slice(&mut cursor, rest, lineno, nmeshes, kw == "SLCC")
                .map(|d| smv.slices.push(d)),
            "BNDF" | "BNDC" => mesh_index(rest, lineno, nmeshes).and_then(|mesh| {
                let (file, quantity) = cursor.file_and_quantity(kw)?;
                smv.boundaries.push(BoundaryDecl {
                    mesh,
                    cell_centered: kw == "BNDC",
                    file,
                    quantity,
                });
                Ok(())
            }),
            "SMOKF3D" | "SMOKG3D" | "SMOKE3D" => mesh_index(rest, lineno, nmeshes).and_then(|mesh| {
                let (file, quantity) = cursor.file_and_quantity(kw)?;
                smv.smoke3d.push(Smoke3dDecl {
                    mesh,
                    file,
                    quantity,
                });
                Ok(())
            }),
            _ => Ok(()),
        };
        settings.recover(format!("{} block line {}", kw, lineno), res)?;
    }
    for mesh in smv.meshes.iter_mut() {
        mesh.finish()?;
    }
    anyhow::ensure!(!smv.meshes.is_empty(), "no mesh declared");
    if smv.chid.is_empty() {
        tracing::warn!("no CHID in .smv file");
    }
    Ok(smv)
}
