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

//! Time series of 3D arrays, and their conversion to bytes

use itertools::Itertools;
use structopt::clap::arg_enum;

arg_enum! {
    /// Memory layout of exported arrays. `F` (Fortran, column-major) puts x fastest, `C` puts z
    /// fastest. Time is always the outermost dimension.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub enum ArrayOrder {
        C,
        F
    }
}

/// Frames of a 3D array over time, each frame stored with x fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Frames<T> {
    /// Time of each frame
    pub times: Vec<f32>,
    /// Size along x, y, z
    pub shape: [usize; 3],
    /// All frames one after the other
    pub values: Vec<T>,
}

impl<T: Copy + Default> Frames<T> {
    /// No frame yet
    pub fn new(shape: [usize; 3]) -> Self {
        Frames {
            times: Vec::new(),
            shape,
            values: Vec::new(),
        }
    }

    /// Number of values in a frame
    pub fn frame_len(&self) -> usize {
        self.shape.iter().fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when no frame has been read
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Appends a frame
    pub fn push(&mut self, time: f32, frame: &[T]) -> anyhow::Result<()> {
        anyhow::ensure!(
            frame.len() == self.frame_len(),
            "frame at t={} has {} values, expected {} for shape {:?}",
            time,
            frame.len(),
            self.frame_len(),
            self.shape
        );
        self.times.push(time);
        self.values.extend_from_slice(frame);
        Ok(())
    }

    /// Values of frame `t`
    pub fn frame(&self, t: usize) -> &[T] {
        let n = self.frame_len();
        &self.values[t * n..(t + 1) * n]
    }

    /// Keeps at most `len` frames
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.times.truncate(len);
            let n = self.frame_len();
            self.values.truncate(len * n);
        }
    }

    /// Mean time between two frames, 0 with less than two frames.
    pub fn time_step(&self) -> f32 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) if self.len() > 1 => (last - first) / (self.len() - 1) as f32,
            _ => 0.,
        }
    }

    /// All values in the requested order.
    pub fn ordered(&self, order: ArrayOrder) -> Vec<T> {
        match order {
            ArrayOrder::F => self.values.clone(),
            ArrayOrder::C => {
                let [nx, ny, nz] = self.shape;
                let mut res = vec![T::default(); self.values.len()];
                for t in 0..self.len() {
                    let src = self.frame(t);
                    let dst = &mut res[t * src.len()..(t + 1) * src.len()];
                    for k in 0..nz {
                        for j in 0..ny {
                            for i in 0..nx {
                                dst[(i * ny + j) * nz + k] = src[i + nx * (j + ny * k)];
                            }
                        }
                    }
                }
                res
            }
        }
    }
}

impl Frames<f32> {
    /// Smallest and largest finite values, None when there are none.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .minmax()
            .into_option()
    }
}

/// Merges value ranges
pub fn union_range(ranges: impl IntoIterator<Item = Option<(f32, f32)>>) -> Option<(f32, f32)> {
    ranges
        .into_iter()
        .flatten()
        .fold(None, |acc, (lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((a, b)) => Some((a.min(lo), b.max(hi))),
        })
}

/// Maps floats in `min..=max` linearly to bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    /// value mapped to 0
    pub min: f32,
    /// value mapped to 255
    pub max: f32,
}

impl Quantizer {
    /// A quantizer for the range, or for `0..=0` when there are no values.
    pub fn new(range: Option<(f32, f32)>) -> Self {
        let (min, max) = range.unwrap_or((0., 0.));
        Quantizer { min, max }
    }

    /// Value of one byte step, so that `value = min + byte * scale_factor`.
    pub fn scale_factor(&self) -> f32 {
        (self.max - self.min) / 255.
    }

    /// Quantizes the values; NaN maps to 0 and out of range values are clamped.
    pub fn quantize(&self, values: &[f32]) -> Vec<u8> {
        let range = self.max - self.min;
        let scale = if range > 0. { 255. / range } else { 0. };
        values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    0
                } else {
                    ((v - self.min) * scale).round().max(0.).min(255.) as u8
                }
            })
            .collect()
    }
}

/// Joins numbers with spaces, the way vectors are written in export headers.
pub fn join<T: std::fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values.into_iter().join(" ")
}
