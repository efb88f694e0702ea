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

//! Reader for Fortran unformatted sequential files, the container of every FDS data file.
//!
//! Each record is framed by its length in bytes as a little endian 32 bit integer, before and
//! after the payload.

use anyhow::Context;
use std::io::Read;

/// Reads records one at a time from an underlying byte source.
pub struct RecordReader<R: Read> {
    /// underlying byte source
    read: R,
    /// byte offset of the next record
    offset: u64,
    /// number of records read so far
    records: usize,
}

/// Reads until `buf` is full or EOF is reached. Returns the number of bytes read.
fn fill<R: Read>(read: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut done = 0;
    while done < buf.len() {
        match read.read(&mut buf[done..]) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(done)
}

impl<R: Read> RecordReader<R> {
    /// Creates a reader positioned before the first record.
    pub fn new(read: R) -> Self {
        Self {
            read,
            offset: 0,
            records: 0,
        }
    }

    /// Byte offset of the next record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records read so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Returns the payload of the next record, or None on EOF between two records. A file
    /// ending inside a record is an error.
    pub fn next_record(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        let mut marker = [0u8; 4];
        let n = fill(&mut self.read, &mut marker)
            .with_context(|| format!("reading record marker at offset {}", self.offset))?;
        match n {
            0 => return Ok(None),
            4 => {}
            n => anyhow::bail!(
                "truncated record marker at offset {} ({} bytes)",
                self.offset,
                n
            ),
        }
        let len = u32::from_le_bytes(marker) as usize;
        // the buffer grows with the bytes actually present, never with the marker alone
        let mut data = Vec::new();
        let n = (&mut self.read)
            .take(len as u64)
            .read_to_end(&mut data)
            .with_context(|| format!("reading record {} at offset {}", self.records, self.offset))?;
        anyhow::ensure!(
            n == len,
            "record {} at offset {} is truncated: {} of {} bytes",
            self.records,
            self.offset,
            n,
            len
        );
        let mut trailer = [0u8; 4];
        let n = fill(&mut self.read, &mut trailer)
            .with_context(|| format!("reading end of record {}", self.records))?;
        anyhow::ensure!(
            n == 4 && trailer == marker,
            "record {} at offset {}: trailing marker does not match length {}",
            self.records,
            self.offset,
            len
        );
        self.offset += len as u64 + 8;
        self.records += 1;
        Ok(Some(data))
    }

    /// Like `next_record`, but EOF is an error.
    pub fn record(&mut self) -> anyhow::Result<Vec<u8>> {
        let offset = self.offset;
        self.next_record()?
            .with_context(|| format!("unexpected end of file at offset {}", offset))
    }

    /// Reads a record of 32 bit signed integers.
    pub fn i32s(&mut self) -> anyhow::Result<Vec<i32>> {
        let data = self.record()?;
        decode_i32s(&data).with_context(|| format!("record {}", self.records - 1))
    }

    /// Reads a record of 32 bit floats.
    pub fn f32s(&mut self) -> anyhow::Result<Vec<f32>> {
        let data = self.record()?;
        decode_f32s(&data).with_context(|| format!("record {}", self.records - 1))
    }

    /// Reads a record holding a single float.
    pub fn f32_scalar(&mut self) -> anyhow::Result<f32> {
        let values = self.f32s()?;
        anyhow::ensure!(
            values.len() == 1,
            "expected one float in record {}, found {}",
            self.records - 1,
            values.len()
        );
        Ok(values[0])
    }

    /// Reads a fixed width character record, trimmed.
    pub fn string(&mut self) -> anyhow::Result<String> {
        let data = self.record()?;
        Ok(String::from_utf8_lossy(&data).trim().to_owned())
    }
}

/// Decodes little endian signed integers.
pub fn decode_i32s(data: &[u8]) -> anyhow::Result<Vec<i32>> {
    anyhow::ensure!(
        data.len() % 4 == 0,
        "{} bytes is not a whole number of integers",
        data.len()
    );
    Ok(data
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decodes little endian floats.
pub fn decode_f32s(data: &[u8]) -> anyhow::Result<Vec<f32>> {
    anyhow::ensure!(
        data.len() % 4 == 0,
        "{} bytes is not a whole number of floats",
        data.len()
    );
    Ok(data
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
