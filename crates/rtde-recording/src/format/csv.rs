// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delimited text writer.
//!
//! Vector fields expand to one column per component (`actual_q_0` ..
//! `actual_q_5`); scalar fields keep their name. The default delimiter is a
//! single space.

use super::{FormatError, RowWriter};
use rtde::{Recipe, Sample, Value};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default column delimiter.
pub const DEFAULT_DELIMITER: char = ' ';

/// CSV row writer.
pub struct CsvWriter<W: Write> {
    writer: W,
    columns: Vec<String>,
    field_count: usize,
    delimiter: char,
    line: String,
    rows: u64,
}

impl CsvWriter<BufWriter<File>> {
    /// Create (truncate) a CSV file.
    pub fn create<P: AsRef<Path>>(path: P, recipe: &Recipe) -> Result<Self, FormatError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), recipe))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W, recipe: &Recipe) -> Self {
        let mut columns = Vec::new();
        for (name, ty) in recipe.fields() {
            match ty.components() {
                1 => columns.push(name.to_string()),
                n => columns.extend((0..n).map(|i| format!("{}_{}", name, i))),
            }
        }

        Self {
            writer,
            columns,
            field_count: recipe.len(),
            delimiter: DEFAULT_DELIMITER,
            line: String::with_capacity(256),
            rows: 0,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Expanded column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn push_cell(&mut self, cell: std::fmt::Arguments<'_>) {
        if !self.line.is_empty() {
            self.line.push(self.delimiter);
        }
        // Writing into a String cannot fail.
        let _ = self.line.write_fmt(cell);
    }

    fn push_value(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => self.push_cell(format_args!("{}", if *v { "True" } else { "False" })),
            Value::Uint8(v) => self.push_cell(format_args!("{}", v)),
            Value::Uint32(v) => self.push_cell(format_args!("{}", v)),
            Value::Uint64(v) => self.push_cell(format_args!("{}", v)),
            Value::Int32(v) => self.push_cell(format_args!("{}", v)),
            Value::Double(v) => self.push_cell(format_args!("{:?}", v)),
            Value::Vector3d(v) => v.iter().for_each(|x| self.push_cell(format_args!("{:?}", x))),
            Value::Vector6d(v) => v.iter().for_each(|x| self.push_cell(format_args!("{:?}", x))),
            Value::Vector6Int32(v) => v.iter().for_each(|x| self.push_cell(format_args!("{}", x))),
            Value::Vector6Uint32(v) => {
                v.iter().for_each(|x| self.push_cell(format_args!("{}", x)))
            }
        }
    }
}

impl<W: Write> RowWriter for CsvWriter<W> {
    fn write_header(&mut self) -> Result<(), FormatError> {
        let delimiter = self.delimiter.to_string();
        let mut header = self.columns.join(&delimiter);
        header.push('\n');
        self.writer.write_all(header.as_bytes())?;
        Ok(())
    }

    fn write_row(&mut self, sample: &Sample) -> Result<(), FormatError> {
        let values = sample.values();
        if values.len() != self.field_count {
            return Err(FormatError::RecipeMismatch {
                expected: self.field_count,
                got: values.len(),
            });
        }

        // Format the whole line first so a failed write never leaves half a row
        // in the buffer.
        self.line.clear();
        for value in values {
            self.push_value(value);
        }
        self.line.push('\n');

        self.writer.write_all(self.line.as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        self.writer.flush()?;
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }
}
