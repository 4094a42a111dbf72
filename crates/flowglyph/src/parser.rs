//! Lenient reader for the flow-field table.
//!
//! Bad rows never abort a parse: they are dropped one by one and counted in
//! [`ParseSummary`].

use std::borrow::Cow;
use std::io;
use std::path::Path;

use glam::Vec3;
use log::{debug, info, trace};
use serde::Serialize;

use crate::sample::FlowSample;

/// Minimum number of comma-separated fields in a data row.
pub const REQUIRED_FIELDS: usize = 20;

const FIELD_DELIMITER: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep every `stride`-th data row (0 and 1 keep all rows).
    pub stride: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { stride: 1 }
    }
}

/// Row accounting for one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    /// Non-blank rows after the header.
    pub data_rows: usize,
    /// Rows skipped by decimation before validation.
    pub skipped_by_stride: usize,
    /// Rows with fewer than [`REQUIRED_FIELDS`] fields.
    pub dropped_short: usize,
    /// Rows where at least one required field is not a number.
    pub dropped_malformed: usize,
    /// Rows whose velocity magnitude is zero or not finite.
    pub dropped_degenerate: usize,
    pub accepted: usize,
}

impl ParseSummary {
    pub fn dropped(&self) -> usize {
        self.dropped_short + self.dropped_malformed + self.dropped_degenerate
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub samples: Vec<FlowSample>,
    pub summary: ParseSummary,
}

enum RowError {
    Short(usize),
    Malformed(usize),
    Degenerate,
}

/// Parse a whole table with default options.
pub fn parse_table(text: &str) -> ParsedTable {
    parse_table_with(text, &ParseOptions::default())
}

pub fn parse_table_with(text: &str, options: &ParseOptions) -> ParsedTable {
    let stride = options.stride.max(1);
    let mut summary = ParseSummary::default();
    let mut samples = Vec::new();

    // The first non-blank line is the header, whatever it contains.
    let mut rows = text.split('\n').filter(|line| !line.trim().is_empty());
    let _header = rows.next();

    for (row_index, line) in rows.enumerate() {
        summary.data_rows += 1;

        if row_index % stride != 0 {
            summary.skipped_by_stride += 1;
            continue;
        }

        match parse_row(line) {
            Ok(sample) => {
                samples.push(sample);
                summary.accepted += 1;
            }
            Err(RowError::Short(found)) => {
                trace!("row {}: {} fields, need {}", row_index, found, REQUIRED_FIELDS);
                summary.dropped_short += 1;
            }
            Err(RowError::Malformed(column)) => {
                trace!("row {}: column {} is not a number", row_index, column);
                summary.dropped_malformed += 1;
            }
            Err(RowError::Degenerate) => {
                trace!("row {}: zero velocity", row_index);
                summary.dropped_degenerate += 1;
            }
        }
    }

    if summary.dropped() > 0 {
        debug!(
            "Dropped {} rows ({} short, {} malformed, {} zero velocity)",
            summary.dropped(),
            summary.dropped_short,
            summary.dropped_malformed,
            summary.dropped_degenerate
        );
    }

    info!(
        "Parsed {} samples from {} data rows (stride {})",
        summary.accepted, summary.data_rows, stride
    );

    ParsedTable { samples, summary }
}

fn parse_row(line: &str) -> Result<FlowSample, RowError> {
    // Field count is checked before any field is parsed.
    let found = line.split(FIELD_DELIMITER).count();
    if found < REQUIRED_FIELDS {
        return Err(RowError::Short(found));
    }

    let mut values = [0f32; REQUIRED_FIELDS];
    for (column, field) in line.split(FIELD_DELIMITER).take(REQUIRED_FIELDS).enumerate() {
        values[column] = field
            .trim()
            .parse::<f32>()
            .map_err(|_| RowError::Malformed(column))?;
    }

    let vec3 = |at: usize| Vec3::new(values[at], values[at + 1], values[at + 2]);

    let velocity = vec3(12);
    let magnitude = velocity.length();
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return Err(RowError::Degenerate);
    }

    Ok(FlowSample {
        measured_position: vec3(0),
        aux_vectors: [vec3(3), vec3(6)],
        original_position: vec3(9),
        direction: velocity / magnitude,
        magnitude,
        energy: (values[15] + values[16] + values[17]) / 3.0,
        pressure: values[18],
        temperature: values[19],
    })
}

/// Fast path: prefer mmap; fall back to a single read.
#[cfg(feature = "mmap")]
pub fn read_table_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> io::Result<ParsedTable> {
    let file = std::fs::File::open(path)?;
    let map = unsafe { memmap2::MmapOptions::new().map(&file)? };
    Ok(parse_table_with(&decode(&map), options))
}

#[cfg(not(feature = "mmap"))]
pub fn read_table_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> io::Result<ParsedTable> {
    let bytes = std::fs::read(path)?;
    Ok(parse_table_with(&decode(&bytes), options))
}

/// Exported tables carry Latin-1 headers; numeric rows are plain ASCII.
#[inline]
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
