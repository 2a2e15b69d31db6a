use crate::error::{Error, Result};
use crate::header::Axis;
use log::warn;

pub const MIN_RECORD_LINES: usize = 8;

/// One event block of a report, as read from the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// position of the block among the non-blank blocks of the report
    pub chunk_index: usize,
    pub incident_label: String,
    pub fragment_tags: Vec<String>,
    pub electron_gain: f64,
    pub final_axis_velocity: f64,
    pub final_speed: f64,
}

/// A block that could not be turned into a record or classified.
#[derive(Debug)]
pub struct SkippedChunk {
    /// same numbering as `RawRecord::chunk_index`
    pub index: usize,
    pub reason: Error,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub skipped: Vec<SkippedChunk>,
}

/// Splits a report into blank-line separated blocks and reads one record
/// from each. Malformed blocks are logged and collected, never fatal.
pub fn extract_records(text: &str, projectile_axis: Axis) -> Extraction {
    let text = text.replace("\r\n", "\n");
    let mut extraction = Extraction::default();

    let chunks = text.split("\n\n").filter(|c| !c.trim().is_empty());
    for (index, chunk) in chunks.enumerate() {
        match parse_chunk(index, chunk, projectile_axis) {
            Ok(record) => extraction.records.push(record),
            Err(reason) => {
                warn!("skipping chunk {}: {}", index, reason);
                extraction.skipped.push(SkippedChunk { index, reason });
            }
        }
    }
    extraction
}

pub fn parse_chunk(chunk_index: usize, chunk: &str, projectile_axis: Axis) -> Result<RawRecord> {
    let lines: Vec<&str> = chunk
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < MIN_RECORD_LINES {
        return Err(Error::format(format!(
            "record has {} lines, expected at least {}",
            lines.len(),
            MIN_RECORD_LINES
        )));
    }

    let fields = fields(lines[0]);
    let (incident_label, fragment_tags) = match fields.split_first() {
        Some((label, tags)) => (
            label.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        ),
        None => return Err(Error::format("record has an empty label line")),
    };

    Ok(RawRecord {
        chunk_index,
        incident_label,
        fragment_tags,
        electron_gain: last_float(lines[1], "electron gain")?,
        final_axis_velocity: last_float(lines[projectile_axis.velocity_line()], "axis velocity")?,
        final_speed: last_float(lines[7], "final speed")?,
    })
}

fn fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

fn last_float(line: &str, field: &'static str) -> Result<f64> {
    let value = fields(line)
        .last()
        .copied()
        .ok_or_else(|| Error::format(format!("no value for {}", field)))?;
    value.parse::<f64>().map_err(|_| Error::parse(field, value))
}
