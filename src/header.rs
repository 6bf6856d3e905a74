//! Parser for the plain-text `{name}.hea` channel description.
//!
//! Line 1 is `{name} {channels} {rate} {length}`; each of the next 13 lines
//! describes one lead with 9 whitespace separated fields. The header is only
//! used to validate the signal matrix and is not kept afterwards.

use std::fs;
use std::path::Path;

use log::debug;

use crate::types::*;

/// Recording-level header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub name: String,
    pub channels: usize,
    pub rate: u32,
    pub length: usize,
    pub signals: Vec<ChannelDescriptor>,
}

/// One per-lead descriptor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub filename: String,
    pub format: String,
    pub unit: String,
    pub resolution: String,
    pub zero: String,
    /// Initial value, reserved and unchecked
    pub initial_value: i64,
    /// Checksum, reserved and unchecked
    pub checksum: i64,
    pub block_size: String,
    pub description: String,
}

/// Reads `path` and validates it against the recording name and length
/// already established from the signal matrix.
pub fn read_header<P: AsRef<Path>>(path: P, name: &str, length: usize) -> Result<RecordHeader> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_header(&text, name, length)
}

/// Parses header text. Any mismatch fails the whole parse.
pub fn parse_header(text: &str, name: &str, length: usize) -> Result<RecordHeader> {
    let mut lines = text.lines();

    let first = lines
        .next()
        .ok_or_else(|| schema("header is empty"))?;
    let mut header = parse_record_line(first)?;

    if header.name != name {
        return Err(schema(format!(
            "header names recording '{}', expected '{}'",
            header.name, name
        )));
    }
    if header.channels != NUM_CHANNELS {
        return Err(schema(format!(
            "header declares {} channels, expected {}",
            header.channels, NUM_CHANNELS
        )));
    }
    if header.rate != SAMPLE_RATE {
        return Err(schema(format!(
            "header declares {} Hz, expected {} Hz",
            header.rate, SAMPLE_RATE
        )));
    }
    if header.length != length {
        return Err(schema(format!(
            "header declares {} samples, signal has {}",
            header.length, length
        )));
    }

    let expected_file = format!("{}{}", name, SIGNAL_SUFFIX);
    for (index, spec) in CHANNELS.iter().enumerate() {
        let line = lines
            .next()
            .ok_or_else(|| schema(format!("header is missing the line for channel {}", index)))?;
        let descriptor = parse_channel_line(line, index)?;
        check_channel(&descriptor, index, spec, &expected_file)?;
        header.signals.push(descriptor);
    }

    debug!("Header for {} validated: {} channels", name, header.signals.len());

    Ok(header)
}

fn parse_record_line(line: &str) -> Result<RecordHeader> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(schema(format!(
            "header record line has {} fields, expected 4: '{}'",
            fields.len(),
            line.trim()
        )));
    }

    Ok(RecordHeader {
        name: fields[0].to_string(),
        channels: parse_number(fields[1], "channel count")?,
        rate: parse_number(fields[2], "sample rate")?,
        length: parse_number(fields[3], "length")?,
        signals: Vec::with_capacity(NUM_CHANNELS),
    })
}

fn parse_channel_line(line: &str, index: usize) -> Result<ChannelDescriptor> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 9 {
        return Err(schema(format!(
            "channel {} line has {} fields, expected 9: '{}'",
            index,
            fields.len(),
            line.trim()
        )));
    }

    Ok(ChannelDescriptor {
        filename: fields[0].to_string(),
        format: fields[1].to_string(),
        unit: fields[2].to_string(),
        resolution: fields[3].to_string(),
        zero: fields[4].to_string(),
        initial_value: parse_number(fields[5], "initial value")?,
        checksum: parse_number(fields[6], "checksum")?,
        block_size: fields[7].to_string(),
        description: fields[8].to_string(),
    })
}

fn check_channel(
    descriptor: &ChannelDescriptor,
    index: usize,
    spec: &ChannelSpec,
    expected_file: &str,
) -> Result<()> {
    let checks = [
        ("filename", descriptor.filename.as_str(), expected_file),
        ("format", descriptor.format.as_str(), SIGNAL_FORMAT),
        ("unit", descriptor.unit.as_str(), spec.unit),
        ("resolution", descriptor.resolution.as_str(), ADC_RESOLUTION),
        ("zero", descriptor.zero.as_str(), ADC_ZERO),
        ("block size", descriptor.block_size.as_str(), BLOCK_SIZE),
        ("name", descriptor.description.as_str(), spec.name),
    ];

    for (field, found, expected) in checks {
        if found != expected {
            return Err(schema(format!(
                "channel {} {} is '{}', expected '{}'",
                index, field, found, expected
            )));
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| schema(format!("header {} '{}' is not a valid number", what, token)))
}
