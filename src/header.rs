use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // scanned axis pair at the start of the third label segment, e.g. "x0z3"
    static ref SCAN_AXES_RE: Regex = Regex::new(r"^([xyzXYZ])\d+([xyzXYZ])").unwrap();
}

/// Cartesian axis of the simulation box.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn from_char(c: char) -> Option<Axis> {
        match c.to_ascii_lowercase() {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }

    // line of a record holding the final velocity component along this axis
    pub fn velocity_line(&self) -> usize {
        match self {
            Axis::X => 4,
            Axis::Y => 5,
            Axis::Z => 6,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        };
        write!(f, "{}", c)
    }
}

/// Run-level settings taken from the first line of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub projectile_axis: Axis,
    pub molecule_name: String,
    pub initial_velocity: f64,
}

/// Parses the report's first line. The initial velocity is not part of the
/// file and is supplied by the caller.
pub fn parse_header(first_line: &str, initial_velocity: f64) -> Result<Header> {
    let first_field = first_line.split(',').next().unwrap_or("").trim();
    let parts: Vec<&str> = first_field.split('_').collect();
    if parts.len() < 3 {
        return Err(Error::format(format!(
            "header field '{}' has fewer than 3 underscore segments",
            first_field
        )));
    }

    let caps = SCAN_AXES_RE.captures(parts[2]).ok_or_else(|| {
        Error::format(format!("no scan axis pattern in '{}'", parts[2]))
    })?;

    let scanned: Vec<Axis> = [&caps[1], &caps[2]]
        .iter()
        .filter_map(|s| s.chars().next().and_then(Axis::from_char))
        .collect();
    let missing: Vec<Axis> = Axis::ALL
        .iter()
        .copied()
        .filter(|a| !scanned.contains(a))
        .collect();
    if missing.len() != 1 {
        return Err(Error::format(format!(
            "could not determine projectile axis from '{}'",
            parts[2]
        )));
    }

    Ok(Header {
        projectile_axis: missing[0],
        molecule_name: parts[0].to_string(),
        initial_velocity,
    })
}
