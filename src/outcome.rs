use crate::chunk::RawRecord;
use crate::error::{Error, Result};
use crate::header::Header;
use log::debug;
use std::fmt;

/// Hydrogen mass in eV fs^2 / A^2.
pub const HYDROGEN_MASS: f64 = 103.64269314;

/// Placeholder written when the molecule did not fragment.
pub const NO_FRAGMENTS: &str = "none";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Behavior {
    Reflected,
    Transmitted,
}

impl Behavior {
    pub fn code(&self) -> &'static str {
        match self {
            Behavior::Reflected => "R",
            Behavior::Transmitted => "T",
        }
    }

    /// Reflected when the velocity along the projectile axis changed sign.
    /// Zero counts as positive.
    pub fn classify(initial_velocity: f64, final_axis_velocity: f64) -> Behavior {
        if sign(initial_velocity) != sign(final_axis_velocity) {
            Behavior::Reflected
        } else {
            Behavior::Transmitted
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn sign(v: f64) -> i8 {
    if v >= 0.0 {
        1
    } else {
        -1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub incident_point: String,
    pub behavior: Behavior,
    pub electron_gain: f64,
    pub kinetic_energy_loss: f64,
    pub fragment_products: String,
}

pub fn kinetic_energy_loss(initial_velocity: f64, final_speed: f64) -> f64 {
    0.5 * HYDROGEN_MASS * (initial_velocity.powi(2) - final_speed.powi(2))
}

/// Grid coordinate part of an incident label, everything after
/// `molecule_scan_`.
pub fn incident_point(incident_label: &str) -> Result<&str> {
    incident_label.splitn(3, '_').nth(2).ok_or_else(|| {
        Error::format(format!("incident label '{}' has no grid coordinate", incident_label))
    })
}

// species part of a tag such as "C2H[3]"
fn species(tag: &str) -> &str {
    tag.split('[').next().unwrap_or(tag).trim()
}

/// The last tag is the recoiling projectile and is not reported.
pub fn fragment_products(fragment_tags: &[String], molecule_name: &str) -> String {
    match fragment_tags.first() {
        None => NO_FRAGMENTS.to_string(),
        Some(first) if species(first) == molecule_name => NO_FRAGMENTS.to_string(),
        Some(_) => fragment_tags[..fragment_tags.len() - 1]
            .iter()
            .map(|t| species(t))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub fn classify(record: &RawRecord, header: &Header) -> Result<OutcomeRecord> {
    let outcome = OutcomeRecord {
        incident_point: incident_point(&record.incident_label)?.to_string(),
        behavior: Behavior::classify(header.initial_velocity, record.final_axis_velocity),
        electron_gain: record.electron_gain,
        kinetic_energy_loss: kinetic_energy_loss(header.initial_velocity, record.final_speed),
        fragment_products: fragment_products(&record.fragment_tags, &header.molecule_name),
    };
    debug!(
        "{}: {} gain={} loss={} products={}",
        outcome.incident_point,
        outcome.behavior,
        outcome.electron_gain,
        outcome.kinetic_energy_loss,
        outcome.fragment_products
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Axis;

    fn header() -> Header {
        Header {
            projectile_axis: Axis::Y,
            molecule_name: "C2H2".to_string(),
            initial_velocity: 0.10,
        }
    }

    fn record(label: &str, tags: &[&str], v_axis: f64, speed: f64) -> RawRecord {
        RawRecord {
            chunk_index: 0,
            incident_label: label.to_string(),
            fragment_tags: tags.iter().map(|t| t.to_string()).collect(),
            electron_gain: 0.3,
            final_axis_velocity: v_axis,
            final_speed: speed,
        }
    }

    #[test]
    fn sign_flip_is_reflection() {
        assert_eq!(Behavior::classify(0.1, -0.05), Behavior::Reflected);
        assert_eq!(Behavior::classify(0.1, 0.05), Behavior::Transmitted);
        assert_eq!(Behavior::classify(-0.1, -0.05), Behavior::Transmitted);
        assert_eq!(Behavior::classify(-0.1, 0.0), Behavior::Reflected);
        assert_eq!(Behavior::classify(0.0, 0.0), Behavior::Transmitted);
    }

    #[test]
    fn energy_loss_ignores_sign_of_speed() {
        for &v in &[0.0, 0.03, 0.12, 1.7] {
            assert_eq!(kinetic_energy_loss(0.1, v), kinetic_energy_loss(0.1, -v));
        }
        let expected = 0.5 * HYDROGEN_MASS * (0.01 - 0.0144);
        assert!((kinetic_energy_loss(0.1, 0.12) - expected).abs() < 1e-12);
    }

    #[test]
    fn unfragmented_molecule_gives_none() {
        let r = record("C2H2_x0z1_x0z1", &["C2H2[1]", "H[2]"], -0.05, 0.12);
        let o = classify(&r, &header()).unwrap();
        assert_eq!(o.incident_point, "x0z1");
        assert_eq!(o.behavior, Behavior::Reflected);
        assert_eq!(o.behavior.code(), "R");
        assert_eq!(o.fragment_products, NO_FRAGMENTS);

        let tags: Vec<String> = vec!["C2H2[1]".into(), "C[3]".into(), "H[2]".into()];
        assert_eq!(fragment_products(&tags, "C2H2"), NO_FRAGMENTS);
        assert_eq!(fragment_products(&[], "C2H2"), NO_FRAGMENTS);
    }

    #[test]
    fn fragments_exclude_recoil_partner() {
        let r = record("C2H2_x0z1_x0z1", &["C2H[1]", "H[2]"], -0.05, 0.12);
        assert_eq!(classify(&r, &header()).unwrap().fragment_products, "C2H");

        let tags: Vec<String> = vec!["CH[1]".into(), "C H[2]".into(), "H[3]".into()];
        assert_eq!(fragment_products(&tags, "C2H2"), "CH, C H");
    }

    #[test]
    fn label_without_coordinate_fails() {
        let r = record("C2H2_x0z1", &["H[1]"], 0.1, 0.1);
        assert!(matches!(classify(&r, &header()), Err(Error::Format(_))));
        assert_eq!(incident_point("N2_p_x1z2_gs").unwrap(), "x1z2_gs");
    }
}
