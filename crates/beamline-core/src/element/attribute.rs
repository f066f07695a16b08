//! Scalar element parameters addressable by name.
//!
//! An [`Attribute`] names one scalar inside an element payload. It is the
//! vocabulary shared with expression stores and other collaborators that read
//! or write element parameters without knowing the element's kind.

use std::{fmt, str::FromStr};

/// A settable scalar parameter of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Length,
    Angle,
    E1,
    E2,
    /// Quadrupole gradient; `kn[1]` on multipoles, `k1` on bends.
    K1,
    /// Normal coefficient of the given order (per length on thick elements,
    /// integrated on thin multipoles).
    Kn(usize),
    /// Skew coefficient of the given order.
    Ks(usize),
    /// Solenoid strength `ks` (integrated `ksi` on thin solenoids).
    SolenoidKs,
    Voltage,
    Frequency,
    Lag,
    HKick,
    VKick,
    Hgap,
    Fint,
    /// Curvature of a dipole edge.
    H,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Length => f.write_str("length"),
            Attribute::Angle => f.write_str("angle"),
            Attribute::E1 => f.write_str("e1"),
            Attribute::E2 => f.write_str("e2"),
            Attribute::K1 => f.write_str("k1"),
            Attribute::Kn(order) => write!(f, "kn{order}"),
            Attribute::Ks(order) => write!(f, "ks{order}"),
            Attribute::SolenoidKs => f.write_str("ks"),
            Attribute::Voltage => f.write_str("volt"),
            Attribute::Frequency => f.write_str("freq"),
            Attribute::Lag => f.write_str("lag"),
            Attribute::HKick => f.write_str("hkick"),
            Attribute::VKick => f.write_str("vkick"),
            Attribute::Hgap => f.write_str("hgap"),
            Attribute::Fint => f.write_str("fint"),
            Attribute::H => f.write_str("h"),
        }
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let attribute = match s {
            "length" | "l" => Attribute::Length,
            "angle" => Attribute::Angle,
            "e1" => Attribute::E1,
            "e2" => Attribute::E2,
            "k1" => Attribute::K1,
            "ks" => Attribute::SolenoidKs,
            "volt" => Attribute::Voltage,
            "freq" => Attribute::Frequency,
            "lag" => Attribute::Lag,
            "hkick" => Attribute::HKick,
            "vkick" => Attribute::VKick,
            "hgap" => Attribute::Hgap,
            "fint" => Attribute::Fint,
            "h" => Attribute::H,
            other => {
                let parsed = other
                    .strip_prefix("kn")
                    .and_then(|order| order.parse().ok().map(Attribute::Kn))
                    .or_else(|| {
                        other
                            .strip_prefix("ks")
                            .and_then(|order| order.parse().ok().map(Attribute::Ks))
                    });
                return parsed.ok_or_else(|| format!("unknown attribute `{other}`"));
            }
        };
        Ok(attribute)
    }
}
