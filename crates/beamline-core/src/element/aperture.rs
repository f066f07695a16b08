//! Physical aperture attached to an element.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tolerance::params_eq;

/// Transverse aperture shape and dimensions, in metres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aperture {
    Circle { radius: f64 },
    Rectangle { half_x: f64, half_y: f64 },
    Ellipse { half_x: f64, half_y: f64 },
}

impl Aperture {
    /// Shape tag used in element records.
    pub fn tag(&self) -> &'static str {
        match self {
            Aperture::Circle { .. } => "circle",
            Aperture::Rectangle { .. } => "rectangle",
            Aperture::Ellipse { .. } => "ellipse",
        }
    }

    /// Dimensions in record order: `[radius]` or `[half_x, half_y]`.
    pub fn dimensions(&self) -> Vec<f64> {
        match *self {
            Aperture::Circle { radius } => vec![radius],
            Aperture::Rectangle { half_x, half_y } | Aperture::Ellipse { half_x, half_y } => {
                vec![half_x, half_y]
            }
        }
    }

    /// Rebuilds an aperture from its record tag and dimensions.
    ///
    /// Returns `None` when the tag is unknown or the number of dimensions does
    /// not fit the shape.
    pub fn from_parts(tag: &str, dimensions: &[f64]) -> Option<Self> {
        match (tag, dimensions) {
            ("circle", [radius]) => Some(Aperture::Circle { radius: *radius }),
            ("rectangle", [half_x, half_y]) => Some(Aperture::Rectangle {
                half_x: *half_x,
                half_y: *half_y,
            }),
            ("ellipse", [half_x, half_y]) => Some(Aperture::Ellipse {
                half_x: *half_x,
                half_y: *half_y,
            }),
            _ => None,
        }
    }

    /// Returns `true` if every dimension is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.dimensions().iter().all(|d| *d > 0.0 && d.is_finite())
    }
}

impl PartialEq for Aperture {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag()
            && self
                .dimensions()
                .iter()
                .zip(other.dimensions())
                .all(|(a, b)| params_eq(*a, b))
    }
}

impl fmt::Display for Aperture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aperture::Circle { radius } => write!(f, "circle(r={radius})"),
            Aperture::Rectangle { half_x, half_y } => write!(f, "rectangle({half_x}x{half_y})"),
            Aperture::Ellipse { half_x, half_y } => write!(f, "ellipse({half_x}x{half_y})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_roundtrip() {
        let aperture = Aperture::Rectangle {
            half_x: 0.04,
            half_y: 0.02,
        };
        let rebuilt = Aperture::from_parts(aperture.tag(), &aperture.dimensions());
        assert_eq!(rebuilt, Some(aperture));
    }

    #[test]
    fn test_from_parts_rejects_bad_dimensions() {
        assert_eq!(Aperture::from_parts("circle", &[0.1, 0.2]), None);
        assert_eq!(Aperture::from_parts("octagon", &[0.1]), None);
    }

    #[test]
    fn test_is_valid() {
        assert!(Aperture::Circle { radius: 0.03 }.is_valid());
        assert!(!Aperture::Circle { radius: 0.0 }.is_valid());
        assert!(
            !Aperture::Ellipse {
                half_x: 0.1,
                half_y: -0.1
            }
            .is_valid()
        );
    }

    #[test]
    fn test_shapes_differ() {
        let circle = Aperture::Circle { radius: 0.02 };
        let ellipse = Aperture::Ellipse {
            half_x: 0.02,
            half_y: 0.02,
        };
        assert_ne!(circle, ellipse);
    }
}
