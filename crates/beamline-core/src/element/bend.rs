//! Dipole bends and their edge elements.
//!
//! A bend is stored once as [`Bend`]; whether `length` is the arc length or the
//! chord length depends on the [`ElementBody`](super::ElementBody) variant that
//! wraps it (`SectorBend` or `RectangularBend`).
//!
//! # Conversion convention
//!
//! ```text
//!   arc = angle * chord / (2 * sin(angle / 2))      (angle != 0)
//!   arc = chord                                      (angle == 0)
//!
//!   rectangular -> sector:  e1 += angle / 2,  e2 += angle / 2
//!   sector -> rectangular:  e1 -= angle / 2,  e2 -= angle / 2
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tolerance::params_eq;

/// Geometry and focusing of a dipole magnet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bend {
    length: f64,
    angle: f64,
    e1: f64,
    e2: f64,
    k1: f64,
    hgap: f64,
    fint: f64,
}

impl Bend {
    /// Creates a bend with the given length and bending angle and no edge angles.
    pub fn new(length: f64, angle: f64) -> Self {
        Self {
            length,
            angle,
            ..Self::default()
        }
    }

    /// Sets the entrance and exit edge angles (builder style).
    pub fn with_edges(mut self, e1: f64, e2: f64) -> Self {
        self.e1 = e1;
        self.e2 = e2;
        self
    }

    /// Sets the combined-function quadrupole gradient (builder style).
    pub fn with_k1(mut self, k1: f64) -> Self {
        self.k1 = k1;
        self
    }

    /// Sets the fringe field gap and integral (builder style).
    pub fn with_fringe(mut self, hgap: f64, fint: f64) -> Self {
        self.hgap = hgap;
        self.fint = fint;
        self
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn e1(&self) -> f64 {
        self.e1
    }

    pub fn e2(&self) -> f64 {
        self.e2
    }

    pub fn k1(&self) -> f64 {
        self.k1
    }

    pub fn hgap(&self) -> f64 {
        self.hgap
    }

    pub fn fint(&self) -> f64 {
        self.fint
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub(crate) fn set_e1(&mut self, e1: f64) {
        self.e1 = e1;
    }

    pub(crate) fn set_e2(&mut self, e2: f64) {
        self.e2 = e2;
    }

    pub(crate) fn set_k1(&mut self, k1: f64) {
        self.k1 = k1;
    }

    pub(crate) fn set_hgap(&mut self, hgap: f64) {
        self.hgap = hgap;
    }

    pub(crate) fn set_fint(&mut self, fint: f64) {
        self.fint = fint;
    }

    /// Curvature `h = angle / length` of a sector bend; zero for a zero length.
    pub fn curvature(&self) -> f64 {
        if self.length == 0.0 {
            0.0
        } else {
            self.angle / self.length
        }
    }

    /// Interprets `self` as a rectangular bend and returns the equivalent sector bend.
    pub fn rectangular_to_sector(&self) -> Self {
        let half = self.angle / 2.0;
        Self {
            length: chord_to_arc(self.length, self.angle),
            e1: self.e1 + half,
            e2: self.e2 + half,
            ..*self
        }
    }

    /// Interprets `self` as a sector bend and returns the equivalent rectangular bend.
    pub fn sector_to_rectangular(&self) -> Self {
        let half = self.angle / 2.0;
        Self {
            length: arc_to_chord(self.length, self.angle),
            e1: self.e1 - half,
            e2: self.e2 - half,
            ..*self
        }
    }
}

impl PartialEq for Bend {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.length, other.length)
            && params_eq(self.angle, other.angle)
            && params_eq(self.e1, other.e1)
            && params_eq(self.e2, other.e2)
            && params_eq(self.k1, other.k1)
            && params_eq(self.hgap, other.hgap)
            && params_eq(self.fint, other.fint)
    }
}

/// Arc length of a bend whose chord is `chord`.
pub fn chord_to_arc(chord: f64, angle: f64) -> f64 {
    if angle == 0.0 {
        chord
    } else {
        angle * chord / (2.0 * (angle / 2.0).sin())
    }
}

/// Chord length of a bend whose arc is `arc`.
pub fn arc_to_chord(arc: f64, angle: f64) -> f64 {
    if angle == 0.0 {
        arc
    } else {
        arc * 2.0 * (angle / 2.0).sin() / angle
    }
}

/// Which face of a bend an edge element models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSide {
    Entrance,
    Exit,
}

impl EdgeSide {
    pub fn tag(&self) -> &'static str {
        match self {
            EdgeSide::Entrance => "entrance",
            EdgeSide::Exit => "exit",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "entrance" => Some(EdgeSide::Entrance),
            "exit" => Some(EdgeSide::Exit),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Thin fringe-field kick at the entrance or exit face of a bend.
#[derive(Debug, Clone, Copy)]
pub struct DipoleEdge {
    side: EdgeSide,
    h: f64,
    edge_angle: f64,
    hgap: f64,
    fint: f64,
}

impl DipoleEdge {
    pub fn new(side: EdgeSide, h: f64, edge_angle: f64) -> Self {
        Self {
            side,
            h,
            edge_angle,
            hgap: 0.0,
            fint: 0.0,
        }
    }

    /// Sets the fringe field gap and integral (builder style).
    pub fn with_fringe(mut self, hgap: f64, fint: f64) -> Self {
        self.hgap = hgap;
        self.fint = fint;
        self
    }

    /// Builds the edge for one face of a sector bend.
    pub fn for_bend(bend: &Bend, side: EdgeSide) -> Self {
        let edge_angle = match side {
            EdgeSide::Entrance => bend.e1,
            EdgeSide::Exit => bend.e2,
        };
        Self::new(side, bend.curvature(), edge_angle).with_fringe(bend.hgap, bend.fint)
    }

    pub fn side(&self) -> EdgeSide {
        self.side
    }

    pub fn h(&self) -> f64 {
        self.h
    }

    pub fn edge_angle(&self) -> f64 {
        self.edge_angle
    }

    pub fn hgap(&self) -> f64 {
        self.hgap
    }

    pub fn fint(&self) -> f64 {
        self.fint
    }

    pub(crate) fn set_h(&mut self, h: f64) {
        self.h = h;
    }

    pub(crate) fn set_edge_angle(&mut self, edge_angle: f64) {
        self.edge_angle = edge_angle;
    }

    pub(crate) fn set_hgap(&mut self, hgap: f64) {
        self.hgap = hgap;
    }

    pub(crate) fn set_fint(&mut self, fint: f64) {
        self.fint = fint;
    }
}

impl PartialEq for DipoleEdge {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side
            && params_eq(self.h, other.h)
            && params_eq(self.edge_angle, other.edge_angle)
            && params_eq(self.hgap, other.hgap)
            && params_eq(self.fint, other.fint)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_zero_angle_keeps_length() {
        assert_approx_eq!(f64, chord_to_arc(2.5, 0.0), 2.5);
        assert_approx_eq!(f64, arc_to_chord(2.5, 0.0), 2.5);
    }

    #[test]
    fn test_arc_longer_than_chord() {
        let arc = chord_to_arc(10.0, 0.2);
        assert!(arc > 10.0);
        assert_approx_eq!(f64, arc, 0.2 * 10.0 / (2.0 * 0.1f64.sin()), epsilon = 1e-12);
    }

    #[test]
    fn test_rectangular_to_sector_edges() {
        let rbend = Bend::new(3.0, 0.1).with_edges(0.01, -0.02);
        let sbend = rbend.rectangular_to_sector();

        assert_approx_eq!(f64, sbend.e1(), 0.06, epsilon = 1e-12);
        assert_approx_eq!(f64, sbend.e2(), 0.03, epsilon = 1e-12);
        assert_approx_eq!(f64, sbend.angle(), 0.1);
    }

    #[test]
    fn test_bend_conversion_roundtrip() {
        let sbend = Bend::new(6.0, -0.4).with_edges(0.1, 0.05).with_k1(0.02);
        assert_eq!(sbend.sector_to_rectangular().rectangular_to_sector(), sbend);
    }

    #[test]
    fn test_curvature() {
        assert_approx_eq!(f64, Bend::new(15.0, 0.3).curvature(), 0.02, epsilon = 1e-12);
        assert_approx_eq!(f64, Bend::new(0.0, 0.3).curvature(), 0.0);
    }

    #[test]
    fn test_edge_for_bend_uses_face_angle() {
        let bend = Bend::new(15.0, 0.3).with_edges(0.15, 0.12);

        let entrance = DipoleEdge::for_bend(&bend, EdgeSide::Entrance);
        let exit = DipoleEdge::for_bend(&bend, EdgeSide::Exit);

        assert_eq!(entrance.side(), EdgeSide::Entrance);
        assert_approx_eq!(f64, entrance.edge_angle(), 0.15);
        assert_approx_eq!(f64, exit.edge_angle(), 0.12);
        assert_approx_eq!(f64, exit.h(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_edge_side_tags() {
        assert_eq!(EdgeSide::from_tag("entrance"), Some(EdgeSide::Entrance));
        assert_eq!(EdgeSide::from_tag("exit"), Some(EdgeSide::Exit));
        assert_eq!(EdgeSide::from_tag("middle"), None);
        assert_eq!(EdgeSide::Exit.to_string(), "exit");
    }
}
