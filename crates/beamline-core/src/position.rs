//! Longitudinal placement of elements along the beamline.
//!
//! Positions are measured by the path-length coordinate `s`, in metres. A
//! [`Placement`] records where a node was asked to sit (an anchor point on the
//! element, a location and an optional reference element). A [`Span`] is the
//! resolved `[start, end]` interval it occupies once its length is known.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// The point of an element that a placement location refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    #[default]
    Center,
    End,
}

impl Anchor {
    pub fn tag(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Center => "center",
            Anchor::End => "end",
        }
    }

    /// Distance from the anchor point to the element centre.
    fn offset_to_center(&self, length: f64) -> f64 {
        match self {
            Anchor::Start => length / 2.0,
            Anchor::Center => 0.0,
            Anchor::End => -length / 2.0,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "entry" => Ok(Anchor::Start),
            "center" | "centre" => Ok(Anchor::Center),
            "end" | "exit" => Ok(Anchor::End),
            other => Err(format!("unknown anchor `{other}`")),
        }
    }
}

/// A resolved longitudinal interval `[start, end]`.
///
/// # Examples
///
/// ```
/// use beamline_core::position::Span;
///
/// let span = Span::from_center(5.0, 2.0);
/// assert_eq!(span.start(), 4.0);
/// assert_eq!(span.end(), 6.0);
/// assert_eq!(span.gap_to(&Span::new(7.5, 8.0)), 1.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    start: f64,
    end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn from_center(center: f64, length: f64) -> Self {
        Self::new(center - length / 2.0, center + length / 2.0)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Signed distance from the end of this span to the start of `next`.
    ///
    /// Negative values mean the two spans overlap.
    pub fn gap_to(&self, next: &Span) -> f64 {
        next.start - self.end
    }
}

/// Where a node was placed, as given by the user or an importer.
///
/// The absolute anchor position is `location + reference`. `reference` is
/// zero for absolute placements and is filled in from the `from` element when
/// references are resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    anchor: Anchor,
    location: f64,
    reference: f64,
    from: Option<Id>,
}

impl Placement {
    /// Places the centre of an element at `location`.
    pub fn at(location: f64) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    /// Places the given anchor point of an element at `location`.
    pub fn anchored(anchor: Anchor, location: f64) -> Self {
        Self {
            anchor,
            location,
            ..Self::default()
        }
    }

    /// Makes `location` relative to the centre of `element` (builder style).
    pub fn relative_to(mut self, element: Id) -> Self {
        self.from = Some(element);
        self
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn from(&self) -> Option<Id> {
        self.from
    }

    /// Absolute `s` of the anchor point.
    pub fn position(&self) -> f64 {
        self.location + self.reference
    }

    pub fn set_reference(&mut self, reference: f64) {
        self.reference = reference;
    }

    pub fn set_location(&mut self, location: f64) {
        self.location = location;
    }

    /// Resolves the interval occupied by an element of the given length.
    pub fn span(&self, length: f64) -> Span {
        Span::from_center(self.position() + self.anchor.offset_to_center(length), length)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_anchor_spans() {
        let start = Placement::anchored(Anchor::Start, 10.0).span(2.0);
        assert_approx_eq!(f64, start.start(), 10.0);
        assert_approx_eq!(f64, start.end(), 12.0);

        let center = Placement::at(10.0).span(2.0);
        assert_approx_eq!(f64, center.start(), 9.0);
        assert_approx_eq!(f64, center.center(), 10.0);

        let end = Placement::anchored(Anchor::End, 10.0).span(2.0);
        assert_approx_eq!(f64, end.start(), 8.0);
        assert_approx_eq!(f64, end.end(), 10.0);
    }

    #[test]
    fn test_reference_shifts_position() {
        let mut placement = Placement::at(1.5).relative_to(Id::new("ip"));
        assert_eq!(placement.from(), Some(Id::new("ip")));
        assert_approx_eq!(f64, placement.position(), 1.5);

        placement.set_reference(100.0);
        assert_approx_eq!(f64, placement.position(), 101.5);
        assert_approx_eq!(f64, placement.span(1.0).end(), 102.0);
    }

    #[test]
    fn test_zero_length_span_is_a_point() {
        let span = Placement::anchored(Anchor::End, 3.0).span(0.0);
        assert_approx_eq!(f64, span.start(), 3.0);
        assert_approx_eq!(f64, span.end(), 3.0);
        assert_approx_eq!(f64, span.length(), 0.0);
    }

    #[test]
    fn test_gap_sign() {
        let a = Span::new(0.0, 2.0);
        assert_approx_eq!(f64, a.gap_to(&Span::new(3.0, 4.0)), 1.0);
        assert_approx_eq!(f64, a.gap_to(&Span::new(1.5, 4.0)), -0.5);
    }

    #[test]
    fn test_anchor_parsing() {
        assert_eq!("exit".parse::<Anchor>(), Ok(Anchor::End));
        assert_eq!("centre".parse::<Anchor>(), Ok(Anchor::Center));
        assert!("middle".parse::<Anchor>().is_err());
        assert_eq!(Anchor::default(), Anchor::Center);
    }
}
