//! Orbit corrector kickers.

use crate::tolerance::params_eq;

/// Horizontal and vertical kick angles of a corrector.
///
/// Horizontal-only and vertical-only kickers use the same payload with the
/// other plane left at zero; [`Element::new`](super::Element::new) enforces
/// that for the `HKicker` and `VKicker` variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kicker {
    length: f64,
    hkick: f64,
    vkick: f64,
}

impl Kicker {
    pub fn new(length: f64, hkick: f64, vkick: f64) -> Self {
        Self {
            length,
            hkick,
            vkick,
        }
    }

    pub fn horizontal(length: f64, hkick: f64) -> Self {
        Self::new(length, hkick, 0.0)
    }

    pub fn vertical(length: f64, vkick: f64) -> Self {
        Self::new(length, 0.0, vkick)
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn hkick(&self) -> f64 {
        self.hkick
    }

    pub fn vkick(&self) -> f64 {
        self.vkick
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_hkick(&mut self, hkick: f64) {
        self.hkick = hkick;
    }

    pub(crate) fn set_vkick(&mut self, vkick: f64) {
        self.vkick = vkick;
    }
}

impl PartialEq for Kicker {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.length, other.length)
            && params_eq(self.hkick, other.hkick)
            && params_eq(self.vkick, other.vkick)
    }
}
