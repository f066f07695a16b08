//! Solenoids and their thin equivalents.

use crate::tolerance::params_eq;

/// Thick solenoid with per-length strength `ks`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Solenoid {
    length: f64,
    ks: f64,
}

impl Solenoid {
    pub fn new(length: f64, ks: f64) -> Self {
        Self { length, ks }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn ks(&self) -> f64 {
        self.ks
    }

    /// Integrated strength `ks * length`.
    pub fn ksi(&self) -> f64 {
        self.ks * self.length
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_ks(&mut self, ks: f64) {
        self.ks = ks;
    }
}

impl PartialEq for Solenoid {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.length, other.length) && params_eq(self.ks, other.ks)
    }
}

/// Zero-length solenoid kick carrying an integrated strength.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThinSolenoid {
    ksi: f64,
    radiation_length: f64,
}

impl ThinSolenoid {
    pub fn new(ksi: f64, radiation_length: f64) -> Self {
        Self {
            ksi,
            radiation_length,
        }
    }

    pub fn ksi(&self) -> f64 {
        self.ksi
    }

    pub fn radiation_length(&self) -> f64 {
        self.radiation_length
    }

    pub(crate) fn set_ksi(&mut self, ksi: f64) {
        self.ksi = ksi;
    }
}

impl PartialEq for ThinSolenoid {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.ksi, other.ksi) && params_eq(self.radiation_length, other.radiation_length)
    }
}
