//! RF cavities.

use crate::tolerance::params_eq;

/// Voltage, frequency and phase lag of an RF field.
///
/// Shared by the thick cavity and its thin replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RfField {
    voltage: f64,
    frequency: f64,
    lag: f64,
}

impl RfField {
    pub fn new(voltage: f64, frequency: f64, lag: f64) -> Self {
        Self {
            voltage,
            frequency,
            lag,
        }
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn lag(&self) -> f64 {
        self.lag
    }

    /// The same field with its voltage divided by `parts`.
    pub fn split(&self, parts: usize) -> Self {
        Self {
            voltage: self.voltage / parts as f64,
            ..*self
        }
    }

    pub(crate) fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    pub(crate) fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    pub(crate) fn set_lag(&mut self, lag: f64) {
        self.lag = lag;
    }
}

impl PartialEq for RfField {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.voltage, other.voltage)
            && params_eq(self.frequency, other.frequency)
            && params_eq(self.lag, other.lag)
    }
}

/// A thick RF cavity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RfCavity {
    length: f64,
    field: RfField,
}

impl RfCavity {
    pub fn new(length: f64, field: RfField) -> Self {
        Self { length, field }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn field(&self) -> &RfField {
        &self.field
    }

    pub(crate) fn field_mut(&mut self) -> &mut RfField {
        &mut self.field
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }
}

impl PartialEq for RfCavity {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.length, other.length) && self.field == other.field
    }
}

/// Zero-length RF kick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThinRfMultipole {
    field: RfField,
    radiation_length: f64,
}

impl ThinRfMultipole {
    pub fn new(field: RfField, radiation_length: f64) -> Self {
        Self {
            field,
            radiation_length,
        }
    }

    pub fn field(&self) -> &RfField {
        &self.field
    }

    pub fn radiation_length(&self) -> f64 {
        self.radiation_length
    }

    pub(crate) fn field_mut(&mut self) -> &mut RfField {
        &mut self.field
    }
}

impl PartialEq for ThinRfMultipole {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && params_eq(self.radiation_length, other.radiation_length)
    }
}
