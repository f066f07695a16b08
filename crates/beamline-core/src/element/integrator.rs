//! Numerical integration requests carried by thick elements.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Placement scheme for thin kicks inside a sliced element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceMethod {
    /// Symmetric placement that never puts a kick on an element edge.
    #[default]
    Teapot,
    /// Evenly spaced kicks with the outer two on the element edges.
    Uniform,
}

impl SliceMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            SliceMethod::Teapot => "teapot",
            SliceMethod::Uniform => "uniform",
        }
    }
}

impl fmt::Display for SliceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SliceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teapot" => Ok(SliceMethod::Teapot),
            "uniform" => Ok(SliceMethod::Uniform),
            other => Err(format!("unknown slicing method `{other}`")),
        }
    }
}

/// Upper bound on the number of slices per element.
pub const MAX_SLICES: usize = 100_000;

/// How an element should be integrated when a thin lattice is produced.
///
/// `num_slices` is always in `1..=MAX_SLICES`; [`Integrator::new`] refuses
/// anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Integrator {
    num_slices: usize,
    method: SliceMethod,
    pass_method: Option<String>,
}

impl Integrator {
    /// Creates an integration request, or `None` when `num_slices` is zero or
    /// above [`MAX_SLICES`].
    pub fn new(num_slices: usize, method: SliceMethod) -> Option<Self> {
        (1..=MAX_SLICES).contains(&num_slices).then_some(Self {
            num_slices,
            method,
            pass_method: None,
        })
    }

    /// Attaches a tracking-code pass method hint (builder style).
    pub fn with_pass_method(mut self, pass_method: impl Into<String>) -> Self {
        self.pass_method = Some(pass_method.into());
        self
    }

    pub fn num_slices(&self) -> usize {
        self.num_slices
    }

    pub fn method(&self) -> SliceMethod {
        self.method
    }

    pub fn pass_method(&self) -> Option<&str> {
        self.pass_method.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_slices_rejected() {
        assert!(Integrator::new(0, SliceMethod::Teapot).is_none());
        assert!(Integrator::new(1, SliceMethod::Uniform).is_some());
        assert!(Integrator::new(MAX_SLICES, SliceMethod::Uniform).is_some());
        assert!(Integrator::new(MAX_SLICES + 1, SliceMethod::Teapot).is_none());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("teapot".parse::<SliceMethod>(), Ok(SliceMethod::Teapot));
        assert_eq!("uniform".parse::<SliceMethod>(), Ok(SliceMethod::Uniform));
        assert!("simple".parse::<SliceMethod>().is_err());
        assert_eq!(SliceMethod::default(), SliceMethod::Teapot);
    }

    #[test]
    fn test_pass_method_hint() {
        let integrator = Integrator::new(4, SliceMethod::Teapot)
            .expect("valid slice count")
            .with_pass_method("BndMPoleSymplectic4Pass");
        assert_eq!(integrator.pass_method(), Some("BndMPoleSymplectic4Pass"));
        assert_eq!(integrator.num_slices(), 4);
    }
}
