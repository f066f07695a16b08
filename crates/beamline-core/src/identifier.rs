//! Interned element names.
//!
//! Every element in a lattice is addressed by its name. Nodes refer to
//! catalog entries by name rather than by owning a copy of the element, so the
//! name type has to be cheap to copy, hash and compare. [`Id`] provides that by
//! interning the string once and passing a symbol around afterwards.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global interner shared by all identifiers in the process.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An interned element name.
///
/// Two `Id`s are equal exactly when the strings they were created from are
/// equal, and comparing them does not touch the string data.
///
/// # Examples
///
/// ```
/// use beamline_core::identifier::Id;
///
/// let qf = Id::new("qf");
/// assert_eq!(qf, "qf");
/// assert_eq!(qf, Id::new("qf"));
///
/// let drift = Id::indexed("drift", 3);
/// assert_eq!(drift, "drift_3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates the identifier `{prefix}_{index}`.
    ///
    /// Used for elements the engine synthesizes itself, such as drifts.
    pub fn indexed(prefix: &str, index: usize) -> Self {
        Self::new(&format!("{prefix}_{index}"))
    }

    /// Creates a derived identifier by appending `suffix` to this name.
    ///
    /// # Examples
    ///
    /// ```
    /// use beamline_core::identifier::Id;
    ///
    /// let mb = Id::new("mb");
    /// assert_eq!(mb.with_suffix("..0"), "mb..0");
    /// ```
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let derived = format!("{self}{suffix}");
        Self::new(&derived)
    }

    /// Runs `f` with the string this identifier was created from.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let guard = interner();
        f(guard.resolve(self.0).unwrap_or_default())
    }

    /// Matches the name against a lookup pattern.
    ///
    /// * `*tail` matches names ending in `tail`
    /// * `head*` matches names starting with `head`
    /// * anything else matches names containing the pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use beamline_core::identifier::Id;
    ///
    /// let id = Id::new("qf.arc1");
    /// assert!(id.matches_pattern("qf*"));
    /// assert!(id.matches_pattern("*arc1"));
    /// assert!(id.matches_pattern("arc"));
    /// assert!(!id.matches_pattern("qd*"));
    /// ```
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        self.with_str(|name| {
            if let Some(tail) = pattern.strip_prefix('*') {
                name.ends_with(tail)
            } else if let Some(head) = pattern.strip_suffix('*') {
                name.starts_with(head)
            } else {
                name.contains(pattern)
            }
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|name| f.write_str(name))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|name| name == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl serde::Serialize for Id {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_str(|name| serializer.serialize_str(name))
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}
