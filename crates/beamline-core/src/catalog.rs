//! Name-keyed storage of element definitions.

use indexmap::{IndexMap, map};
use log::trace;

use crate::{
    element::{Element, ElementKind},
    error::{ElementError, Result},
    identifier::Id,
};

/// The set of element definitions of a lattice, keyed by name.
///
/// Iteration follows insertion order. Nodes hold names, not elements, so an
/// edit made through [`ElementCatalog::get_mut`] is seen by every occurrence of
/// that element.
///
/// # Examples
///
/// ```
/// use beamline_core::{catalog::ElementCatalog, element::{Element, ElementKind}};
///
/// let mut catalog = ElementCatalog::new();
/// catalog.insert(Element::quadrupole("qf.1", 0.5, 0.8).unwrap()).unwrap();
/// catalog.insert(Element::quadrupole("qd.1", 0.5, -0.8).unwrap()).unwrap();
/// catalog.insert(Element::drift("d1", 2.0).unwrap()).unwrap();
///
/// assert_eq!(catalog.get_class(ElementKind::Quadrupole).count(), 2);
/// assert_eq!(catalog.find("qf*").count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCatalog {
    elements: IndexMap<Id, Element>,
}

impl ElementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from element definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::DuplicateElement`] if two definitions share a name.
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Result<Self> {
        let mut catalog = Self::new();
        for element in elements {
            catalog.insert(element)?;
        }
        Ok(catalog)
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::DuplicateElement`] if the name is already taken.
    pub fn insert(&mut self, element: Element) -> Result<()> {
        match self.elements.entry(element.name()) {
            map::Entry::Occupied(entry) => Err(ElementError::DuplicateElement(*entry.key())),
            map::Entry::Vacant(entry) => {
                entry.insert(element);
                Ok(())
            }
        }
    }

    /// Adds or overwrites a definition, returning the previous one.
    pub fn replace(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.name(), element)
    }

    /// Merges definitions from another source.
    ///
    /// A definition equal to the one already stored under the same name is
    /// skipped, so thin elements shared between several parents merge cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::DuplicateElement`] for a name that is already
    /// bound to a different definition. Definitions merged before the
    /// conflicting one stay in the catalog.
    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) -> Result<()> {
        for element in elements {
            match self.elements.get(&element.name()) {
                Some(existing) if *existing == element => {
                    trace!(element:% = element.name(); "Skipping identical definition");
                }
                Some(_) => return Err(ElementError::DuplicateElement(element.name())),
                None => {
                    self.elements.insert(element.name(), element);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: Id) -> Option<&Element> {
        self.elements.get(&name)
    }

    pub fn get_mut(&mut self, name: Id) -> Option<&mut Element> {
        self.elements.get_mut(&name)
    }

    /// Like [`ElementCatalog::get`], but a missing name is an error.
    pub fn require(&self, name: Id) -> Result<&Element> {
        self.get(name).ok_or(ElementError::MissingElement(name))
    }

    /// Removes a definition, keeping the order of the others.
    pub fn remove(&mut self, name: Id) -> Option<Element> {
        self.elements.shift_remove(&name)
    }

    pub fn contains(&self, name: Id) -> bool {
        self.elements.contains_key(&name)
    }

    /// All definitions of one kind, in insertion order.
    pub fn get_class(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(move |element| element.kind() == kind)
    }

    /// All definitions whose name matches `pattern`.
    ///
    /// See [`Id::matches_pattern`] for the pattern syntax.
    pub fn find<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .values()
            .filter(move |element| element.name().matches_pattern(pattern))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn names(&self) -> impl Iterator<Item = Id> + '_ {
        self.elements.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<'a> IntoIterator for &'a ElementCatalog {
    type Item = &'a Element;
    type IntoIter = map::Values<'a, Id, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.values()
    }
}

impl IntoIterator for ElementCatalog {
    type Item = Element;
    type IntoIter = map::IntoValues<Id, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_values()
    }
}
