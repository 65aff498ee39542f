//! Multi-section objects
//!
//! A source file may declare several policies. Parsing it produces one section
//! per declared unit; each section holds either an object or the error that
//! prevented its creation. The index space is fixed up front so a failure at
//! one index never shifts the others.

use super::object::{Object, ObjectKind};
use crate::error::{PolicyError, Result};
use tracing::warn;

/// Metadata describing a successfully created section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMeta {
    pub partition: String,
    pub kind: ObjectKind,
    pub name: String,
    pub code_id: String,
    pub code_type: String,
    pub language: String,
    pub language_version: String,
    pub language_type: String,
}

/// A successfully created section
#[derive(Debug, Clone)]
pub struct SectionObject {
    index: usize,
    object: Object,
    meta: SectionMeta,
}

impl SectionObject {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn meta(&self) -> &SectionMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn code_id(&self) -> &str {
        &self.meta.code_id
    }
}

/// Outcome of one section
pub type Section = std::result::Result<SectionObject, PolicyError>;

/// Fixed-length container of per-section results
#[derive(Debug)]
pub struct MultiSectionObject {
    path: String,
    sections: Vec<Option<Section>>,
}

impl MultiSectionObject {
    /// Create a container with `expected` empty slots
    pub fn new(path: impl Into<String>, expected: usize) -> Self {
        let mut sections = Vec::with_capacity(expected);
        sections.resize_with(expected, || None);
        MultiSectionObject {
            path: path.into(),
            sections,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Record a created object at `index`
    ///
    /// Writing past the declared length is a programming error: it panics in
    /// debug builds and is rejected with `SectionOutOfRange` otherwise.
    pub fn add_section_at(&mut self, index: usize, object: Object, meta: SectionMeta) -> Result<()> {
        self.check_index(index)?;
        self.sections[index] = Some(Ok(SectionObject {
            index,
            object,
            meta,
        }));
        Ok(())
    }

    /// Record a parse or validation failure at `index`
    pub fn add_section_error_at(&mut self, index: usize, error: PolicyError) -> Result<()> {
        self.check_index(index)?;
        warn!(path = %self.path, index, error = %error, "section rejected");
        self.sections[index] = Some(Err(error));
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        debug_assert!(
            index < self.sections.len(),
            "section index {} out of range (declared {})",
            index,
            self.sections.len()
        );
        if index >= self.sections.len() {
            return Err(PolicyError::SectionOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        Ok(())
    }

    /// Section at `index`; `None` if out of range or never filled
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index).and_then(Option::as_ref)
    }

    /// All filled sections in index order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().flatten()
    }

    /// Successfully created sections in index order
    pub fn objects(&self) -> impl Iterator<Item = &SectionObject> {
        self.sections().filter_map(|s| s.as_ref().ok())
    }

    /// Failed sections as `(index, error)` pairs
    pub fn errors(&self) -> impl Iterator<Item = (usize, &PolicyError)> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Some(Err(e)) => Some((i, e)),
                _ => None,
            })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}
