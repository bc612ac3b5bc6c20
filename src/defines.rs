//! Shader Macro Definitions
//!
//! An ordered collection of preprocessor-style `NAME=VALUE` pairs attached to
//! one shader variant. The collection keeps its entries sorted by name so
//! that identical define sets always compare and iterate identically,
//! regardless of insertion order.

/// A collection of shader macro definitions.
///
/// Internally an ordered `Vec<(String, String)>`, kept sorted by name with
/// binary-search insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDefines {
    defines: Vec<(String, String)>,
}

impl ShaderDefines {
    /// Create an empty define collection.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            defines: Vec::new(),
        }
    }

    /// Create a define collection with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            defines: Vec::with_capacity(capacity),
        }
    }

    /// Set a define (maintains sorted order).
    ///
    /// If the name exists, updates its value; otherwise inserts a new entry.
    pub fn set(&mut self, name: &str, value: &str) {
        match self
            .defines
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
        {
            Ok(idx) => value.clone_into(&mut self.defines[idx].1),
            Err(idx) => self.defines.insert(idx, (name.to_owned(), value.to_owned())),
        }
    }

    /// Check whether a define with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.defines
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .is_ok()
    }

    /// Get the value of a define.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.defines
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|idx| self.defines[idx].1.as_str())
    }

    /// Number of defines.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Check if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Iterate all defines as `(name, value)` pairs, ordered by name.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defines.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Merge defines from another collection.
    ///
    /// On conflicting names the values from `other` win.
    pub fn merge(&mut self, other: &ShaderDefines) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }
}

impl From<&[(&str, &str)]> for ShaderDefines {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self::with_capacity(defines.len());
        for (name, value) in defines {
            result.set(name, value);
        }
        result
    }
}
