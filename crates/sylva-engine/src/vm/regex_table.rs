//! Regex table and per-type validators
//!
//! Regex literals in a program refer to an entry by its exact source text
//! (`restr`). Entries are compiled once at load; a literal stores the entry's
//! index as its handle.

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::vm::types::{RegexId, TypeId};

/// Errors raised while compiling regexes
#[derive(Debug, Clone, Error)]
pub enum RegexError {
    /// The pattern does not compile
    #[error("invalid regex {restr:?}: {source}")]
    InvalidPattern {
        /// Literal text of the entry
        restr: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },
}

/// A compiled regex entry.
#[derive(Debug, Clone)]
pub struct CompiledRegex {
    /// Literal text used for lookup
    pub restr: String,
    /// Compiled pattern
    pub regex: Regex,
}

impl CompiledRegex {
    /// Compile a pattern. The whole input must match, so the pattern is anchored.
    pub fn compile(restr: &str, pattern: &str) -> Result<Self, RegexError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            RegexError::InvalidPattern {
                restr: restr.to_string(),
                source,
            }
        })?;
        Ok(Self {
            restr: restr.to_string(),
            regex,
        })
    }

    /// Whether `text` matches the whole pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Loaded regexes and the validator assignments.
#[derive(Debug, Clone, Default)]
pub struct RegexTable {
    entries: Vec<CompiledRegex>,
    by_text: FxHashMap<String, RegexId>,
    validators: FxHashMap<TypeId, RegexId>,
}

impl RegexTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, entry: CompiledRegex) -> RegexId {
        let id = RegexId::new(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Compile and register an entry under its literal text.
    ///
    /// A repeated text keeps the first entry.
    pub fn insert(&mut self, restr: &str, pattern: &str) -> Result<RegexId, RegexError> {
        if let Some(&id) = self.by_text.get(restr) {
            tracing::warn!(restr, "regex declared more than once; keeping the first");
            return Ok(id);
        }
        let id = self.push(CompiledRegex::compile(restr, pattern)?);
        self.by_text.insert(restr.to_string(), id);
        tracing::debug!(restr, id = %id, "registered regex");
        Ok(id)
    }

    /// Compile a validator pattern and attach it to a type.
    ///
    /// A second validator for the same type is ignored.
    pub fn add_validator(
        &mut self,
        vtype: TypeId,
        restr: &str,
        pattern: &str,
    ) -> Result<RegexId, RegexError> {
        if let Some(&id) = self.validators.get(&vtype) {
            tracing::warn!(vtype = %vtype, "type already has a validator; keeping the first");
            return Ok(id);
        }
        let id = self.push(CompiledRegex::compile(restr, pattern)?);
        self.validators.insert(vtype, id);
        Ok(id)
    }

    /// Entry whose literal text is exactly `restr`.
    pub fn lookup(&self, restr: &str) -> Option<RegexId> {
        self.by_text.get(restr).copied()
    }

    /// Entry by handle.
    pub fn get(&self, id: RegexId) -> Option<&CompiledRegex> {
        self.entries.get(id.index())
    }

    /// Validator of a type.
    pub fn validator_for(&self, vtype: TypeId) -> Option<&CompiledRegex> {
        self.validators.get(&vtype).and_then(|&id| self.get(id))
    }

    /// Check `text` against a type's validator; `None` if the type has none.
    pub fn validate(&self, vtype: TypeId, text: &str) -> Option<bool> {
        self.validator_for(vtype).map(|re| re.is_match(text))
    }

    /// Number of compiled entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries exist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of validators.
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut table = RegexTable::new();
        let id = table.insert("/[0-9]+/", "[0-9]+").unwrap();
        assert_eq!(table.lookup("/[0-9]+/"), Some(id));
        assert_eq!(table.lookup("[0-9]+"), None);
        assert!(table.get(id).unwrap().is_match("123"));
        assert!(!table.get(id).unwrap().is_match("12a"));
    }

    #[test]
    fn test_repeated_text_keeps_first() {
        let mut table = RegexTable::new();
        let a = table.insert("/a/", "a").unwrap();
        let b = table.insert("/a/", "b").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_invalid_pattern() {
        let mut table = RegexTable::new();
        let err = table.insert("/(/", "(").unwrap_err();
        assert!(err.to_string().contains("/(/"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_validators() {
        let mut table = RegexTable::new();
        let zip = TypeId::new(30);
        table.add_validator(zip, "/[0-9]{5}/", "[0-9]{5}").unwrap();
        assert_eq!(table.validate(zip, "98052"), Some(true));
        assert_eq!(table.validate(zip, "9805"), Some(false));
        assert_eq!(table.validate(TypeId::new(31), "x"), None);
        assert_eq!(table.validator_count(), 1);
        // validators are not visible to literal lookup
        assert_eq!(table.lookup("/[0-9]{5}/"), None);
    }
}
