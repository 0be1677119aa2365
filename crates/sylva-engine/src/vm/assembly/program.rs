//! The loaded program context
//!
//! Everything the loader builds is owned by one [`LoadedProgram`]. It is
//! constructed once by [`AssemblyLoader`](super::AssemblyLoader) and is
//! read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;

use crate::vm::flavor::{FlavorRegistry, ListFlavor, MapFlavor};
use crate::vm::gc::{Heap, ObjectRef};
use crate::vm::globals::GlobalStore;
use crate::vm::invoke::InvokeTable;
use crate::vm::names::{NameRegistry, Namespace};
use crate::vm::regex_table::{CompiledRegex, RegexTable};
use crate::vm::types::{FieldTable, TypeDescriptor, TypeId, TypeTable};

/// Source texts by file name.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: BTreeMap<String, String>,
}

impl SourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file's text, replacing any earlier text for the same name.
    pub fn insert(&mut self, fname: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(fname.into(), contents.into());
    }

    /// Text of a file.
    pub fn get(&self, fname: &str) -> Option<&str> {
        self.files.get(fname).map(String::as_str)
    }

    /// One line of a file, 1-based.
    pub fn line(&self, fname: &str, line: u32) -> Option<&str> {
        let index = usize::try_from(line.checked_sub(1)?).ok()?;
        self.get(fname)?.lines().nth(index)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.keys().map(String::as_str)
    }
}

/// Counts describing a loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramSummary {
    /// Size of the type ID space
    pub type_ids: usize,
    /// Types with a descriptor
    pub descriptors: usize,
    /// Field IDs
    pub fields: usize,
    /// Invoke IDs
    pub invokes: usize,
    /// List flavors
    pub list_flavors: usize,
    /// Map flavors
    pub map_flavors: usize,
    /// Regex entries
    pub regexes: usize,
    /// Validators
    pub validators: usize,
    /// Global buffer bytes
    pub global_bytes: usize,
    /// Objects allocated during load
    pub heap_objects: usize,
    /// Source files kept
    pub sources: usize,
}

impl fmt::Display for ProgramSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "types:        {} ({} ids)", self.descriptors, self.type_ids)?;
        writeln!(f, "fields:       {}", self.fields)?;
        writeln!(f, "invokes:      {}", self.invokes)?;
        writeln!(
            f,
            "flavors:      {} list, {} map",
            self.list_flavors, self.map_flavors
        )?;
        writeln!(
            f,
            "regexes:      {} ({} validators)",
            self.regexes, self.validators
        )?;
        writeln!(f, "globals:      {} bytes", self.global_bytes)?;
        writeln!(f, "heap objects: {}", self.heap_objects)?;
        write!(f, "sources:      {}", self.sources)
    }
}

/// A fully loaded assembly.
#[derive(Debug)]
pub struct LoadedProgram {
    pub(super) names: NameRegistry,
    pub(super) sources: SourceMap,
    pub(super) globals: GlobalStore,
    pub(super) heap: Heap,
    pub(super) types: TypeTable,
    pub(super) fields: FieldTable,
    pub(super) flavors: FlavorRegistry,
    pub(super) invokes: InvokeTable,
    pub(super) regexes: RegexTable,
}

impl LoadedProgram {
    /// Interned names.
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    /// Retained source texts.
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Global constant buffer.
    pub fn globals(&self) -> &GlobalStore {
        &self.globals
    }

    /// Object heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Type table.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Field table.
    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Collection flavors.
    pub fn flavors(&self) -> &FlavorRegistry {
        &self.flavors
    }

    /// Invoke table.
    pub fn invokes(&self) -> &InvokeTable {
        &self.invokes
    }

    /// Regex table and validators.
    pub fn regexes(&self) -> &RegexTable {
        &self.regexes
    }

    /// Descriptor of a type by name.
    pub fn type_by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(self.names.type_id(name)?)
    }

    /// List flavor for an entry type.
    pub fn list_flavor(&self, entry: TypeId) -> Option<&ListFlavor> {
        self.flavors.list(entry)
    }

    /// Map flavor for a key/value pair.
    pub fn map_flavor(&self, key: TypeId, value: TypeId) -> Option<&MapFlavor> {
        self.flavors.map(key, value)
    }

    /// Validator of a type.
    pub fn validator_for(&self, tid: TypeId) -> Option<&CompiledRegex> {
        self.regexes.validator_for(tid)
    }

    /// Text of a retained source file.
    pub fn source(&self, fname: &str) -> Option<&str> {
        self.sources.get(fname)
    }

    /// Human-readable name of a type, for diagnostics.
    pub fn display_type(&self, tid: TypeId) -> String {
        if let Some(desc) = self.types.get(tid) {
            return desc.name.clone();
        }
        match self.names.type_name(tid) {
            Some(name) => name.to_string(),
            None => tid.to_string(),
        }
    }

    /// Heap objects referenced from the global buffer.
    pub fn global_roots(&self) -> Vec<ObjectRef> {
        self.heap.global_roots(self.globals.as_bytes())
    }

    /// Counts for reporting.
    pub fn summary(&self) -> ProgramSummary {
        ProgramSummary {
            type_ids: self.types.len(),
            descriptors: self.types.populated(),
            fields: self.names.count(Namespace::Field),
            invokes: self.invokes.len(),
            list_flavors: self.flavors.list_count(),
            map_flavors: self.flavors.map_count(),
            regexes: self.regexes.len(),
            validators: self.regexes.validator_count(),
            global_bytes: self.globals.size(),
            heap_objects: self.heap.allocation_count(),
            sources: self.sources.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_map_lines() {
        let mut sources = SourceMap::new();
        sources.insert("main.bsq", "first\nsecond\nthird");
        assert_eq!(sources.line("main.bsq", 2), Some("second"));
        assert_eq!(sources.line("main.bsq", 0), None);
        assert_eq!(sources.line("main.bsq", 9), None);
        assert_eq!(sources.line("other.bsq", 1), None);
        assert_eq!(sources.names().collect::<Vec<_>>(), vec!["main.bsq"]);
    }

    #[test]
    fn test_summary_display() {
        let summary = ProgramSummary {
            type_ids: 27,
            descriptors: 27,
            ..ProgramSummary::default()
        };
        let text = summary.to_string();
        assert!(text.starts_with("types:        27 (27 ids)"));
        assert!(text.ends_with("sources:      0"));
    }
}
