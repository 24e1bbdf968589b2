//! The completer's collaborator (spec §4.2 `complete`, §1 "class-file reader").
//!
//! Reading module metadata off disk is the class-file reader's job and out of scope here; the core
//! only needs a seam to ask for it. [`ModuleMetadataSource`] is that seam — the driver supplies an
//! implementation (a real one wraps a bytecode reader; the in-memory double below is what the
//! core's own tests use).

use std::collections::HashMap;

use crate::directive::Directive;
use crate::location::Location;
use crate::name::{Name, Version};
use crate::tree::ModuleDeclTree;

/// What a compiled (already-built) module-info record looks like, once the out-of-scope class-file
/// reader has parsed it. Simpler than [`ModuleDeclTree`] because the compiled form carries directives
/// directly rather than view-nested syntax.
#[derive(Clone, Debug)]
pub struct CompiledModuleInfo {
    pub name: Name,
    pub version: Option<Version>,
    pub directives: Vec<Directive>,
}

/// Supplies module metadata for a location, preferring a source module-info over a compiled one
/// when both exist (spec §4.2 `complete`).
pub trait ModuleMetadataSource {
    /// A source-form module declaration found at `location`, if the syntax parser (external,
    /// upstream of this trait) already produced one for it.
    fn read_source(&self, location: &Location) -> Option<ModuleDeclTree>;

    /// A compiled module-info record found at `location`, if a bytecode reader materialized one.
    fn read_compiled(&self, location: &Location) -> Option<CompiledModuleInfo>;
}

/// An in-memory [`ModuleMetadataSource`] keyed by location name; what the core's own tests and the
/// CLI's smoke-test driver use in place of a real class-file reader.
#[derive(Debug, Default)]
pub struct InMemoryMetadataSource {
    source: HashMap<Name, ModuleDeclTree>,
    compiled: HashMap<Name, CompiledModuleInfo>,
}

impl InMemoryMetadataSource {
    #[must_use]
    pub fn new() -> Self {
        InMemoryMetadataSource::default()
    }

    #[must_use]
    pub fn with_source(mut self, location_name: impl Into<Name>, tree: ModuleDeclTree) -> Self {
        self.source.insert(location_name.into(), tree);
        self
    }

    #[must_use]
    pub fn with_compiled(mut self, location_name: impl Into<Name>, info: CompiledModuleInfo) -> Self {
        self.compiled.insert(location_name.into(), info);
        self
    }
}

impl ModuleMetadataSource for InMemoryMetadataSource {
    fn read_source(&self, location: &Location) -> Option<ModuleDeclTree> {
        self.source.get(&location.name).cloned()
    }

    fn read_compiled(&self, location: &Location) -> Option<CompiledModuleInfo> {
        self.compiled.get(&location.name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationRole;

    #[test]
    fn test_source_preferred_over_compiled_when_both_present() {
        let location = Location::new(Name::new("loc"), LocationRole::ModulePath);
        let source = InMemoryMetadataSource::new()
            .with_source(Name::new("loc"), ModuleDeclTree::new("m"))
            .with_compiled(
                Name::new("loc"),
                CompiledModuleInfo {
                    name: Name::new("m-compiled"),
                    version: None,
                    directives: vec![],
                },
            );
        assert!(source.read_source(&location).is_some());
        assert!(source.read_compiled(&location).is_some());
        // The catalog's `complete` is responsible for the preference; this double just answers
        // both questions truthfully.
    }

    #[test]
    fn test_absent_location_yields_neither() {
        let location = Location::new(Name::new("missing"), LocationRole::ModulePath);
        let source = InMemoryMetadataSource::new();
        assert!(source.read_source(&location).is_none());
        assert!(source.read_compiled(&location).is_none());
    }
}
