//! A minimal tree model for parsed module declarations (spec §1, §4.1).
//!
//! The syntax parser that produces these trees is an external collaborator and out of scope; this
//! module defines only the plain data shape the visitor consumes, so the core is testable without a
//! real parser attached.

use crate::location::Location;
use crate::name::{ModuleQuery, Name, Version};

/// How the file manager maps source files to module locations (spec §6.1 `getModuleMode`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleMode {
    /// A single module's sources and classes are found directly on the class/source path.
    Single,
    /// Multiple modules are found by source-file position under module-path entries.
    Multiple,
}

/// A single parsed compilation unit, as the visitor receives it.
#[derive(Clone, Debug, Default)]
pub struct CompilationUnit {
    pub source_file: String,
    pub package_name: Option<Name>,
    pub module_decl: Option<ModuleDeclTree>,
    /// Filled in by the visitor once the unit's module location is identified (spec §3 lifecycles).
    pub location: Option<Location>,
    /// Back-reference the driver updates from the catalog on re-entrant `enter` calls (spec §4.5).
    pub resolved_module_name: Option<Name>,
}

impl CompilationUnit {
    #[must_use]
    pub fn new(source_file: impl Into<String>) -> Self {
        CompilationUnit {
            source_file: source_file.into(),
            ..CompilationUnit::default()
        }
    }

    #[must_use]
    pub fn with_module_decl(mut self, module_decl: ModuleDeclTree) -> Self {
        self.module_decl = Some(module_decl);
        self
    }

    #[must_use]
    pub fn with_package(mut self, package_name: impl Into<Name>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }
}

/// A parsed `module N[@V] { ... }` declaration.
#[derive(Clone, Debug)]
pub struct ModuleDeclTree {
    pub name: Name,
    pub version: Option<Version>,
    pub directives: Vec<DirectiveTree>,
}

impl ModuleDeclTree {
    #[must_use]
    pub fn new(name: impl Into<Name>) -> Self {
        ModuleDeclTree {
            name: name.into(),
            version: None,
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<Version>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveTree) -> Self {
        self.directives.push(directive);
        self
    }

    /// The tree-walker referenced by spec §4.3 step 3: locates the directive that declared `query`,
    /// for attaching unresolved-query diagnostics to the right source location. Only searches
    /// top-level directives, since `requires` is rejected inside views (spec §4.1).
    #[must_use]
    pub fn find_requires(&self, query: &ModuleQuery) -> Option<&DirectiveTree> {
        self.directives.iter().find(|directive| {
            matches!(directive, DirectiveTree::RequiresModule { query: q, .. } if q == query)
        })
    }
}

/// A single clause as the parser would hand it to the visitor, before flag-token translation or
/// duplicate checking.
#[derive(Clone, Debug, PartialEq)]
pub enum DirectiveTree {
    Permits { module_name: Name },
    ProvidesModule { alias_name: Name, alias_version: Option<Version> },
    ProvidesService { service: Name, implementation: Name },
    RequiresModule { query: ModuleQuery, flag_tokens: Vec<String> },
    RequiresService { service: Name },
    Exports { package_name: Name },
    Entrypoint { class_name: Name },
    View { name: Name, directives: Vec<DirectiveTree> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::VersionQuery;

    #[test]
    fn test_find_requires_locates_matching_top_level_directive() {
        let query = ModuleQuery::new(Name::new("base"), VersionQuery::Any);
        let tree = ModuleDeclTree::new("app").with_directive(DirectiveTree::RequiresModule {
            query: query.clone(),
            flag_tokens: vec![],
        });
        assert!(tree.find_requires(&query).is_some());
        let other = ModuleQuery::new(Name::new("other"), VersionQuery::Any);
        assert!(tree.find_requires(&other).is_none());
    }

    #[test]
    fn test_compilation_unit_builder() {
        let unit = CompilationUnit::new("App.src")
            .with_package(Name::new("app"))
            .with_module_decl(ModuleDeclTree::new("app"));
        assert_eq!(unit.source_file, "App.src");
        assert!(unit.module_decl.is_some());
        assert!(unit.location.is_none());
    }
}
