//! `ModuleSymbol`: the per-location record the catalog and graph operate on (spec §3).

use crate::directive::{Directive, DirectiveKind};
use crate::location::Location;
use crate::name::{ModuleId, Name, Version};

/// A materialized view: a named alias sub-declaration with its own directive list (spec §3
/// `ViewDeclaration`, glossary "View").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewSymbol {
    pub name: Name,
    pub directives: Vec<Directive>,
}

impl ViewSymbol {
    #[must_use]
    pub fn aliases(&self) -> impl Iterator<Item = &ModuleId> {
        self.directives.iter().filter_map(|directive| match directive {
            Directive::ProvidesModule { alias } => Some(alias),
            _ => None,
        })
    }
}

/// Unique per module-location (invariant 1). Mutated only by the completer (parsing metadata) and
/// the visitor (attaching source-derived directives) until frozen; never destroyed within a
/// compilation (spec §3 lifecycles).
#[derive(Clone, Debug)]
pub struct ModuleSymbol {
    location: Location,
    name: Name,
    version: Option<Version>,
    directives: Vec<Directive>,
    views: Vec<ViewSymbol>,
    source_file: Option<String>,
    frozen: bool,
}

impl ModuleSymbol {
    /// Creates the empty, unnamed symbol for a freshly-entered location (spec §4.2 `enter`: "empty,
    /// with a deferred completer").
    #[must_use]
    pub fn new(location: Location) -> Self {
        ModuleSymbol {
            location,
            name: Name::new(""),
            version: None,
            directives: Vec::new(),
            views: Vec::new(),
            source_file: None,
            frozen: false,
        }
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        ModuleId::new(self.name.clone(), self.version.clone())
    }

    /// Whether this symbol has been given a name yet — the empty string names the "unnamed module"
    /// (spec §4.2 `complete`, glossary "Unnamed module").
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    #[must_use]
    pub fn views(&self) -> &[ViewSymbol] {
        &self.views
    }

    pub fn set_name(&mut self, name: Name) {
        debug_assert!(!self.frozen, "attempted to rename a frozen ModuleSymbol");
        self.name = name;
    }

    pub fn set_version(&mut self, version: Option<Version>) {
        debug_assert!(!self.frozen, "attempted to set version on a frozen ModuleSymbol");
        self.version = version;
    }

    pub fn set_source_file(&mut self, source_file: impl Into<String>) {
        self.source_file = Some(source_file.into());
    }

    /// Appends a top-level directive; panics in debug builds if the symbol is already frozen, since
    /// that would violate the "frozen once completed" invariant silently.
    pub fn push_directive(&mut self, directive: Directive) {
        debug_assert!(!self.frozen, "attempted to mutate a frozen ModuleSymbol");
        self.directives.push(directive);
    }

    pub fn push_view(&mut self, view: ViewSymbol) {
        debug_assert!(!self.frozen, "attempted to mutate a frozen ModuleSymbol");
        self.views.push(view);
    }

    /// Whether a top-level directive with `kind`/`target_name` is already present, per invariant 2.
    #[must_use]
    pub fn has_directive(&self, kind: DirectiveKind, target_name: &Name) -> bool {
        self.directives
            .iter()
            .any(|d| d.kind() == kind && d.target_name() == Some(target_name))
    }

    /// Freezes the directive list: spec §3 "once completed, the symbol's directives are frozen".
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Every `requires module` clause, for the graph builder (spec §4.3 step 3).
    pub fn requires_modules(&self) -> impl Iterator<Item = &Directive> {
        self.directives
            .iter()
            .filter(|d| matches!(d, Directive::RequiresModule { .. }))
    }

    /// Every alias this symbol (or one of its views) provides for the base-requirement check and
    /// the catalog's alias registration (spec §4.2 `register`, invariant 3/6).
    pub fn aliases(&self) -> impl Iterator<Item = &ModuleId> {
        let own = self.directives.iter().filter_map(|directive| match directive {
            Directive::ProvidesModule { alias } => Some(alias),
            _ => None,
        });
        own.chain(self.views.iter().flat_map(ViewSymbol::aliases))
    }
}
