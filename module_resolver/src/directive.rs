//! The directive model: tagged variants for module declaration clauses (spec §3, §9 design notes).
//!
//! The source this core is modeled on dispatches over a class hierarchy of directive trees; per the
//! design notes a tagged-variant (sum type) plus a single dispatch point replaces that hierarchy —
//! no open extensibility is needed here.

use crate::name::{ModuleId, ModuleQuery, Name};

bitflags::bitflags! {
    /// Flags carried on `requires` clauses.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct Flags: u8 {
        /// The dependency is re-exported to this module's own requirers (`requires transitive`-like).
        const REEXPORT    = 0b0000_0001;
        /// Unresolved dependencies of this kind are silently dropped rather than reported.
        const OPTIONAL    = 0b0000_0010;
        /// Visible only within the declaring module (not propagated).
        const LOCAL       = 0b0000_0100;
        /// Synthesized by the visitor rather than declared in source (the implicit base requirement).
        const SYNTHESIZED = 0b0000_1000;
        /// Synthesized by the compiler for a reason other than the base requirement.
        const SYNTHETIC   = 0b0001_0000;
    }
}

impl Flags {
    /// Parses a clause's flag token list (`REEXPORT`, `OPTIONAL`, `LOCAL`); unrecognized tokens are
    /// ignored rather than rejected, since the grammar that produces them is out of scope here.
    #[must_use]
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = Flags::empty();
        for token in tokens {
            match token {
                "REEXPORT" => flags |= Flags::REEXPORT,
                "OPTIONAL" => flags |= Flags::OPTIONAL,
                "LOCAL" => flags |= Flags::LOCAL,
                _ => {}
            }
        }
        flags
    }
}

/// One clause inside a module declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    RequiresModule { query: ModuleQuery, flags: Flags },
    RequiresService { service: Name },
    ProvidesModule { alias: ModuleId },
    ProvidesService { service: Name, implementation: Name },
    Permits { module_name: Name },
    Exports { package_name: Name },
    Entrypoint { class_name: Name },
    View { name: Name, directives: Vec<Directive> },
}

/// The tag of a [`Directive`], used for `(Kind, target-name)` duplicate tracking (invariant 2) and
/// as the single dispatch key the design notes call for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DirectiveKind {
    RequiresModule,
    RequiresService,
    ProvidesModule,
    ProvidesService,
    Permits,
    Exports,
    Entrypoint,
    View,
}

impl Directive {
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::RequiresModule { .. } => DirectiveKind::RequiresModule,
            Directive::RequiresService { .. } => DirectiveKind::RequiresService,
            Directive::ProvidesModule { .. } => DirectiveKind::ProvidesModule,
            Directive::ProvidesService { .. } => DirectiveKind::ProvidesService,
            Directive::Permits { .. } => DirectiveKind::Permits,
            Directive::Exports { .. } => DirectiveKind::Exports,
            Directive::Entrypoint { .. } => DirectiveKind::Entrypoint,
            Directive::View { .. } => DirectiveKind::View,
        }
    }

    /// The `target-name` half of the `(Kind, target-name)` duplicate key (invariant 2), where one
    /// exists. `Entrypoint` has no target name — duplicate detection for it is "at most one per
    /// scope", tracked separately by the visitor.
    #[must_use]
    pub fn target_name(&self) -> Option<&Name> {
        match self {
            Directive::RequiresModule { query, .. } => Some(&query.name),
            Directive::RequiresService { service } => Some(service),
            Directive::ProvidesModule { alias } => Some(&alias.name),
            Directive::ProvidesService { service, .. } => Some(service),
            Directive::Permits { module_name } => Some(module_name),
            Directive::Exports { package_name } => Some(package_name),
            Directive::View { name, .. } => Some(name),
            Directive::Entrypoint { .. } => None,
        }
    }
}
