//! Diagnostics: the stable keys the core reports through instead of throwing (spec §6.5, §7).
//!
//! A [`Diagnostic`] names the offending construct with a stable key, a rendered message, and the
//! source file the log should scope it to. [`DiagnosticSink`] is the write-through collaborator the
//! visitor, catalog, graph, and driver all report through; [`VecDiagnosticSink`] is a test double and
//! [`TracingDiagnosticSink`] is the production sink that forwards to `tracing`.

use std::cell::RefCell;
use std::fmt;

/// One of the stable diagnostic keys from spec §6.5.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum DiagnosticKey {
    ModuleAlreadyDefined,
    DuplRequires,
    DuplProvides,
    DuplPermits,
    DuplView,
    DuplEntrypoint,
    RequiresNotAllowedInView,
    NestedViewNotAllowed,
    ModuleFileManagerRequired,
    FileInWrongDirectory,
    NoVersionAvailable,
    NoUniqueVersionAvailable,
    RequiredVersionNotAvailable,
    DuplicateDefinition,
    ModuleLibraryNotFound,
    CannotOpenModuleLibrary,
    ModuleDeclNotPermitted,
}

impl DiagnosticKey {
    /// The stable string key, as it would appear in a diagnostic bundle.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKey::ModuleAlreadyDefined => "module.already.defined",
            DiagnosticKey::DuplRequires => "dupl.requires",
            DiagnosticKey::DuplProvides => "dupl.provides",
            DiagnosticKey::DuplPermits => "dupl.permits",
            DiagnosticKey::DuplView => "dupl.view",
            DiagnosticKey::DuplEntrypoint => "dupl.entrypoint",
            DiagnosticKey::RequiresNotAllowedInView => "requires.not.allowed.in.view",
            DiagnosticKey::NestedViewNotAllowed => "nested.view.not.allowed",
            DiagnosticKey::ModuleFileManagerRequired => "module.file.manager.required",
            DiagnosticKey::FileInWrongDirectory => "file.in.wrong.directory",
            DiagnosticKey::NoVersionAvailable => "no.version.available",
            DiagnosticKey::NoUniqueVersionAvailable => "no.unique.version.available",
            DiagnosticKey::RequiredVersionNotAvailable => "required.version.not.available",
            DiagnosticKey::DuplicateDefinition => "duplicate.definition",
            DiagnosticKey::ModuleLibraryNotFound => "module.library.not.found",
            DiagnosticKey::CannotOpenModuleLibrary => "cannot.open.module.library",
            DiagnosticKey::ModuleDeclNotPermitted => "module.decl.not.permitted",
        }
    }

    /// Severity used to pick a `tracing` level in [`TracingDiagnosticSink`].
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKey::ModuleFileManagerRequired | DiagnosticKey::ModuleDeclNotPermitted => {
                Severity::Error
            }
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse severity, used only to pick a log level; it does not gate whether the construct is
/// discarded (that is decided at the call site, per spec §7's recoverability taxonomy).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single reported diagnostic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub key: DiagnosticKey,
    pub message: String,
    pub source_file: Option<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(key: DiagnosticKey, message: impl Into<String>) -> Self {
        Diagnostic {
            key,
            message: message.into(),
            source_file: None,
        }
    }

    #[must_use]
    pub fn scoped(key: DiagnosticKey, message: impl Into<String>, source_file: impl Into<String>) -> Self {
        Diagnostic {
            key,
            message: message.into(),
            source_file: Some(source_file.into()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_file {
            Some(file) => write!(f, "{file}: {}: {}", self.key, self.message),
            None => write!(f, "{}: {}", self.key, self.message),
        }
    }
}

/// The collaborator every diagnostic is reported through.
///
/// Single-threaded per spec §5, so implementors are free to use interior mutability (a `RefCell`)
/// rather than locking.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);

    /// Convenience for the common unscoped case.
    fn error(&self, key: DiagnosticKey, message: impl Into<String>) {
        self.report(Diagnostic::new(key, message));
    }

    /// Convenience for reporting scoped to a unit's source file (spec §4.1: "uses the diagnostic
    /// log to scope messages to the unit's source file").
    fn error_scoped(&self, key: DiagnosticKey, message: impl Into<String>, source_file: impl Into<String>) {
        self.report(Diagnostic::scoped(key, message, source_file));
    }
}

/// Accumulates diagnostics in memory; the sink test double, and usable standalone by embedders
/// that want to inspect everything reported during an `enter`.
#[derive(Debug, Default)]
pub struct VecDiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl VecDiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        VecDiagnosticSink::default()
    }

    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    #[must_use]
    pub fn has_key(&self, key: DiagnosticKey) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.key == key)
    }

    #[must_use]
    pub fn count(&self, key: DiagnosticKey) -> usize {
        self.diagnostics.borrow().iter().filter(|d| d.key == key).count()
    }

    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl DiagnosticSink for VecDiagnosticSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing`, one event per diagnostic, at `warn` or `error` depending
/// on [`DiagnosticKey::severity`] — the production sink for structured, leveled logging.
#[derive(Debug, Default)]
pub struct TracingDiagnosticSink;

impl TracingDiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        TracingDiagnosticSink
    }
}

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.key.severity() {
            Severity::Error => {
                tracing::error!(key = diagnostic.key.as_str(), source_file = diagnostic.source_file.as_deref(), "{}", diagnostic.message);
            }
            Severity::Warning => {
                tracing::warn!(key = diagnostic.key.as_str(), source_file = diagnostic.source_file.as_deref(), "{}", diagnostic.message);
            }
        }
    }
}

/// Reports a failed attempt to load a well-known resolver strategy as `module.library.not.found`
/// or `cannot.open.module.library` (spec §6.3 discovery order, §6.5).
pub fn report_strategy_load_failure(sink: &dyn DiagnosticSink, error: &crate::error::ModuleError) {
    match error {
        crate::error::ModuleError::ModuleLibraryNotFound(path) => {
            sink.error(DiagnosticKey::ModuleLibraryNotFound, path.clone());
        }
        crate::error::ModuleError::CannotOpenModuleLibrary(reason) => {
            sink.error(DiagnosticKey::CannotOpenModuleLibrary, reason.clone());
        }
        other => {
            sink.error(DiagnosticKey::CannotOpenModuleLibrary, other.to_string());
        }
    }
}

bitflags::bitflags! {
    /// Debug tracing categories (spec §7: `debug.enabled(category)`), read from `MODULES_DEBUG`.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct DebugCategories: u8 {
        const INITIAL_ROOT_LOCNS = 0b0000_0001;
        const RESOLVE            = 0b0000_0010;
        const LOCATION           = 0b0000_0100;
        const REQUIRES           = 0b0000_1000;
    }
}

impl DebugCategories {
    /// Parses the comma-separated `MODULES_DEBUG` value. Unknown tokens are ignored; `all` (in any
    /// case) enables every category.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut categories = DebugCategories::empty();
        for token in value.split(',') {
            match token.trim().to_ascii_lowercase().as_str() {
                "all" => return DebugCategories::all(),
                "initialrootlocns" => categories |= DebugCategories::INITIAL_ROOT_LOCNS,
                "resolve" => categories |= DebugCategories::RESOLVE,
                "location" => categories |= DebugCategories::LOCATION,
                "requires" => categories |= DebugCategories::REQUIRES,
                _ => {}
            }
        }
        categories
    }

    /// Reads and parses the `MODULES_DEBUG` environment variable; empty (nothing enabled) if unset.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("MODULES_DEBUG")
            .map(|value| DebugCategories::parse(&value))
            .unwrap_or_else(|_| DebugCategories::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_key_as_str() {
        assert_eq!(DiagnosticKey::DuplRequires.as_str(), "dupl.requires");
        assert_eq!(
            DiagnosticKey::ModuleDeclNotPermitted.as_str(),
            "module.decl.not.permitted"
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(DiagnosticKey::DuplRequires.severity(), Severity::Warning);
        assert_eq!(
            DiagnosticKey::ModuleFileManagerRequired.severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_vec_sink_records_and_scopes() {
        let sink = VecDiagnosticSink::new();
        sink.error(DiagnosticKey::DuplProvides, "X");
        sink.error_scoped(DiagnosticKey::DuplView, "V", "Foo.src");
        assert_eq!(sink.diagnostics().len(), 2);
        assert!(sink.has_key(DiagnosticKey::DuplProvides));
        assert_eq!(sink.count(DiagnosticKey::DuplView), 1);
        assert_eq!(sink.diagnostics()[1].source_file.as_deref(), Some("Foo.src"));
    }

    #[test]
    fn test_debug_categories_parse() {
        let categories = DebugCategories::parse("resolve, Location");
        assert!(categories.contains(DebugCategories::RESOLVE));
        assert!(categories.contains(DebugCategories::LOCATION));
        assert!(!categories.contains(DebugCategories::REQUIRES));
    }

    #[test]
    fn test_debug_categories_all() {
        let categories = DebugCategories::parse("requires,all");
        assert_eq!(categories, DebugCategories::all());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::scoped(DiagnosticKey::DuplPermits, "N", "Foo.src");
        assert_eq!(diagnostic.to_string(), "Foo.src: dupl.permits: N");
    }
}
