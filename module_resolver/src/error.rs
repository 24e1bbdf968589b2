//! Error handling for the module resolver core.
//!
//! [`ModuleError`] covers the failure modes that can cross the public `enter`/`resolve` boundary —
//! unresolvable version queries and collaborator (file manager, strategy) failures. Per-module
//! well-formedness problems (duplicate directives, misplaced views, and so on) are reported through
//! [`crate::diagnostic::DiagnosticSink`] instead: the core's contract at that boundary is "report a
//! diagnostic and keep going", not "throw".

/// Module resolver result type.
pub type Result<T, E = ModuleError> = core::result::Result<T, E>;

/// Errors that can occur while cataloguing, resolving, or assembling locations for modules.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ModuleError {
    /// `resolve(query)` found no catalog entry under the queried name at all.
    #[error("no.version.available: {0}")]
    NoVersionAvailable(String),

    /// `resolve(query)` had a null version query but more than one version is catalogued.
    #[error("no.unique.version.available: {0}")]
    NoUniqueVersionAvailable(String),

    /// `resolve(query)` named a version that is not catalogued under that name.
    #[error("required.version.not.available: {0}")]
    RequiredVersionNotAvailable(String),

    /// A second module was registered under an already-occupied `(name, version)`.
    #[error("duplicate.definition: {name}{}", version.as_deref().map(|v| format!("@{v}")).unwrap_or_default())]
    DuplicateDefinition {
        /// The colliding module name.
        name: String,
        /// The colliding module version, if any.
        version: Option<String>,
    },

    /// Resolution could not produce a visible-module list: an unresolved non-optional `requires`,
    /// or the pluggable strategy declined to resolve.
    #[error("Module resolution failed: {0}")]
    ResolutionFailed(String),

    /// The file manager does not support modules but a module declaration was encountered.
    #[error("module.file.manager.required")]
    FileManagerRequired,

    /// The configured module library could not be located.
    #[error("module.library.not.found: {0}")]
    ModuleLibraryNotFound(String),

    /// The configured module library exists but could not be opened.
    #[error("cannot.open.module.library: {0}")]
    CannotOpenModuleLibrary(String),

    /// A file manager collaborator rejected a file object as outside the expected module root.
    #[error("invalid file object: {0}")]
    InvalidFileObject(String),

    /// An internal invariant was violated; a bug in the core, not in the input.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for ModuleError {
    fn from(error: std::io::Error) -> Self {
        ModuleError::CannotOpenModuleLibrary(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_definition_display_with_version() {
        let error = ModuleError::DuplicateDefinition {
            name: "acme.widgets".to_string(),
            version: Some("2.0".to_string()),
        };
        assert_eq!(error.to_string(), "duplicate.definition: acme.widgets@2.0");
    }

    #[test]
    fn test_duplicate_definition_display_without_version() {
        let error = ModuleError::DuplicateDefinition {
            name: "acme.widgets".to_string(),
            version: None,
        };
        assert_eq!(error.to_string(), "duplicate.definition: acme.widgets");
    }

    #[test]
    fn test_no_version_available_display() {
        let error = ModuleError::NoVersionAvailable("acme.widgets".to_string());
        assert_eq!(error.to_string(), "no.version.available: acme.widgets");
    }

    #[test]
    fn test_error_equality() {
        let a = ModuleError::FileManagerRequired;
        let b = ModuleError::FileManagerRequired;
        assert_eq!(a, b);
        assert_ne!(a, ModuleError::ResolutionFailed("x".to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::other("disk gone");
        let error: ModuleError = io.into();
        assert!(matches!(error, ModuleError::CannotOpenModuleLibrary(_)));
    }
}
