//! # Module Resolver
//!
//! The module resolver core of a module-aware compiler front-end: given a set of parsed
//! compilation units, a file-manager collaborator, and an optional pluggable resolver strategy, it
//! discovers modules reachable from a set of root locations, parses their module declarations,
//! builds a directed dependency graph keyed by name and version, detects strongly connected
//! components, computes the set of visible modules in a dependency-respecting order, and assembles
//! a merged search location for a downstream class reader.
//!
//! ## Getting started
//!
//! Wire a [`file_manager::FileManager`] and a [`metadata::ModuleMetadataSource`] (a real embedder's
//! file system and class-file reader, or the in-memory test doubles this crate ships) into a
//! [`driver::ResolverDriver`], and drive it with batches of [`tree::CompilationUnit`]:
//!
//! ```rust
//! use module_resolver::diagnostic::VecDiagnosticSink;
//! use module_resolver::driver::ResolverDriver;
//! use module_resolver::file_manager::InMemoryFileManager;
//! use module_resolver::location::{Location, LocationRole};
//! use module_resolver::metadata::InMemoryMetadataSource;
//! use module_resolver::name::Name;
//! use module_resolver::strategy::StrategySelector;
//! use module_resolver::tree::{CompilationUnit, ModuleDeclTree, ModuleMode};
//!
//! let class_path = Location::new(Name::new("cp"), LocationRole::ClassPath);
//! let source_path = Location::new(Name::new("sp"), LocationRole::SourcePath);
//! let module_path = Location::new(Name::new("mp"), LocationRole::ModulePath);
//! let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
//! let metadata = InMemoryMetadataSource::new();
//! let sink = VecDiagnosticSink::new();
//!
//! let mut driver = ResolverDriver::new(class_path, source_path, module_path, StrategySelector::built_in());
//! let mut units = vec![CompilationUnit::new("App.src").with_module_decl(ModuleDeclTree::new("app"))];
//! let success = driver.enter(&mut units, &file_manager, &metadata, &sink).expect("enter succeeds");
//! assert!(success);
//! ```
//!
//! ## Debug tracing
//!
//! Set `MODULES_DEBUG` to a comma-separated list of `initialRootLocns`, `resolve`, `location`,
//! `requires`, or `all` to select [`diagnostic::DebugCategories`] an embedder's tracing subscriber
//! can branch on.
//!
//! ## Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` to ensure everything is implemented in 100% safe Rust.

#![forbid(unsafe_code)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod diagnostic;
pub mod directive;
pub mod driver;
pub mod error;
pub mod file_manager;
pub mod graph;
pub mod location;
pub mod metadata;
pub mod name;
pub mod strategy;
pub mod symbol;
pub mod tree;
pub mod visitor;

pub use catalog::ModuleCatalog;
pub use diagnostic::{Diagnostic, DiagnosticKey, DiagnosticSink};
pub use directive::{Directive, DirectiveKind, Flags};
pub use driver::{DriverState, ResolverDriver};
pub use error::{ModuleError, Result};
pub use file_manager::FileManager;
pub use location::{FileKinds, Location, LocationRole, LocationSegment, SearchLocation};
pub use metadata::ModuleMetadataSource;
pub use name::{ModuleId, ModuleQuery, Name, Version, VersionQuery};
pub use strategy::{ResolverStrategy, StrategySelector};
pub use symbol::ModuleSymbol;
pub use tree::{CompilationUnit, ModuleDeclTree, ModuleMode};
pub use visitor::ModuleDeclarationVisitor;
