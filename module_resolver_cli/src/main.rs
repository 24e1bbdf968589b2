//! A thin command-line front end exercising the module resolver driver end-to-end with an
//! in-memory file manager, for manual smoke-testing (spec §6.4's CLI surface).

#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::unwrap_used)]

mod argument;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use module_resolver::diagnostic::VecDiagnosticSink;
use module_resolver::driver::ResolverDriver;
use module_resolver::file_manager::InMemoryFileManager;
use module_resolver::location::{Location, LocationRole};
use module_resolver::metadata::InMemoryMetadataSource;
use module_resolver::name::{ModuleQuery, Name, VersionQuery};
use module_resolver::strategy::StrategySelector;
use module_resolver::tree::{CompilationUnit, DirectiveTree, ModuleDeclTree, ModuleMode};

use argument::Arguments;

fn main() -> ExitCode {
    logging::initialize();
    let arguments = Arguments::parse();

    if let Some(path) = &arguments.module_library_path {
        tracing::debug!(path = %path.display(), "module library path configured; this smoke-test driver has no dynamic loader for it");
    }

    let class_path = Location::new(Name::new("cp"), LocationRole::ClassPath);
    let source_path = Location::new(Name::new("sp"), LocationRole::SourcePath);
    let module_path = Location::new(Name::new("mp"), LocationRole::ModulePath);

    // --force-builtin-resolver and the built-in-only default both resolve to the same
    // `StrategySelector`: this driver has no caller-supplied strategy to inject in the first place.
    let strategy = StrategySelector::built_in();
    let mut driver = ResolverDriver::new(class_path, source_path, module_path, strategy);
    if arguments.disable_module_system {
        driver = driver.disable_modules();
    }

    let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
    let metadata = InMemoryMetadataSource::new();
    let sink = VecDiagnosticSink::new();

    let mut decl = ModuleDeclTree::new(arguments.module.as_str());
    for required in &arguments.requires {
        decl = decl.with_directive(DirectiveTree::RequiresModule {
            query: ModuleQuery::new(Name::new(required.as_str()), VersionQuery::Any),
            flag_tokens: vec![],
        });
    }
    let module_name = arguments.module.as_str();
    let source_file = format!("{module_name}.src");
    let mut units = vec![CompilationUnit::new(source_file).with_module_decl(decl)];

    let success = match driver.enter(&mut units, &file_manager, &metadata, &sink) {
        Ok(success) => success,
        Err(error) => {
            eprintln!("module resolution failed: {error}");
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in sink.diagnostics() {
        eprintln!("{diagnostic}");
    }

    if !success {
        return ExitCode::FAILURE;
    }

    println!("resolved modules:");
    for symbol in driver.catalog().modules() {
        println!("  {}", symbol.id());
    }
    if let Some(merged) = driver.merged_path() {
        println!("merged search location: {} segment(s)", merged.segments().len());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use module_resolver::diagnostic::DiagnosticKey;

    use super::*;

    #[test]
    fn test_single_root_with_no_requires_resolves() {
        let class_path = Location::new(Name::new("cp"), LocationRole::ClassPath);
        let source_path = Location::new(Name::new("sp"), LocationRole::SourcePath);
        let module_path = Location::new(Name::new("mp"), LocationRole::ModulePath);
        let mut driver = ResolverDriver::new(class_path, source_path, module_path, StrategySelector::built_in());
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut units = vec![CompilationUnit::new("app.src").with_module_decl(ModuleDeclTree::new("app"))];
        let success = driver
            .enter(&mut units, &file_manager, &metadata, &sink)
            .expect("enter succeeds");

        assert!(success);
        assert!(driver.merged_path().is_some());
    }

    #[test]
    fn test_unresolvable_requires_reports_diagnostic() {
        let class_path = Location::new(Name::new("cp"), LocationRole::ClassPath);
        let source_path = Location::new(Name::new("sp"), LocationRole::SourcePath);
        let module_path = Location::new(Name::new("mp"), LocationRole::ModulePath);
        let mut driver = ResolverDriver::new(class_path, source_path, module_path, StrategySelector::built_in());
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let decl = ModuleDeclTree::new("app").with_directive(DirectiveTree::RequiresModule {
            query: ModuleQuery::new(Name::new("missing"), VersionQuery::Any),
            flag_tokens: vec![],
        });
        let mut units = vec![CompilationUnit::new("app.src").with_module_decl(decl)];
        let success = driver
            .enter(&mut units, &file_manager, &metadata, &sink)
            .expect("enter succeeds");

        assert!(!success);
        assert!(sink.has_key(DiagnosticKey::NoVersionAvailable));
    }
}
