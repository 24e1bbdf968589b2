//! The resolver driver state machine (spec §4.5): orchestrates the visitor, catalog, graph
//! resolver, and location merger across one or more batches of input trees.

use indexmap::IndexSet;

use crate::catalog::ModuleCatalog;
use crate::diagnostic::{DiagnosticKey, DiagnosticSink};
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::location::{Location, LocationMerger, SearchLocation};
use crate::metadata::ModuleMetadataSource;
use crate::name::Name;
use crate::strategy::StrategySelector;
use crate::symbol::ModuleSymbol;
use crate::tree::CompilationUnit;
use crate::visitor::{self, ModuleDeclarationVisitor};

/// `INITIAL → RESOLVING → RESOLVED` (spec §4.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverState {
    Initial,
    Resolving,
    Resolved,
}

/// Orchestrates one compilation's module phase. Not `Sync`/`Send`-required: the core runs on a
/// single compilation thread (spec §5).
#[derive(Debug)]
pub struct ResolverDriver {
    catalog: ModuleCatalog,
    location_merger: LocationMerger,
    strategy: StrategySelector,
    state: DriverState,
    roots: IndexSet<Location>,
    class_path_location: Location,
    source_path_location: Location,
    module_path_location: Location,
    platform_prepend: Option<Location>,
    platform_append: Option<Location>,
    modules_enabled: bool,
    merged_path: Option<SearchLocation>,
}

impl ResolverDriver {
    #[must_use]
    pub fn new(
        class_path_location: Location,
        source_path_location: Location,
        module_path_location: Location,
        strategy: StrategySelector,
    ) -> Self {
        ResolverDriver {
            catalog: ModuleCatalog::new(),
            location_merger: LocationMerger::new(),
            strategy,
            state: DriverState::Initial,
            roots: IndexSet::new(),
            class_path_location,
            source_path_location,
            module_path_location,
            platform_prepend: None,
            platform_append: None,
            modules_enabled: true,
            merged_path: None,
        }
    }

    /// "An option equivalent to disable the module system" (spec §6.4): every module declaration
    /// is then rejected with `module.decl.not.permitted`.
    #[must_use]
    pub fn disable_modules(mut self) -> Self {
        self.modules_enabled = false;
        self
    }

    #[must_use]
    pub fn with_platform_prepend(mut self, location: Location) -> Self {
        self.platform_prepend = Some(location);
        self
    }

    #[must_use]
    pub fn with_platform_append(mut self, location: Location) -> Self {
        self.platform_append = Some(location);
        self
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// "Exposed to the class reader" (spec §6.2): the final merged search location, once resolved.
    #[must_use]
    pub fn merged_path(&self) -> Option<&SearchLocation> {
        self.merged_path.as_ref()
    }

    /// The module-phase entry point (spec §4.5). Never throws for a domain-level failure: returns
    /// `Ok(false)` when a diagnosable condition blocks resolution, and reserves `Err` for failures
    /// below the domain layer (catalog/metadata-source I/O).
    pub fn enter(
        &mut self,
        units: &mut [CompilationUnit],
        file_manager: &dyn FileManager,
        metadata: &dyn ModuleMetadataSource,
        sink: &dyn DiagnosticSink,
    ) -> Result<bool> {
        let _span = tracing::debug_span!("module_resolver_enter", state = ?self.state).entered();

        if !self.modules_enabled {
            return Ok(visitor::visit_no_modules(units, sink));
        }

        let has_module_decl = units.iter().any(|unit| unit.module_decl.is_some());
        if has_module_decl && !file_manager.is_module_aware() {
            sink.error(
                DiagnosticKey::ModuleFileManagerRequired,
                "a module declaration is present but the file manager is not module-aware",
            );
            return Ok(false);
        }

        ModuleDeclarationVisitor::visit(
            units,
            &mut self.catalog,
            file_manager,
            &self.class_path_location,
            &self.source_path_location,
            &self.module_path_location,
            &mut self.roots,
            sink,
        );

        match self.state {
            DriverState::Initial => {
                self.state = DriverState::Resolving;
                let success = self.resolve_all(file_manager, metadata, sink)?;
                self.state = DriverState::Resolved;
                Ok(success)
            }
            DriverState::Resolving => {
                // Re-entrant: completing a module may itself have triggered parsing of more
                // units. Just refresh their back-reference from the catalog (spec §4.5).
                for unit in units.iter_mut() {
                    if let Some(location) = unit.location.clone() {
                        if let Some(symbol) = self.catalog.get_by_location(&location) {
                            unit.resolved_module_name = Some(symbol.name().clone());
                        }
                    }
                }
                Ok(true)
            }
            DriverState::Resolved => Ok(true),
        }
    }

    /// §4.3 + §4.4: enumerate every module on the module path, complete and register them, resolve
    /// the visible set, and assemble the merged search location.
    fn resolve_all(
        &mut self,
        file_manager: &dyn FileManager,
        metadata: &dyn ModuleMetadataSource,
        sink: &dyn DiagnosticSink,
    ) -> Result<bool> {
        let _span = tracing::debug_span!("module_resolver_resolve").entered();

        // Locations the visitor already processed (and registered) are excluded: only newly
        // discovered module-path entries need completing here.
        let discovered: Vec<Location> = self
            .roots
            .iter()
            .flat_map(|root| file_manager.get_module_locations(root))
            .filter(|location| !self.roots.contains(location))
            .collect();

        for location in discovered {
            self.catalog.complete(&location, metadata)?;
            self.catalog.register(&location, sink);
        }
        self.catalog.register_platform_defaults(sink);

        let roots: Vec<ModuleSymbol> = self
            .roots
            .iter()
            .filter_map(|location| self.catalog.get_by_location(location))
            .filter(|symbol| symbol.is_named())
            .cloned()
            .collect();
        let all_named: Vec<ModuleSymbol> = self.catalog.modules().cloned().collect();

        match self.strategy.resolve(&roots, &all_named, &self.catalog, sink) {
            Ok(ordered) => {
                self.merged_path = Some(self.assemble_merged_location(&ordered));
                Ok(true)
            }
            Err(_error) => Ok(false),
        }
    }

    /// §4.4: platform augmentation on the resolver's ordered module list, then a single composite
    /// merge across every module's (possibly augmented) location.
    fn assemble_merged_location(&self, ordered: &[ModuleSymbol]) -> SearchLocation {
        let names: Vec<Name> = ordered.iter().map(|symbol| symbol.name().clone()).collect();
        let mut base_locations = indexmap::IndexMap::new();
        for symbol in ordered {
            base_locations.insert(symbol.name().clone(), symbol.location().clone());
        }

        let augmented = self.location_merger.augment_platform(
            &names,
            &base_locations,
            crate::catalog::is_platform_name,
            self.platform_prepend.as_ref(),
            self.platform_append.as_ref(),
        );

        let locations: Vec<Location> = names
            .iter()
            .filter_map(|name| augmented.get(name).cloned())
            .collect();
        self.location_merger.merge(&locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::VecDiagnosticSink;
    use crate::file_manager::InMemoryFileManager;
    use crate::location::LocationRole;
    use crate::metadata::InMemoryMetadataSource;
    use crate::name::{ModuleQuery, VersionQuery};
    use crate::strategy::StrategySelector;
    use crate::tree::{DirectiveTree, ModuleDeclTree, ModuleMode};

    fn fixtures() -> (Location, Location, Location) {
        (
            Location::new(Name::new("cp"), LocationRole::ClassPath),
            Location::new(Name::new("sp"), LocationRole::SourcePath),
            Location::new(Name::new("mp"), LocationRole::ModulePath),
        )
    }

    #[test]
    fn test_initial_to_resolved_transition_populates_merged_path() {
        let (cp, sp, mp) = fixtures();
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut driver = ResolverDriver::new(cp, sp, mp, StrategySelector::built_in());
        assert_eq!(driver.state(), DriverState::Initial);

        let mut units = vec![CompilationUnit::new("App.src").with_module_decl(ModuleDeclTree::new("app"))];
        let success = driver.enter(&mut units, &file_manager, &metadata, &sink).expect("enter succeeds");

        assert!(success);
        assert_eq!(driver.state(), DriverState::Resolved);
        assert!(driver.merged_path().is_some());
        assert!(driver.catalog().modules().any(|m| m.name().as_str() == "app"));
    }

    #[test]
    fn test_resolved_state_is_idempotent() {
        let (cp, sp, mp) = fixtures();
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut driver = ResolverDriver::new(cp, sp, mp, StrategySelector::built_in());
        let mut units = vec![CompilationUnit::new("App.src").with_module_decl(ModuleDeclTree::new("app"))];
        driver.enter(&mut units, &file_manager, &metadata, &sink).expect("first enter succeeds");

        let mut more_units = vec![CompilationUnit::new("Other.src")];
        let second = driver.enter(&mut more_units, &file_manager, &metadata, &sink).expect("second enter succeeds");
        assert!(second);
        assert_eq!(driver.state(), DriverState::Resolved);
    }

    #[test]
    fn test_globally_disabled_modules_rejects_declarations() {
        let (cp, sp, mp) = fixtures();
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut driver = ResolverDriver::new(cp, sp, mp, StrategySelector::built_in()).disable_modules();
        let mut units = vec![CompilationUnit::new("App.src").with_module_decl(ModuleDeclTree::new("app"))];
        let success = driver.enter(&mut units, &file_manager, &metadata, &sink).expect("enter succeeds");

        assert!(!success);
        assert!(sink.has_key(DiagnosticKey::ModuleDeclNotPermitted));
        assert_eq!(driver.state(), DriverState::Initial);
    }

    #[test]
    fn test_non_module_aware_file_manager_is_fatal() {
        let (cp, sp, mp) = fixtures();
        let file_manager = InMemoryFileManager::not_module_aware().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut driver = ResolverDriver::new(cp, sp, mp, StrategySelector::built_in());
        let mut units = vec![CompilationUnit::new("App.src").with_module_decl(ModuleDeclTree::new("app"))];
        let success = driver.enter(&mut units, &file_manager, &metadata, &sink).expect("enter succeeds");

        assert!(!success);
        assert!(sink.has_key(DiagnosticKey::ModuleFileManagerRequired));
        assert_eq!(driver.state(), DriverState::Initial);
    }

    #[test]
    fn test_unresolvable_requires_fails_resolution_without_erroring() {
        let (cp, sp, mp) = fixtures();
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        let metadata = InMemoryMetadataSource::new();
        let sink = VecDiagnosticSink::new();

        let mut driver = ResolverDriver::new(cp, sp, mp, StrategySelector::built_in());
        let decl = ModuleDeclTree::new("app").with_directive(DirectiveTree::RequiresModule {
            query: ModuleQuery::new(Name::new("missing.lib"), VersionQuery::Any),
            flag_tokens: vec![],
        });
        let mut units = vec![CompilationUnit::new("App.src").with_module_decl(decl)];
        let success = driver.enter(&mut units, &file_manager, &metadata, &sink).expect("enter succeeds");

        assert!(!success);
        assert!(sink.has_key(DiagnosticKey::NoVersionAvailable));
    }
}
