//! The module-declaration visitor (spec §4.1).
//!
//! Converts parsed module syntax trees into a canonical, frozen directive list on a
//! [`ModuleSymbol`], enforcing per-module well-formedness: duplicate detection, view-nesting rules,
//! and synthesis of the implicit base-module requirement.

use ahash::{AHashMap, AHashSet};
use indexmap::IndexSet;

use crate::catalog::{ModuleCatalog, BASE_MODULE_NAME};
use crate::diagnostic::{DiagnosticKey, DiagnosticSink};
use crate::directive::{Directive, DirectiveKind, Flags};
use crate::file_manager::FileManager;
use crate::location::Location;
use crate::name::{ModuleId, ModuleQuery, Name};
use crate::symbol::{ModuleSymbol, ViewSymbol};
use crate::tree::{CompilationUnit, DirectiveTree, ModuleDeclTree, ModuleMode};

/// Walks parsed compilation units, populating the catalog with source-declared modules.
pub struct ModuleDeclarationVisitor;

impl ModuleDeclarationVisitor {
    /// Visits every unit, determining its module location (spec §4.1 mode handling) and, for units
    /// whose top is a module-info unit, materializing a frozen [`ModuleSymbol`].
    ///
    /// Returns the declared trees keyed by module name, for the dependency graph's tree-walker
    /// (spec §4.3 step 3) to locate the clause that declared an unresolved query.
    #[must_use]
    pub fn visit(
        units: &mut [CompilationUnit],
        catalog: &mut ModuleCatalog,
        file_manager: &dyn FileManager,
        class_path_location: &Location,
        source_path_location: &Location,
        module_path_location: &Location,
        roots: &mut IndexSet<Location>,
        sink: &dyn DiagnosticSink,
    ) -> AHashMap<Name, ModuleDeclTree> {
        let mode = file_manager.module_mode();
        let mut declared_trees = AHashMap::default();

        for unit in units.iter_mut() {
            let location = match mode {
                ModuleMode::Single => {
                    let location = file_manager.join(&[class_path_location.clone(), source_path_location.clone()]);
                    roots.insert(location.clone());
                    location
                }
                ModuleMode::Multiple => {
                    match file_manager.get_module_location(
                        module_path_location,
                        &unit.source_file,
                        unit.package_name.as_ref(),
                    ) {
                        Ok(location) => {
                            roots.insert(location.clone());
                            location
                        }
                        Err(_) => {
                            sink.error_scoped(
                                DiagnosticKey::FileInWrongDirectory,
                                unit.source_file.clone(),
                                unit.source_file.clone(),
                            );
                            continue;
                        }
                    }
                }
            };
            unit.location = Some(location.clone());

            let Some(decl) = unit.module_decl.clone() else {
                continue;
            };

            if catalog.get_by_location(&location).is_some_and(ModuleSymbol::is_named) {
                sink.error_scoped(
                    DiagnosticKey::ModuleAlreadyDefined,
                    decl.name.to_string(),
                    unit.source_file.clone(),
                );
                continue;
            }

            let symbol = catalog.enter(location.clone());
            populate_symbol(symbol, &decl, &unit.source_file, sink);
            catalog.register(&location, sink);

            unit.resolved_module_name = Some(decl.name.clone());
            declared_trees.insert(decl.name.clone(), decl);
        }

        declared_trees
    }
}

/// Rejects every module declaration outright (spec §4.5: "modules are globally disabled"). Returns
/// whether no module declarations were encountered.
#[must_use]
pub fn visit_no_modules(units: &[CompilationUnit], sink: &dyn DiagnosticSink) -> bool {
    let mut success = true;
    for unit in units {
        if let Some(decl) = &unit.module_decl {
            sink.error_scoped(
                DiagnosticKey::ModuleDeclNotPermitted,
                decl.name.to_string(),
                unit.source_file.clone(),
            );
            success = false;
        }
    }
    success
}

fn populate_symbol(symbol: &mut ModuleSymbol, decl: &ModuleDeclTree, source_file: &str, sink: &dyn DiagnosticSink) {
    symbol.set_name(decl.name.clone());
    symbol.set_version(decl.version.clone());
    symbol.set_source_file(source_file.to_string());

    let base_name = Name::new(BASE_MODULE_NAME);
    let mut requires_base_satisfied = decl.name == base_name;
    let mut view_names_seen = AHashSet::default();
    let mut materialized_views = Vec::new();

    let directives = process_directives(
        &decl.directives,
        false,
        &decl.name,
        &base_name,
        &mut requires_base_satisfied,
        &mut view_names_seen,
        &mut materialized_views,
        Some(source_file),
        sink,
    );

    for directive in directives {
        symbol.push_directive(directive);
    }
    for view in materialized_views {
        symbol.push_view(view);
    }

    // Invariant 3: synthesize the implicit base-module requirement if nothing satisfied it.
    if !requires_base_satisfied {
        symbol.push_directive(Directive::RequiresModule {
            query: ModuleQuery::exact(base_name),
            flags: Flags::SYNTHESIZED,
        });
    }

    symbol.freeze();
}

/// Whether `directives` already holds an entry with this `(kind, target-name)` (invariant 2).
fn already_has(directives: &[Directive], kind: DirectiveKind, target_name: &Name) -> bool {
    directives
        .iter()
        .any(|d| d.kind() == kind && d.target_name() == Some(target_name))
}

#[allow(clippy::too_many_arguments)]
fn process_directives(
    tree_directives: &[DirectiveTree],
    in_view: bool,
    module_name: &Name,
    base_name: &Name,
    requires_base_satisfied: &mut bool,
    view_names_seen: &mut AHashSet<Name>,
    materialized_views: &mut Vec<ViewSymbol>,
    source_file: Option<&str>,
    sink: &dyn DiagnosticSink,
) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut entrypoint_seen = false;

    for tree in tree_directives {
        match tree {
            DirectiveTree::Permits { module_name: target } => {
                if already_has(&directives, DirectiveKind::Permits, target) {
                    report(sink, DiagnosticKey::DuplPermits, target.as_str(), source_file);
                } else {
                    directives.push(Directive::Permits {
                        module_name: target.clone(),
                    });
                }
            }
            DirectiveTree::ProvidesModule { alias_name, alias_version } => {
                if already_has(&directives, DirectiveKind::ProvidesModule, alias_name) {
                    report(sink, DiagnosticKey::DuplProvides, alias_name.as_str(), source_file);
                } else {
                    directives.push(Directive::ProvidesModule {
                        alias: ModuleId::new(alias_name.clone(), alias_version.clone()),
                    });
                    if alias_name == base_name {
                        *requires_base_satisfied = true;
                    }
                }
            }
            DirectiveTree::ProvidesService { service, implementation } => {
                directives.push(Directive::ProvidesService {
                    service: service.clone(),
                    implementation: implementation.clone(),
                });
            }
            DirectiveTree::RequiresModule { query, flag_tokens } => {
                if in_view {
                    report(sink, DiagnosticKey::RequiresNotAllowedInView, query.name.as_str(), source_file);
                } else if already_has(&directives, DirectiveKind::RequiresModule, &query.name) {
                    report(sink, DiagnosticKey::DuplRequires, query.name.as_str(), source_file);
                } else {
                    let flags = Flags::from_tokens(flag_tokens.iter().map(String::as_str));
                    if query.name == *base_name {
                        *requires_base_satisfied = true;
                    }
                    directives.push(Directive::RequiresModule {
                        query: query.clone(),
                        flags,
                    });
                }
            }
            DirectiveTree::RequiresService { service } => {
                if in_view {
                    report(sink, DiagnosticKey::RequiresNotAllowedInView, service.as_str(), source_file);
                } else {
                    directives.push(Directive::RequiresService { service: service.clone() });
                }
            }
            DirectiveTree::Exports { package_name } => {
                directives.push(Directive::Exports {
                    package_name: package_name.clone(),
                });
            }
            DirectiveTree::Entrypoint { class_name } => {
                if entrypoint_seen {
                    report(sink, DiagnosticKey::DuplEntrypoint, class_name.as_str(), source_file);
                } else {
                    entrypoint_seen = true;
                    directives.push(Directive::Entrypoint {
                        class_name: class_name.clone(),
                    });
                }
            }
            DirectiveTree::View { name, directives: child } => {
                if in_view {
                    report(sink, DiagnosticKey::NestedViewNotAllowed, name.as_str(), source_file);
                    continue;
                }
                if name == module_name || view_names_seen.contains(name) {
                    report(sink, DiagnosticKey::DuplView, name.as_str(), source_file);
                    continue;
                }
                view_names_seen.insert(name.clone());
                let child_directives = process_directives(
                    child,
                    true,
                    module_name,
                    base_name,
                    requires_base_satisfied,
                    view_names_seen,
                    materialized_views,
                    source_file,
                    sink,
                );
                if name == base_name {
                    *requires_base_satisfied = true;
                }
                materialized_views.push(ViewSymbol {
                    name: name.clone(),
                    directives: child_directives.clone(),
                });
                directives.push(Directive::View {
                    name: name.clone(),
                    directives: child_directives,
                });
            }
        }
    }

    directives
}

fn report(sink: &dyn DiagnosticSink, key: DiagnosticKey, argument: &str, source_file: Option<&str>) {
    match source_file {
        Some(file) => sink.error_scoped(key, argument.to_string(), file.to_string()),
        None => sink.error(key, argument.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::VecDiagnosticSink;
    use crate::file_manager::InMemoryFileManager;
    use crate::location::LocationRole;
    use crate::name::VersionQuery;

    fn single_mode_fixtures() -> (Location, Location, Location, InMemoryFileManager) {
        let class_path = Location::new(Name::new("cp"), LocationRole::ClassPath);
        let source_path = Location::new(Name::new("sp"), LocationRole::SourcePath);
        let module_path = Location::new(Name::new("mp"), LocationRole::ModulePath);
        let file_manager = InMemoryFileManager::new().with_module_mode(ModuleMode::Single);
        (class_path, source_path, module_path, file_manager)
    }

    #[test]
    fn test_s1_single_module_synthesizes_base_requirement() {
        let (cp, sp, mp, fm) = single_mode_fixtures();
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        let mut roots = IndexSet::new();

        let mut units = vec![CompilationUnit::new("M.src").with_module_decl(ModuleDeclTree::new("M"))];
        ModuleDeclarationVisitor::visit(&mut units, &mut catalog, &fm, &cp, &sp, &mp, &mut roots, &sink);

        let symbol = catalog
            .modules()
            .find(|s| s.name().as_str() == "M")
            .expect("M catalogued");
        assert_eq!(symbol.directives().len(), 1);
        assert!(matches!(
            &symbol.directives()[0],
            Directive::RequiresModule { query, flags }
                if query.name.as_str() == BASE_MODULE_NAME && flags.contains(Flags::SYNTHESIZED)
        ));
    }

    #[test]
    fn test_s4_duplicate_provides_reports_and_keeps_one() {
        let (cp, sp, mp, fm) = single_mode_fixtures();
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        let mut roots = IndexSet::new();

        let decl = ModuleDeclTree::new("M")
            .with_directive(DirectiveTree::ProvidesModule {
                alias_name: Name::new("X"),
                alias_version: Some(crate::name::Version::new("1")),
            })
            .with_directive(DirectiveTree::ProvidesModule {
                alias_name: Name::new("X"),
                alias_version: Some(crate::name::Version::new("1")),
            });
        let mut units = vec![CompilationUnit::new("M.src").with_module_decl(decl)];
        ModuleDeclarationVisitor::visit(&mut units, &mut catalog, &fm, &cp, &sp, &mp, &mut roots, &sink);

        assert!(sink.has_key(DiagnosticKey::DuplProvides));
        let symbol = catalog.modules().find(|s| s.name().as_str() == "M").unwrap();
        let provides_count = symbol
            .directives()
            .iter()
            .filter(|d| matches!(d, Directive::ProvidesModule { .. }))
            .count();
        assert_eq!(provides_count, 1);
    }

    #[test]
    fn test_s5_requires_in_view_rejected() {
        let (cp, sp, mp, fm) = single_mode_fixtures();
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        let mut roots = IndexSet::new();

        let decl = ModuleDeclTree::new("M").with_directive(DirectiveTree::View {
            name: Name::new("V"),
            directives: vec![DirectiveTree::RequiresModule {
                query: ModuleQuery::new(Name::new("N"), VersionQuery::Any),
                flag_tokens: vec![],
            }],
        });
        let mut units = vec![CompilationUnit::new("M.src").with_module_decl(decl)];
        ModuleDeclarationVisitor::visit(&mut units, &mut catalog, &fm, &cp, &sp, &mp, &mut roots, &sink);

        assert!(sink.has_key(DiagnosticKey::RequiresNotAllowedInView));
        let symbol = catalog.modules().find(|s| s.name().as_str() == "M").unwrap();
        assert_eq!(symbol.views().len(), 1);
        assert!(symbol.views()[0].directives.is_empty());
    }

    #[test]
    fn test_nested_view_rejected() {
        let (cp, sp, mp, fm) = single_mode_fixtures();
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        let mut roots = IndexSet::new();

        let decl = ModuleDeclTree::new("M").with_directive(DirectiveTree::View {
            name: Name::new("V"),
            directives: vec![DirectiveTree::View {
                name: Name::new("W"),
                directives: vec![],
            }],
        });
        let mut units = vec![CompilationUnit::new("M.src").with_module_decl(decl)];
        ModuleDeclarationVisitor::visit(&mut units, &mut catalog, &fm, &cp, &sp, &mp, &mut roots, &sink);

        assert!(sink.has_key(DiagnosticKey::NestedViewNotAllowed));
        let symbol = catalog.modules().find(|s| s.name().as_str() == "M").unwrap();
        assert_eq!(symbol.views().len(), 1);
    }

    #[test]
    fn test_module_already_defined_keeps_first() {
        let (cp, sp, mp, fm) = single_mode_fixtures();
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        let mut roots = IndexSet::new();

        let mut units = vec![
            CompilationUnit::new("M1.src").with_module_decl(ModuleDeclTree::new("M")),
            CompilationUnit::new("M2.src").with_module_decl(ModuleDeclTree::new("M2")),
        ];
        ModuleDeclarationVisitor::visit(&mut units, &mut catalog, &fm, &cp, &sp, &mp, &mut roots, &sink);

        assert!(sink.has_key(DiagnosticKey::ModuleAlreadyDefined));
        // Both units share the same location in single-module mode, so only the first name wins.
        assert!(catalog.modules().any(|s| s.name().as_str() == "M"));
        assert!(!catalog.modules().any(|s| s.name().as_str() == "M2"));
    }

    #[test]
    fn test_no_modules_visitor_rejects_declarations() {
        let sink = VecDiagnosticSink::new();
        let units = vec![CompilationUnit::new("M.src").with_module_decl(ModuleDeclTree::new("M"))];
        let success = visit_no_modules(&units, &sink);
        assert!(!success);
        assert!(sink.has_key(DiagnosticKey::ModuleDeclNotPermitted));
    }

    #[test]
    fn test_no_modules_visitor_accepts_plain_units() {
        let sink = VecDiagnosticSink::new();
        let units = vec![CompilationUnit::new("Plain.src")];
        assert!(visit_no_modules(&units, &sink));
        assert!(sink.diagnostics().is_empty());
    }
}
