//! The dependency graph and Tarjan-based SCC resolver (spec §4.3).
//!
//! Nodes live in an arena indexed by `usize`; SCC bookkeeping (`index`, `low_link`, `on_stack`,
//! `scc`) lives alongside each node rather than in recursive call frames, and Tarjan's algorithm
//! runs with an explicit work stack instead of recursion (spec §9 design notes). The condensation
//! DAG is built once SCCs are known and is only ever walked for the root set actually being
//! resolved — there is no persistent condensation cache across calls.

use ahash::{AHashMap, AHashSet};

use crate::catalog::ModuleCatalog;
use crate::diagnostic::{DiagnosticKey, DiagnosticSink};
use crate::directive::{Directive, Flags};
use crate::error::{ModuleError, Result};
use crate::location::Location;
use crate::name::ModuleQuery;
use crate::symbol::ModuleSymbol;

#[derive(Clone, Copy, Debug)]
struct Node {
    index: Option<usize>,
    low_link: usize,
    on_stack: bool,
}

impl Node {
    fn new() -> Self {
        Node {
            index: None,
            low_link: 0,
            on_stack: false,
        }
    }
}

/// Consumes `(roots, modules)` and the catalog built from them; returns the visible-module list in
/// dependency-respecting post-order, or `Err(ResolutionFailed)` if a non-optional `requires` could
/// not be resolved (spec §4.3).
pub fn resolve(
    roots: &[ModuleSymbol],
    modules: &[ModuleSymbol],
    catalog: &ModuleCatalog,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<ModuleSymbol>> {
    if modules.is_empty() {
        return Ok(Vec::new());
    }

    let mut location_index: AHashMap<Location, usize> = AHashMap::default();
    for (i, module) in modules.iter().enumerate() {
        location_index.insert(module.location().clone(), i);
    }

    let (adjacency, had_unresolved) = build_edges(modules, &location_index, catalog, sink);

    let (scc_of, scc_count) = tarjan(&adjacency);
    let condensation = build_condensation(&adjacency, &scc_of, scc_count);

    let root_sccs: Vec<usize> = roots
        .iter()
        .filter_map(|root| location_index.get(root.location()).map(|&i| scc_of[i]))
        .collect();

    let reachable = reachable_sccs(&condensation, &root_sccs);
    let order = topological_order(&condensation, &reachable, &root_sccs);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); scc_count];
    for (i, &scc) in scc_of.iter().enumerate() {
        members[scc].push(i);
    }

    let mut result = Vec::new();
    for scc_id in order {
        for &node_index in &members[scc_id] {
            result.push(modules[node_index].clone());
        }
    }

    if had_unresolved {
        return Err(ModuleError::ResolutionFailed(
            "one or more non-optional requires clauses could not be resolved".to_string(),
        ));
    }

    Ok(result)
}

/// Builds the adjacency list, resolving every `RequiresModule` directive against the catalog.
/// Unresolved optional requires are silently omitted (spec §4.3 step 3, scenario S7); unresolved
/// non-optional requires are diagnosed and recorded as a resolution failure.
fn build_edges(
    modules: &[ModuleSymbol],
    location_index: &AHashMap<Location, usize>,
    catalog: &ModuleCatalog,
    sink: &dyn DiagnosticSink,
) -> (Vec<Vec<usize>>, bool) {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
    let mut had_unresolved = false;

    for (i, symbol) in modules.iter().enumerate() {
        for directive in symbol.requires_modules() {
            let Directive::RequiresModule { query, flags } = directive else {
                unreachable!("requires_modules only yields RequiresModule directives")
            };
            match catalog.resolve(query) {
                Ok(target) => {
                    if let Some(&j) = location_index.get(target.location()) {
                        adjacency[i].push(j);
                    }
                }
                Err(error) => {
                    if flags.contains(Flags::OPTIONAL) {
                        continue;
                    }
                    had_unresolved = true;
                    report_unresolved(sink, symbol, query, &error);
                }
            }
        }
    }

    (adjacency, had_unresolved)
}

fn report_unresolved(sink: &dyn DiagnosticSink, symbol: &ModuleSymbol, query: &ModuleQuery, error: &ModuleError) {
    let (key, message) = match error {
        ModuleError::NoVersionAvailable(name) => (DiagnosticKey::NoVersionAvailable, name.clone()),
        ModuleError::NoUniqueVersionAvailable(name) => {
            (DiagnosticKey::NoUniqueVersionAvailable, name.clone())
        }
        ModuleError::RequiredVersionNotAvailable(target) => {
            (DiagnosticKey::RequiredVersionNotAvailable, target.clone())
        }
        _ => (DiagnosticKey::NoVersionAvailable, query.to_string()),
    };
    match symbol.source_file() {
        Some(file) => sink.error_scoped(key, message, file.to_string()),
        None => sink.error(key, message),
    }
}

/// Iterative Tarjan's SCC algorithm (spec §9 design notes: explicit stack, no recursion). Returns
/// each node's SCC id and the total number of SCCs found.
fn tarjan(adjacency: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = adjacency.len();
    let mut nodes: Vec<Node> = (0..n).map(|_| Node::new()).collect();
    let mut scc_of = vec![usize::MAX; n];
    let mut next_index = 0usize;
    let mut scc_count = 0usize;
    let mut on_stack_order: Vec<usize> = Vec::new();

    for start in 0..n {
        if nodes[start].index.is_some() {
            continue;
        }

        // Explicit recursion stack: each frame is (node, position of the next child to visit).
        let mut work: Vec<(usize, usize)> = vec![(start, 0)];
        nodes[start].index = Some(next_index);
        nodes[start].low_link = next_index;
        next_index += 1;
        nodes[start].on_stack = true;
        on_stack_order.push(start);

        while let Some(&mut (v, ref mut position)) = work.last_mut() {
            if *position < adjacency[v].len() {
                let w = adjacency[v][*position];
                *position += 1;

                if nodes[w].index.is_none() {
                    nodes[w].index = Some(next_index);
                    nodes[w].low_link = next_index;
                    next_index += 1;
                    nodes[w].on_stack = true;
                    on_stack_order.push(w);
                    work.push((w, 0));
                } else if nodes[w].on_stack {
                    let w_index = nodes[w].index.expect("checked Some above");
                    nodes[v].low_link = nodes[v].low_link.min(w_index);
                }
            } else {
                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    let v_low = nodes[v].low_link;
                    nodes[parent].low_link = nodes[parent].low_link.min(v_low);
                }

                if nodes[v].low_link == nodes[v].index.expect("v was indexed on entry") {
                    loop {
                        let w = on_stack_order.pop().expect("SCC root must be on the stack");
                        nodes[w].on_stack = false;
                        scc_of[w] = scc_count;
                        if w == v {
                            break;
                        }
                    }
                    scc_count += 1;
                }
            }
        }
    }

    (scc_of, scc_count)
}

/// The condensation DAG: an edge `u -> v` between distinct SCCs for every original edge crossing
/// between them.
fn build_condensation(adjacency: &[Vec<usize>], scc_of: &[usize], scc_count: usize) -> Vec<AHashSet<usize>> {
    let mut edges: Vec<AHashSet<usize>> = vec![AHashSet::default(); scc_count];
    for (u, neighbors) in adjacency.iter().enumerate() {
        for &v in neighbors {
            if scc_of[u] != scc_of[v] {
                edges[scc_of[u]].insert(scc_of[v]);
            }
        }
    }
    edges
}

/// Every SCC reachable from any root SCC, by DFS over the condensation (spec §4.3 step 5: "module
/// visibility predicate").
fn reachable_sccs(condensation: &[AHashSet<usize>], root_sccs: &[usize]) -> AHashSet<usize> {
    let mut seen = AHashSet::default();
    let mut stack: Vec<usize> = root_sccs.to_vec();
    while let Some(scc) = stack.pop() {
        if !seen.insert(scc) {
            continue;
        }
        for &next in &condensation[scc] {
            if !seen.contains(&next) {
                stack.push(next);
            }
        }
    }
    seen
}

/// A topological order over the reachable SCCs such that for every condensation edge `u -> v`, `u`
/// precedes `v` — i.e. if `A requires B`, `A` precedes `B` (spec §4.3 step 5, testable property 4).
/// Computed as the reverse of a DFS postorder, which is the standard construction for this
/// precedence direction.
fn topological_order(condensation: &[AHashSet<usize>], reachable: &AHashSet<usize>, root_sccs: &[usize]) -> Vec<usize> {
    let mut visited: AHashSet<usize> = AHashSet::default();
    let mut postorder: Vec<usize> = Vec::new();

    for &root in root_sccs {
        if visited.contains(&root) {
            continue;
        }
        // Iterative postorder DFS: a frame is re-pushed with `expanded = true` once its children
        // have all been scheduled, and is only appended to `postorder` on that second visit.
        let mut stack: Vec<(usize, bool)> = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                postorder.push(node);
                continue;
            }
            if !visited.insert(node) {
                continue;
            }
            stack.push((node, true));
            let mut children: Vec<usize> = condensation[node]
                .iter()
                .copied()
                .filter(|child| reachable.contains(child) && !visited.contains(child))
                .collect();
            children.sort_unstable();
            for child in children {
                stack.push((child, false));
            }
        }
    }

    postorder.reverse();
    postorder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::VecDiagnosticSink;
    use crate::location::LocationRole;
    use crate::name::{Name, Version, VersionQuery};

    fn module(name: &str, requires: &[&str]) -> ModuleSymbol {
        let location = Location::new(Name::new(name), LocationRole::ModulePath);
        let mut symbol = ModuleSymbol::new(location);
        symbol.set_name(Name::new(name));
        for target in requires {
            symbol.push_directive(Directive::RequiresModule {
                query: ModuleQuery::new(Name::new(*target), VersionQuery::Any),
                flags: Flags::empty(),
            });
        }
        symbol.freeze();
        symbol
    }

    fn optional_requires(name: &str, target: &str) -> ModuleSymbol {
        let location = Location::new(Name::new(name), LocationRole::ModulePath);
        let mut symbol = ModuleSymbol::new(location);
        symbol.set_name(Name::new(name));
        symbol.push_directive(Directive::RequiresModule {
            query: ModuleQuery::new(Name::new(target), VersionQuery::Any),
            flags: Flags::OPTIONAL,
        });
        symbol.freeze();
        symbol
    }

    fn catalog_from(modules: &[ModuleSymbol]) -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        let sink = VecDiagnosticSink::new();
        for module in modules {
            let symbol = catalog.enter(module.location().clone());
            *symbol = module.clone();
            catalog.register(module.location(), &sink);
        }
        catalog
    }

    fn position_of(modules: &[ModuleSymbol], name: &str) -> usize {
        modules.iter().position(|m| m.name().as_str() == name).unwrap_or_else(|| {
            panic!("{name} not present in resolver output")
        })
    }

    #[test]
    fn test_s2_diamond_respects_requires_edges() {
        let a = module("A", &["B", "C"]);
        let b = module("B", &["D"]);
        let c = module("C", &["D"]);
        let d = module("D", &[]);
        let modules = vec![a.clone(), b.clone(), c.clone(), d.clone()];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let result = resolve(&[a], &modules, &catalog, &sink).expect("resolves");
        assert_eq!(result.len(), 4);

        let pos = |n: &str| position_of(&result, n);
        assert!(pos("A") < pos("B"));
        assert!(pos("A") < pos("C"));
        assert!(pos("B") < pos("D"));
        assert!(pos("C") < pos("D"));
    }

    #[test]
    fn test_s3_cycle_both_members_present_and_precede_dependency() {
        let a = module("A", &["B", "E"]);
        let b = module("B", &["A"]);
        let e = module("E", &[]);
        let modules = vec![a.clone(), b.clone(), e.clone()];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let result = resolve(&[a], &modules, &catalog, &sink).expect("resolves");
        assert_eq!(result.len(), 3);
        let pos = |n: &str| position_of(&result, n);
        assert!(pos("A") < pos("E"));
        assert!(pos("B") < pos("E"));
    }

    fn versioned_module(location_name: &str, module_name: &str, version: &str) -> ModuleSymbol {
        let location = Location::new(Name::new(location_name), LocationRole::ModulePath);
        let mut symbol = ModuleSymbol::new(location);
        symbol.set_name(Name::new(module_name));
        symbol.set_version(Some(Version::new(version)));
        symbol.freeze();
        symbol
    }

    #[test]
    fn test_s6_ambiguous_version_fails_resolution() {
        let x1 = versioned_module("loc-x1", "X", "1");
        let x2 = versioned_module("loc-x2", "X", "2");
        let requirer = module("M", &["X"]);
        let modules = vec![requirer.clone(), x1, x2];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let result = resolve(&[requirer], &modules, &catalog, &sink);
        assert!(result.is_err());
        assert!(sink.has_key(DiagnosticKey::NoUniqueVersionAvailable));
    }

    #[test]
    fn test_s7_unresolved_optional_requires_no_diagnostic_and_succeeds() {
        let requirer = optional_requires("M", "Z");
        let modules = vec![requirer.clone()];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let result = resolve(&[requirer], &modules, &catalog, &sink).expect("resolves despite missing Z");
        assert_eq!(result.len(), 1);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_determinism_same_input_same_output() {
        let a = module("A", &["B"]);
        let b = module("B", &[]);
        let modules = vec![a.clone(), b.clone()];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let first = resolve(&[a.clone()], &modules, &catalog, &sink).expect("resolves");
        let second = resolve(&[a], &modules, &catalog, &sink).expect("resolves");
        let names = |result: &[ModuleSymbol]| result.iter().map(|m| m.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_unresolved_required_dependency_reports_and_fails() {
        let requirer = module("M", &["Missing"]);
        let modules = vec![requirer.clone()];
        let catalog = catalog_from(&modules);
        let sink = VecDiagnosticSink::new();

        let result = resolve(&[requirer], &modules, &catalog, &sink);
        assert!(result.is_err());
        assert!(sink.has_key(DiagnosticKey::NoVersionAvailable));
    }
}
