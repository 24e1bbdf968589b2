//! The module catalog (spec §4.2): a two-level `name -> version -> symbol` index with alias
//! expansion and deterministic version-query resolution.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::diagnostic::{DiagnosticKey, DiagnosticSink};
use crate::directive::Directive;
use crate::error::{ModuleError, Result};
use crate::location::{Location, LocationRole};
use crate::metadata::ModuleMetadataSource;
use crate::name::{ModuleId, ModuleQuery, Name, Version, VersionQuery};
use crate::symbol::ModuleSymbol;

/// The single mandatory module every other module implicitly requires (glossary "Base module").
pub const BASE_MODULE_NAME: &str = "lang.base";

/// A reserved alias that stands in for "every platform module" the way `java.se` once did.
pub const LEGACY_PLATFORM_ALIAS: &str = "lang.legacy";

/// Module names beginning with this prefix are platform-reserved (glossary "Platform module").
pub const PLATFORM_MODULE_PREFIX: &str = "lang.";

/// True iff `name` is reserved by the platform: it begins with the platform prefix, or is the
/// legacy platform alias.
#[must_use]
pub fn is_platform_name(name: &Name) -> bool {
    name.as_str().starts_with(PLATFORM_MODULE_PREFIX)
}

/// Distinguishes a catalogued "no version" entry from a real version without needing a sentinel
/// string in a `HashMap<String, _>` (spec §3: "stored under a distinguished sentinel so null-keyed
/// maps are avoided").
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
enum VersionKey {
    Unversioned,
    Versioned(Version),
}

impl From<Option<&Version>> for VersionKey {
    fn from(version: Option<&Version>) -> Self {
        match version {
            Some(v) => VersionKey::Versioned(v.clone()),
            None => VersionKey::Unversioned,
        }
    }
}

/// The name/version-indexed table of known modules, including aliases (spec §4.2).
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    symbols: IndexMap<Location, ModuleSymbol>,
    index: AHashMap<Name, Vec<(VersionKey, Location)>>,
}

impl ModuleCatalog {
    #[must_use]
    pub fn new() -> Self {
        ModuleCatalog::default()
    }

    /// Returns the unique symbol for `location`, creating an empty one (invariant 1) if absent.
    pub fn enter(&mut self, location: Location) -> &mut ModuleSymbol {
        self.symbols
            .entry(location.clone())
            .or_insert_with(|| ModuleSymbol::new(location))
    }

    #[must_use]
    pub fn get_by_location(&self, location: &Location) -> Option<&ModuleSymbol> {
        self.symbols.get(location)
    }

    /// Reads module metadata for the symbol at `location`: a source module-info is preferred over a
    /// compiled one; if neither exists the module keeps the empty name (the unnamed module).
    pub fn complete(
        &mut self,
        location: &Location,
        metadata: &dyn ModuleMetadataSource,
    ) -> Result<()> {
        if let Some(tree) = metadata.read_source(location) {
            let symbol = self.enter(location.clone());
            if !symbol.is_frozen() {
                symbol.set_name(tree.name.clone());
                symbol.set_version(tree.version.clone());
            }
            return Ok(());
        }
        if let Some(compiled) = metadata.read_compiled(location) {
            let symbol = self.enter(location.clone());
            if !symbol.is_frozen() {
                symbol.set_name(compiled.name.clone());
                symbol.set_version(compiled.version.clone());
                for directive in compiled.directives {
                    symbol.push_directive(directive);
                }
                symbol.freeze();
            }
            return Ok(());
        }
        // Neither a source nor a compiled record exists: the symbol stays the unnamed module.
        Ok(())
    }

    /// Registers `(sym.name, sym.version) -> sym` and every `ProvidesModule` alias on the symbol or
    /// one of its views (spec §4.2 `register`, invariants 5 and 6). Collisions are diagnosed as
    /// `duplicate.definition` and the first registration wins.
    pub fn register(&mut self, location: &Location, sink: &dyn DiagnosticSink) {
        let Some(symbol) = self.symbols.get(location) else {
            return;
        };
        if !symbol.is_named() {
            return;
        }
        let id = symbol.id();
        let aliases: Vec<ModuleId> = symbol.aliases().cloned().collect();
        let source_file = symbol.source_file().map(ToString::to_string);

        self.register_id(&id, location.clone(), source_file.as_deref(), sink);
        for alias in aliases {
            self.register_id(&alias, location.clone(), source_file.as_deref(), sink);
        }
    }

    fn register_id(&mut self, id: &ModuleId, location: Location, source_file: Option<&str>, sink: &dyn DiagnosticSink) {
        let key = VersionKey::from(id.version.as_ref());
        let entries = self.index.entry(id.name.clone()).or_default();
        if entries.iter().any(|(k, _)| k == &key) {
            let message = id.to_string();
            match source_file {
                Some(file) => sink.error_scoped(DiagnosticKey::DuplicateDefinition, message, file),
                None => sink.error(DiagnosticKey::DuplicateDefinition, message),
            }
            return;
        }
        entries.push((key, location));
    }

    /// Resolves a `requires`-clause query against the catalog (spec §4.2 `resolve`).
    pub fn resolve(&self, query: &ModuleQuery) -> Result<&ModuleSymbol> {
        let Some(entries) = self.index.get(&query.name) else {
            return Err(ModuleError::NoVersionAvailable(query.name.to_string()));
        };

        match &query.version_query {
            VersionQuery::Any => {
                if entries.len() > 1 {
                    return Err(ModuleError::NoUniqueVersionAvailable(query.name.to_string()));
                }
                let (_, location) = &entries[0];
                self.symbols
                    .get(location)
                    .ok_or_else(|| ModuleError::InternalError("catalog index points at missing symbol".to_string()))
            }
            VersionQuery::Exact(version) | VersionQuery::AtLeast(version) => {
                let key = VersionKey::Versioned(version.clone());
                entries
                    .iter()
                    .find(|(k, _)| k == &key)
                    .and_then(|(_, location)| self.symbols.get(location))
                    .ok_or_else(|| {
                        ModuleError::RequiredVersionNotAvailable(format!("{}@{version}", query.name))
                    })
            }
        }
    }

    /// After construction, inserts the platform-reserved names (the base module, the legacy
    /// platform alias) if absent, each at a distinguished platform-location with an empty directive
    /// list (spec §4.2 `register-platform-defaults`).
    pub fn register_platform_defaults(&mut self, sink: &dyn DiagnosticSink) {
        for name in [BASE_MODULE_NAME, LEGACY_PLATFORM_ALIAS] {
            let name = Name::new(name);
            if self.index.contains_key(&name) {
                continue;
            }
            let location = Location::new(name.clone(), LocationRole::Platform);
            let symbol = self.enter(location.clone());
            symbol.set_name(name);
            symbol.freeze();
            self.register(&location, sink);
        }
    }

    #[must_use]
    pub fn modules(&self) -> impl Iterator<Item = &ModuleSymbol> {
        self.symbols.values().filter(|s| s.is_named())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
