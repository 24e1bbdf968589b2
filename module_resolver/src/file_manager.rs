//! The file-manager capability interface the core depends on (spec §6.1).
//!
//! Enumerating directories and archives, and mapping file-objects to binary names, are the file
//! manager's job; the core only ever calls through this trait. [`InMemoryFileManager`] is a minimal
//! test double, not a real implementation — a production embedder wires up something backed by the
//! actual file system.

use indexmap::IndexMap;

use crate::error::Result;
use crate::location::Location;
use crate::name::Name;
use crate::tree::ModuleMode;

/// An opaque handle to a single file the file manager knows about (a compiled class, a source
/// file). The core never reads through one; it is only ever passed back to
/// [`FileManager::infer_binary_name`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileObjectRef(pub String);

/// Capability set the core depends on from the file-manager collaborator (spec §6.1).
pub trait FileManager {
    /// Produces a composite location from an ordered list; the core's own merger (§4.4) delegates
    /// the final result here.
    fn join(&self, locations: &[Location]) -> Location;

    /// Maps a source file inside `parent` to the unique module-root directory, given the file's
    /// declared package. May fail if the file sits outside any recognized module root.
    fn get_module_location(&self, parent: &Location, file: &str, package: Option<&Name>) -> Result<Location>;

    /// Enumerates every module-root location found under `parent`.
    fn get_module_locations(&self, parent: &Location) -> Vec<Location>;

    /// Whether source files map one-to-one to modules (`Single`) or multiple module roots are
    /// discovered under a shared parent (`Multiple`).
    fn module_mode(&self) -> ModuleMode;

    /// Applies the platform-path prepend/append around a base platform location (spec §4.4).
    fn augment_platform_location(&self, location: &Location, is_first: bool, is_last: bool) -> Vec<Location>;

    /// Whether this file manager implements the module-aware capability set at all. A file manager
    /// that answers `false` here causes the driver to report `module.file.manager.required` the
    /// moment it sees a module declaration (spec §6.1, §4.5, §7).
    fn is_module_aware(&self) -> bool {
        true
    }
}

/// A minimal in-memory [`FileManager`], keyed by location name, for the core's own tests and the
/// CLI's smoke-test driver.
#[derive(Debug, Default)]
pub struct InMemoryFileManager {
    module_mode: Option<ModuleMode>,
    locations_by_parent: IndexMap<Name, Vec<Location>>,
    module_aware: bool,
}

impl InMemoryFileManager {
    #[must_use]
    pub fn new() -> Self {
        InMemoryFileManager {
            module_aware: true,
            ..InMemoryFileManager::default()
        }
    }

    #[must_use]
    pub fn not_module_aware() -> Self {
        InMemoryFileManager {
            module_aware: false,
            ..InMemoryFileManager::default()
        }
    }

    #[must_use]
    pub fn with_module_mode(mut self, mode: ModuleMode) -> Self {
        self.module_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_module_locations(mut self, parent: impl Into<Name>, locations: Vec<Location>) -> Self {
        self.locations_by_parent.insert(parent.into(), locations);
        self
    }
}

impl FileManager for InMemoryFileManager {
    fn join(&self, locations: &[Location]) -> Location {
        match locations {
            [single] => single.clone(),
            _ => {
                let name = locations
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect::<Vec<_>>()
                    .join("+");
                Location::new(Name::new(name), crate::location::LocationRole::Extended)
            }
        }
    }

    fn get_module_location(&self, parent: &Location, _file: &str, _package: Option<&Name>) -> Result<Location> {
        Ok(parent.clone())
    }

    fn get_module_locations(&self, parent: &Location) -> Vec<Location> {
        self.locations_by_parent
            .get(&parent.name)
            .cloned()
            .unwrap_or_default()
    }

    fn module_mode(&self) -> ModuleMode {
        self.module_mode.unwrap_or(ModuleMode::Single)
    }

    fn augment_platform_location(&self, location: &Location, _is_first: bool, _is_last: bool) -> Vec<Location> {
        vec![location.clone()]
    }

    fn is_module_aware(&self) -> bool {
        self.module_aware
    }
}
