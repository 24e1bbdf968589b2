//! Interned names, versions, module identity, and module queries (spec §3).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

use hashbrown::HashSet;
use std::sync::Arc;

fn interner() -> &'static Mutex<HashSet<Arc<str>>> {
    static INTERNER: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();
    INTERNER.get_or_init(|| Mutex::new(HashSet::new()))
}

/// An interned identifier string. Equality is pointer equality over the interned allocation
/// (falling back to content comparison only if two interners ever disagree, which cannot happen
/// through [`Name::new`]); ordering is lexicographic over the string content.
#[derive(Clone, Eq)]
pub struct Name(Arc<str>);

impl Name {
    /// Interns `value`, returning the shared handle. Repeated calls with equal content return
    /// clones of the same allocation.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        let mut table = interner().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = table.get(value) {
            return Name(Arc::clone(existing));
        }
        let arc: Arc<str> = Arc::from(value);
        table.insert(Arc::clone(&arc));
        Name(arc)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn stable_hash(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

/// An opaque version value. Two versions compare with equality of their string form; ordering is
/// lexicographic, matching [`Name`]'s ordering (no numeric component parsing: spec §3 treats
/// `Version` as produced whole by an injected, unspecified grammar).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Version(String);

impl Version {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Version(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn stable_hash(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Version::new(value)
    }
}

/// A version constraint appearing in a `requires` clause.
///
/// Per spec §3 / §9 Open Question: the `AtLeast` form is **deliberately not a range** — it matches
/// iff the candidate's string form equals the suffix after `>=`, nothing more. This is a faithful
/// reproduction of the source behavior (Open Question decision (a), not (b); see `DESIGN.md`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum VersionQuery {
    /// No version specified: matches any version, but is ambiguous if the catalog holds more than
    /// one version under the queried name.
    Any,
    /// `>=V`: matches iff the candidate's version string equals `V` exactly.
    AtLeast(Version),
    /// A bare version string: matches iff the candidate's version equals it exactly.
    Exact(Version),
}

impl VersionQuery {
    /// Parses the surface form of a version query: `None`/empty for "any", a leading `>=` for
    /// [`VersionQuery::AtLeast`], otherwise [`VersionQuery::Exact`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => VersionQuery::Any,
            Some(raw) if raw.is_empty() => VersionQuery::Any,
            Some(raw) => {
                if let Some(suffix) = raw.strip_prefix(">=") {
                    VersionQuery::AtLeast(Version::new(suffix))
                } else {
                    VersionQuery::Exact(Version::new(raw))
                }
            }
        }
    }

    /// Whether `candidate` satisfies this query in isolation. A `None` candidate (unversioned)
    /// never satisfies a versioned query; ambiguity among multiple versions under [`VersionQuery::Any`]
    /// is a catalog-level concern (§4.2 `resolve`), not decided here.
    #[must_use]
    pub fn matches(&self, candidate: Option<&Version>) -> bool {
        match self {
            VersionQuery::Any => true,
            VersionQuery::AtLeast(v) => candidate.is_some_and(|c| c.as_str() == v.as_str()),
            VersionQuery::Exact(v) => candidate == Some(v),
        }
    }
}

/// `(Name, Version?)`: the identity of a catalogued module.
///
/// Hashing deliberately follows spec §3's formula (`43*name.hash + (version?.hash ?? 0)`) rather
/// than deriving it, to keep the composition rule explicit and auditable.
#[derive(Clone, Debug, Eq)]
pub struct ModuleId {
    pub name: Name,
    pub version: Option<Version>,
}

impl ModuleId {
    #[must_use]
    pub fn new(name: Name, version: Option<Version>) -> Self {
        ModuleId { name, version }
    }

    #[must_use]
    pub fn unversioned(name: Name) -> Self {
        ModuleId { name, version: None }
    }

    /// Parses the `name[@version]` surface form.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once('@') {
            Some((name, version)) => ModuleId::new(Name::new(name), Some(Version::new(version))),
            None => ModuleId::unversioned(Name::new(value)),
        }
    }
}

impl PartialEq for ModuleId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Hash for ModuleId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let name_hash = self.name.stable_hash();
        let version_hash = self.version.as_ref().map_or(0, Version::stable_hash);
        let combined = 43u64.wrapping_mul(name_hash).wrapping_add(version_hash);
        state.write_u64(combined);
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{version}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// `(Name, VersionQuery?)`: what a `requires` clause asks the catalog to resolve.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModuleQuery {
    pub name: Name,
    pub version_query: VersionQuery,
}

impl ModuleQuery {
    #[must_use]
    pub fn new(name: Name, version_query: VersionQuery) -> Self {
        ModuleQuery { name, version_query }
    }

    #[must_use]
    pub fn exact(name: Name) -> Self {
        ModuleQuery::new(name, VersionQuery::Any)
    }

    /// Parses the `name[@version-query]` surface form used in `requires` clauses.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once('@') {
            Some((name, query)) => ModuleQuery::new(Name::new(name), VersionQuery::parse(Some(query))),
            None => ModuleQuery::new(Name::new(value), VersionQuery::Any),
        }
    }

    /// True iff `id`'s name matches and its version satisfies this query's version constraint.
    #[must_use]
    pub fn matches(&self, id: &ModuleId) -> bool {
        self.name == id.name && self.version_query.matches(id.version.as_ref())
    }
}

impl fmt::Display for ModuleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_query {
            VersionQuery::Any => write!(f, "{}", self.name),
            VersionQuery::AtLeast(v) => write!(f, "{}@>={v}", self.name),
            VersionQuery::Exact(v) => write!(f, "{}@{v}", self.name),
        }
    }
}
