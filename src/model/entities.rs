use std::{fmt::Display, ops::Deref, str::FromStr};

use serde::Serialize;

use super::{CrawlerError, CrawlerResult};

/// The base URL of the site hosting the dependents listing.
pub const GITHUB_BASE_URL: &str = "https://github.com";

const GITHUB_URL_PREFIXES: [&str; 2] = ["https://github.com", "http://github.com"];

/// Splits a raw `owner/name` reference into its trimmed, non-empty parts.
pub fn split_owner_name(raw: &str) -> CrawlerResult<(String, String)> {
    let parts = raw.split('/').collect::<Vec<_>>();
    if parts.len() != 2 {
        return Err(CrawlerError::InvalidTargetFormat(raw.to_string()));
    }
    let owner = parts[0].trim();
    let name = parts[1].trim();
    if owner.is_empty() || name.is_empty() {
        return Err(CrawlerError::InvalidTargetFormat(raw.to_string()));
    }

    Ok((owner.to_string(), name.to_string()))
}

/// The kind of dependents listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependentType {
    /// Repositories depending on the target
    #[default]
    Repository,

    /// Packages depending on the target
    Package,
}

impl DependentType {
    /// The value of the `dependent_type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependentType::Repository => "REPOSITORY",
            DependentType::Package => "PACKAGE",
        }
    }
}

impl FromStr for DependentType {
    type Err = CrawlerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REPOSITORY" => Ok(DependentType::Repository),
            "PACKAGE" => Ok(DependentType::Package),
            _ => Err(CrawlerError::InvalidDependentType(value.to_string())),
        }
    }
}

impl Display for DependentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The repository whose dependents are crawled, with the listing selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The owner of the repository.
    owner: String,

    /// The name of the repository.
    name: String,

    /// The kind of dependents to list.
    dependent_type: DependentType,

    /// The sub-group (package) to select, if any.
    sub_group: Option<String>,
}

impl Target {
    /// Creates a new `Target` from already separated parts.
    pub fn new(
        owner: &str,
        name: &str,
        dependent_type: DependentType,
        sub_group: Option<&str>,
    ) -> Self {
        Self {
            owner: owner.trim().to_string(),
            name: name.trim().to_string(),
            dependent_type,
            sub_group: sub_group
                .map(str::trim)
                .filter(|sub_group| !sub_group.is_empty())
                .map(str::to_string),
        }
    }

    /// Resolves a user supplied reference such as `owner/name` or
    /// `https://github.com/owner/name/` into a `Target`.
    pub fn resolve(
        raw: &str,
        dependent_type: DependentType,
        sub_group: Option<&str>,
    ) -> CrawlerResult<Self> {
        let mut reference = raw.trim();
        for prefix in GITHUB_URL_PREFIXES {
            if let Some(stripped) = reference.strip_prefix(prefix) {
                reference = stripped;
                break;
            }
        }
        let (owner, name) = split_owner_name(reference.trim_matches('/'))?;

        Ok(Self::new(&owner, &name, dependent_type, sub_group))
    }

    /// Checks that every field needed to build the listing URL is set.
    pub fn validate(&self) -> CrawlerResult<()> {
        if self.owner.is_empty() {
            return Err(CrawlerError::IncompleteTarget("owner"));
        }
        if self.name.is_empty() {
            return Err(CrawlerError::IncompleteTarget("name"));
        }

        Ok(())
    }

    /// Retrieves the owner of the repository.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Retrieves the name of the repository.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retrieves the kind of dependents to list.
    pub fn dependent_type(&self) -> DependentType {
        self.dependent_type
    }

    /// Retrieves the requested sub-group, if any.
    pub fn sub_group(&self) -> Option<&str> {
        self.sub_group.as_deref()
    }

    /// Creates a dummy `Target` for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy() -> Self {
        Self::new("owner", "name", DependentType::Repository, None)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.owner, self.name, self.dependent_type)?;
        if let Some(sub_group) = &self.sub_group {
            write!(f, " [{sub_group}]")?;
        }

        Ok(())
    }
}

/// A dependent found on a listing page, as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DependentRecord(pub String);

impl DependentRecord {
    /// Splits the record into its owner and name.
    pub fn owner_and_name(&self) -> CrawlerResult<(String, String)> {
        split_owner_name(&self.0)
    }
}

impl Deref for DependentRecord {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DependentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DependentRecord {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A selectable partition of the dependents listing (a package of the target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubGroup {
    /// The displayed name.
    pub name: String,

    /// The site relative reference of the sub-group's first page.
    #[serde(skip)]
    pub locator: String,

    /// Whether the page is currently showing this sub-group.
    #[serde(skip)]
    pub selected: bool,
}

impl SubGroup {
    /// Creates a new `SubGroup`.
    pub fn new(name: &str, locator: &str, selected: bool) -> Self {
        Self {
            name: name.to_string(),
            locator: locator.to_string(),
            selected,
        }
    }
}

/// The sub-groups listed on a page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubGroups(pub Vec<SubGroup>);

impl SubGroups {
    /// Finds the first sub-group with the given name.
    pub fn by_name(&self, name: &str) -> Option<&SubGroup> {
        self.0.iter().find(|sub_group| sub_group.name == name)
    }

    /// Whether the first sub-group with the given name is selected.
    pub fn is_selected(&self, name: &str) -> bool {
        self.by_name(name)
            .map(|sub_group| sub_group.selected)
            .unwrap_or(false)
    }
}

impl Deref for SubGroups {
    type Target = [SubGroup];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Aggregate number of dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// The number of dependent repositories.
    pub repositories: u64,

    /// The number of dependent packages.
    pub packages: u64,
}

/// Information about the dependents of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependentsInfo {
    /// The sub-groups the listing can be narrowed to.
    #[serde(rename = "subpackages")]
    pub sub_groups: SubGroups,

    /// The aggregate counts.
    pub counts: Counts,
}

/// The outcome of a completed crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// The number of listing pages fetched, including a sub-group reload.
    pub pages_fetched: u32,

    /// The number of dependents handed to the callback.
    pub dependents_delivered: u32,

    /// Whether the callback asked to stop.
    pub cancelled: bool,
}

impl Display for CrawlReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Crawl: pages={}, dependents={}, cancelled={}",
            self.pages_fetched, self.dependents_delivered, self.cancelled
        )
    }
}
