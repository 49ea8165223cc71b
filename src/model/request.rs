use std::fmt::Display;

use url::Url;

use super::{CrawlerError, CrawlerResult, DependentType, Target};

/// A request for one page of the dependents listing
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum PageRequest {
    /// The first page of the listing of a target.
    FirstPage {
        /// The owner of the target.
        owner: String,
        /// The name of the target.
        name: String,
        /// The kind of dependents to list.
        dependent_type: DependentType,
    },

    /// The first page of a sub-group, reached through its locator.
    SubGroup {
        /// The name of the sub-group.
        name: String,
        /// The locator harvested from the sub-group menu.
        locator: String,
    },

    /// A following page, reached through the pagination locator.
    NextPage {
        /// The position of the page in the crawl, starting at 1.
        number: u32,
        /// The locator harvested from the pagination control.
        locator: String,
    },
}

impl PageRequest {
    /// Creates a request for the first page of the target's listing.
    pub fn first_page(target: &Target) -> Self {
        Self::FirstPage {
            owner: target.owner().to_string(),
            name: target.name().to_string(),
            dependent_type: target.dependent_type(),
        }
    }

    /// Creates a request for the first page of a sub-group.
    pub fn sub_group(name: &str, locator: &str) -> Self {
        Self::SubGroup {
            name: name.to_string(),
            locator: locator.to_string(),
        }
    }

    /// Creates a request for a following page.
    pub fn next_page(number: u32, locator: &str) -> Self {
        Self::NextPage {
            number,
            locator: locator.to_string(),
        }
    }

    /// Builds the URL to fetch, relative to the base URL of the site.
    ///
    /// Locators are joined on the base URL: absolute ones are kept as is.
    pub fn url(&self, base_url: &Url) -> CrawlerResult<String> {
        match self {
            PageRequest::FirstPage {
                owner,
                name,
                dependent_type,
            } => {
                let mut url = base_url.clone();
                url.path_segments_mut()
                    .map_err(|_| CrawlerError::InvalidUrl {
                        url: base_url.to_string(),
                        reason: "base URL cannot hold a path".to_string(),
                    })?
                    .pop_if_empty()
                    .extend([owner.as_str(), name.as_str(), "network", "dependents"]);
                url.query_pairs_mut()
                    .clear()
                    .append_pair("dependent_type", dependent_type.as_str());

                Ok(url.to_string())
            }
            PageRequest::SubGroup { locator, .. } | PageRequest::NextPage { locator, .. } => base_url
                .join(locator)
                .map(|url| url.to_string())
                .map_err(|e| CrawlerError::InvalidUrl {
                    url: locator.to_owned(),
                    reason: e.to_string(),
                }),
        }
    }
}

impl Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRequest::FirstPage {
                owner,
                name,
                dependent_type,
            } => write!(
                f,
                "first page of dependents: target={owner}/{name}, type={dependent_type}"
            ),
            PageRequest::SubGroup { name, locator } => {
                write!(f, "first page of sub-group: name={name}, locator={locator}")
            }
            PageRequest::NextPage { number, locator } => {
                write!(f, "next page ({number}) of dependents: locator={locator}")
            }
        }
    }
}
