use crate::{
    DependentRecord, Page, SubGroups, extract_dependents, extract_next_page, extract_sub_groups,
};

/// What a crawl needs from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Dependents listed on the page, in page order.
    pub(crate) dependents: Vec<DependentRecord>,

    /// The locator of the following page, if any.
    pub(crate) next_page: Option<String>,

    /// The sub-groups of the listing.
    pub(crate) sub_groups: SubGroups,
}

impl ListingPage {
    /// Extracts the listing from a parsed page.
    pub fn extract(page: &Page) -> Self {
        Self {
            dependents: extract_dependents(page),
            next_page: extract_next_page(page),
            sub_groups: extract_sub_groups(page),
        }
    }

    /// Retrieves the sub-groups.
    pub fn sub_groups(&self) -> &SubGroups {
        &self.sub_groups
    }
}
