//! Extraction of the dependents listing from GitHub's markup.
//!
//! Every assumption about the shape of the listing page lives here.

use std::{io::Read, sync::LazyLock};

use scraper::{ElementRef, Selector};

use crate::{
    Counts, CrawlerError, CrawlerResult, DependentRecord, Page, RawPage, SubGroup, SubGroups,
};

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Invalid selector {css:?}: {e}"))
}

static DEPENDENT_ROW: LazyLock<Selector> =
    LazyLock::new(|| parse_selector("[data-repository-hovercards-enabled]"));
static PAGINATION: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(r#"[data-test-selector="pagination"]"#));
static SUB_GROUP_MENU: LazyLock<Selector> =
    LazyLock::new(|| parse_selector("div.select-menu-list"));
static COUNT_TOGGLE: LazyLock<Selector> =
    LazyLock::new(|| parse_selector("div.table-list-header-toggle"));

/// Direct element children of an element.
fn child_elements<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent.children().filter_map(ElementRef::wrap)
}

fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|name| name == class)
}

fn select<'a>(page: &'a Page, selector: &Selector) -> Vec<ElementRef<'a>> {
    page.document().select(selector).collect()
}

/// Extracts the dependents listed on the page, in document order.
///
/// Only rows linking to a repository are reported.
pub fn extract_dependents(page: &Page) -> Vec<DependentRecord> {
    select(page, &DEPENDENT_ROW)
        .into_iter()
        .filter_map(|row| {
            child_elements(row)
                .find(|child| child.value().attr("data-hovercard-type") == Some("repository"))
                .and_then(|repository| repository.value().attr("href"))
                .map(|href| DependentRecord::from(href.strip_prefix('/').unwrap_or(href)))
        })
        .collect()
}

/// Extracts the locator of the following page, if any.
pub fn extract_next_page(page: &Page) -> Option<String> {
    let last = select(page, &PAGINATION)
        .into_iter()
        .flat_map(child_elements)
        .filter(|child| child.value().name() == "a")
        .last()?;
    let text = last.text().collect::<String>();
    if text.contains("Previous") {
        return None;
    }

    last.value().attr("href").map(str::to_string)
}

/// Extracts the sub-groups the listing can be narrowed to.
pub fn extract_sub_groups(page: &Page) -> SubGroups {
    SubGroups(
        select(page, &SUB_GROUP_MENU)
            .into_iter()
            .flat_map(child_elements)
            .filter(|item| item.value().name() == "a" && has_class(item, "select-menu-item"))
            .filter_map(|item| {
                let locator = item.value().attr("href")?;
                let name = child_elements(item)
                    .filter(|child| {
                        child.value().name() == "span" && has_class(child, "select-menu-item-text")
                    })
                    .flat_map(|child| child.text())
                    .collect::<String>();
                let selected = item.value().attr("aria-checked") == Some("true");

                Some(SubGroup::new(name.trim(), locator, selected))
            })
            .collect(),
    )
}

/// Extracts the aggregate counts of dependent repositories and packages.
///
/// A count label without a number means the markup changed shape and fails.
pub fn extract_counts(page: &Page) -> CrawlerResult<Counts> {
    let mut counts = Counts::default();
    let labels = select(page, &COUNT_TOGGLE)
        .into_iter()
        .flat_map(child_elements)
        .filter(|child| child.value().name() == "a");
    for label in labels {
        let text = label.text().collect::<String>();
        let text = text.trim();
        let parse_count = || {
            text.chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse::<u64>()
                .map_err(|_| CrawlerError::CountParseError(text.to_string()))
        };
        if text.contains("Repositor") {
            counts.repositories = parse_count()?;
        }
        if text.contains("Package") {
            counts.packages = parse_count()?;
        }
    }

    Ok(counts)
}

/// Extracts the dependents from a saved listing document.
pub fn extract_dependents_from_reader<R: Read>(mut reader: R) -> CrawlerResult<Vec<DependentRecord>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let raw_page = RawPage::try_new("<reader>", &bytes)?;

    Ok(extract_dependents(&raw_page.parse()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::listing_html;
    use super::*;

    fn page(html: &str) -> Page {
        Page::from_html(html)
    }

    #[test]
    fn selectors_are_valid() {
        for selector in [&DEPENDENT_ROW, &PAGINATION, &SUB_GROUP_MENU, &COUNT_TOGGLE] {
            LazyLock::force(selector);
        }
    }

    #[test]
    #[should_panic(expected = "Invalid selector")]
    fn invalid_selector_is_reported() {
        parse_selector("div[");
    }

    mod dependents {
        use super::*;

        #[test]
        fn extracts_repository_links_in_document_order() {
            let page = page(&listing_html(
                &["org-1/repo-1", "org-2/repo-2", "org-3/repo-3"],
                None,
                &[],
            ));

            let dependents = extract_dependents(&page);

            assert_eq!(
                vec![
                    DependentRecord::from("org-1/repo-1"),
                    DependentRecord::from("org-2/repo-2"),
                    DependentRecord::from("org-3/repo-3"),
                ],
                dependents
            );
        }

        #[test]
        fn skips_rows_without_repository_link() {
            let html = r#"<html><body>
                <span data-repository-hovercards-enabled><a data-hovercard-type="repository" href="/org-1/repo-1">repo-1</a></span>
                <span data-repository-hovercards-enabled><a data-hovercard-type="user" href="/ghost">ghost</a></span>
                <span data-repository-hovercards-enabled><a data-hovercard-type="repository">no-href</a></span>
                <span data-repository-hovercards-enabled>deleted</span>
                <span data-repository-hovercards-enabled><a data-hovercard-type="repository" href="/org-2/repo-2">repo-2</a></span>
                <div><a data-hovercard-type="repository" href="/org-3/not-a-row">not-a-row</a></div>
            </body></html>"#;

            let dependents = extract_dependents(&page(html));

            assert_eq!(
                vec![
                    DependentRecord::from("org-1/repo-1"),
                    DependentRecord::from("org-2/repo-2"),
                ],
                dependents
            );
        }

        #[test]
        fn only_direct_children_are_considered() {
            let html = r#"<html><body>
                <div data-repository-hovercards-enabled><p><a data-hovercard-type="repository" href="/org-1/nested">nested</a></p></div>
            </body></html>"#;

            assert!(extract_dependents(&page(html)).is_empty());
        }

        #[test]
        fn empty_listing_yields_no_dependents() {
            let page = page(&listing_html(&[], None, &[]));

            assert!(extract_dependents(&page).is_empty());
        }

        #[test]
        fn extracts_from_reader() {
            let html = listing_html(&["org-1/repo-1", "org-2/repo-2"], None, &[]);

            let dependents = extract_dependents_from_reader(html.as_bytes()).unwrap();

            assert_eq!(
                vec![
                    DependentRecord::from("org-1/repo-1"),
                    DependentRecord::from("org-2/repo-2"),
                ],
                dependents
            );
        }

        #[test]
        fn reader_with_invalid_document_fails() {
            let error = extract_dependents_from_reader(&[0xff, 0xfe][..])
                .expect_err("Invalid document should be rejected");

            assert!(matches!(error, CrawlerError::MalformedDocument { .. }));
        }
    }

    mod next_page {
        use super::*;

        #[test]
        fn returns_next_link_verbatim() {
            let href = "https://github.com/owner/name/network/dependents?dependents_after=MTIzNDU";
            let page = page(&listing_html(&["org-1/repo-1"], Some(href), &[]));

            assert_eq!(Some(href.to_string()), extract_next_page(&page));
        }

        #[test]
        fn returns_none_when_last_link_is_previous() {
            let page = page(&listing_html(&["org-1/repo-1"], None, &[]));

            assert_eq!(None, extract_next_page(&page));
        }

        #[test]
        fn returns_none_without_pagination() {
            let page = page("<html><body><p>Nothing to see</p></body></html>");

            assert_eq!(None, extract_next_page(&page));
        }

        #[test]
        fn returns_none_when_last_link_has_no_href() {
            let html = r#"<html><body><div data-test-selector="pagination"><a href="/prev">Previous</a><a>Next</a></div></body></html>"#;

            assert_eq!(None, extract_next_page(&page(html)));
        }

        #[test]
        fn uses_last_link_when_both_are_present() {
            let html = r#"<html><body><div data-test-selector="pagination"><a href="/owner/name/network/dependents?dependents_before=MQ">Previous</a><a href="/owner/name/network/dependents?dependents_after=Mg">Next</a></div></body></html>"#;

            assert_eq!(
                Some("/owner/name/network/dependents?dependents_after=Mg".to_string()),
                extract_next_page(&page(html))
            );
        }
    }

    mod sub_groups {
        use super::*;

        #[test]
        fn extracts_names_locators_and_selection() {
            let page = page(&listing_html(
                &[],
                None,
                &[
                    ("pkg-a", "/owner/name/network/dependents?package_id=a", true),
                    ("pkg-b", "/owner/name/network/dependents?package_id=b", false),
                ],
            ));

            let sub_groups = extract_sub_groups(&page);

            assert_eq!(
                SubGroups(vec![
                    SubGroup::new("pkg-a", "/owner/name/network/dependents?package_id=a", true),
                    SubGroup::new("pkg-b", "/owner/name/network/dependents?package_id=b", false),
                ]),
                sub_groups
            );
        }

        #[test]
        fn skips_items_without_href_and_requires_literal_true() {
            let html = r#"<html><body><div class="select-menu-list">
                <a class="select-menu-item" aria-checked="true"><span class="select-menu-item-text">no-href</span></a>
                <a class="select-menu-item" aria-checked="TRUE" href="/a"><span class="select-menu-item-text"> pkg-a </span></a>
                <a class="other-item" href="/x"><span class="select-menu-item-text">not-an-item</span></a>
                <a class="select-menu-item" href="/b"><span class="select-menu-item-text">pkg-b</span><span class="description">ignored</span></a>
            </div></body></html>"#;

            let sub_groups = extract_sub_groups(&page(html));

            assert_eq!(
                SubGroups(vec![
                    SubGroup::new("pkg-a", "/a", false),
                    SubGroup::new("pkg-b", "/b", false),
                ]),
                sub_groups
            );
        }

        #[test]
        fn no_menu_yields_no_sub_groups() {
            assert!(extract_sub_groups(&page("<html></html>")).is_empty());
        }
    }

    mod counts {
        use super::*;

        #[test]
        fn extracts_repository_and_package_counts() {
            let page = page(&listing_html(&[], None, &[]));

            assert_eq!(
                Counts {
                    repositories: 1234,
                    packages: 56
                },
                extract_counts(&page).unwrap()
            );
        }

        #[test]
        fn missing_package_label_leaves_zero() {
            let html = r#"<html><body><div class="table-list-header-toggle"><a href="/r">7 Repository</a></div></body></html>"#;

            assert_eq!(
                Counts {
                    repositories: 7,
                    packages: 0
                },
                extract_counts(&page(html)).unwrap()
            );
        }

        #[test]
        fn label_without_number_fails() {
            let html = r#"<html><body><div class="table-list-header-toggle"><a href="/r">Repositories</a><a href="/p">3 Packages</a></div></body></html>"#;

            let error = extract_counts(&page(html)).expect_err("Count should not be parsed");

            assert!(matches!(error, CrawlerError::CountParseError(label) if label == "Repositories"));
        }

        #[test]
        fn unrelated_labels_are_ignored() {
            let html = r#"<html><body><div class="table-list-header-toggle"><a href="/x">Sort</a><a href="/p">12 Packages</a></div></body></html>"#;

            assert_eq!(
                Counts {
                    repositories: 0,
                    packages: 12
                },
                extract_counts(&page(html)).unwrap()
            );
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let page = page(&listing_html(
            &["org-1/repo-1", "org-2/repo-2"],
            Some("/owner/name/network/dependents?dependents_after=Mg"),
            &[("pkg-a", "/a", true)],
        ));

        assert_eq!(extract_dependents(&page), extract_dependents(&page));
        assert_eq!(extract_next_page(&page), extract_next_page(&page));
        assert_eq!(extract_sub_groups(&page), extract_sub_groups(&page));
        assert_eq!(
            extract_counts(&page).unwrap(),
            extract_counts(&page).unwrap()
        );
    }
}
