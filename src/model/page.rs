use scraper::Html;

use super::{CrawlerError, CrawlerResult};

/// A listing document as received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// The URL the document was fetched from.
    url: String,

    /// The decoded document.
    body: String,
}

impl RawPage {
    /// Creates a new `RawPage` from the raw response bytes.
    pub fn try_new(url: &str, bytes: &[u8]) -> CrawlerResult<Self> {
        let body = String::from_utf8(bytes.to_vec()).map_err(|e| {
            CrawlerError::MalformedDocument {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        if body.trim().is_empty() {
            return Err(CrawlerError::MalformedDocument {
                url: url.to_string(),
                reason: "empty document".to_string(),
            });
        }

        Ok(Self {
            url: url.to_string(),
            body,
        })
    }

    /// Retrieves the URL the document was fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieves the decoded document.
    #[cfg(test)]
    pub(crate) fn body(&self) -> &str {
        &self.body
    }

    /// Parses the document.
    ///
    /// The parsed tree is not `Send`: keep it out of await points and drop it
    /// once extraction is done.
    pub fn parse(&self) -> Page {
        Page::from_html(&self.body)
    }

    /// Creates a dummy `RawPage` holding the given markup for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy(url: &str, html: &str) -> Self {
        Self::try_new(url, html.as_bytes()).unwrap()
    }
}

/// A parsed listing document.
pub struct Page {
    document: Html,
}

impl Page {
    /// Parses a document.
    pub fn from_html(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub(crate) fn document(&self) -> &Html {
        &self.document
    }
}
