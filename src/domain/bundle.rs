//! Search bundle domain model
//!
//! A `SearchBundle` is one page of search results. It is produced per search
//! call and discarded once consumed.

/// Opaque server-issued link to the next page of a search
///
/// The link is passed back to the server exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationLink(String);

impl ContinuationLink {
    pub(crate) fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    /// Returns the link as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBundle<R> {
    /// Total number of matches reported by the server, across all pages
    pub total: Option<u64>,

    /// Matched resources on this page, in server order
    pub entries: Vec<R>,

    /// Link to the next page, if any
    pub next: Option<ContinuationLink>,
}

impl<R> SearchBundle<R> {
    /// Returns true when the server reported zero matches
    pub fn is_empty_result(&self) -> bool {
        self.total == Some(0)
    }

    /// Returns true if a further page can be fetched
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
