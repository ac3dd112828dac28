//! Search criteria and the lazy search bundle paginator
//!
//! [`ResourceClient::search`] returns a stream that fetches pages on demand,
//! applies an optional [`SearchFilter`] to each candidate in server order and
//! stops after `max_results` accepted resources, as soon as the server reports
//! zero matches, or when there is no next link. Nothing is fetched until the
//! stream is polled, and a page beyond the one holding the last needed
//! resource is never requested.

use super::client::ResourceClient;
use super::codec::FhirResource;
use super::filter::SearchFilter;
use crate::domain::{ContinuationLink, FhirError, Result, SearchBundle};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Default cap on resources yielded by one search
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// One `name=value` search criterion
///
/// # Example
///
/// ```
/// use fhirdesk::adapters::fhir::SearchParam;
///
/// let param: SearchParam = "family=Garcia".parse().unwrap();
/// assert_eq!(param.name(), "family");
/// assert_eq!(param.value(), "Garcia");
///
/// let param: SearchParam = "birthdate=ge1990-01-01".parse().unwrap();
/// assert_eq!(param.value(), "ge1990-01-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParam {
    name: String,
    value: String,
}

impl SearchParam {
    /// Creates a criterion from its parts
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses `name=value`; the value may itself contain `=`
    ///
    /// # Errors
    ///
    /// Returns `FhirError::InvalidArgument` if there is no `=` or the name is empty
    pub fn parse(criterion: &str) -> Result<Self> {
        let (name, value) = criterion.split_once('=').ok_or_else(|| {
            FhirError::InvalidArgument(format!(
                "Search criterion '{criterion}' must have the form name=value"
            ))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FhirError::InvalidArgument(format!(
                "Search criterion '{criterion}' has an empty parameter name"
            )));
        }
        Ok(Self::new(name, value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for SearchParam {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Stream of search results
pub type SearchResults<R> = BoxStream<'static, Result<R>>;

/// A search to run: criteria, result cap, paging, filter and cancellation
///
/// # Example
///
/// ```
/// use fhirdesk::adapters::fhir::{filter_fn, SearchRequest};
/// use fhirdesk::domain::Patient;
///
/// let request = SearchRequest::<Patient>::from_criteria(["family=Garcia"])
///     .unwrap()
///     .max_results(5)
///     .page_size(50)
///     .filter(filter_fn(|p: &Patient| p.birth_date.is_some()));
/// assert_eq!(request.limit(), 5);
/// ```
pub struct SearchRequest<R> {
    criteria: Vec<SearchParam>,
    max_results: usize,
    page_size: Option<u32>,
    filter: Option<Arc<dyn SearchFilter<R>>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<R: FhirResource> Default for SearchRequest<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FhirResource> SearchRequest<R> {
    /// A search with no criteria and the default result cap
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
            page_size: None,
            filter: None,
            cancel: None,
        }
    }

    /// Parses each `name=value` criterion
    ///
    /// # Errors
    ///
    /// Returns `FhirError::InvalidArgument` for the first malformed criterion
    pub fn from_criteria<I, S>(criteria: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let criteria = criteria
            .into_iter()
            .map(|c| SearchParam::parse(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            criteria,
            ..Self::new()
        })
    }

    /// Adds a criterion
    pub fn param(mut self, param: SearchParam) -> Self {
        self.criteria.push(param);
        self
    }

    /// Caps the number of resources yielded; zero yields nothing without a request
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Requests pages of this size (`_count`)
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Only yields candidates the filter accepts
    pub fn filter(mut self, filter: impl SearchFilter<R> + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Stops the search with `FhirError::Cancelled` once the channel holds `true`
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The result cap
    pub fn limit(&self) -> usize {
        self.max_results
    }

    /// Query parameters of the first page request
    pub fn query(&self) -> Vec<SearchParam> {
        let mut params = self.criteria.clone();
        if let Some(page_size) = self.page_size {
            params.push(SearchParam::new("_count", page_size.to_string()));
        }
        params
    }
}

impl<R: FhirResource> ResourceClient<R> {
    /// Lazily iterates the matches of a search across pages
    ///
    /// Every call starts a fresh iteration. The stream ends after the first
    /// error. Resources are yielded in server order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fhirdesk::adapters::fhir::{ResourceClient, SearchRequest, Session};
    /// use fhirdesk::config::ClientConfig;
    /// use fhirdesk::domain::Patient;
    /// use futures::TryStreamExt;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> fhirdesk::domain::Result<()> {
    /// let session = Arc::new(Session::new(ClientConfig::for_server("hapi"))?);
    /// let patients = ResourceClient::<Patient>::from_session(session);
    ///
    /// let mut results = patients.search(SearchRequest::from_criteria(["family=Garcia"])?);
    /// while let Some(patient) = results.try_next().await? {
    ///     println!("{:?}", patient.primary_name());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn search(&self, request: SearchRequest<R>) -> SearchResults<R> {
        let paginator = Paginator::new(self.clone(), request);
        stream::try_unfold(paginator, |mut paginator| async move {
            Ok::<_, FhirError>(paginator.next_match().await?.map(|item| (item, paginator)))
        })
        .boxed()
    }

    /// Runs a search to completion and collects the results
    pub async fn search_all(&self, request: SearchRequest<R>) -> Result<Vec<R>> {
        self.search(request).try_collect().await
    }
}

enum Cursor {
    First(Vec<SearchParam>),
    Next(ContinuationLink),
    Done,
}

struct Paginator<R> {
    client: ResourceClient<R>,
    cursor: Cursor,
    buffer: VecDeque<R>,
    yielded: usize,
    max_results: usize,
    filter: Option<Arc<dyn SearchFilter<R>>>,
    cancel: Option<watch::Receiver<bool>>,
    seen_links: HashSet<String>,
    pages: usize,
}

impl<R: FhirResource> Paginator<R> {
    fn new(client: ResourceClient<R>, request: SearchRequest<R>) -> Self {
        let cursor = Cursor::First(request.query());
        Self {
            client,
            cursor,
            buffer: VecDeque::new(),
            yielded: 0,
            max_results: request.max_results,
            filter: request.filter,
            cancel: request.cancel,
            seen_links: HashSet::new(),
            pages: 0,
        }
    }

    async fn next_match(&mut self) -> Result<Option<R>> {
        loop {
            if self.yielded >= self.max_results {
                return Ok(None);
            }
            if self.cancel.as_ref().is_some_and(|c| *c.borrow()) {
                return Err(FhirError::Cancelled);
            }

            if let Some(candidate) = self.buffer.pop_front() {
                let accepted = match &self.filter {
                    Some(filter) => guarded(&mut self.cancel, filter.accept(&candidate)).await?,
                    None => true,
                };
                if accepted {
                    self.yielded += 1;
                    return Ok(Some(candidate));
                }
                continue;
            }

            let page = match std::mem::replace(&mut self.cursor, Cursor::Done) {
                Cursor::Done => return Ok(None),
                Cursor::First(params) => {
                    guarded(&mut self.cancel, self.client.search_page(&params)).await?
                }
                Cursor::Next(link) => {
                    guarded(&mut self.cancel, self.client.continue_search(&link)).await?
                }
            };
            self.absorb(page);
        }
    }

    fn absorb(&mut self, page: SearchBundle<R>) {
        self.pages += 1;

        if page.is_empty_result() {
            tracing::debug!(
                resource_type = R::RESOURCE_TYPE,
                "Server reported no matches"
            );
            return;
        }

        self.buffer.extend(page.entries);
        self.cursor = match page.next {
            Some(link) if self.seen_links.insert(link.as_str().to_string()) => Cursor::Next(link),
            Some(link) => {
                tracing::warn!(
                    link = link.as_str(),
                    pages = self.pages,
                    "Server repeated a continuation link, stopping pagination"
                );
                Cursor::Done
            }
            None => Cursor::Done,
        };
    }
}

async fn guarded<T, F>(cancel: &mut Option<watch::Receiver<bool>>, fetch: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(cancel) => cancellable(cancel, fetch).await,
        None => fetch.await,
    }
}

/// Runs `operation` until it completes or `cancel` turns `true`
///
/// An operation whose channel already holds `true` is never polled. A
/// dropped sender leaves the operation to run to completion.
pub async fn cancellable<T, F>(cancel: &mut watch::Receiver<bool>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if *cancel.borrow() {
        return Err(FhirError::Cancelled);
    }
    tokio::select! {
        result = operation => result,
        _ = cancelled(cancel) => Err(FhirError::Cancelled),
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() {
            // Sender gone: cancellation can no longer be requested
            std::future::pending::<()>().await;
        }
        if *cancel.borrow() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Patient;

    #[test]
    fn test_parse_param() {
        let param = SearchParam::parse("name=Smith").unwrap();
        assert_eq!(param.name(), "name");
        assert_eq!(param.value(), "Smith");
        assert_eq!(param.to_string(), "name=Smith");
    }

    #[test]
    fn test_parse_param_keeps_equals_in_value() {
        let param = SearchParam::parse("identifier=urn:x|a=b").unwrap();
        assert_eq!(param.value(), "urn:x|a=b");
    }

    #[test]
    fn test_parse_param_empty_value_allowed() {
        let param = SearchParam::parse("name=").unwrap();
        assert_eq!(param.value(), "");
    }

    #[test]
    fn test_parse_param_rejects_missing_equals() {
        assert!(matches!(
            SearchParam::parse("Smith"),
            Err(FhirError::InvalidArgument(_))
        ));
        assert!(matches!(
            SearchParam::parse("=Smith"),
            Err(FhirError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_request_query_appends_page_size() {
        let request = SearchRequest::<Patient>::from_criteria(["family=Garcia"])
            .unwrap()
            .page_size(50);
        let query = request.query();
        assert_eq!(query.len(), 2);
        assert_eq!(query[1], SearchParam::new("_count", "50"));
    }

    #[test]
    fn test_request_defaults() {
        let request = SearchRequest::<Patient>::new();
        assert_eq!(request.limit(), DEFAULT_MAX_RESULTS);
        assert!(request.query().is_empty());
    }

    #[tokio::test]
    async fn test_guarded_reports_cancellation_before_fetch() {
        let (tx, rx) = watch::channel(true);
        let mut cancel = Some(rx);
        let result: Result<()> = guarded(&mut cancel, async { Ok(()) }).await;
        assert!(matches!(result, Err(FhirError::Cancelled)));
        drop(tx);
    }

    #[tokio::test]
    async fn test_guarded_cancels_pending_fetch() {
        let (tx, rx) = watch::channel(false);
        let mut cancel = Some(rx);
        let pending = std::future::pending::<Result<()>>();
        let (result, _) = tokio::join!(guarded(&mut cancel, pending), async {
            tx.send(true).unwrap();
        });
        assert!(matches!(result, Err(FhirError::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_without_cancel_runs_fetch() {
        let result = guarded(&mut None, async { Ok(7) }).await.unwrap();
        assert_eq!(result, 7);
    }
}
