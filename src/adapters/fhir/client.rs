//! Typed resource client: create, read, update, delete and search pages
//!
//! [`ResourceClient`] turns raw [`Transport`] exchanges into typed results and
//! classifies HTTP failures into the [`FhirError`] taxonomy.

use super::codec::{self, DateHandling, FhirResource};
use super::search::SearchParam;
use super::transport::{endpoint, resolve_link, RawResponse, Session, Transport};
use crate::domain::{ContinuationLink, FhirError, ResourceId, Result, SearchBundle, TransportError};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// CRUD and search operations for one resource type
///
/// Cloning is cheap; clones share the underlying transport.
///
/// # Example
///
/// ```no_run
/// use fhirdesk::adapters::fhir::{ResourceClient, Session};
/// use fhirdesk::config::ClientConfig;
/// use fhirdesk::domain::{HumanName, Patient};
/// use std::sync::Arc;
///
/// # async fn example() -> fhirdesk::domain::Result<()> {
/// let session = Arc::new(Session::new(ClientConfig::for_server("hapi"))?);
/// let patients = ResourceClient::<Patient>::from_session(session);
///
/// let draft = Patient::builder().name(HumanName::new("Garcia").with_given("Ana")).build();
/// let created = patients.create(&draft).await?;
/// let fetched = patients.read(created.id().unwrap().as_str()).await?;
/// assert_eq!(fetched.name, draft.name);
/// # Ok(())
/// # }
/// ```
pub struct ResourceClient<R> {
    transport: Arc<dyn Transport>,
    dates: DateHandling,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            dates: self.dates,
            _resource: PhantomData,
        }
    }
}

impl<R: FhirResource> ResourceClient<R> {
    /// Creates a client over any transport
    pub fn new(transport: Arc<dyn Transport>, dates: DateHandling) -> Self {
        Self {
            transport,
            dates,
            _resource: PhantomData,
        }
    }

    /// Creates a client over a session, taking date handling from its configuration
    pub fn from_session(session: Arc<Session>) -> Self {
        let dates = DateHandling::from_strict(session.config().strict_dates);
        Self::new(session, dates)
    }

    /// A client for another resource type sharing this client's transport
    pub fn sibling<S: FhirResource>(&self) -> ResourceClient<S> {
        ResourceClient::new(Arc::clone(&self.transport), self.dates)
    }

    /// Creates a resource and returns it as stored, with its server-assigned id
    ///
    /// Any id already on `resource` is not sent.
    ///
    /// # Errors
    ///
    /// - `FhirError::Validation` if the server rejects the resource
    /// - `FhirError::MalformedResource` if the response cannot be decoded
    /// - `FhirError::Transport` for network failures and 5xx responses
    pub async fn create(&self, resource: &R) -> Result<R> {
        let mut value = resource.to_value()?;
        if let Value::Object(map) = &mut value {
            if map.remove("id").is_some() {
                tracing::debug!(
                    resource_type = R::RESOURCE_TYPE,
                    "Dropping client-side id on create"
                );
            }
        }
        let body = serde_json::to_vec(&value)?;

        let url = endpoint(self.transport.base_url(), &[R::RESOURCE_TYPE])?;
        let response = self.transport.post(url, body).await?;
        let response = check_response(response, R::RESOURCE_TYPE)?;

        let location_id = response
            .location
            .as_deref()
            .and_then(|location| id_from_location(location, R::RESOURCE_TYPE));

        let created = if response.has_empty_body() {
            let id = location_id.clone().ok_or_else(|| {
                FhirError::Transport(TransportError::InvalidResponse(format!(
                    "{} create returned neither a body nor a Location header",
                    R::RESOURCE_TYPE
                )))
            })?;
            with_id(value, &id, self.dates)?
        } else {
            codec::decode::<R>(&response.body, self.dates)?
        };

        let created = match (created.resource_id(), location_id) {
            (Some(_), _) => created,
            (None, Some(id)) => with_id(created.to_value()?, &id, self.dates)?,
            (None, None) => {
                return Err(FhirError::MalformedResource(format!(
                    "Created {} has no id",
                    R::RESOURCE_TYPE
                )))
            }
        };

        tracing::info!(
            resource_type = R::RESOURCE_TYPE,
            id = ?created.resource_id().map(ResourceId::as_str),
            "Resource created"
        );
        Ok(created)
    }

    /// Reads a resource by id
    ///
    /// # Errors
    ///
    /// - `FhirError::InvalidArgument` if `id` is empty or not a valid FHIR id
    /// - `FhirError::NotFound` if the resource does not exist or was deleted
    pub async fn read(&self, id: &str) -> Result<R> {
        let id = parse_argument_id(id)?;
        let url = endpoint(self.transport.base_url(), &[R::RESOURCE_TYPE, id.as_str()])?;
        let response = self.transport.get(url).await?;
        let response = check_response(response, &format!("{}/{id}", R::RESOURCE_TYPE))?;

        tracing::debug!(resource_type = R::RESOURCE_TYPE, id = %id, "Resource read");
        codec::decode(&response.body, self.dates)
    }

    /// Replaces a stored resource with `resource`
    ///
    /// # Errors
    ///
    /// - `FhirError::InvalidArgument` if `resource` has no id
    /// - `FhirError::NotFound` if the server reports the resource missing
    /// - `FhirError::Validation` if the server rejects the new content
    /// - `FhirError::MalformedResource` if the server answers with another id
    pub async fn update(&self, resource: &R) -> Result<R> {
        let id = resource.resource_id().ok_or_else(|| {
            FhirError::InvalidArgument(format!(
                "Cannot update a {} without an id; create it first",
                R::RESOURCE_TYPE
            ))
        })?;
        let value = resource.to_value()?;
        let body = serde_json::to_vec(&value)?;

        let url = endpoint(self.transport.base_url(), &[R::RESOURCE_TYPE, id.as_str()])?;
        let response = self.transport.put(url, body).await?;
        let response = check_response(response, &format!("{}/{id}", R::RESOURCE_TYPE))?;

        let updated = if response.has_empty_body() {
            R::from_value(value, self.dates)?
        } else {
            codec::decode(&response.body, self.dates)?
        };
        if let Some(returned) = updated.resource_id().filter(|returned| *returned != id) {
            return Err(FhirError::MalformedResource(format!(
                "Update of {}/{id} returned a resource with id '{returned}'",
                R::RESOURCE_TYPE
            )));
        }

        tracing::info!(resource_type = R::RESOURCE_TYPE, id = %id, "Resource updated");
        Ok(updated)
    }

    /// Deletes a resource by id
    ///
    /// # Errors
    ///
    /// - `FhirError::InvalidArgument` if `id` is empty or invalid
    /// - `FhirError::NotFound` if the server reports the resource missing
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_argument_id(id)?;
        let url = endpoint(self.transport.base_url(), &[R::RESOURCE_TYPE, id.as_str()])?;
        let response = self.transport.delete(url).await?;
        check_response(response, &format!("{}/{id}", R::RESOURCE_TYPE))?;

        tracing::info!(resource_type = R::RESOURCE_TYPE, id = %id, "Resource deleted");
        Ok(())
    }

    /// Runs a search and returns its first page
    pub async fn search_page(&self, params: &[SearchParam]) -> Result<SearchBundle<R>> {
        let mut url = endpoint(self.transport.base_url(), &[R::RESOURCE_TYPE])?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for param in params {
                query.append_pair(param.name(), param.value());
            }
        }
        self.fetch_page(url).await
    }

    /// Fetches the page a continuation link points to
    pub async fn continue_search(&self, link: &ContinuationLink) -> Result<SearchBundle<R>> {
        let url = resolve_link(self.transport.base_url(), link.as_str())?;
        self.fetch_page(url).await
    }

    /// Number of matches for a search, fetching at most one resource
    ///
    /// Uses the server-reported total; servers that omit it are counted by the
    /// entries on the first page, so the result is then only a lower bound.
    pub async fn count(&self, params: &[SearchParam]) -> Result<u64> {
        let mut params = params.to_vec();
        params.push(SearchParam::new("_count", "1"));
        let page = self.search_page(&params).await?;
        Ok(page.total.unwrap_or(page.entries.len() as u64))
    }

    async fn fetch_page(&self, url: url::Url) -> Result<SearchBundle<R>> {
        let response = self.transport.get(url).await?;
        let response = check_response(response, R::RESOURCE_TYPE)?;
        let page = codec::decode_bundle(&response.body, self.dates)?;

        crate::log_page_fetched!(R::RESOURCE_TYPE, page.entries.len(), page.total, page.has_next());
        Ok(page)
    }
}

/// Summary of a server's CapabilityStatement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub fhir_version: Option<String>,
    pub software: Option<String>,
    /// Resource types the server exposes over REST
    pub resource_types: Vec<String>,
}

impl ServerCapabilities {
    /// Returns true if the server lists `resource_type` among its REST resources
    pub fn supports(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|t| t == resource_type)
    }
}

/// Fetches `{base}/metadata` and summarizes the CapabilityStatement
///
/// # Errors
///
/// Returns `FhirError::MalformedResource` if the body is not a
/// CapabilityStatement, or the usual transport and status errors.
pub async fn server_capabilities(transport: &dyn Transport) -> Result<ServerCapabilities> {
    let url = endpoint(transport.base_url(), &["metadata"])?;
    let response = check_response(transport.get(url).await?, "metadata")?;

    let value: Value = serde_json::from_slice(&response.body)?;
    if value.get("resourceType").and_then(Value::as_str) != Some("CapabilityStatement") {
        return Err(FhirError::MalformedResource(
            "metadata did not return a CapabilityStatement".to_string(),
        ));
    }

    let text = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let resource_types = value
        .pointer("/rest/0/resource")
        .and_then(Value::as_array)
        .map(|resources| {
            resources
                .iter()
                .filter_map(|r| r.get("type").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ServerCapabilities {
        fhir_version: text("/fhirVersion"),
        software: text("/software/name"),
        resource_types,
    })
}

/// Maps a non-2xx response to the error taxonomy
///
/// `subject` names what was addressed, e.g. `Patient/123`.
pub(crate) fn check_response(response: RawResponse, subject: &str) -> Result<RawResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let message = codec::outcome_summary(&response.body).unwrap_or_else(|| {
        let text = response.body_text();
        let text = text.trim();
        if text.is_empty() {
            format!("HTTP {status}")
        } else {
            text.chars().take(MAX_ERROR_BODY_CHARS).collect()
        }
    });

    tracing::debug!(status, subject, message = %message, "FHIR server returned an error");

    Err(match status {
        404 | 410 => FhirError::NotFound(format!("{subject}: {message}")),
        401 | 403 => FhirError::Authentication(format!("HTTP {status}: {message}")),
        400..=499 => FhirError::Validation { status, message },
        500..=599 => FhirError::Transport(TransportError::ServerError { status, message }),
        _ => FhirError::Transport(TransportError::InvalidResponse(format!(
            "Unexpected HTTP status {status} for {subject}"
        ))),
    })
}

/// Extracts the resource id from a `Location` header such as
/// `http://host/fhir/Patient/123/_history/1`
fn id_from_location(location: &str, resource_type: &str) -> Option<ResourceId> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    let mut segments = path.split('/');
    segments.find(|segment| *segment == resource_type)?;
    segments.next().and_then(|id| ResourceId::new(id).ok())
}

fn parse_argument_id(id: &str) -> Result<ResourceId> {
    if id.trim().is_empty() {
        return Err(FhirError::InvalidArgument(
            "Resource id cannot be empty".to_string(),
        ));
    }
    ResourceId::new(id).map_err(FhirError::InvalidArgument)
}

fn with_id<R: FhirResource>(mut value: Value, id: &ResourceId, dates: DateHandling) -> Result<R> {
    if let Value::Object(map) = &mut value {
        map.insert("id".to_string(), Value::String(id.as_str().to_string()));
    }
    R::from_value(value, dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportErrorKind;
    use test_case::test_case;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.as_bytes().to_vec(),
            location: None,
        }
    }

    #[test_case(404 ; "not found")]
    #[test_case(410 ; "gone")]
    fn test_missing_statuses_map_to_not_found(status: u16) {
        let err = check_response(response(status, ""), "Patient/1").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Patient/1"));
    }

    #[test_case(400)]
    #[test_case(409)]
    #[test_case(412)]
    #[test_case(422)]
    fn test_client_errors_map_to_validation(status: u16) {
        let err = check_response(response(status, "bad"), "Patient").unwrap_err();
        assert!(matches!(err, FhirError::Validation { status: s, .. } if s == status));
    }

    #[test]
    fn test_auth_statuses() {
        let err = check_response(response(401, ""), "Patient").unwrap_err();
        assert!(matches!(err, FhirError::Authentication(_)));
    }

    #[test]
    fn test_server_error_is_transport() {
        let err = check_response(response(503, "down"), "Patient").unwrap_err();
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Server));
    }

    #[test]
    fn test_outcome_diagnostics_in_message() {
        let body = r#"{"resourceType":"OperationOutcome","issue":[{"severity":"error","code":"invalid","diagnostics":"birthDate is invalid"}]}"#;
        match check_response(response(422, body), "Patient").unwrap_err() {
            FhirError::Validation { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "birthDate is invalid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_passes_through() {
        let ok = check_response(response(201, "{}"), "Patient").unwrap();
        assert_eq!(ok.status, 201);
    }

    #[test_case("http://h/fhir/Patient/123/_history/1", Some("123"))]
    #[test_case("Patient/abc", Some("abc"))]
    #[test_case("http://h/fhir/Patient/xyz?x=1", Some("xyz"))]
    #[test_case("http://h/fhir/Encounter/1", None)]
    fn test_id_from_location(location: &str, expected: Option<&str>) {
        assert_eq!(
            id_from_location(location, "Patient").as_ref().map(ResourceId::as_str),
            expected
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("a/b" ; "slash")]
    fn test_invalid_argument_ids(id: &str) {
        assert!(matches!(
            parse_argument_id(id),
            Err(FhirError::InvalidArgument(_))
        ));
    }
}
