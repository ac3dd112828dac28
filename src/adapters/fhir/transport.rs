//! Session and HTTP transport
//!
//! The [`Transport`] trait is the seam between the resource layer and the
//! network: it moves raw bytes and status codes and knows nothing about
//! resources. [`Session`] is the reqwest-backed implementation built from a
//! [`ClientConfig`]; it is stateless beyond that configuration.

use crate::config::{AuthType, ClientConfig};
use crate::domain::{FhirError, Result, TransportError};
use crate::log_fhir_exchange;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LOCATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// HTTP methods used by the FHIR RESTful API subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn is_write(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single request to the FHIR server
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    /// Overrides the session timeout for this request
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Creates a request without body
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            timeout: None,
        }
    }

    /// Attaches a request body
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw server answer: status, body bytes and the location of a written resource
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// `Location` (or `Content-Location`) header, if the server sent one
    pub location: Option<String>,
}

impl RawResponse {
    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true when the body is empty or whitespace only
    pub fn has_empty_body(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Body decoded as UTF-8, lossily
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Byte-level access to a FHIR server
///
/// Implementations attach content negotiation and authentication headers and
/// fail only for network-level problems; HTTP error statuses come back as a
/// normal [`RawResponse`] for the resource layer to classify.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URL all resource endpoints are resolved against
    fn base_url(&self) -> &Url;

    /// Sends a request and returns the raw response
    ///
    /// # Errors
    ///
    /// Returns `FhirError::Transport` for connection failures, timeouts and
    /// unreadable responses.
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse>;

    async fn get(&self, url: Url) -> Result<RawResponse> {
        self.execute(TransportRequest::new(HttpMethod::Get, url))
            .await
    }

    async fn post(&self, url: Url, body: Vec<u8>) -> Result<RawResponse> {
        self.execute(TransportRequest::new(HttpMethod::Post, url).with_body(body))
            .await
    }

    async fn put(&self, url: Url, body: Vec<u8>) -> Result<RawResponse> {
        self.execute(TransportRequest::new(HttpMethod::Put, url).with_body(body))
            .await
    }

    async fn delete(&self, url: Url) -> Result<RawResponse> {
        self.execute(TransportRequest::new(HttpMethod::Delete, url))
            .await
    }
}

/// Builds `{base}/{segment}/{segment}...`, percent-encoding each segment
///
/// # Example
///
/// ```
/// use fhirdesk::adapters::fhir::transport::endpoint;
/// use url::Url;
///
/// let base = Url::parse("http://hapi.fhir.org/baseR4/").unwrap();
/// let url = endpoint(&base, &["Patient", "123"]).unwrap();
/// assert_eq!(url.as_str(), "http://hapi.fhir.org/baseR4/Patient/123");
/// ```
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| {
            FhirError::Configuration(format!("Base URL '{base}' cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Resolves a continuation link: absolute links are used verbatim, relative
/// ones are joined to the base URL
pub fn resolve_link(base: &Url, link: &str) -> Result<Url> {
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Join relative to the base directory, not its last segment
            let mut base = base.clone();
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            base.join(link).map_err(|e| {
                FhirError::Transport(TransportError::InvalidResponse(format!(
                    "Invalid continuation link '{link}': {e}"
                )))
            })
        }
        Err(e) => Err(FhirError::Transport(TransportError::InvalidResponse(
            format!("Invalid continuation link '{link}': {e}"),
        ))),
    }
}

/// reqwest-backed FHIR session
///
/// # Example
///
/// ```no_run
/// use fhirdesk::adapters::fhir::{Session, Transport};
/// use fhirdesk::config::ClientConfig;
///
/// # fn example() -> fhirdesk::domain::Result<()> {
/// let session = Session::new(ClientConfig::for_server("local"))?;
/// assert_eq!(session.base_url().as_str(), "http://localhost:8081/fhir");
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: ClientConfig,
    base_url: Url,
    client: Client,
}

impl Session {
    /// Creates a session from configuration
    ///
    /// # Errors
    ///
    /// Returns `FhirError::Configuration` if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.resolved_base_url()).map_err(|e| {
            FhirError::Configuration(format!(
                "Invalid FHIR base URL '{}': {e}",
                config.resolved_base_url()
            ))
        })?;

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds));

        if !config.tls_verify {
            tracing::warn!(
                base_url = %base_url,
                "TLS certificate verification disabled"
            );
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            FhirError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        tracing::debug!(
            base_url = %base_url,
            format = config.preferred_format.mime_type(),
            prefer = config.return_preference.prefer_header(),
            "FHIR session created"
        );

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// The configuration this session was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        match self.config.auth_type {
            AuthType::None => None,
            AuthType::Bearer => self
                .config
                .token
                .as_ref()
                .map(|token| format!("Bearer {}", token.expose_secret().as_ref())),
            AuthType::Basic => match (&self.config.username, &self.config.password) {
                (Some(username), Some(password)) => {
                    let credentials = format!("{username}:{}", password.expose_secret().as_ref());
                    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                    Some(format!("Basic {encoded}"))
                }
                _ => None,
            },
        }
    }
}

fn map_send_error(err: reqwest::Error, method: HttpMethod, url: &Url) -> FhirError {
    let detail = format!("{method} {url}: {err}");
    let transport = if err.is_timeout() {
        TransportError::Timeout(detail)
    } else if err.is_body() || err.is_decode() {
        TransportError::InvalidResponse(detail)
    } else {
        TransportError::ConnectionFailed(detail)
    };
    FhirError::Transport(transport)
}

#[async_trait]
impl Transport for Session {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn execute(&self, request: TransportRequest) -> Result<RawResponse> {
        let TransportRequest {
            method,
            url,
            body,
            timeout,
        } = request;
        let mime = self.config.preferred_format.mime_type();

        let mut builder = self
            .client
            .request(method.into(), url.clone())
            .header(ACCEPT, mime);

        if method.is_write() {
            builder = builder.header("Prefer", self.config.return_preference.prefer_header());
        }
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, format!("{mime}; charset=utf-8"))
                .body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(auth) = self.auth_header_value() {
            builder = builder.header(AUTHORIZATION, auth);
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(e, method, &url))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .or_else(|| response.headers().get(CONTENT_LOCATION))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, method, &url))?
            .to_vec();

        log_fhir_exchange!(method, url, status, started.elapsed());

        Ok(RawResponse {
            status,
            body,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let base = Url::parse("http://localhost:8081/fhir").unwrap();
        let url = endpoint(&base, &["Patient", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/fhir/Patient/abc");
    }

    #[test]
    fn test_endpoint_at_server_root() {
        let base = Url::parse("http://127.0.0.1:4000").unwrap();
        let url = endpoint(&base, &["Patient"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/Patient");
    }

    #[test]
    fn test_resolve_link_absolute_is_verbatim() {
        let base = Url::parse("http://localhost:8081/fhir").unwrap();
        let link = "http://other.example/fhir?_getpages=abc&_getpagesoffset=20";
        assert_eq!(resolve_link(&base, link).unwrap().as_str(), link);
    }

    #[test]
    fn test_resolve_link_relative() {
        let base = Url::parse("http://localhost:8081/fhir/").unwrap();
        let url = resolve_link(&base, "Patient?page=2").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/fhir/Patient?page=2");
    }

    #[test]
    fn test_resolve_link_relative_without_trailing_slash() {
        let base = Url::parse("http://localhost:8081/fhir").unwrap();
        let url = resolve_link(&base, "Patient?page=2").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/fhir/Patient?page=2");

        let url = resolve_link(&base, "/other/Patient?page=2").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/other/Patient?page=2");
    }

    #[test]
    fn test_session_rejects_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(FhirError::Configuration(_))
        ));
    }

    #[test]
    fn test_session_resolves_preset() {
        let session = Session::new(ClientConfig::for_server("firely")).unwrap();
        assert_eq!(session.base_url().host_str(), Some("vonk.fire.ly"));
    }

    #[test]
    fn test_basic_auth_header() {
        let config = ClientConfig {
            auth_type: AuthType::Basic,
            username: Some("user".to_string()),
            password: Some(secret_string("pass".to_string())),
            ..Default::default()
        };
        let session = Session::new(config).unwrap();
        assert_eq!(
            session.auth_header_value().as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[test]
    fn test_bearer_auth_header() {
        let config = ClientConfig {
            auth_type: AuthType::Bearer,
            token: Some(secret_string("tok".to_string())),
            ..Default::default()
        };
        let session = Session::new(config).unwrap();
        assert_eq!(session.auth_header_value().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_no_auth_header_by_default() {
        let session = Session::new(ClientConfig::default()).unwrap();
        assert!(session.auth_header_value().is_none());
    }

    #[test]
    fn test_raw_response_helpers() {
        let response = RawResponse {
            status: 201,
            body: b"  \n".to_vec(),
            location: None,
        };
        assert!(response.is_success());
        assert!(response.has_empty_body());
    }
}
