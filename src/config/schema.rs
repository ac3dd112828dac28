//! Configuration schema types
//!
//! This module defines the configuration structure for fhirdesk. The root
//! [`DeskConfig`] maps to the TOML file; [`ClientConfig`] is the immutable
//! session configuration handed to [`crate::adapters::fhir::Session`].

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Well-known public and local FHIR servers, addressable by short name
pub const KNOWN_SERVERS: &[(&str, &str)] = &[
    ("local", "http://localhost:8081/fhir"),
    ("hapi", "http://hapi.fhir.org/baseR4/"),
    ("firely", "http://vonk.fire.ly"),
];

/// Looks up a server preset by name (case-insensitive)
pub fn known_server(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    KNOWN_SERVERS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, url)| *url)
}

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Wire format used for request and response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `application/fhir+json`
    #[default]
    Json,
}

impl WireFormat {
    /// MIME type sent in `Accept` and `Content-Type`
    pub fn mime_type(&self) -> &'static str {
        match self {
            WireFormat::Json => "application/fhir+json",
        }
    }
}

/// What the server should return from create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReturnPreference {
    /// Full resource body (`Prefer: return=representation`)
    #[default]
    #[serde(alias = "full")]
    Representation,
    /// Headers only (`Prefer: return=minimal`)
    Minimal,
}

impl ReturnPreference {
    /// Value of the `Prefer` header
    pub fn prefer_header(&self) -> &'static str {
        match self {
            ReturnPreference::Representation => "return=representation",
            ReturnPreference::Minimal => "return=minimal",
        }
    }
}

/// Authentication scheme for the FHIR server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Anonymous access
    #[default]
    None,
    /// HTTP Basic with username and password
    Basic,
    /// Static bearer token
    Bearer,
}

/// Main fhirdesk configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeskConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// FHIR server session settings
    pub server: ClientConfig,

    /// Patient search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeskConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate(&self.environment)?;
        self.search.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// FHIR server session configuration
///
/// Immutable once handed to a `Session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the FHIR server (or a preset name: local, hapi, firely)
    pub base_url: String,

    /// Preferred wire format
    #[serde(default)]
    pub preferred_format: WireFormat,

    /// Return preference for create and update
    #[serde(default)]
    pub return_preference: ReturnPreference,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Authentication type
    #[serde(default)]
    pub auth_type: AuthType,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Token for bearer authentication
    #[serde(default)]
    pub token: Option<SecretString>,

    /// TLS certificate verification enabled
    ///
    /// Must stay `true` in production environments (enforced by validation).
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Reject unparsable birth dates instead of leaving them unset
    #[serde(default = "default_true")]
    pub strict_dates: bool,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL or preset name with defaults
    ///
    /// # Example
    ///
    /// ```
    /// use fhirdesk::config::ClientConfig;
    ///
    /// let config = ClientConfig::for_server("hapi");
    /// assert_eq!(config.base_url, "http://hapi.fhir.org/baseR4/");
    ///
    /// let config = ClientConfig::for_server("https://fhir.example.org/r4");
    /// assert_eq!(config.base_url, "https://fhir.example.org/r4");
    /// ```
    pub fn for_server(server: &str) -> Self {
        Self {
            base_url: known_server(server).unwrap_or(server).to_string(),
            ..Default::default()
        }
    }

    /// Resolves a preset name in `base_url` to its URL
    pub fn resolved_base_url(&self) -> &str {
        known_server(&self.base_url).unwrap_or(&self.base_url)
    }

    pub(crate) fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let base_url = self.resolved_base_url();
        if base_url.is_empty() {
            return Err("server.base_url cannot be empty".to_string());
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err("server.base_url must start with http:// or https://".to_string());
        }

        url::Url::parse(base_url)
            .map_err(|e| format!("server.base_url '{base_url}' is not a valid URL: {e}"))?;

        if self.timeout_seconds == 0 || self.timeout_seconds > 600 {
            return Err(format!(
                "server.timeout_seconds must be between 1 and 600, got {}",
                self.timeout_seconds
            ));
        }

        if self.connect_timeout_seconds == 0 {
            return Err("server.connect_timeout_seconds must be > 0".to_string());
        }

        match self.auth_type {
            AuthType::None => {}
            AuthType::Basic => {
                if self.username.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Err(
                        "server.username cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
                if self
                    .password
                    .as_ref()
                    .map(|s| s.expose_secret().is_empty())
                    .unwrap_or(true)
                {
                    return Err(
                        "server.password cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
            }
            AuthType::Bearer => {
                if self
                    .token
                    .as_ref()
                    .map(|s| s.expose_secret().is_empty())
                    .unwrap_or(true)
                {
                    return Err(
                        "server.token cannot be empty when auth_type is 'bearer'".to_string()
                    );
                }
            }
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments. \
                Set 'tls_verify = true', or use environment = \"development\" for local testing."
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/fhir".to_string(),
            preferred_format: WireFormat::default(),
            return_preference: ReturnPreference::default(),
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            auth_type: AuthType::default(),
            username: None,
            password: None,
            token: None,
            tls_verify: true,
            strict_dates: true,
        }
    }
}

/// Patient search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of patients returned by a search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Requested page size (`_count`); server default when unset
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl SearchConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > 1000 {
                return Err(format!(
                    "search.page_size must be between 1 and 1000, got {page_size}"
                ));
            }
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            page_size: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging (JSON lines)
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    20
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.max_results, 20);
        assert_eq!(config.server.base_url, "http://localhost:8081/fhir");
    }

    #[test]
    fn test_known_server_presets() {
        assert_eq!(known_server("LOCAL"), Some("http://localhost:8081/fhir"));
        assert_eq!(known_server("firely"), Some("http://vonk.fire.ly"));
        assert_eq!(known_server("nowhere"), None);

        let config = ClientConfig {
            base_url: "hapi".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_base_url(), "http://hapi.fhir.org/baseR4/");
        assert!(config.validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig {
            base_url: "ftp://example.org".to_string(),
            ..Default::default()
        };
        let err = config.validate(&Environment::Development).unwrap_err();
        assert!(err.contains("http:// or https://"));
    }

    #[test]
    fn test_basic_auth_requires_password() {
        let mut config = ClientConfig {
            auth_type: AuthType::Basic,
            username: Some("clinician".to_string()),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_err());

        config.password = Some(secret_string("s3cret".to_string()));
        assert!(config.validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_bearer_auth_requires_token() {
        let config = ClientConfig {
            auth_type: AuthType::Bearer,
            ..Default::default()
        };
        let err = config.validate(&Environment::Development).unwrap_err();
        assert!(err.contains("server.token"));
    }

    #[test]
    fn test_tls_verify_enforced_in_production() {
        let config = ClientConfig {
            base_url: "https://fhir.example.org".to_string(),
            tls_verify: false,
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Production).is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let config = ClientConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let search = SearchConfig {
            max_results: 20,
            page_size: Some(0),
        };
        assert!(search.validate().is_err());
    }

    #[test]
    fn test_return_preference_full_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            pref: ReturnPreference,
        }
        let w: Wrapper = toml::from_str("pref = \"full\"").unwrap();
        assert_eq!(w.pref, ReturnPreference::Representation);
        assert_eq!(
            ReturnPreference::Minimal.prefer_header(),
            "return=minimal"
        );
    }

    #[test]
    fn test_invalid_rotation() {
        let logging = LoggingConfig {
            local_rotation: "weekly".to_string(),
            ..Default::default()
        };
        assert!(logging.validate().is_err());
    }
}
