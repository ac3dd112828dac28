//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AuthType, DeskConfig, ReturnPreference};
use super::secret::secret_string;
use crate::domain::errors::FhirError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DeskConfig
/// 4. Applies environment variable overrides (FHIRDESK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `FhirError::Configuration` if the file cannot be read, a referenced
/// environment variable is missing, TOML parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use fhirdesk::config::loader::load_config;
///
/// let config = load_config("fhirdesk.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DeskConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FhirError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FhirError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DeskConfig = toml::from_str(&contents)
        .map_err(|e| FhirError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| FhirError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Loads the configuration file if it exists, otherwise starts from defaults
///
/// Environment overrides and validation apply in both cases, so a user can run
/// against a server with nothing but `FHIRDESK_SERVER_BASE_URL` set.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<DeskConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using defaults"
    );

    let mut config = DeskConfig::default();
    apply_env_overrides(&mut config);
    config
        .validate()
        .map_err(|e| FhirError::Configuration(format!("Configuration validation failed: {e}")))?;
    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment variable pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(FhirError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using FHIRDESK_* prefix
///
/// Environment variables follow the pattern: FHIRDESK_<SECTION>_<KEY>,
/// for example FHIRDESK_SERVER_BASE_URL or FHIRDESK_SEARCH_MAX_RESULTS.
/// Unparsable values are ignored with a warning.
fn apply_env_overrides(config: &mut DeskConfig) {
    if let Ok(val) = std::env::var("FHIRDESK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Server overrides
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_BASE_URL") {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_RETURN_PREFERENCE") {
        match val.to_lowercase().as_str() {
            "representation" | "full" => {
                config.server.return_preference = ReturnPreference::Representation
            }
            "minimal" => config.server.return_preference = ReturnPreference::Minimal,
            other => tracing::warn!(value = %other, "Ignoring invalid FHIRDESK_SERVER_RETURN_PREFERENCE"),
        }
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_TIMEOUT_SECONDS") {
        match val.parse() {
            Ok(secs) => config.server.timeout_seconds = secs,
            Err(_) => tracing::warn!(value = %val, "Ignoring invalid FHIRDESK_SERVER_TIMEOUT_SECONDS"),
        }
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_AUTH_TYPE") {
        match val.to_lowercase().as_str() {
            "none" => config.server.auth_type = AuthType::None,
            "basic" => config.server.auth_type = AuthType::Basic,
            "bearer" => config.server.auth_type = AuthType::Bearer,
            other => tracing::warn!(value = %other, "Ignoring invalid FHIRDESK_SERVER_AUTH_TYPE"),
        }
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_USERNAME") {
        config.server.username = Some(val);
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_PASSWORD") {
        config.server.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_TOKEN") {
        config.server.token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_TLS_VERIFY") {
        config.server.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("FHIRDESK_SERVER_STRICT_DATES") {
        config.server.strict_dates = val.parse().unwrap_or(true);
    }

    // Search overrides
    if let Ok(val) = std::env::var("FHIRDESK_SEARCH_MAX_RESULTS") {
        match val.parse() {
            Ok(max) => config.search.max_results = max,
            Err(_) => tracing::warn!(value = %val, "Ignoring invalid FHIRDESK_SEARCH_MAX_RESULTS"),
        }
    }
    if let Ok(val) = std::env::var("FHIRDESK_SEARCH_PAGE_SIZE") {
        match val.parse() {
            Ok(size) => config.search.page_size = Some(size),
            Err(_) => tracing::warn!(value = %val, "Ignoring invalid FHIRDESK_SEARCH_PAGE_SIZE"),
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("FHIRDESK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("FHIRDESK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
