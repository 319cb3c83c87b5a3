//! Guard configuration.
//!
//! A [`GuardConfig`] is assembled once, before the guard loop starts, and is
//! never mutated afterwards. Whether a value came from the command line or
//! the environment is decided by the caller.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::conflict::ConflictMatcher;
use crate::errors::ConfigError;

/// Matches refs beginning with one or more digits followed by a hyphen.
pub const DEFAULT_REF_PATTERN: &str = r"^\d+-";
/// Matches statuses beginning with `running`.
pub const DEFAULT_STATUS_PATTERN: &str = "running";
/// One hour, the default CI job timeout.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;

/// How the credential is presented to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStyle {
    /// `PRIVATE-TOKEN: <credential>`
    #[default]
    PrivateToken,
    /// `Authorization: Bearer <credential>`
    Bearer,
}

impl fmt::Display for AuthStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateToken => write!(f, "private-token"),
            Self::Bearer => write!(f, "bearer"),
        }
    }
}

impl std::str::FromStr for AuthStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private-token" | "private_token" => Ok(Self::PrivateToken),
            "bearer" => Ok(Self::Bearer),
            other => Err(format!(
                "unknown auth style '{other}', expected 'private-token' or 'bearer'"
            )),
        }
    }
}

/// Validated, immutable guard configuration.
#[derive(Clone)]
pub struct GuardConfig {
    matcher: ConflictMatcher,
    project_api_url: String,
    credential: String,
    auth_style: AuthStyle,
    timeout: Duration,
    fail_fast: bool,
    quiet: bool,
}

impl GuardConfig {
    /// Starts building a configuration with defaults.
    #[must_use]
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::default()
    }

    /// Returns the compiled conflict predicate.
    #[must_use]
    pub fn matcher(&self) -> &ConflictMatcher {
        &self.matcher
    }

    /// Returns the project-scoped API URL (`{api_url}/projects/{project_id}`).
    #[must_use]
    pub fn project_api_url(&self) -> &str {
        &self.project_api_url
    }

    /// Returns the API credential.
    #[must_use]
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Returns how the credential is sent.
    #[must_use]
    pub fn auth_style(&self) -> AuthStyle {
        self.auth_style
    }

    /// Returns the wall-clock budget for the whole guard run.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if the guard should fail on the first conflict.
    #[must_use]
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Returns true if conflict summaries and progress markers are suppressed.
    #[must_use]
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

impl fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardConfig")
            .field("ref_pattern", &self.matcher.ref_pattern())
            .field("status_pattern", &self.matcher.status_pattern())
            .field("self_execution_id", &self.matcher.self_execution_id())
            .field("project_api_url", &self.project_api_url)
            .field("credential", &"<redacted>")
            .field("auth_style", &self.auth_style)
            .field("timeout", &self.timeout)
            .field("fail_fast", &self.fail_fast)
            .field("quiet", &self.quiet)
            .finish()
    }
}

/// Builder for [`GuardConfig`].
#[derive(Clone)]
pub struct GuardConfigBuilder {
    ref_pattern: String,
    status_pattern: String,
    api_url: Option<String>,
    project_id: Option<String>,
    self_execution_id: u64,
    credential: Option<String>,
    auth_style: AuthStyle,
    timeout: Duration,
    fail_fast: bool,
    quiet: bool,
}

impl Default for GuardConfigBuilder {
    fn default() -> Self {
        Self {
            ref_pattern: DEFAULT_REF_PATTERN.to_string(),
            status_pattern: DEFAULT_STATUS_PATTERN.to_string(),
            api_url: None,
            project_id: None,
            self_execution_id: 0,
            credential: None,
            auth_style: AuthStyle::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            fail_fast: false,
            quiet: false,
        }
    }
}

impl GuardConfigBuilder {
    /// Sets the ref pattern.
    #[must_use]
    pub fn with_ref_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ref_pattern = pattern.into();
        self
    }

    /// Sets the status pattern.
    #[must_use]
    pub fn with_status_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.status_pattern = pattern.into();
        self
    }

    /// Sets the API base URL (e.g. `https://gitlab.example.com/api/v4`).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the project identifier.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets the guarding execution's own id.
    #[must_use]
    pub fn with_self_execution_id(mut self, id: u64) -> Self {
        self.self_execution_id = id;
        self
    }

    /// Sets the API credential.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Sets how the credential is sent.
    #[must_use]
    pub fn with_auth_style(mut self, style: AuthStyle) -> Self {
        self.auth_style = style;
        self
    }

    /// Sets the timeout in whole seconds.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets fail-fast mode.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Sets quiet mode.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Validates the settings and compiles the conflict predicate.
    pub fn build(self) -> Result<GuardConfig, ConfigError> {
        let credential = self
            .credential
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let api_url = self
            .api_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;

        let project_id = self
            .project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingProjectId)?;

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        let project_api_url = project_api_url(&api_url, &project_id)?;
        let matcher =
            ConflictMatcher::new(&self.ref_pattern, &self.status_pattern, self.self_execution_id)?;

        Ok(GuardConfig {
            matcher,
            project_api_url,
            credential,
            auth_style: self.auth_style,
            timeout: self.timeout,
            fail_fast: self.fail_fast,
            quiet: self.quiet,
        })
    }
}

/// Joins the API base URL and project id into the project-scoped URL.
fn project_api_url(api_url: &str, project_id: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(api_url.trim()).map_err(|e| ConfigError::InvalidApiUrl {
        url: api_url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(format!(
        "{}/projects/{}",
        api_url.trim().trim_end_matches('/'),
        project_id.trim().trim_matches('/')
    ))
}
