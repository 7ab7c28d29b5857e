//! XNAT container service API client.
//!
//! This crate provides a typed client for the `/xapi` endpoints the
//! container service exposes, plus the handful of legacy `/data` endpoints
//! the admin tools read. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults (timeout, cookies)
//! - Discovering credentials from `XNAT_USER`/`XNAT_PASS` or `~/.netrc`
//! - Validating the configured XNAT host
//! - Turning every non-success response into [`ApiError::Http`] carrying
//!   the status code, status text and raw body
//! - Previewing write requests without sending them (dry run)
//!
//! The primary entry point is [`XnatClient`]. Build one from
//! [`ClientSettings`] and call the endpoint methods grouped by area in the
//! submodules.
//!
//! # Example
//!
//! ```ignore
//! use xcs_api::{ClientSettings, XnatClient};
//! use xcs_types::Scope;
//!
//! async fn show() -> Result<(), xcs_api::ApiError> {
//!     let settings = ClientSettings::new("https://xnat.example.org").with_credentials("admin", Some("admin".into()));
//!     let client = XnatClient::new(settings)?;
//!     for command in client.list_commands(None).await? {
//!         println!("{} {}", command.id, command.name);
//!     }
//!     let enabled = client.get_enabled(&Scope::Site, 4, "dcm2niix-scan").await?;
//!     println!("enabled: {enabled}");
//!     Ok(())
//! }
//! ```

use std::time::Duration;
use std::{env, fs};

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use xcs_util::http::{JsonParseError, parse_response_json_strict};

mod automation;
mod commands;
mod containers;
mod docker;
mod launch;
mod projects;

/// Environment variable holding the XNAT base URL.
pub const HOST_ENV: &str = "XNAT_HOST";
/// Environment variable holding the XNAT user name.
pub const USER_ENV: &str = "XNAT_USER";
/// Environment variable holding the XNAT password.
pub const PASSWORD_ENV: &str = "XNAT_PASS";
/// Set to `1` to permit plain-http hosts other than localhost.
pub const ALLOW_HTTP_ENV: &str = "XCS_ALLOW_HTTP";

/// Hostnames allowed to use plain http without opting in.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'/').add(b'?').add(b'<').add(b'>');

/// Errors surfaced by [`XnatClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("Error {status}: {status_text}")]
    Http { status: u16, status_text: String, body: String },
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] JsonParseError),
    #[error("invalid XNAT host '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{0}")]
    Configuration(String),
    /// Dry-run mode stopped a write request before it was sent.
    #[error("dry run: {} {}", .0.method, .0.url)]
    DryRun(Box<RequestPreview>),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A request as it would go over the wire, with secrets redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPreview {
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<Value>,
}

impl RequestPreview {
    fn from_request(request: &Request) -> Self {
        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let line = format!("{}: {}", name.as_str(), value.to_str().unwrap_or(""));
                let redacted = xcs_util::redact_sensitive(&line);
                let value = redacted.split_once(':').map(|(_, value)| value.trim()).unwrap_or("");
                (name.as_str().to_string(), value.to_string())
            })
            .collect();
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .and_then(|bytes| serde_json::from_slice(bytes).ok());
        Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers,
            body,
        }
    }
}

/// Everything needed to construct an [`XnatClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    /// Build write requests but return them as [`ApiError::DryRun`].
    pub dry_run: bool,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(xcs_util::config::DEFAULT_TIMEOUT_SECS),
            dry_run: false,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve settings from explicit overrides, the environment, the config
    /// file and `~/.netrc`, in that order of precedence.
    ///
    /// The password is only ever read from `XNAT_PASS` or `~/.netrc`.
    pub fn resolve(
        config: &xcs_util::XcsConfig,
        host_override: Option<&str>,
        user_override: Option<&str>,
    ) -> ApiResult<Self> {
        let base_url = first_non_empty([host_override.map(str::to_string), env::var(HOST_ENV).ok(), config.host.clone()])
            .ok_or_else(|| {
                ApiError::Configuration(format!(
                    "no XNAT host configured; pass --host, set {HOST_ENV}, or run `xcs config set-host <url>`"
                ))
            })?;
        validate_base_url(&base_url)?;

        let host_name = Url::parse(&base_url).ok().and_then(|url| url.host_str().map(str::to_string));
        let netrc = host_name.as_deref().and_then(get_netrc_credentials);

        let username = first_non_empty([
            user_override.map(str::to_string),
            env::var(USER_ENV).ok(),
            config.username.clone(),
            netrc.as_ref().map(|(login, _)| login.clone()),
        ]);
        let password = env::var(PASSWORD_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| {
                netrc
                    .filter(|(login, _)| username.as_deref().is_none_or(|user| user == login.as_str()))
                    .map(|(_, password)| password)
            });

        Ok(Self {
            base_url,
            username,
            password,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            dry_run: false,
        })
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for XNAT access.
///
/// Requests are resolved against a validated base URL and carry HTTP basic
/// credentials when configured. The session cookie XNAT returns is kept for
/// the lifetime of the client.
pub struct XnatClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
    credentials: Option<(String, Option<String>)>,
    dry_run: bool,
}

impl XnatClient {
    pub fn new(settings: ClientSettings) -> ApiResult<Self> {
        validate_base_url(&settings.base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .cookie_store(true)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("xcs/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            credentials: settings.username.map(|user| (user, settings.password)),
            dry_run: settings.dry_run,
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and server-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "building request");

        let builder = self.http.request(method, url).header(header::USER_AGENT, &self.user_agent);
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_deref()),
            None => builder,
        }
    }

    /// Send a request and return its status and body text. In dry-run mode
    /// anything but a GET is returned as a preview instead.
    async fn dispatch(&self, builder: RequestBuilder) -> ApiResult<(StatusCode, String)> {
        let request = builder.build()?;
        if self.dry_run && request.method() != Method::GET {
            return Err(ApiError::DryRun(Box::new(RequestPreview::from_request(&request))));
        }
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Send a request and return the body text of a successful response.
    pub async fn send_text(&self, builder: RequestBuilder) -> ApiResult<String> {
        let (status, body) = self.dispatch(builder).await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "request failed");
            return Err(http_error(status, body));
        }
        Ok(body)
    }

    /// Send a request and decode the JSON body of a successful response.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let (status, body) = self.dispatch(builder).await?;
        if !status.is_success() {
            return Err(http_error(status, body));
        }
        Ok(parse_response_json_strict(&body, Some(status))?)
    }

    /// Send a request whose successful response body is ignored.
    pub async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.send_text(builder).await.map(|_| ())
    }
}

fn http_error(status: StatusCode, body: String) -> ApiError {
    ApiError::Http {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        body,
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// `/xapi` prefix for a scope: `/xapi` for site, `/xapi/projects/{id}` for a project.
pub(crate) fn scoped_prefix(scope: &xcs_types::Scope) -> String {
    match scope.project_id() {
        Some(project) => format!("/xapi/projects/{}", segment(project)),
        None => "/xapi".to_string(),
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - must parse and include a host
/// - scheme must be http or https
/// - plain http is allowed for localhost, or anywhere when `XCS_ALLOW_HTTP=1`
fn validate_base_url(base: &str) -> ApiResult<()> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    let host_name = parsed.host_str().ok_or_else(|| invalid("URL must include a host".into()))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_local = LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed));
            let allow_http = env::var(ALLOW_HTTP_ENV).is_ok_and(|value| value == "1");
            if is_local || allow_http {
                Ok(())
            } else {
                Err(invalid(format!(
                    "plain http is only allowed for localhost; use https or set {ALLOW_HTTP_ENV}=1"
                )))
            }
        }
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Attempt to read credentials for `host` from the user's `~/.netrc` file.
fn get_netrc_credentials(host: &str) -> Option<(String, String)> {
    let home = dirs_next::home_dir()?;
    let content = fs::read_to_string(home.join(".netrc")).ok()?;
    parse_netrc(&content, host)
}

/// Small `.netrc` reader: finds the `machine <host>` stanza (or `default`)
/// and returns its `login` and `password`.
///
/// ```text
/// machine xnat.example.org
///   login admin
///   password s3cret
/// ```
fn parse_netrc(content: &str, host: &str) -> Option<(String, String)> {
    let mut tokens = content.split_whitespace();
    let mut in_stanza = false;
    let mut fallback: Option<(String, String)> = None;
    let mut login: Option<String> = None;
    let mut password: Option<String> = None;
    let mut default_stanza = false;

    let mut finish = |login: &mut Option<String>, password: &mut Option<String>, default_stanza: bool| {
        if let (Some(user), Some(pass)) = (login.take(), password.take()) {
            if default_stanza {
                fallback.get_or_insert((user, pass));
                return None;
            }
            return Some((user, pass));
        }
        None
    };

    while let Some(token) = tokens.next() {
        match token {
            "machine" | "default" => {
                if in_stanza && let Some(found) = finish(&mut login, &mut password, default_stanza) {
                    return Some(found);
                }
                login = None;
                password = None;
                default_stanza = token == "default";
                in_stanza = default_stanza || tokens.next().is_some_and(|machine| machine.eq_ignore_ascii_case(host));
            }
            "login" if in_stanza => login = tokens.next().map(str::to_string),
            "password" if in_stanza => password = tokens.next().map(str::to_string),
            _ => {}
        }
    }
    if in_stanza && let Some(found) = finish(&mut login, &mut password, default_stanza) {
        return Some(found);
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netrc_matches_machine_stanza() {
        let content = "machine other.org login x password y\nmachine xnat.example.org\n  login admin\n  password s3cret\n";
        assert_eq!(
            parse_netrc(content, "xnat.example.org"),
            Some(("admin".to_string(), "s3cret".to_string()))
        );
    }

    #[test]
    fn netrc_falls_back_to_default_stanza() {
        let content = "default login guest password guest\nmachine other.org login x password y\n";
        assert_eq!(
            parse_netrc(content, "xnat.example.org"),
            Some(("guest".to_string(), "guest".to_string()))
        );
        assert_eq!(parse_netrc("machine other.org login x password y", "xnat.example.org"), None);
    }

    #[test]
    fn base_url_rules() {
        temp_env::with_var(ALLOW_HTTP_ENV, None::<&str>, || {
            assert!(validate_base_url("https://xnat.example.org").is_ok());
            assert!(validate_base_url("http://localhost:8080").is_ok());
            assert!(validate_base_url("http://xnat.example.org").is_err());
            assert!(validate_base_url("ftp://xnat.example.org").is_err());
            assert!(validate_base_url("not a url").is_err());
        });
        temp_env::with_var(ALLOW_HTTP_ENV, Some("1"), || {
            assert!(validate_base_url("http://xnat.internal").is_ok());
        });
    }

    #[test]
    fn resolve_prefers_overrides_then_environment() {
        let config = xcs_util::XcsConfig {
            host: Some("https://from-config.example.org".into()),
            username: Some("config-user".into()),
            ..Default::default()
        };
        temp_env::with_vars(
            [(HOST_ENV, Some("https://from-env.example.org")), (USER_ENV, None), (PASSWORD_ENV, Some("pw"))],
            || {
                let settings = ClientSettings::resolve(&config, None, None).unwrap();
                assert_eq!(settings.base_url, "https://from-env.example.org");
                assert_eq!(settings.username.as_deref(), Some("config-user"));
                assert_eq!(settings.password.as_deref(), Some("pw"));

                let settings = ClientSettings::resolve(&config, Some("https://flag.example.org"), Some("flag-user")).unwrap();
                assert_eq!(settings.base_url, "https://flag.example.org");
                assert_eq!(settings.username.as_deref(), Some("flag-user"));
            },
        );
    }

    #[test]
    fn resolve_requires_a_host() {
        temp_env::with_var(HOST_ENV, None::<&str>, || {
            let error = ClientSettings::resolve(&xcs_util::XcsConfig::default(), None, None).unwrap_err();
            assert!(error.to_string().contains("no XNAT host configured"));
        });
    }

    #[test]
    fn segments_escape_slashes_and_spaces() {
        assert_eq!(segment("my wrapper/v2"), "my%20wrapper%2Fv2");
        assert_eq!(scoped_prefix(&xcs_types::Scope::project("CT 1")), "/xapi/projects/CT%201");
        assert_eq!(scoped_prefix(&xcs_types::Scope::Site), "/xapi");
    }
}
