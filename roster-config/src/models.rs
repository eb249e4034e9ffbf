use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use zeroize::Zeroizing;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PRIVILEGED_ROLE: &str = "ADMIN";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub navigation: NavigationConfig,
    /// Role whose presence unlocks the console views.
    pub privileged_role: String,
    pub metadata: ConfigMetadata,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            navigation: NavigationConfig::default(),
            privileged_role: DEFAULT_PRIVILEGED_ROLE.to_string(),
            metadata: ConfigMetadata::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Normalised origin: always has a scheme, never a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Only for development servers with self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub credential: Option<Credential>,
}

/// Credential attached to every request.
///
/// Session issuance happens elsewhere; the console only replays what it is
/// given.
#[derive(Clone)]
pub enum Credential {
    Bearer(Zeroizing<String>),
    /// Raw `Cookie` header value, e.g. `JSESSIONID=...`.
    SessionCookie(Zeroizing<String>),
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential::Bearer(Zeroizing::new(token.into()))
    }

    pub fn session_cookie(cookie: impl Into<String>) -> Self {
        Credential::SessionCookie(Zeroizing::new(cookie.into()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Credential::Bearer(***)"),
            Credential::SessionCookie(_) => {
                f.write_str("Credential::SessionCookie(***)")
            }
        }
    }
}

/// Console paths used by the navigation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    pub console_path: String,
    pub profile_path: String,
    pub login_path: String,
    pub logout_path: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            console_path: "/admin".to_string(),
            profile_path: "/user".to_string(),
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
        }
    }
}
