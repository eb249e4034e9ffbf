use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::parse_bool;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub navigation: FileNavigationConfig,
    pub privileged_role: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Humantime duration, e.g. `"30s"` or `"2m"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileNavigationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_path: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub request_timeout: Option<String>,
    pub accept_invalid_certs: Option<bool>,
    pub auth_token: Option<String>,
    pub session_cookie: Option<String>,
    pub privileged_role: Option<String>,
    pub console_path: Option<String>,
    pub profile_path: Option<String>,
    pub login_path: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: non_empty_var("ROSTER_CONFIG").map(PathBuf::from),
            server_url: non_empty_var("ROSTER_SERVER_URL"),
            request_timeout: non_empty_var("ROSTER_REQUEST_TIMEOUT"),
            accept_invalid_certs: std::env::var("ROSTER_ACCEPT_INVALID_CERTS")
                .ok()
                .and_then(|raw| parse_bool(&raw)),
            auth_token: non_empty_var("ROSTER_AUTH_TOKEN"),
            session_cookie: non_empty_var("ROSTER_SESSION_COOKIE"),
            privileged_role: non_empty_var("ROSTER_PRIVILEGED_ROLE"),
            console_path: non_empty_var("ROSTER_CONSOLE_PATH"),
            profile_path: non_empty_var("ROSTER_PROFILE_PATH"),
            login_path: non_empty_var("ROSTER_LOGIN_PATH"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
