use thiserror::Error;

use super::models::{Config, NavigationConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("both a bearer token and a session cookie are configured; pick one")]
    ConflictingCredentials,
    #[error("navigation paths collide: {first} and {second} are both '{path}'")]
    PathCollision {
        first: &'static str,
        second: &'static str,
        path: String,
    },
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.server.request_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout);
    }

    validate_navigation(&config.navigation)?;

    if config.auth.credential.is_some()
        && config.server.base_url.starts_with("http://")
        && !is_loopback(&config.server.base_url)
    {
        warnings.push_with_hint(
            "Credentials will be sent over plain HTTP",
            "Use an https:// server URL for anything but local development",
        );
    }

    if config.server.accept_invalid_certs {
        warnings.push(
            "TLS certificate validation is disabled (ROSTER_ACCEPT_INVALID_CERTS)",
        );
    }

    if config.auth.credential.is_none() {
        warnings.push_with_hint(
            "No credential configured; every request will be anonymous",
            "Set ROSTER_AUTH_TOKEN or ROSTER_SESSION_COOKIE",
        );
    }

    Ok(warnings)
}

fn validate_navigation(
    navigation: &NavigationConfig,
) -> Result<(), ConfigGuardRailError> {
    let named = [
        ("console_path", &navigation.console_path),
        ("profile_path", &navigation.profile_path),
        ("login_path", &navigation.login_path),
        ("logout_path", &navigation.logout_path),
    ];

    for (i, (first, a)) in named.iter().enumerate() {
        for (second, b) in &named[i + 1..] {
            if a == b {
                return Err(ConfigGuardRailError::PathCollision {
                    first: *first,
                    second: *second,
                    path: a.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn is_loopback(base_url: &str) -> bool {
    url::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| {
            host == "localhost" || host == "127.0.0.1" || host == "[::1]"
        })
        .unwrap_or(false)
}
