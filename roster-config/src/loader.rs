use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;
use zeroize::Zeroizing;

use super::{
    models::{
        AuthConfig, Config, ConfigMetadata, Credential, DEFAULT_PRIVILEGED_ROLE,
        DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL, NavigationConfig,
        ServerConfig,
    },
    sources::{EnvConfig, FileAuthConfig, FileConfig},
    util::{normalize_base_url, normalize_path},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    let mut locations = vec![
        PathBuf::from("roster.toml"),
        PathBuf::from("config/roster.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("roster").join("config.toml"));
    }
    locations
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Server URL given on the command line; outranks every other layer.
    pub server_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// Effective configuration plus anything worth telling the operator about.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_server_url<S: Into<String>>(mut self, url: S) -> Self {
        self.options.server_url = Some(url.into());
        self
    }

    /// Load `.env`, read the process environment and compose the result.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose against an already gathered environment. Neither `.env` nor
    /// the process environment is consulted.
    pub fn load_with_env(
        &self,
        mut env_config: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        if let Some(url) = &self.options.server_url {
            env_config.server_url = Some(url.clone());
        }
        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let (config, warnings) =
            self.compose_config(file_config, env_config, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            log::warn!(
                "configuration file {} ({provenance:?}) not found; ignoring",
                path.display()
            );
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        log::debug!("loaded configuration from {}", path.display());
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No roster.toml detected; using environment variables and defaults",
                "Create roster.toml or pass --config <path>",
            );
        }

        let FileConfig {
            server: file_server,
            auth: file_auth,
            navigation: file_navigation,
            privileged_role: file_privileged_role,
        } = file_config.unwrap_or_default();

        let raw_url = env
            .server_url
            .or(file_server.url)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let base_url = normalize_base_url(&raw_url).map_err(|source| {
            ConfigLoadError::InvalidServerUrl {
                raw: raw_url.clone(),
                source,
            }
        })?;

        let request_timeout = match env
            .request_timeout
            .or(file_server.request_timeout)
        {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let server = ServerConfig {
            base_url,
            request_timeout,
            accept_invalid_certs: env
                .accept_invalid_certs
                .or(file_server.accept_invalid_certs)
                .unwrap_or(false),
        };

        let env_credential =
            pick_credential(env.auth_token, env.session_cookie)?;
        let FileAuthConfig {
            token: file_token,
            session_cookie: file_cookie,
        } = file_auth;
        let file_credential = pick_credential(file_token, file_cookie)?;
        let auth = AuthConfig {
            credential: env_credential.or(file_credential),
        };

        let defaults = NavigationConfig::default();
        let navigation = NavigationConfig {
            console_path: env
                .console_path
                .or(file_navigation.console_path)
                .map(|path| normalize_path(&path))
                .unwrap_or(defaults.console_path),
            profile_path: env
                .profile_path
                .or(file_navigation.profile_path)
                .map(|path| normalize_path(&path))
                .unwrap_or(defaults.profile_path),
            login_path: env
                .login_path
                .or(file_navigation.login_path)
                .map(|path| normalize_path(&path))
                .unwrap_or(defaults.login_path),
            logout_path: file_navigation
                .logout_path
                .map(|path| normalize_path(&path))
                .unwrap_or(defaults.logout_path),
        };

        let privileged_role = env
            .privileged_role
            .or(file_privileged_role)
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| DEFAULT_PRIVILEGED_ROLE.to_string());

        let config = Config {
            server,
            auth,
            navigation,
            privileged_role,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok((config, warnings))
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidTimeout {
            raw: raw.to_string(),
            source,
        }
    })
}

fn pick_credential(
    token: Option<String>,
    cookie: Option<String>,
) -> Result<Option<Credential>, ConfigGuardRailError> {
    let token = token.filter(|value| !value.trim().is_empty());
    let cookie = cookie.filter(|value| !value.trim().is_empty());
    match (token, cookie) {
        (Some(_), Some(_)) => Err(ConfigGuardRailError::ConflictingCredentials),
        (Some(token), None) => Ok(Some(Credential::Bearer(Zeroizing::new(
            token.trim().to_string(),
        )))),
        (None, Some(cookie)) => Ok(Some(Credential::SessionCookie(
            Zeroizing::new(cookie.trim().to_string()),
        ))),
        (None, None) => Ok(None),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid server URL '{raw}'")]
    InvalidServerUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid request timeout '{raw}'")]
    InvalidTimeout {
        raw: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(self, ConfigPathProvenance::Explicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_layers_do_not_mix() {
        assert!(matches!(
            pick_credential(Some("t".into()), Some("c".into())),
            Err(ConfigGuardRailError::ConflictingCredentials)
        ));
        assert!(matches!(
            pick_credential(Some("  ".into()), Some("JSESSIONID=abc".into())),
            Ok(Some(Credential::SessionCookie(_)))
        ));
        assert!(matches!(pick_credential(None, None), Ok(None)));
    }

    #[test]
    fn timeouts_use_humantime() {
        assert_eq!(parse_timeout("2m").unwrap(), Duration::from_secs(120));
        assert!(matches!(
            parse_timeout("soon"),
            Err(ConfigLoadError::InvalidTimeout { .. })
        ));
    }
}
