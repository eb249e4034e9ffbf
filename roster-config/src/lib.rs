//! Shared configuration library for Roster.
//!
//! Configuration is layered the same way everywhere: built-in defaults, then
//! a TOML file, then `.env`/process environment. The effective [`Config`] is
//! returned together with non-fatal [`ConfigWarnings`] so the binary can
//! report questionable setups without refusing to start.

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AuthConfig, Config, ConfigMetadata, Credential, NavigationConfig,
    ServerConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
