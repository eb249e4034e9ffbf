use roster_config::{Config, NavigationConfig};
use roster_model::ADMIN_ROLE;
use std::sync::Arc;

use crate::{
    collection::CatalogSlot, crud::FormSlot, identity::IdentitySlot,
    navigation::ViewSlot,
};

/// Settings the orchestration layer reads but never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub privileged_role: String,
    pub navigation: NavigationConfig,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            privileged_role: ADMIN_ROLE.to_string(),
            navigation: NavigationConfig::default(),
        }
    }
}

impl ConsoleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            privileged_role: config.privileged_role.clone(),
            navigation: config.navigation.clone(),
        }
    }
}

/// Session-wide state shared by every component.
///
/// Each slot can be read by anyone but only written by the module that
/// defines it: the identity by [`crate::identity`], the role catalog and
/// user collection by [`crate::collection`], the view by
/// [`crate::navigation`] and the forms by [`crate::crud`].
#[derive(Debug, Default)]
pub struct AppState {
    pub settings: ConsoleSettings,
    pub identity: IdentitySlot,
    pub catalog: CatalogSlot,
    pub view: ViewSlot,
    pub forms: FormSlot,
}

impl AppState {
    pub fn new(settings: ConsoleSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            ..Self::default()
        })
    }
}
