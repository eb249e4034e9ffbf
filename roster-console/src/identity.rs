//! Identity loading and the privilege flag derived from it.

use log::{info, warn};
use parking_lot::RwLock;
use roster_model::{Identity, PrivilegeChecker, UserId};
use std::sync::Arc;

use crate::{
    error::{ConsoleError, ConsoleResult},
    infra::services::AdminService,
    state::AppState,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdentityStatus {
    #[default]
    NotLoaded,
    Loaded {
        identity: Identity,
        privileged: bool,
    },
    /// The identity request failed for a reason other than authentication.
    Unavailable { reason: String },
    /// The session was rejected; only the login page can help.
    LoginRequired,
}

#[derive(Debug, Default)]
pub struct IdentitySlot {
    status: RwLock<IdentityStatus>,
}

impl IdentitySlot {
    pub fn status(&self) -> IdentityStatus {
        self.status.read().clone()
    }

    pub fn current(&self) -> Option<Identity> {
        match &*self.status.read() {
            IdentityStatus::Loaded { identity, .. } => Some(identity.clone()),
            _ => None,
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(
            &*self.status.read(),
            IdentityStatus::Loaded {
                privileged: true,
                ..
            }
        )
    }

    pub fn is_self(&self, user_id: UserId) -> bool {
        match &*self.status.read() {
            IdentityStatus::Loaded { identity, .. } => identity.id() == user_id,
            _ => false,
        }
    }

    fn set(&self, status: IdentityStatus) {
        *self.status.write() = status;
    }
}

#[derive(Clone)]
pub struct IdentityLoader {
    state: Arc<AppState>,
    service: Arc<dyn AdminService>,
}

impl std::fmt::Debug for IdentityLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityLoader").finish_non_exhaustive()
    }
}

impl IdentityLoader {
    pub fn new(state: Arc<AppState>, service: Arc<dyn AdminService>) -> Self {
        Self { state, service }
    }

    /// Fetch the caller's identity and derive the privilege flag.
    ///
    /// `Unauthorized` is terminal for the session. Any other failure marks
    /// the identity unavailable.
    pub async fn load_identity(&self) -> ConsoleResult<Identity> {
        match self.service.current_identity().await {
            Ok(identity) => {
                let privileged = PrivilegeChecker::with_role(
                    Some(&identity),
                    &self.state.settings.privileged_role,
                )
                .is_privileged();
                info!(
                    "Loaded identity {} (privileged: {})",
                    identity.email(),
                    privileged
                );
                self.state.identity.set(IdentityStatus::Loaded {
                    identity: identity.clone(),
                    privileged,
                });
                Ok(identity)
            }
            Err(err) => {
                let err = ConsoleError::from_identity_failure(err);
                if err.is_unauthorized() {
                    warn!("Identity request rejected; login required");
                    self.state.identity.set(IdentityStatus::LoginRequired);
                } else {
                    warn!("Identity unavailable: {}", err);
                    self.state.identity.set(IdentityStatus::Unavailable {
                        reason: err.to_string(),
                    });
                }
                Err(err)
            }
        }
    }
}
