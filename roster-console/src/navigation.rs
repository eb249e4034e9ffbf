//! Which view is visible, gated by the privilege flag.

use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    List,
    Create,
}

/// Top-level view. A tab only exists inside the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    Console(Tab),
    #[default]
    SelfProfile,
}

impl ViewState {
    pub fn is_console(&self) -> bool {
        matches!(self, ViewState::Console(_))
    }

    pub fn tab(&self) -> Option<Tab> {
        match self {
            ViewState::Console(tab) => Some(*tab),
            ViewState::SelfProfile => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Entered(ViewState),
    /// The gate turned the request away before any privileged data was
    /// requested.
    Redirected { requested: String, to: ViewState },
    /// Login or logout page; handled outside the console.
    LoginBoundary(String),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("tabs are only available in the console view")]
    NotInConsole,
}

#[derive(Debug, Default)]
pub struct ViewSlot {
    view: RwLock<ViewState>,
}

impl ViewSlot {
    pub fn current(&self) -> ViewState {
        *self.view.read()
    }

    fn set(&self, view: ViewState) {
        *self.view.write() = view;
    }
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    state: Arc<AppState>,
}

impl NavigationController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn current(&self) -> ViewState {
        self.state.view.current()
    }

    /// Initial gating decision once the identity load has settled.
    pub fn initial(&self) -> ViewState {
        let view = if self.state.identity.is_privileged() {
            ViewState::Console(Tab::List)
        } else {
            ViewState::SelfProfile
        };
        debug!("Initial view: {:?}", view);
        self.state.view.set(view);
        view
    }

    pub fn navigate(&self, path: &str) -> NavigationOutcome {
        let routes = &self.state.settings.navigation;
        let current = self.current();

        if matches_route(path, &routes.login_path)
            || matches_route(path, &routes.logout_path)
        {
            return NavigationOutcome::LoginBoundary(routes.login_path.clone());
        }

        if matches_route(path, &routes.console_path) {
            if !self.state.identity.is_privileged() {
                warn!("Navigation to {} denied; showing self profile", path);
                self.state.view.set(ViewState::SelfProfile);
                return NavigationOutcome::Redirected {
                    requested: path.to_string(),
                    to: ViewState::SelfProfile,
                };
            }
            let view = match current {
                ViewState::Console(tab) => ViewState::Console(tab),
                ViewState::SelfProfile => ViewState::Console(Tab::List),
            };
            info!("Entered console view {:?}", view);
            self.state.view.set(view);
            return NavigationOutcome::Entered(view);
        }

        if matches_route(path, &routes.profile_path) {
            self.state.view.set(ViewState::SelfProfile);
            return NavigationOutcome::Entered(ViewState::SelfProfile);
        }

        NavigationOutcome::Unknown(path.to_string())
    }

    pub fn select_tab(&self, tab: Tab) -> Result<ViewState, NavigationError> {
        match self.current() {
            ViewState::Console(_) => {
                let view = ViewState::Console(tab);
                self.state.view.set(view);
                Ok(view)
            }
            ViewState::SelfProfile => Err(NavigationError::NotInConsole),
        }
    }

    /// Re-evaluate the gate after an identity reload. Returns the new view
    /// when the caller lost access to the console.
    pub fn regate(&self) -> Option<ViewState> {
        if self.current().is_console() && !self.state.identity.is_privileged() {
            warn!("Console access lost; switching to self profile");
            self.state.view.set(ViewState::SelfProfile);
            return Some(ViewState::SelfProfile);
        }
        None
    }
}

/// `route` matches itself and anything below it, ignoring query, fragment
/// and trailing slashes.
fn matches_route(path: &str, route: &str) -> bool {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let route = route.trim_end_matches('/');
    if route.is_empty() {
        return path.is_empty();
    }
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityLoader;
    use crate::infra::testing::StubAdminService;
    use crate::state::ConsoleSettings;
    use roster_model::{Role, User, UserId};

    async fn controller(roles: &[&str]) -> NavigationController {
        let stub = StubAdminService::new().with_identity(Some(User {
            id: UserId(7),
            first_name: String::new(),
            last_name: String::new(),
            age: None,
            email: "u@example.com".into(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        }));
        let state = AppState::new(ConsoleSettings::default());
        IdentityLoader::new(state.clone(), Arc::new(stub))
            .load_identity()
            .await
            .unwrap();
        NavigationController::new(state)
    }

    #[test]
    fn route_matching_respects_segments() {
        assert!(matches_route("/admin", "/admin"));
        assert!(matches_route("/admin/users?tab=2", "/admin"));
        assert!(matches_route("/admin/", "/admin"));
        assert!(!matches_route("/administrator", "/admin"));
        assert!(!matches_route("/api/user/info", "/user"));
    }

    #[tokio::test]
    async fn initial_view_depends_on_privilege() {
        assert_eq!(
            controller(&["ADMIN"]).await.initial(),
            ViewState::Console(Tab::List)
        );
        assert_eq!(controller(&["USER"]).await.initial(), ViewState::SelfProfile);
    }

    #[tokio::test]
    async fn unprivileged_console_request_is_redirected() {
        let nav = controller(&["USER"]).await;
        nav.initial();
        assert_eq!(
            nav.navigate("/admin"),
            NavigationOutcome::Redirected {
                requested: "/admin".into(),
                to: ViewState::SelfProfile
            }
        );
        assert_eq!(nav.current(), ViewState::SelfProfile);
    }

    #[tokio::test]
    async fn tabs_only_exist_in_console() {
        let nav = controller(&["USER"]).await;
        nav.initial();
        assert_eq!(
            nav.select_tab(Tab::Create),
            Err(NavigationError::NotInConsole)
        );

        let nav = controller(&["ADMIN"]).await;
        nav.initial();
        assert_eq!(
            nav.select_tab(Tab::Create),
            Ok(ViewState::Console(Tab::Create))
        );
        // Re-entering the console keeps the active tab.
        assert_eq!(
            nav.navigate("/admin"),
            NavigationOutcome::Entered(ViewState::Console(Tab::Create))
        );
        assert_eq!(
            nav.navigate("/user"),
            NavigationOutcome::Entered(ViewState::SelfProfile)
        );
    }

    #[tokio::test]
    async fn login_paths_leave_the_console() {
        let nav = controller(&["ADMIN"]).await;
        assert_eq!(
            nav.navigate("/logout"),
            NavigationOutcome::LoginBoundary("/login".into())
        );
        assert_eq!(
            nav.navigate("/reports"),
            NavigationOutcome::Unknown("/reports".into())
        );
    }
}
