//! Route definitions shared by the console and its test servers.

/// Endpoints available to any authenticated caller.
pub mod user {
    pub const INFO: &str = "/api/user/info";
}

/// Endpoints reserved for privileged callers.
pub mod admin {
    pub const ROOT: &str = "/api/admin";
    pub const ROLES: &str = "/api/admin/roles";
    pub const USERS: &str = "/api/admin/users";
    pub const USER_ITEM: &str = "/api/admin/users/{id}";
}

pub mod utils {
    /// Replace a single path parameter (e.g. `"{id}"`) with the provided value.
    pub fn replace_param(
        route: &str,
        param: &str,
        value: impl AsRef<str>,
    ) -> String {
        route.replace(param, value.as_ref())
    }

    /// True when `path` targets the privileged API surface.
    pub fn is_admin_path(path: &str) -> bool {
        path == super::admin::ROOT || path.starts_with("/api/admin/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_item_route_substitutes_id() {
        assert_eq!(
            utils::replace_param(admin::USER_ITEM, "{id}", "42"),
            "/api/admin/users/42"
        );
    }

    #[test]
    fn admin_paths_are_recognised() {
        assert!(utils::is_admin_path(admin::USERS));
        assert!(utils::is_admin_path("/api/admin/users/3"));
        assert!(!utils::is_admin_path(user::INFO));
        assert!(!utils::is_admin_path("/api/administrator"));
    }
}
