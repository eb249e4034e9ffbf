use crate::ids::UserId;
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// A manageable user account as returned by the admin endpoints.
///
/// There is deliberately no password field: credentials are write-only and
/// only ever appear on outgoing requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(Role::name).collect()
    }

    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name == role_name)
    }
}

/// The authenticated caller's own record plus roles.
///
/// Same wire shape as [`User`]; kept as a distinct type so the session's
/// identity can never be confused with an entry of the admin collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    user: User,
}

impl Identity {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn roles(&self) -> &[Role] {
        &self.user.roles
    }

    pub fn has_role(&self, role_name: &str) -> bool {
        self.user.has_role(role_name)
    }

    pub fn as_user(&self) -> &User {
        &self.user
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self::new(user)
    }
}
