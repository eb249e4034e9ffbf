use serde::{Deserialize, Serialize};
use std::fmt;

/// A role that can be assigned to users.
///
/// The name is the unique key. Any other attributes the backend attaches
/// (numeric ids, authority strings) are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Join role names with `", "` in the given order.
pub fn join_names(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::name)
        .collect::<Vec<_>>()
        .join(", ")
}
