//! Core data model definitions shared across Roster crates.
//!
//! Everything that crosses the wire between the console and the admin
//! backend lives here: identities, users, roles, drafts written by forms,
//! the request/response envelopes and the route table.
#![allow(missing_docs)]

pub mod api;
pub mod draft;
pub mod error;
pub mod ids;
pub mod rbac;
pub mod role;
pub mod routes;
pub mod user;

// Intentionally curated re-exports for downstream consumers.
pub use api::{
    CreateUserRequest, MessageResponse, ServerMessage, UpdateUserRequest,
    UsersEnvelope,
};
pub use draft::{Password, UserDraft};
pub use error::{ModelError, Result as ModelResult};
pub use ids::UserId;
pub use rbac::{ADMIN_ROLE, PrivilegeChecker, USER_ROLE};
pub use role::{Role, join_names};
pub use user::{Identity, User};
