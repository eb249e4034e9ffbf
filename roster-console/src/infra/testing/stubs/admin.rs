use async_trait::async_trait;
use parking_lot::RwLock;
use roster_model::{
    ADMIN_ROLE, CreateUserRequest, Identity, MessageResponse, Role,
    USER_ROLE, UpdateUserRequest, User, UserId,
    routes::{admin, user, utils},
};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use crate::infra::{api_client::ApiError, services::AdminService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubOperation {
    CurrentIdentity,
    ListRoles,
    ListUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

/// A scripted failure returned instead of the stub's normal answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubFailure {
    Status { status: u16, message: Option<String> },
    /// What the backend does for a missing or expired session.
    LoginRedirect,
}

impl StubFailure {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        StubFailure::Status {
            status,
            message: Some(message.into()),
        }
    }

    fn into_api_error(self, path: &str) -> ApiError {
        match self {
            StubFailure::Status { status, message } => ApiError::Status {
                path: path.to_string(),
                status,
                message,
            },
            StubFailure::LoginRedirect => ApiError::Redirect {
                path: path.to_string(),
                status: 302,
                location: Some("/login".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
}

/// In-memory backend mirroring the console's REST contract.
///
/// Every call is recorded before it is answered, including calls that end
/// up failing, so tests can assert on exactly what reached the "server".
#[derive(Debug, Clone)]
pub struct StubAdminService {
    inner: Arc<RwLock<InnerAdminState>>,
}

#[derive(Debug)]
struct InnerAdminState {
    identity: Option<User>,
    roles: Vec<Role>,
    users: Vec<User>,
    next_id: i64,
    calls: Vec<RecordedCall>,
    failures: HashMap<StubOperation, VecDeque<StubFailure>>,
    latency: Option<Duration>,
}

impl Default for StubAdminService {
    fn default() -> Self {
        Self::new()
    }
}

impl StubAdminService {
    /// One administrator, signed in, with the `ADMIN` and `USER` roles seeded.
    pub fn new() -> Self {
        let admin = User {
            id: UserId(1),
            first_name: "Ada".into(),
            last_name: "Admin".into(),
            age: Some(36),
            email: "admin@example.com".into(),
            roles: vec![Role::new(ADMIN_ROLE), Role::new(USER_ROLE)],
        };

        let inner = InnerAdminState {
            identity: Some(admin.clone()),
            roles: vec![Role::new(ADMIN_ROLE), Role::new(USER_ROLE)],
            users: vec![admin],
            next_id: 2,
            calls: Vec::new(),
            failures: HashMap::new(),
            latency: None,
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub fn with_identity(self, identity: Option<User>) -> Self {
        self.inner.write().identity = identity;
        self
    }

    pub fn with_roles(self, roles: Vec<Role>) -> Self {
        self.inner.write().roles = roles;
        self
    }

    /// Replace the stored users verbatim, duplicates included.
    pub fn with_users(self, users: Vec<User>) -> Self {
        let mut guard = self.inner.write();
        guard.next_id = users.iter().map(|u| u.id.as_i64()).max().unwrap_or(0) + 1;
        guard.users = users;
        drop(guard);
        self
    }

    /// Delay every answer, which keeps submits pending long enough to
    /// observe them.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.inner.write().latency = Some(latency);
        self
    }

    pub fn set_identity(&self, identity: Option<User>) {
        self.inner.write().identity = identity;
    }

    /// Queue a failure for the next call of `operation`.
    pub fn fail_next(&self, operation: StubOperation, failure: StubFailure) {
        self.inner
            .write()
            .failures
            .entry(operation)
            .or_default()
            .push_back(failure);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.read().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.write().calls.clear();
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.inner
            .read()
            .calls
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    /// Calls that targeted the privileged API surface.
    pub fn admin_calls(&self) -> usize {
        self.inner
            .read()
            .calls
            .iter()
            .filter(|call| utils::is_admin_path(&call.path))
            .count()
    }

    pub fn users(&self) -> Vec<User> {
        self.inner.read().users.clone()
    }

    pub fn identity(&self) -> Option<User> {
        self.inner.read().identity.clone()
    }

    async fn begin(
        &self,
        operation: StubOperation,
        method: &'static str,
        path: &str,
    ) -> Result<(), ApiError> {
        let (failure, latency) = {
            let mut guard = self.inner.write();
            guard.calls.push(RecordedCall {
                method,
                path: path.to_string(),
            });
            let failure = guard
                .failures
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            (failure, guard.latency)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match failure {
            Some(failure) => Err(failure.into_api_error(path)),
            None => Ok(()),
        }
    }

    fn item_path(user_id: UserId) -> String {
        utils::replace_param(admin::USER_ITEM, "{id}", user_id.to_string())
    }

    fn not_found(path: &str, user_id: UserId) -> ApiError {
        StubFailure::status(404, format!("User not found with id: {user_id}"))
            .into_api_error(path)
    }
}

impl InnerAdminState {
    fn resolve_roles(
        &self,
        path: &str,
        names: &[String],
    ) -> Result<Vec<Role>, ApiError> {
        names
            .iter()
            .map(|name| {
                self.roles.iter().find(|r| &r.name == name).cloned().ok_or_else(
                    || {
                        StubFailure::status(400, format!("Role not found: {name}"))
                            .into_api_error(path)
                    },
                )
            })
            .collect()
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users.iter().any(|u| {
            Some(u.id) != except && u.email.eq_ignore_ascii_case(email)
        })
    }
}

#[async_trait]
impl AdminService for StubAdminService {
    async fn current_identity(&self) -> Result<Identity, ApiError> {
        self.begin(StubOperation::CurrentIdentity, "GET", user::INFO)
            .await?;
        match self.inner.read().identity.clone() {
            Some(identity) => Ok(Identity::new(identity)),
            None => Err(StubFailure::LoginRedirect.into_api_error(user::INFO)),
        }
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        self.begin(StubOperation::ListRoles, "GET", admin::ROLES).await?;
        Ok(self.inner.read().roles.clone())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.begin(StubOperation::ListUsers, "GET", admin::USERS).await?;
        Ok(self.inner.read().users.clone())
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, ApiError> {
        let path = Self::item_path(user_id);
        self.begin(StubOperation::GetUser, "GET", &path).await?;
        self.inner
            .read()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(&path, user_id))
    }

    async fn create_user(
        &self,
        req: CreateUserRequest,
    ) -> Result<User, ApiError> {
        self.begin(StubOperation::CreateUser, "POST", admin::USERS)
            .await?;

        let mut guard = self.inner.write();
        if guard.email_taken(&req.email, None) {
            return Err(StubFailure::status(
                409,
                format!("User with email {} already exists", req.email),
            )
            .into_api_error(admin::USERS));
        }
        let roles = guard.resolve_roles(admin::USERS, &req.roles)?;

        let created = User {
            id: UserId(guard.next_id),
            first_name: req.first_name,
            last_name: req.last_name,
            age: req.age,
            email: req.email,
            roles,
        };
        guard.next_id += 1;
        guard.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        req: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        let path = Self::item_path(user_id);
        self.begin(StubOperation::UpdateUser, "PUT", &path).await?;

        let mut guard = self.inner.write();
        let Some(index) = guard.users.iter().position(|u| u.id == user_id)
        else {
            return Err(Self::not_found(&path, user_id));
        };
        if let Some(email) = req.email.as_deref()
            && guard.email_taken(email, Some(user_id))
        {
            return Err(StubFailure::status(
                409,
                format!("Email {email} is already in use"),
            )
            .into_api_error(&path));
        }
        let roles = match req.roles.as_deref() {
            Some(names) => Some(guard.resolve_roles(&path, names)?),
            None => None,
        };

        let stored = &mut guard.users[index];
        if let Some(first_name) = req.first_name {
            stored.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            stored.last_name = last_name;
        }
        if let Some(age) = req.age {
            stored.age = Some(age);
        }
        if let Some(email) = req.email {
            stored.email = email;
        }
        // An empty selection clears every role.
        if let Some(roles) = roles {
            stored.roles = roles;
        }
        let updated = stored.clone();

        if guard.identity.as_ref().map(|i| i.id) == Some(user_id) {
            guard.identity = Some(updated.clone());
        }
        Ok(updated)
    }

    async fn delete_user(
        &self,
        user_id: UserId,
    ) -> Result<MessageResponse, ApiError> {
        let path = Self::item_path(user_id);
        self.begin(StubOperation::DeleteUser, "DELETE", &path).await?;

        let mut guard = self.inner.write();
        let before = guard.users.len();
        guard.users.retain(|u| u.id != user_id);
        if guard.users.len() == before {
            return Err(Self::not_found(&path, user_id));
        }
        if guard.identity.as_ref().map(|i| i.id) == Some(user_id) {
            // The session dies with its account.
            guard.identity = None;
        }
        Ok(MessageResponse {
            message: "User deleted successfully".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_model::Password;

    fn request(email: &str, roles: &[&str]) -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Linus".into(),
            last_name: "T".into(),
            age: None,
            email: email.into(),
            password: Password::new("pw"),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn calls_are_recorded_even_when_failing() {
        let stub = StubAdminService::new();
        stub.fail_next(StubOperation::ListUsers, StubFailure::status(503, "down"));

        assert!(stub.list_users().await.is_err());
        assert_eq!(stub.list_users().await.unwrap().len(), 1);
        assert_eq!(stub.count("GET", admin::USERS), 2);
        assert_eq!(stub.admin_calls(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let stub = StubAdminService::new();
        let err = stub
            .create_user(request("ADMIN@example.com", &["USER"]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.server_message(),
            Some("User with email ADMIN@example.com already exists")
        );
    }

    #[tokio::test]
    async fn empty_role_update_clears_roles() {
        let stub = StubAdminService::new();
        let created = stub
            .create_user(request("new@example.com", &["USER"]))
            .await
            .unwrap();
        assert_eq!(created.id, UserId(2));

        let updated = stub
            .update_user(
                created.id,
                UpdateUserRequest {
                    roles: Some(Vec::new()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.roles.is_empty());
        assert_eq!(updated.first_name, "Linus");
    }

    #[tokio::test]
    async fn deleting_the_caller_ends_the_session() {
        let stub = StubAdminService::new();
        stub.delete_user(UserId(1)).await.unwrap();
        let err = stub.current_identity().await.unwrap_err();
        assert!(matches!(err, ApiError::Redirect { .. }));
    }
}
