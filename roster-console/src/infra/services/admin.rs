use async_trait::async_trait;
use roster_model::{
    CreateUserRequest, Identity, MessageResponse, Role, UpdateUserRequest,
    User, UserId, UsersEnvelope,
    routes::{admin, user, utils},
};
use std::sync::Arc;

use crate::infra::api_client::{ApiClient, ApiError};

/// Operations the console needs from the backend.
#[async_trait]
pub trait AdminService: Send + Sync {
    /// The caller's own record and roles.
    async fn current_identity(&self) -> Result<Identity, ApiError>;

    async fn list_roles(&self) -> Result<Vec<Role>, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    async fn get_user(&self, user_id: UserId) -> Result<User, ApiError>;

    async fn create_user(
        &self,
        req: CreateUserRequest,
    ) -> Result<User, ApiError>;

    async fn update_user(
        &self,
        user_id: UserId,
        req: UpdateUserRequest,
    ) -> Result<User, ApiError>;

    async fn delete_user(
        &self,
        user_id: UserId,
    ) -> Result<MessageResponse, ApiError>;
}

#[derive(Clone, Debug)]
pub struct AdminApiAdapter {
    client: Arc<ApiClient>,
}

impl AdminApiAdapter {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn item_path(user_id: UserId) -> String {
        utils::replace_param(admin::USER_ITEM, "{id}", user_id.to_string())
    }
}

#[async_trait]
impl AdminService for AdminApiAdapter {
    async fn current_identity(&self) -> Result<Identity, ApiError> {
        self.client.get(user::INFO).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        // Bare JSON array, unlike the users listing.
        self.client.get(admin::ROLES).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let envelope: UsersEnvelope = self.client.get(admin::USERS).await?;
        Ok(envelope.users)
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, ApiError> {
        self.client.get(&Self::item_path(user_id)).await
    }

    async fn create_user(
        &self,
        req: CreateUserRequest,
    ) -> Result<User, ApiError> {
        self.client.post(admin::USERS, &req).await
    }

    async fn update_user(
        &self,
        user_id: UserId,
        req: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        self.client.put(&Self::item_path(user_id), &req).await
    }

    async fn delete_user(
        &self,
        user_id: UserId,
    ) -> Result<MessageResponse, ApiError> {
        self.client.delete(&Self::item_path(user_id)).await
    }
}
