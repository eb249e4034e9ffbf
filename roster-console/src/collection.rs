//! Role catalog and user collection, kept in step with the server.

use log::{error, info};
use parking_lot::RwLock;
use roster_model::{Role, User, UserId};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    error::{ConsoleError, ConsoleResult},
    infra::services::AdminService,
    state::AppState,
};

/// Users keyed by id, iterated in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    users: Vec<User>,
    index: HashMap<UserId, usize>,
}

impl Collection {
    /// Fails with the first repeated id.
    pub fn from_users(users: Vec<User>) -> Result<Self, UserId> {
        let mut index = HashMap::with_capacity(users.len());
        for (position, user) in users.iter().enumerate() {
            if index.insert(user.id, position).is_some() {
                return Err(user.id);
            }
        }
        Ok(Self { users, index })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    pub fn get(&self, user_id: UserId) -> Option<&User> {
        self.index.get(&user_id).map(|&position| &self.users[position])
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.index.contains_key(&user_id)
    }
}

#[derive(Debug, Default)]
pub struct CatalogSlot {
    roles: RwLock<Option<Vec<Role>>>,
    users: RwLock<Option<Collection>>,
}

impl CatalogSlot {
    /// Last loaded role catalog; empty until the first successful load.
    pub fn roles(&self) -> Vec<Role> {
        self.roles.read().clone().unwrap_or_default()
    }

    pub fn roles_loaded(&self) -> bool {
        self.roles.read().is_some()
    }

    /// `None` until the first successful load.
    pub fn users(&self) -> Option<Collection> {
        self.users.read().clone()
    }

    fn replace_roles(&self, roles: Vec<Role>) {
        *self.roles.write() = Some(roles);
    }

    fn replace_users(&self, users: Collection) {
        *self.users.write() = Some(users);
    }
}

#[derive(Clone)]
pub struct CollectionSynchronizer {
    state: Arc<AppState>,
    service: Arc<dyn AdminService>,
}

impl std::fmt::Debug for CollectionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSynchronizer")
            .finish_non_exhaustive()
    }
}

impl CollectionSynchronizer {
    pub fn new(state: Arc<AppState>, service: Arc<dyn AdminService>) -> Self {
        Self { state, service }
    }

    /// Replace the role catalog wholesale.
    pub async fn load_roles(&self) -> ConsoleResult<Vec<Role>> {
        let fetched = self.service.list_roles().await.map_err(|err| {
            let err = ConsoleError::from(err);
            error!("Failed to load roles: {}", err);
            err
        })?;

        // Names are the catalog key; keep the first occurrence.
        let mut seen = HashSet::new();
        let roles: Vec<Role> = fetched
            .into_iter()
            .filter(|role| seen.insert(role.name.clone()))
            .collect();

        info!("Loaded {} roles", roles.len());
        self.state.catalog.replace_roles(roles.clone());
        Ok(roles)
    }

    /// Replace the user collection wholesale.
    ///
    /// A response with repeated ids is rejected and the previous collection
    /// stays in place.
    pub async fn load_users(&self) -> ConsoleResult<Collection> {
        let users = self.service.list_users().await.map_err(|err| {
            let err = ConsoleError::from(err);
            error!("Failed to load users: {}", err);
            err
        })?;

        let collection = Collection::from_users(users).map_err(|id| {
            error!("Server returned user id {} more than once", id);
            ConsoleError::Transient(format!(
                "server returned user id {id} more than once"
            ))
        })?;

        info!("Loaded {} users", collection.len());
        self.state.catalog.replace_users(collection.clone());
        Ok(collection)
    }

    /// Fetch one user for a modal prefill. The cached collection is left
    /// alone.
    pub async fn fetch_user(&self, user_id: UserId) -> ConsoleResult<User> {
        self.service.get_user(user_id).await.map_err(|err| {
            let err = ConsoleError::from(err);
            error!("Failed to fetch user {}: {}", user_id, err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{StubAdminService, StubFailure, StubOperation};
    use crate::state::ConsoleSettings;

    fn user(id: i64, email: &str) -> User {
        User {
            id: UserId(id),
            first_name: "F".into(),
            last_name: "L".into(),
            age: None,
            email: email.into(),
            roles: vec![Role::new("USER")],
        }
    }

    fn synchronizer(stub: &StubAdminService) -> (Arc<AppState>, CollectionSynchronizer) {
        let state = AppState::new(ConsoleSettings::default());
        let sync = CollectionSynchronizer::new(state.clone(), Arc::new(stub.clone()));
        (state, sync)
    }

    #[tokio::test]
    async fn load_users_replaces_collection_in_server_order() {
        let stub = StubAdminService::new()
            .with_users(vec![user(9, "z@x"), user(3, "a@x")]);
        let (state, sync) = synchronizer(&stub);

        sync.load_users().await.unwrap();
        let users = state.catalog.users().unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UserId(9), UserId(3)]);
        assert_eq!(users.get(UserId(3)).unwrap().email, "a@x");
    }

    #[tokio::test]
    async fn empty_collection_is_a_loaded_state() {
        let stub = StubAdminService::new().with_users(Vec::new());
        let (state, sync) = synchronizer(&stub);

        sync.load_users().await.unwrap();
        assert_eq!(state.catalog.users().map(|c| c.len()), Some(0));
    }

    #[tokio::test]
    async fn duplicate_ids_keep_previous_collection() {
        let stub = StubAdminService::new().with_users(vec![user(1, "a@x")]);
        let (state, sync) = synchronizer(&stub);
        sync.load_users().await.unwrap();

        let stub = stub.with_users(vec![user(2, "b@x"), user(2, "c@x")]);
        let err = sync.load_users().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Transient(_)));
        assert_eq!(stub.count("GET", "/api/admin/users"), 2);

        let kept = state.catalog.users().unwrap();
        assert_eq!(kept.len(), 1);
        assert!(kept.contains(UserId(1)));
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_roles() {
        let stub = StubAdminService::new();
        let (state, sync) = synchronizer(&stub);
        sync.load_roles().await.unwrap();

        stub.fail_next(StubOperation::ListRoles, StubFailure::status(500, "boom"));
        assert!(sync.load_roles().await.is_err());
        let names: Vec<_> =
            state.catalog.roles().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["ADMIN", "USER"]);
    }

    #[tokio::test]
    async fn fetch_user_does_not_touch_collection() {
        let stub = StubAdminService::new();
        let (state, sync) = synchronizer(&stub);

        let fetched = sync.fetch_user(UserId(1)).await.unwrap();
        assert_eq!(fetched.email, "admin@example.com");
        assert!(state.catalog.users().is_none());

        let missing = sync.fetch_user(UserId(99)).await.unwrap_err();
        assert_eq!(
            missing,
            ConsoleError::NotFound("User not found with id: 99".into())
        );
    }
}
