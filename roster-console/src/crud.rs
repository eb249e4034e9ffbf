//! Create, edit and delete workflows.
//!
//! Every successful mutation is followed by a full reload of the user
//! collection; nothing is patched locally. Failed submits leave their form
//! open with the operator's input intact.

use log::{debug, error, info, warn};
use parking_lot::RwLock;
use roster_model::{MessageResponse, User, UserDraft, UserId};
use std::sync::Arc;

use crate::{
    collection::CollectionSynchronizer,
    error::{ConsoleError, ConsoleResult},
    identity::IdentityLoader,
    infra::services::AdminService,
    navigation::{NavigationController, Tab},
    state::AppState,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub draft: UserDraft,
    pub pending: bool,
    pub error: Option<String>,
}

/// Scratch copy of one user. The password starts blank; blank on submit
/// means "keep the current one".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditModal {
    pub user_id: UserId,
    pub draft: UserDraft,
    pub pending: bool,
    pub error: Option<String>,
}

/// Read-only confirmation of the user about to be deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteModal {
    pub user: User,
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct FormSlot {
    create: RwLock<CreateForm>,
    edit: RwLock<Option<EditModal>>,
    delete: RwLock<Option<DeleteModal>>,
}

impl FormSlot {
    pub fn create_form(&self) -> CreateForm {
        self.create.read().clone()
    }

    pub fn edit_modal(&self) -> Option<EditModal> {
        self.edit.read().clone()
    }

    pub fn delete_modal(&self) -> Option<DeleteModal> {
        self.delete.read().clone()
    }
}

/// Result of a submit that was not rejected outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    /// The server accepted the mutation. `resync` carries a failure of the
    /// follow-up reload, if any.
    Completed {
        value: T,
        resync: Option<ConsoleError>,
    },
    /// No open form to submit, or a submit from the same form is pending.
    Ignored,
}

impl<T> Submission<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Submission::Ignored)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Submission::Completed { value, .. } => Some(value),
            Submission::Ignored => None,
        }
    }
}

#[derive(Clone)]
pub struct CrudOrchestrator {
    state: Arc<AppState>,
    service: Arc<dyn AdminService>,
    collection: CollectionSynchronizer,
    identity: IdentityLoader,
    navigation: NavigationController,
}

impl std::fmt::Debug for CrudOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudOrchestrator").finish_non_exhaustive()
    }
}

impl CrudOrchestrator {
    pub fn new(
        state: Arc<AppState>,
        service: Arc<dyn AdminService>,
        collection: CollectionSynchronizer,
        identity: IdentityLoader,
        navigation: NavigationController,
    ) -> Self {
        Self {
            state,
            service,
            collection,
            identity,
            navigation,
        }
    }

    pub async fn create(
        &self,
        draft: UserDraft,
    ) -> ConsoleResult<Submission<User>> {
        {
            let mut form = self.state.forms.create.write();
            if form.pending {
                debug!("Create submit ignored; previous submit pending");
                return Ok(Submission::Ignored);
            }
            form.draft = draft.clone();
            form.pending = true;
            form.error = None;
        }

        match self.submit_create(&draft).await {
            Ok(user) => {
                info!("Created user {} ({})", user.email, user.id);
                *self.state.forms.create.write() = CreateForm::default();
                let resync = self.resync().await;
                if let Err(err) = self.navigation.select_tab(Tab::List) {
                    debug!("Tab not switched after create: {}", err);
                }
                Ok(Submission::Completed {
                    value: user,
                    resync,
                })
            }
            Err(err) => {
                error!("Failed to create user: {}", err);
                let mut form = self.state.forms.create.write();
                form.pending = false;
                form.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn submit_create(&self, draft: &UserDraft) -> ConsoleResult<User> {
        if !self.state.catalog.roles_loaded() {
            self.collection.load_roles().await?;
        }
        draft.validate_for_create(&self.state.catalog.roles())?;
        Ok(self.service.create_user(draft.to_create_request()).await?)
    }

    /// Discard the create form's contents. A pending submit is left alone.
    pub fn reset_create_form(&self) {
        let mut form = self.state.forms.create.write();
        if !form.pending {
            *form = CreateForm::default();
        }
    }

    pub async fn open_edit_modal(
        &self,
        user_id: UserId,
    ) -> ConsoleResult<EditModal> {
        let user = self.collection.fetch_user(user_id).await?;
        if !self.state.catalog.roles_loaded() {
            self.collection.load_roles().await?;
        }

        let modal = EditModal {
            user_id,
            draft: UserDraft::prefill(&user),
            pending: false,
            error: None,
        };
        debug!("Opened edit modal for user {}", user_id);
        *self.state.forms.edit.write() = Some(modal.clone());
        Ok(modal)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        draft: UserDraft,
    ) -> ConsoleResult<Submission<User>> {
        {
            let mut modal = self.state.forms.edit.write();
            match modal.as_mut() {
                Some(open) if open.user_id == user_id && !open.pending => {
                    open.draft = draft.clone();
                    open.pending = true;
                    open.error = None;
                }
                _ => {
                    debug!("Update submit for user {} ignored", user_id);
                    return Ok(Submission::Ignored);
                }
            }
        }

        let editing_self = self.state.identity.is_self(user_id);

        match self.submit_update(user_id, &draft).await {
            Ok(user) => {
                info!("Updated user {} ({})", user.email, user.id);
                self.close_edit_for(user_id);
                let mut resync = self.resync().await;
                if editing_self {
                    if let Err(err) = self.identity.load_identity().await {
                        resync.get_or_insert(err);
                    }
                    self.navigation.regate();
                }
                Ok(Submission::Completed {
                    value: user,
                    resync,
                })
            }
            Err(err) => {
                error!("Failed to update user {}: {}", user_id, err);
                if let Some(open) = self
                    .state
                    .forms
                    .edit
                    .write()
                    .as_mut()
                    .filter(|open| open.user_id == user_id)
                {
                    open.pending = false;
                    open.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    async fn submit_update(
        &self,
        user_id: UserId,
        draft: &UserDraft,
    ) -> ConsoleResult<User> {
        draft.validate_roles(&self.state.catalog.roles())?;
        Ok(self
            .service
            .update_user(user_id, draft.to_update_request())
            .await?)
    }

    pub fn close_edit_modal(&self) {
        *self.state.forms.edit.write() = None;
    }

    fn close_edit_for(&self, user_id: UserId) {
        let mut modal = self.state.forms.edit.write();
        if modal.as_ref().is_some_and(|open| open.user_id == user_id) {
            *modal = None;
        }
    }

    pub async fn open_delete_modal(
        &self,
        user_id: UserId,
    ) -> ConsoleResult<DeleteModal> {
        let user = self.collection.fetch_user(user_id).await?;
        if !self.state.catalog.roles_loaded() {
            self.collection.load_roles().await?;
        }

        let modal = DeleteModal {
            user,
            pending: false,
            error: None,
        };
        debug!("Opened delete modal for user {}", user_id);
        *self.state.forms.delete.write() = Some(modal.clone());
        Ok(modal)
    }

    pub async fn delete(
        &self,
        user_id: UserId,
    ) -> ConsoleResult<Submission<MessageResponse>> {
        {
            let mut modal = self.state.forms.delete.write();
            match modal.as_mut() {
                Some(open) if open.user.id == user_id && !open.pending => {
                    open.pending = true;
                    open.error = None;
                }
                _ => {
                    debug!("Delete submit for user {} ignored", user_id);
                    return Ok(Submission::Ignored);
                }
            }
        }

        if self.state.identity.is_self(user_id) {
            warn!("Deleting the signed-in account {}", user_id);
        }

        match self.service.delete_user(user_id).await {
            Ok(response) => {
                info!("Deleted user {}: {}", user_id, response.message);
                {
                    let mut modal = self.state.forms.delete.write();
                    if modal.as_ref().is_some_and(|open| open.user.id == user_id)
                    {
                        *modal = None;
                    }
                }
                let resync = self.resync().await;
                Ok(Submission::Completed {
                    value: response,
                    resync,
                })
            }
            Err(err) => {
                let err = ConsoleError::from(err);
                error!("Failed to delete user {}: {}", user_id, err);
                if let Some(open) = self
                    .state
                    .forms
                    .delete
                    .write()
                    .as_mut()
                    .filter(|open| open.user.id == user_id)
                {
                    open.pending = false;
                    open.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    pub fn close_delete_modal(&self) {
        *self.state.forms.delete.write() = None;
    }

    async fn resync(&self) -> Option<ConsoleError> {
        self.collection.load_users().await.err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{StubAdminService, StubFailure, StubOperation};
    use crate::state::ConsoleSettings;
    use roster_model::{Password, Role};

    struct Harness {
        state: Arc<AppState>,
        stub: StubAdminService,
        crud: CrudOrchestrator,
        navigation: NavigationController,
    }

    async fn harness(stub: StubAdminService) -> Harness {
        let state = AppState::new(ConsoleSettings::default());
        let service: Arc<dyn AdminService> = Arc::new(stub.clone());
        let collection = CollectionSynchronizer::new(state.clone(), service.clone());
        let identity = IdentityLoader::new(state.clone(), service.clone());
        let navigation = NavigationController::new(state.clone());
        identity.load_identity().await.unwrap();
        navigation.initial();
        collection.load_roles().await.unwrap();
        let crud = CrudOrchestrator::new(
            state.clone(),
            service,
            collection,
            identity,
            navigation.clone(),
        );
        stub.clear_calls();
        Harness {
            state,
            stub,
            crud,
            navigation,
        }
    }

    fn draft(email: &str, roles: &[&str]) -> UserDraft {
        UserDraft {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            age: Some(85),
            email: email.into(),
            password: Password::new("cobol"),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn local_validation_happens_before_any_request() {
        let h = harness(StubAdminService::new()).await;
        let mut incomplete = draft("g@example.com", &["USER"]);
        incomplete.password = Password::blank();

        let err = h.crud.create(incomplete.clone()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        assert!(h.stub.calls().is_empty());

        let form = h.state.forms.create_form();
        assert_eq!(form.draft, incomplete);
        assert!(!form.pending);
        assert_eq!(form.error.as_deref(), Some("password must not be empty"));
    }

    #[tokio::test]
    async fn create_resets_form_and_returns_to_list() {
        let stub = StubAdminService::new().with_roles(vec![
            Role::new("ADMIN"),
            Role::new("USER"),
            Role::new("EDITOR"),
        ]);
        let h = harness(stub).await;
        h.navigation.select_tab(Tab::Create).unwrap();

        let outcome = h.crud.create(draft("g@example.com", &["EDITOR"])).await.unwrap();
        assert!(matches!(outcome, Submission::Completed { resync: None, .. }));
        assert_eq!(h.state.forms.create_form(), CreateForm::default());
        assert_eq!(h.navigation.current().tab(), Some(Tab::List));
        assert_eq!(h.stub.count("GET", "/api/admin/users"), 1);
        assert_eq!(h.state.catalog.users().map(|c| c.len()), Some(2));
    }

    #[tokio::test]
    async fn server_rejection_keeps_form_data() {
        let h = harness(StubAdminService::new()).await;
        let duplicate = draft("admin@example.com", &["USER"]);

        let err = h.crud.create(duplicate.clone()).await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::Conflict(
                "User with email admin@example.com already exists".into()
            )
        );
        let form = h.state.forms.create_form();
        assert_eq!(form.draft, duplicate);
        assert_eq!(
            form.error.as_deref(),
            Some("User with email admin@example.com already exists")
        );
        assert_eq!(h.stub.count("GET", "/api/admin/users"), 0);
    }

    #[tokio::test]
    async fn edit_prefill_leaves_password_blank() {
        let h = harness(StubAdminService::new()).await;
        let modal = h.crud.open_edit_modal(UserId(1)).await.unwrap();
        assert_eq!(modal.draft.email, "admin@example.com");
        assert_eq!(modal.draft.roles, vec!["ADMIN", "USER"]);
        assert!(modal.draft.password.is_blank());
        assert_eq!(h.state.forms.edit_modal(), Some(modal));
    }

    #[tokio::test]
    async fn submits_without_open_modal_are_inert() {
        let h = harness(StubAdminService::new()).await;
        let outcome = h
            .crud
            .update(UserId(1), draft("x@example.com", &["USER"]))
            .await
            .unwrap();
        assert!(outcome.is_ignored());
        assert!(h.crud.delete(UserId(1)).await.unwrap().is_ignored());
        assert!(h.stub.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_modal_open() {
        let h = harness(StubAdminService::new()).await;
        let mut modal = h.crud.open_edit_modal(UserId(1)).await.unwrap();
        h.stub.fail_next(
            StubOperation::UpdateUser,
            StubFailure::status(500, "database unavailable"),
        );

        modal.draft.first_name = "Augusta".into();
        let err = h
            .crud
            .update(UserId(1), modal.draft.clone())
            .await
            .unwrap_err();
        assert_eq!(err, ConsoleError::Transient("database unavailable".into()));

        let open = h.state.forms.edit_modal().unwrap();
        assert_eq!(open.draft.first_name, "Augusta");
        assert!(!open.pending);
        assert_eq!(open.error.as_deref(), Some("database unavailable"));
    }

    #[tokio::test]
    async fn self_update_reloads_identity() {
        let h = harness(StubAdminService::new()).await;
        let mut modal = h.crud.open_edit_modal(UserId(1)).await.unwrap();
        modal.draft.first_name = "Augusta".into();
        modal.draft.roles = vec!["USER".into()];

        let outcome = h.crud.update(UserId(1), modal.draft).await.unwrap();
        assert!(matches!(outcome, Submission::Completed { resync: None, .. }));
        assert!(h.state.forms.edit_modal().is_none());

        let identity = h.state.identity.current().unwrap();
        assert_eq!(identity.as_user().first_name, "Augusta");
        assert!(!h.state.identity.is_privileged());
        assert_eq!(h.navigation.current(), crate::navigation::ViewState::SelfProfile);
        assert_eq!(h.stub.count("GET", "/api/user/info"), 1);
    }

    #[tokio::test]
    async fn delete_closes_modal_and_reloads() {
        let h = harness(StubAdminService::new()).await;
        let created = h
            .crud
            .create(draft("g@example.com", &["USER"]))
            .await
            .unwrap();
        let id = created.value().unwrap().id;
        h.stub.clear_calls();

        let modal = h.crud.open_delete_modal(id).await.unwrap();
        assert_eq!(modal.user.email, "g@example.com");

        let outcome = h.crud.delete(id).await.unwrap();
        assert_eq!(
            outcome.value().map(|r| r.message.as_str()),
            Some("User deleted successfully")
        );
        assert!(h.state.forms.delete_modal().is_none());
        assert_eq!(h.stub.count("GET", "/api/admin/users"), 1);
        assert!(!h.state.catalog.users().unwrap().contains(id));
    }

    #[tokio::test]
    async fn pending_submit_makes_second_submit_inert() {
        let stub = StubAdminService::new()
            .with_latency(std::time::Duration::from_millis(20));
        let h = harness(stub).await;

        let (first, second) = tokio::join!(
            h.crud.create(draft("a@example.com", &["USER"])),
            h.crud.create(draft("b@example.com", &["USER"])),
        );
        assert!(matches!(first.unwrap(), Submission::Completed { .. }));
        assert!(second.unwrap().is_ignored());
        assert_eq!(h.stub.count("POST", "/api/admin/users"), 1);
    }
}
