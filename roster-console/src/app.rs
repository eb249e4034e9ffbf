//! Console coordinator: turns operator actions into component calls and
//! hands the resulting frames to the presenter.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use roster_model::{UserDraft, UserId};
use std::sync::Arc;

use crate::{
    collection::CollectionSynchronizer,
    crud::{CrudOrchestrator, Submission},
    error::{ConsoleError, ConsoleResult},
    identity::{IdentityLoader, IdentityStatus},
    infra::services::AdminService,
    navigation::{NavigationController, NavigationOutcome, Tab, ViewState},
    render::{self, Frame, Presenter},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dismissible message shown outside any form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NoticeBoard {
    inner: Mutex<NoticeBoardInner>,
}

#[derive(Debug, Default)]
struct NoticeBoardInner {
    next_id: u64,
    active: Vec<Notice>,
}

impl NoticeBoard {
    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) -> Notice {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let notice = Notice {
            id: inner.next_id,
            level,
            message: message.into(),
        };
        inner.active.push(notice.clone());
        notice
    }

    /// False when no notice had that id.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.active.len();
        inner.active.retain(|notice| notice.id != id);
        inner.active.len() != before
    }

    pub fn active(&self) -> Vec<Notice> {
        self.inner.lock().active.clone()
    }
}

#[derive(Clone, Debug)]
pub enum Action {
    /// Load the identity, take the initial gating decision and enter the
    /// resulting view.
    Start,
    /// Load the identity and take the initial gating decision only.
    Identify,
    Navigate(String),
    SelectTab(Tab),
    RefreshUsers,
    RefreshRoles,
    ShowUser(UserId),
    SubmitCreate(UserDraft),
    ResetCreate,
    OpenEdit(UserId),
    SubmitEdit(UserId, UserDraft),
    CloseEdit,
    OpenDelete(UserId),
    ConfirmDelete(UserId),
    CloseDelete,
    DismissNotice(u64),
}

impl Action {
    /// Returns a sanitized display string that hides credential data
    pub fn sanitized_display(&self) -> String {
        match self {
            Self::SubmitCreate(draft) => {
                format!("SubmitCreate(email: {}, password: ***)", draft.email)
            }
            Self::SubmitEdit(id, draft) => {
                let password = if draft.password.is_blank() {
                    "<unchanged>"
                } else {
                    "***"
                };
                format!("SubmitEdit({id}, password: {password})")
            }

            _ => format!("{:?}", self),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Console::Start",
            Self::Identify => "Console::Identify",
            Self::Navigate(_) => "Console::Navigate",
            Self::SelectTab(_) => "Console::SelectTab",
            Self::RefreshUsers => "Console::RefreshUsers",
            Self::RefreshRoles => "Console::RefreshRoles",
            Self::ShowUser(_) => "Console::ShowUser",

            Self::SubmitCreate(_) => "Console::SubmitCreate",
            Self::ResetCreate => "Console::ResetCreate",

            Self::OpenEdit(_) => "Console::OpenEdit",
            Self::SubmitEdit(_, _) => "Console::SubmitEdit",
            Self::CloseEdit => "Console::CloseEdit",

            Self::OpenDelete(_) => "Console::OpenDelete",
            Self::ConfirmDelete(_) => "Console::ConfirmDelete",
            Self::CloseDelete => "Console::CloseDelete",

            Self::DismissNotice(_) => "Console::DismissNotice",
        }
    }
}

pub struct ConsoleApp {
    state: Arc<AppState>,
    identity: IdentityLoader,
    collection: CollectionSynchronizer,
    navigation: NavigationController,
    crud: CrudOrchestrator,
    presenter: Arc<dyn Presenter>,
    notices: NoticeBoard,
}

impl std::fmt::Debug for ConsoleApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleApp")
            .field("view", &self.state.view.current())
            .field("notices", &self.notices)
            .finish_non_exhaustive()
    }
}

impl ConsoleApp {
    pub fn new(
        state: Arc<AppState>,
        service: Arc<dyn AdminService>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let identity = IdentityLoader::new(state.clone(), service.clone());
        let collection =
            CollectionSynchronizer::new(state.clone(), service.clone());
        let navigation = NavigationController::new(state.clone());
        let crud = CrudOrchestrator::new(
            state.clone(),
            service,
            collection.clone(),
            identity.clone(),
            navigation.clone(),
        );

        Self {
            state,
            identity,
            collection,
            navigation,
            crud,
            presenter,
            notices: NoticeBoard::default(),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn view(&self) -> ViewState {
        self.navigation.current()
    }

    /// Run one action to completion.
    ///
    /// Failures are reported to the presenter before being returned;
    /// `Unauthorized` becomes a login redirect rather than a notice.
    pub async fn dispatch(&self, action: Action) -> ConsoleResult<()> {
        debug!("Console dispatch: {}", action.sanitized_display());
        let name = action.name();

        let result = match action {
            Action::Start => self.start(true).await,
            Action::Identify => self.start(false).await,
            Action::Navigate(path) => self.navigate(&path).await.map(|_| ()),
            Action::SelectTab(tab) => self.select_tab(tab).await,
            Action::RefreshUsers => self.refresh_users().await,
            Action::RefreshRoles => self.refresh_roles().await,
            Action::ShowUser(id) => self.show_user(id).await,
            Action::SubmitCreate(draft) => self.submit_create(draft).await,
            Action::ResetCreate => {
                self.crud.reset_create_form();
                self.present(Frame::CreateForm(
                    self.state.forms.create_form(),
                ));
                Ok(())
            }
            Action::OpenEdit(id) => self.open_edit(id).await,
            Action::SubmitEdit(id, draft) => self.submit_edit(id, draft).await,
            Action::CloseEdit => {
                self.crud.close_edit_modal();
                Ok(())
            }
            Action::OpenDelete(id) => self.open_delete(id).await,
            Action::ConfirmDelete(id) => self.confirm_delete(id).await,
            Action::CloseDelete => {
                self.crud.close_delete_modal();
                Ok(())
            }
            Action::DismissNotice(id) => {
                self.notices.dismiss(id);
                Ok(())
            }
        };

        self.reported(name, result)
    }

    /// Same as dispatching [`Action::Navigate`], but hands back the gate's
    /// decision.
    pub async fn open(&self, path: &str) -> ConsoleResult<NavigationOutcome> {
        debug!("Console dispatch: Navigate({:?})", path);
        let result = self.navigate(path).await;
        self.reported("Console::Navigate", result)
    }

    fn reported<T>(
        &self,
        name: &str,
        result: ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        if let Err(err) = &result {
            error!("{} failed ({}): {}", name, err.kind(), err);
            self.report(err);
        }
        result
    }

    /// Run the navigation gate for `path`; privileged data is only
    /// requested once the gate let the caller in.
    async fn navigate(&self, path: &str) -> ConsoleResult<NavigationOutcome> {
        let outcome = self.navigation.navigate(path);
        match &outcome {
            NavigationOutcome::Entered(view) => self.enter(*view).await?,
            NavigationOutcome::Redirected { requested, to } => {
                warn!("Redirected from {} to {:?}", requested, to);
                self.notify(
                    NoticeLevel::Warning,
                    format!("{requested} requires the {} role", self.state.settings.privileged_role),
                );
                self.enter(*to).await?;
            }
            NavigationOutcome::LoginBoundary(login) => {
                self.present(Frame::LoginRedirect(login.clone()));
            }
            NavigationOutcome::Unknown(path) => {
                return Err(ConsoleError::NotFound(format!(
                    "no view at {path}"
                )));
            }
        }
        Ok(outcome)
    }

    async fn start(&self, enter: bool) -> ConsoleResult<()> {
        match self.identity.load_identity().await {
            Ok(identity) => {
                self.present(Frame::IdentitySummary(render::identity_summary(
                    &identity,
                )));
                let view = self.navigation.initial();
                if enter {
                    self.enter(view).await
                } else {
                    self.present(Frame::View(view));
                    Ok(())
                }
            }
            Err(err) => {
                if !err.is_unauthorized() {
                    self.present(Frame::IdentityUnavailable(err.to_string()));
                    self.navigation.initial();
                }
                Err(err)
            }
        }
    }

    async fn enter(&self, view: ViewState) -> ConsoleResult<()> {
        self.present(Frame::View(view));
        match view {
            ViewState::Console(Tab::List) => {
                let (roles, users) =
                    tokio::join!(self.refresh_roles(), self.refresh_users());
                roles.and(users)
            }
            ViewState::Console(Tab::Create) => {
                self.refresh_roles().await?;
                self.present(Frame::CreateForm(self.state.forms.create_form()));
                Ok(())
            }
            ViewState::SelfProfile => {
                self.present_self_profile();
                Ok(())
            }
        }
    }

    fn present_self_profile(&self) {
        match self.state.identity.status() {
            IdentityStatus::Loaded { identity, .. } => {
                self.present(Frame::SelfProfile(render::render_self_profile(
                    &identity,
                )));
            }
            IdentityStatus::Unavailable { reason } => {
                self.present(Frame::IdentityUnavailable(reason));
            }
            IdentityStatus::NotLoaded | IdentityStatus::LoginRequired => {
                self.present(Frame::LoginRedirect(
                    self.state.settings.navigation.login_path.clone(),
                ));
            }
        }
    }

    async fn select_tab(&self, tab: Tab) -> ConsoleResult<()> {
        let view = self
            .navigation
            .select_tab(tab)
            .map_err(|err| ConsoleError::Validation(err.to_string()))?;
        self.enter(view).await
    }

    fn require_console(&self) -> ConsoleResult<()> {
        if self.navigation.current().is_console() {
            Ok(())
        } else {
            Err(ConsoleError::Validation(
                "this action is only available in the console view".into(),
            ))
        }
    }

    async fn refresh_users(&self) -> ConsoleResult<()> {
        self.require_console()?;
        let collection = self.collection.load_users().await?;
        self.present(Frame::UserList(render::render_list(&collection)));
        Ok(())
    }

    async fn refresh_roles(&self) -> ConsoleResult<()> {
        self.require_console()?;
        let roles = self.collection.load_roles().await?;
        self.present(Frame::RoleOptions(render::render_role_options(&roles)));
        Ok(())
    }

    async fn show_user(&self, id: UserId) -> ConsoleResult<()> {
        self.require_console()?;
        let user = self
            .collection
            .fetch_user(id)
            .await
            .map_err(|err| could_not_load(id, err))?;
        self.present(Frame::UserDetail(render::render_user(&user)));
        Ok(())
    }

    async fn submit_create(&self, draft: UserDraft) -> ConsoleResult<()> {
        self.require_console()?;
        match self.crud.create(draft).await {
            Ok(Submission::Completed { value, resync }) => {
                self.notify(
                    NoticeLevel::Info,
                    format!("Created user {} ({})", value.email, value.id),
                );
                self.present(Frame::View(self.navigation.current()));
                self.after_mutation(resync)
            }
            Ok(Submission::Ignored) => Ok(()),
            Err(err) => {
                self.present(Frame::CreateForm(self.state.forms.create_form()));
                Err(err)
            }
        }
    }

    async fn open_edit(&self, id: UserId) -> ConsoleResult<()> {
        self.require_console()?;
        let modal = self
            .crud
            .open_edit_modal(id)
            .await
            .map_err(|err| could_not_load(id, err))?;
        self.present(Frame::RoleOptions(render::render_role_options(
            &self.state.catalog.roles(),
        )));
        self.present(Frame::EditModal(modal));
        Ok(())
    }

    async fn submit_edit(&self, id: UserId, draft: UserDraft) -> ConsoleResult<()> {
        let editing_self = self.state.identity.is_self(id);
        match self.crud.update(id, draft).await {
            Ok(Submission::Completed { value, resync }) => {
                self.notify(
                    NoticeLevel::Info,
                    format!("Updated user {} ({})", value.email, value.id),
                );
                if editing_self
                    && let Some(identity) = self.state.identity.current()
                {
                    self.present(Frame::IdentitySummary(
                        render::identity_summary(&identity),
                    ));
                }
                let view = self.navigation.current();
                if !view.is_console() {
                    self.present(Frame::View(view));
                    self.present_self_profile();
                }
                self.after_mutation(resync)
            }
            Ok(Submission::Ignored) => Ok(()),
            Err(err) => {
                if let Some(modal) = self.state.forms.edit_modal() {
                    self.present(Frame::EditModal(modal));
                }
                Err(err)
            }
        }
    }

    async fn open_delete(&self, id: UserId) -> ConsoleResult<()> {
        self.require_console()?;
        let modal = self
            .crud
            .open_delete_modal(id)
            .await
            .map_err(|err| could_not_load(id, err))?;
        self.present(Frame::RoleOptions(render::render_role_options(
            &self.state.catalog.roles(),
        )));
        self.present(Frame::DeleteModal(modal));
        Ok(())
    }

    async fn confirm_delete(&self, id: UserId) -> ConsoleResult<()> {
        match self.crud.delete(id).await {
            Ok(Submission::Completed { value, resync }) => {
                self.notify(NoticeLevel::Info, value.message);
                self.after_mutation(resync)
            }
            Ok(Submission::Ignored) => Ok(()),
            Err(err) => {
                if let Some(modal) = self.state.forms.delete_modal() {
                    self.present(Frame::DeleteModal(modal));
                }
                Err(err)
            }
        }
    }

    /// Show the reloaded collection, or report why it could not be reloaded.
    fn after_mutation(&self, resync: Option<ConsoleError>) -> ConsoleResult<()> {
        match resync {
            None => {
                if self.navigation.current().is_console()
                    && let Some(collection) = self.state.catalog.users()
                {
                    self.present(Frame::UserList(render::render_list(
                        &collection,
                    )));
                }
                Ok(())
            }
            Some(err) => {
                warn!("Mutation applied but reload failed: {}", err);
                Err(err)
            }
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = self.notices.push(level, message);
        if level == NoticeLevel::Info {
            info!("{}", notice.message);
        }
        self.present(Frame::Notice(notice));
    }

    fn report(&self, err: &ConsoleError) {
        if err.is_unauthorized() {
            self.present(Frame::LoginRedirect(
                self.state.settings.navigation.login_path.clone(),
            ));
        } else {
            self.notify(NoticeLevel::Error, err.to_string());
        }
    }

    fn present(&self, frame: Frame) {
        self.presenter.present(&frame);
    }
}

fn could_not_load(id: UserId, err: ConsoleError) -> ConsoleError {
    match err {
        ConsoleError::NotFound(message) => ConsoleError::NotFound(format!(
            "could not load user {id}: {message}"
        )),
        other => other,
    }
}
