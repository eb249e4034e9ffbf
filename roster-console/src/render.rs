//! Pure conversions from console state to displayable frames, plus the
//! presenter seam they are handed to.

use parking_lot::Mutex;
use roster_model::{Identity, Role, User, UserId, join_names};
use std::io::Write;

use crate::{
    app::{Notice, NoticeLevel},
    collection::Collection,
    crud::{CreateForm, DeleteModal, EditModal},
    navigation::ViewState,
};

pub const EMPTY_COLLECTION_NOTICE: &str =
    "No users found. Create the first user.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub email: String,
    pub roles: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListView {
    Rows(Vec<UserRow>),
    Empty { notice: &'static str },
}

impl UserListView {
    pub fn row_count(&self) -> usize {
        match self {
            UserListView::Rows(rows) => rows.len(),
            UserListView::Empty { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub summary: String,
    pub row: UserRow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOption {
    pub value: String,
    pub label: String,
}

/// Everything a presenter can be asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    IdentitySummary(String),
    /// Identity could not be loaded; dependent views are degraded.
    IdentityUnavailable(String),
    View(ViewState),
    UserList(UserListView),
    SelfProfile(ProfileView),
    RoleOptions(Vec<RoleOption>),
    UserDetail(UserRow),
    CreateForm(CreateForm),
    EditModal(EditModal),
    DeleteModal(DeleteModal),
    Notice(Notice),
    LoginRedirect(String),
}

/// Receives frames after every state change. Registered once when the
/// console is built.
pub trait Presenter: Send + Sync {
    fn present(&self, frame: &Frame);
}

pub fn render_user(user: &User) -> UserRow {
    UserRow {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        age: user.age.map(|age| age.to_string()).unwrap_or_default(),
        email: user.email.clone(),
        roles: join_names(&user.roles),
    }
}

pub fn render_list(collection: &Collection) -> UserListView {
    if collection.is_empty() {
        return UserListView::Empty {
            notice: EMPTY_COLLECTION_NOTICE,
        };
    }
    UserListView::Rows(collection.iter().map(render_user).collect())
}

/// `"<email> with roles: A, B"`
pub fn identity_summary(identity: &Identity) -> String {
    format!(
        "{} with roles: {}",
        identity.email(),
        join_names(identity.roles())
    )
}

pub fn render_self_profile(identity: &Identity) -> ProfileView {
    ProfileView {
        summary: identity_summary(identity),
        row: render_user(identity.as_user()),
    }
}

/// Options in catalog order; the same list serves every form.
pub fn render_role_options(roles: &[Role]) -> Vec<RoleOption> {
    roles
        .iter()
        .map(|role| RoleOption {
            value: role.name.clone(),
            label: role.name.clone(),
        })
        .collect()
}

/// Line-oriented presenter for terminals and pipes.
pub struct TextPresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for TextPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPresenter").finish_non_exhaustive()
    }
}

impl TextPresenter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl Presenter for TextPresenter {
    fn present(&self, frame: &Frame) {
        let Some(text) = format_frame(frame) else {
            return;
        };
        let mut out = self.out.lock();
        if let Err(err) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            log::error!("Failed to write frame: {}", err);
        }
    }
}

fn format_row(row: &UserRow) -> String {
    format!(
        "{:>5}  {:<14} {:<14} {:>3}  {:<28} {}",
        row.id.to_string(),
        row.first_name,
        row.last_name,
        row.age,
        row.email,
        row.roles
    )
}

fn format_draft_fields(form: &roster_model::UserDraft) -> String {
    let age = form.age.map(|a| a.to_string()).unwrap_or_default();
    format!(
        "  First name: {}\n  Last name:  {}\n  Age:        {age}\n  Email:      {}\n  Roles:      {}",
        form.first_name,
        form.last_name,
        form.email,
        form.roles.join(", ")
    )
}

/// Text for one frame. View changes produce no output of their own.
pub fn format_frame(frame: &Frame) -> Option<String> {
    let text = match frame {
        Frame::IdentitySummary(summary) => format!("Signed in as {summary}"),
        Frame::IdentityUnavailable(reason) => {
            format!("Identity unavailable: {reason}")
        }
        Frame::View(_) => return None,
        Frame::UserList(UserListView::Empty { notice }) => notice.to_string(),
        Frame::UserList(UserListView::Rows(rows)) => {
            let mut out = format!(
                "{:>5}  {:<14} {:<14} {:>3}  {:<28} {}",
                "ID", "FIRST NAME", "LAST NAME", "AGE", "EMAIL", "ROLES"
            );
            for row in rows {
                out.push('\n');
                out.push_str(&format_row(row));
            }
            out
        }
        Frame::SelfProfile(profile) => {
            let row = &profile.row;
            format!(
                "{}\n  Id:         {}\n  First name: {}\n  Last name:  {}\n  Age:        {}\n  Email:      {}\n  Roles:      {}",
                profile.summary,
                row.id,
                row.first_name,
                row.last_name,
                row.age,
                row.email,
                row.roles
            )
        }
        Frame::RoleOptions(options) => {
            let names: Vec<&str> =
                options.iter().map(|o| o.label.as_str()).collect();
            format!("Available roles: {}", names.join(", "))
        }
        Frame::UserDetail(row) => format_row(row),
        Frame::CreateForm(form) => {
            let mut out = String::from("New user");
            if form.pending {
                out.push_str(" (saving)");
            }
            out.push('\n');
            out.push_str(&format_draft_fields(&form.draft));
            if let Some(error) = &form.error {
                out.push_str(&format!("\n  Error: {error}"));
            }
            out
        }
        Frame::EditModal(modal) => {
            let mut out = format!("Edit user {}\n", modal.user_id);
            out.push_str(&format_draft_fields(&modal.draft));
            if let Some(error) = &modal.error {
                out.push_str(&format!("\n  Error: {error}"));
            }
            out
        }
        Frame::DeleteModal(modal) => {
            let mut out = format!(
                "Delete user {}?\n{}",
                modal.user.id,
                format_row(&render_user(&modal.user))
            );
            if let Some(error) = &modal.error {
                out.push_str(&format!("\n  Error: {error}"));
            }
            out
        }
        Frame::Notice(notice) => match notice.level {
            NoticeLevel::Info => notice.message.clone(),
            NoticeLevel::Warning => format!("warning: {}", notice.message),
            NoticeLevel::Error => format!("error: {}", notice.message),
        },
        Frame::LoginRedirect(path) => {
            format!("Session is not authenticated; sign in at {path}")
        }
    };
    Some(text)
}
