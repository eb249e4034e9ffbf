//! Roster admin console library
//!
//! Orchestration for the user administration console: identity loading and
//! privilege gating, role catalog and user collection sync, view
//! navigation, create/edit/delete workflows and the render adapter that
//! turns state into frames. The `roster` binary in `src/main.rs` drives it
//! from the command line.
//!
//! Notes
//! - All server access goes through [`infra::services::AdminService`]; the
//!   in-memory implementation in [`infra::testing`] backs the test suites.
//! - Public items are subject to change while the console stabilizes.

pub mod app;
pub mod cli;
pub mod collection;
pub mod crud;
pub mod error;
pub mod identity;
pub mod infra;
pub mod navigation;
pub mod render;
pub mod state;

pub use app::{Action, ConsoleApp, Notice, NoticeBoard, NoticeLevel};
pub use error::{ConsoleError, ConsoleResult};
pub use navigation::{NavigationOutcome, Tab, ViewState};
pub use render::{Frame, Presenter, TextPresenter};
pub use state::{AppState, ConsoleSettings};
