pub mod admin;
pub mod presenter;

pub use admin::{RecordedCall, StubAdminService, StubFailure, StubOperation};
pub use presenter::RecordingPresenter;
