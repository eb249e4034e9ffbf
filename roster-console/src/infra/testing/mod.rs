//! In-memory collaborators for exercising the console without a backend.

pub mod stubs;

pub use stubs::{
    RecordedCall, RecordingPresenter, StubAdminService, StubFailure,
    StubOperation,
};
