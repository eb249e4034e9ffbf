pub mod api_client;
pub mod services;
/// In-memory service and presenter doubles, compiled unconditionally so
/// integration tests can use them.
pub mod testing;

pub use api_client::{ApiClient, ApiError};
