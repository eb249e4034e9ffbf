pub mod admin;

pub use admin::{AdminApiAdapter, AdminService};
