//! Usage report intake service library.
//!
//! A single HTTP endpoint that accepts POSTed reports, checks their `date:`
//! field, and archives each one as a uniquely named file.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::IntakeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{ReportStore, StoreError};
