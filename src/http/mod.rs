//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → middleware/ (concurrency cap)
//!     → gate.rs (method + declared length)
//!     → [body read, report store]
//!     → response.rs (status + text/plain body)
//!     → Send to client
//! ```

pub mod gate;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use gate::{GateRejection, RequestGate};
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use response::{IntakeError, IntakeReply};
pub use server::HttpServer;
