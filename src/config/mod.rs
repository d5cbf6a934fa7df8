//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + command-line overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → IntakeConfig (validated, immutable)
//!     → handed to the gate and store at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EndpointConfig, IntakeConfig, ListenerConfig, LogFormat, ObservabilityConfig, StoreConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
