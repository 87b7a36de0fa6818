//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AltTongConfig (validated, immutable)
//!     → handed to the controller, proxy and admin API at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The candidate language list is NOT config: it is runtime state
//!   persisted through `storage`, edited via the admin API

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    AdminConfig, AltTongConfig, HostConfig, I18nConfig, ListenerConfig, MenuConfig,
    ObservabilityConfig, StorageConfig, TimeoutConfig, ToggleStyle,
};
