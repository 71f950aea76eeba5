//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! getset.toml (optional) + .env / environment (API_URL)
//!     → loader.rs (parse, deserialize, apply overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! Network selection is owned here, before the session starts; the session
//! only reads it. The signing key is never part of the config file.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ArtifactConfig, NetworkConfig, ObservabilityConfig};
