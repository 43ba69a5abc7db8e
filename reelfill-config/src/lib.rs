//! Shared configuration library for reelfill.
//!
//! Configuration is composed from built-in defaults, an optional TOML file and
//! the process environment (after loading `.env`). Secrets only ever come from
//! the environment and are held as [`ApiCredential`] values.

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::columns::{ColumnMap, ReviewUrlKind};
pub use models::credential::{ApiCredential, AuthStyle};
pub use models::retry::RetryPolicy;
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    Config, ConfigMetadata, NotionConfig, ProviderConfig, SyncConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
