//! Layered configuration loading for ClinicSync
//!
//! Settings start from the type's `Default`, then each source is merged on
//! top in the order it was added:
//!
//! - **Files**: YAML (`.yaml`/`.yml`) or TOML (`.toml`), required or optional
//! - **Environment**: variables with a prefix, `__` separating nested keys
//!   (`CLINIC_SYNC_GATE__MIN_RATIO=0.9` sets `gate.min_ratio`)
//!
//! The extracted value is validated before it is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use config_engine::{ConfigLoader, ConfigSource};
//!
//! let config: EngineConfig = ConfigLoader::new()
//!     .add_source(ConfigSource::optional_file("clinic-sync.yaml"))
//!     .add_source(ConfigSource::env("CLINIC_SYNC_"))
//!     .load()?;
//! ```

pub mod error;
pub mod providers;
pub mod validation;

pub use error::*;
pub use providers::*;
pub use validation::*;
