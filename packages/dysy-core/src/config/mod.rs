//! Session Configuration
//!
//! Two tiers:
//! - Preset: one word (`fast`, `balanced`, `thorough`)
//! - YAML v1: preset plus field overrides
//!
//! ```rust,ignore
//! use dysy_core::config::{Preset, SessionConfig};
//!
//! let config = SessionConfig::preset(Preset::Fast);
//! let config = SessionConfig::from_yaml("dysy.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod preset;
pub mod session_config;

pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use session_config::SessionConfig;
