//! Named-configuration manifests and environment-variable layering for the
//! GCS runtime: discovers and validates `CONFIG_DIR`/*.toml manifests, and
//! assembles process-environment overrides into one [`Settings`] value read
//! once at kernel construction.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod loader;
mod manifest;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{config_dir, list, list_from, load, load_from};
pub use manifest::{parse, ConfigManifest};
pub use settings::Settings;
