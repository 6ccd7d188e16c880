#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Credential Store and OAuth Device-Flow Client: persists refreshable
//! OAuth credentials to disk and drives the device-authorization grant
//! used to obtain them.

pub mod credentials;
pub mod device_flow;
mod error;
mod status;

pub use credentials::{CredentialStore, CredentialStoreConfig, Credentials};
pub use device_flow::{DeviceAuthorization, DeviceFlowClient, DeviceFlowConfig, Pkce};
pub use error::{AuthError, AuthResult};
pub use status::{AuthStatus, status};
