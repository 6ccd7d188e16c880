//! The Tool Registry: a shared, read-mostly catalogue of callable tools.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod event;
mod registry;

pub use event::RegistryEvent;
pub use registry::{RegistryEventReceiver, ToolRegistry};
