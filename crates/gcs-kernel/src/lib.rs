//! The Kernel: wires every component crate into one running system and
//! exposes the handful of operations that outlive a single conversation —
//! loading a named configuration, opening a conversation, and shutting
//! down cleanly.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod catalog;
mod error;
mod kernel;

pub use error::{KernelError, KernelResult};
pub use kernel::Kernel;
