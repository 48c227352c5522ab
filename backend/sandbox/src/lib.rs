//! Embedded QuickJS sandbox for plugin scripts.
//!
//! Isolation is enforced at the host boundary: each call gets a throwaway
//! runtime with heap, stack, and wall-clock caps set from the Rust side, and
//! the only way out of the sandbox is through the host functions installed
//! by [`caps`].

pub mod caps;
pub mod client;
pub mod error;
pub mod host;
pub mod limits;

pub use caps::SandboxCapabilities;
pub use client::ModelClient;
pub use error::SandboxError;
pub use host::run_function;
pub use limits::SandboxLimits;
