//! Wire types for the stealth-browser engine and the EMR automation layer.
//!
//! This crate contains the serde-serializable types that cross a process or
//! module boundary: the launch configuration fed to the engine's launcher
//! over stdin, the WebSocket endpoint it advertises on stdout, the typed
//! shapes returned by in-page lookups, and the uniform result envelope every
//! automation operation returns.
//!
//! Types in this crate are pure data - no behavior beyond construction and
//! serialization. The automation logic lives in `emrpilot`.

pub mod launch;
pub mod query;
pub mod result;
pub mod types;

pub use launch::*;
pub use query::*;
pub use result::*;
pub use types::*;
