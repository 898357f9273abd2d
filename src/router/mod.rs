//! Resource and tool routing
//!
//! Maps resource identifiers and tool names onto registered handlers. Both
//! registries are built once at startup and only read afterwards.

pub mod resources;
pub mod subscriptions;
pub mod template;
pub mod tools;
