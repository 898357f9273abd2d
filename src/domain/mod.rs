//! Sample dataset and the resources/tools built on top of it
//!
//! Provides the users/projects store, document-root file access, and the
//! registrations the demo server exposes over MCP.

pub mod files;
pub mod resources;
pub mod store;
pub mod tools;
