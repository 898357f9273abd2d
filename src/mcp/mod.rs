//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides JSON-RPC validation, negotiation, formatting, method routing, and
//! the stdio transport.

pub mod methods;
pub mod rpc;
pub mod server;
pub mod transport;
