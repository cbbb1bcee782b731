//! JSON-RPC 2.0 stdio bridge exposing the connector as MCP tools.

pub mod server;
pub mod tools;

pub use server::run_stdio_server;
