//! Prompt Saver MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server that saves,
//! searches, and refines reusable prompt templates derived from past
//! conversations.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, and the main server
//! - **domains**: Business logic organized by bounded contexts
//!   - **library**: The prompt lifecycle engine (create, preview, update, improve, search)
//!   - **tools**: MCP tools that expose the lifecycle operations to clients
//! - **providers**: Embedding and completion provider adapters
//! - **storage**: The prompt store trait and its MongoDB implementation
pub mod core;
pub mod domains;
pub mod providers;
pub mod storage;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
