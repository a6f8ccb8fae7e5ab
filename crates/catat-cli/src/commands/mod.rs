//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - init/parse/status commands and shared utilities (open_db)
//! - `serve` - Web server command
//! - `transactions` - Transaction listing

pub mod core;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use serve::*;
pub use transactions::*;
