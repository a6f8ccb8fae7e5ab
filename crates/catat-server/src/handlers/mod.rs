//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod documents;
pub mod parse;
pub mod transactions;
pub mod whatsapp;

// Re-export all handlers for use in router
pub use documents::*;
pub use parse::*;
pub use transactions::*;
pub use whatsapp::*;
