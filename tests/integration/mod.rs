//! Integration tests for the conduit manager
//!
//! The container engine and process runner are replaced by in-memory
//! doubles, so these run without docker or root.

pub mod dashboard;
pub mod engine;
pub mod helpers;
pub mod lifecycle;
pub mod settings_file;
