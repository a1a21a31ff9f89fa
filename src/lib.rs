pub mod commands;
pub mod completions;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod fs;
pub mod models;
pub mod process;
pub mod service;
pub mod stats;
pub mod utils;

/// ASCII art logo for the conduit CLI
pub const LOGO: &str = "\
  ┌─┐┌─┐┌┐┌┌┬┐┬ ┬┬┌┬┐
  │  │ ││││ │││ ││ │
  └─┘└─┘┘└┘─┴┘└─┘┴ ┴ ";
