pub mod common;
pub mod health;
pub mod install;
pub mod lifecycle;
pub mod logs;
pub mod menu;
pub mod settings;
pub mod stats;
pub mod status;
pub mod uninstall;
pub mod update;
