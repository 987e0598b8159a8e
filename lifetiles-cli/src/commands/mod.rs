//! Subcommand implementations.

pub mod build;
pub mod config;
pub mod init;
pub mod inspect;
pub mod stats;
pub mod view;
