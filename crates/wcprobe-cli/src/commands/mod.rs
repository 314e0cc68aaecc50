//! CLI command implementations.

pub mod config;
pub mod init;
pub mod random;
pub mod run;
pub mod version;
