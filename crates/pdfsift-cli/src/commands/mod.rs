//! CLI command handlers

pub mod chunk;
pub mod manifest;
pub mod outline;
pub mod run;
