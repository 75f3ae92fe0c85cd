//! CLI command modules.

pub mod cache;
pub mod capture;
pub mod config;
