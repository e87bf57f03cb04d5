//! # kkit
//!
//! Command-line front end of `kkit-core`: model document loading, TOML
//! configuration and the `export` / `status` commands.

pub mod cli;
pub mod config;
