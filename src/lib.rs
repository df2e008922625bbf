//! Host-side loader for configuration customisation modules.
//!
//! Discovers loadable modules, matches them against the configuration
//! sections declared on the host, and hands each module the customisation
//! source of the first section it accepts.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: run settings and the INI-based section registry
//! - **[`index`]**: logical file name to customisation source lookup
//! - **[`modules`]**: module discovery, loading and capability resolution
//! - **[`dispatch`]**: the per-module matching pass and the run loop
//! - **[`commands`]**: top-level subcommand orchestration (`run`, `plan`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod logging;
pub mod modules;
pub mod operations;
