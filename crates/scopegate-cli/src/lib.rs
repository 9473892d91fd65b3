//! Scopegate CLI - administration of per-scope service toggles
//!
//! Loads configuration, opens the configured scope store, registers the
//! configured services and runs one admin subcommand against them.

pub mod command;
pub mod config;
pub mod startup;

pub use crate::command::{Cli, Command, GlobalArgs, run};
pub use crate::config::{Configuration, ServiceConfig};
