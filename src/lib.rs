//! Container entrypoint for MCDReforged-managed Minecraft servers.
//!
//! On start the launcher runs first-time setup, derives the game server's launch
//! command from the environment ([`launch::build`]), patches configuration with
//! the start hook ([`hook::run`]) and finally replaces itself with the expanded
//! `STARTUP` command.

#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all)]

pub mod cli;
pub mod command;
pub mod error;
pub mod exec;
pub mod handler;
pub mod hook;
pub mod init;
pub mod launch;
pub mod logging;
mod macros;
pub mod memory;
pub mod settings;
pub mod startup;
pub mod vars;
pub mod versions;

pub use error::LaunchError;
pub use launch::{LaunchCommand, LaunchEnv, LaunchPlan, Layout};
