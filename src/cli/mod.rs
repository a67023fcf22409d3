//! CLI module for loopcycle - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
