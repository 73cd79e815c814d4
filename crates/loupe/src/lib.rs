//! Loupe - a query tool for JSON-line log files.
//!
//! This crate provides both the CLI application and a small library for
//! loading log directories and rendering records.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod error;
pub mod loader;
pub mod output;

// Public CLI module (needed by binary)
pub mod cli;
