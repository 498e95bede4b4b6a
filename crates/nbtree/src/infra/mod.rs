//! Infrastructure adapters for configuration, notebook files, logging, and the terminal.

pub mod config;
pub mod interrupt;
pub mod logging;
pub mod notebook;
pub mod prompt;
