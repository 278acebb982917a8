//! CLI library components for the BUFR bundler.

pub mod cli;
pub mod commands;
pub mod logging;
