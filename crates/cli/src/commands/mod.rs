//! CLI subcommands

pub mod analyze;
