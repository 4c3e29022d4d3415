//! Subcommand implementations

pub mod inspect;
pub mod tag;
