//! CLI subcommand implementations.

pub mod catalogue;
pub mod common;
pub mod decode;
pub mod encode;
pub mod lower;
