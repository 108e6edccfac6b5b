//! Subcommand implementations.

pub mod common;
pub mod config;
pub mod font;
pub mod render;
pub mod tiles;
