//! Library side of the `atlas` binary.
//!
//! - `cli`: argument parsing with clap
//! - `commands`: generate, resolve, manifest and fetch implementations

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, Target};
pub use commands::{
    handle_fetch, handle_generate, handle_manifest, handle_resolve, init_logging, load_settings,
    resolve_command,
};
