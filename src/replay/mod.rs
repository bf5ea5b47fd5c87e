pub mod ass;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
mod logging;
mod render;
pub mod snips;
pub mod timecode;
pub mod transcript;
pub mod window;
pub mod wrap;

pub use cli::ReplayCommands;
pub use commands::handle_replay_command;
