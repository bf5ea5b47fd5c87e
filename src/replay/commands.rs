use anyhow::Result;

use super::cli::ReplayCommands;
use super::render::{handle_check, handle_init_config, handle_map, handle_render};

pub fn handle_replay_command(command: ReplayCommands) -> Result<()> {
    match command {
        ReplayCommands::Render(args) => handle_render(args),
        ReplayCommands::Check(args) => handle_check(args),
        ReplayCommands::Map(args) => handle_map(args),
        ReplayCommands::InitConfig(args) => handle_init_config(args),
    }
}
