mod replay;
mod ui;

use clap::Parser;

use crate::replay::{ReplayCommands, handle_replay_command};
use crate::ui::prelude::{Level, OutputFormat, emit};

/// Chat replay subtitle generator
#[derive(Parser, Debug)]
#[command(name = "chatsubs", author, version, about, long_about = None)]
struct Cli {
    /// Print debug events (config resolution, snip table)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit one JSON event per line instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: ReplayCommands,
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.no_color && !cli.json);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = handle_replay_command(cli.command) {
        emit(Level::Error, "replay.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
