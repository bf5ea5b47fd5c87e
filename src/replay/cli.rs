use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum ReplayCommands {
    /// Render a chat transcript into an ASS subtitle overlay
    Render(RenderArgs),
    /// Validate a transcript against the config and show statistics
    Check(CheckArgs),
    /// Map a chat timestamp onto the edited video timeline
    Map(MapArgs),
    /// Write a commented starter config
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Semicolon-separated chat transcript
    #[arg(value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Config file; defaults to ./chatsubs.toml, then the user config directory
    #[arg(short = 'c', long = "config", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// ASS header to use verbatim instead of the built-in one
    #[arg(long = "header", value_hint = ValueHint::FilePath)]
    pub header: Option<PathBuf>,

    /// Optional output file path; defaults to <transcript>.ass next to the transcript
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Semicolon-separated chat transcript
    #[arg(value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Config file; defaults to ./chatsubs.toml, then the user config directory
    #[arg(short = 'c', long = "config", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Raw chat timestamp (HH:MM:SS[.ss])
    pub timestamp: String,

    /// Config file; defaults to ./chatsubs.toml, then the user config directory
    #[arg(short = 'c', long = "config", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    /// Where to write the config (defaults to ./chatsubs.toml)
    #[arg(value_hint = ValueHint::FilePath)]
    pub path: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}
