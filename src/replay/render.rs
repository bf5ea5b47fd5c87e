use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::ui::prelude::{Level, OutputFormat, get_output_format, separator};

use super::ass::{Cue, assemble_document};
use super::cli::{CheckArgs, InitConfigArgs, MapArgs, RenderArgs};
use super::config::{
    AuthorTable, CONFIG_FILE_NAME, DEFAULT_CONFIG_DOCUMENT, ReplayConfig, resolve_config_path,
};
use super::error::ReplayError;
use super::logging::log_event;
use super::snips::TimeOffsetMapper;
use super::timecode::Timecode;
use super::transcript::{ChatRecord, load_transcript};
use super::window::{fold_windows, frames_to_cues};
use super::wrap::{DisplayLine, MessageWrapper};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub records: usize,
    pub skipped_attachments: usize,
    pub attachments: usize,
    pub reactions: usize,
    pub messages: usize,
    pub lines: usize,
    pub frames: usize,
    pub cues: usize,
    pub first_message: Option<String>,
    pub last_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplayOutput {
    pub cues: Vec<Cue>,
    pub stats: ReplayStats,
}

/// Runs the whole conversion in memory: map, wrap, window, emit.
pub fn build_cues(records: &[ChatRecord], config: &ReplayConfig) -> Result<ReplayOutput> {
    let mapper = config.mapper()?;
    let authors = config.authors()?;
    let wrapper = MessageWrapper::new(&authors, config.max_line_width, config.width_mode)?;
    let closing = config.closing_time()?;

    let mut stats = ReplayStats {
        records: records.len(),
        ..ReplayStats::default()
    };

    let mut groups: Vec<Vec<DisplayLine>> = Vec::with_capacity(records.len());
    for record in records {
        stats.attachments += usize::from(record.has_attachment());
        stats.reactions += usize::from(record.has_reactions());
        if record.is_attachment_only() {
            stats.skipped_attachments += 1;
            continue;
        }
        let group = wrap_record(record, &mapper, &authors, &wrapper)
            .with_context(|| format!("Transcript line {}", record.line))?;
        stats.lines += group.len();
        groups.push(group);
    }

    if groups.is_empty() {
        return Err(ReplayError::EmptyTranscript.into());
    }
    stats.messages = groups.len();
    stats.first_message = groups.first().and_then(|g| g.first()).map(|l| l.time.to_string());
    stats.last_message = groups.last().and_then(|g| g.first()).map(|l| l.time.to_string());

    let frames = fold_windows(&groups, config.screen_height);
    stats.frames = frames.len();
    for (index, frame) in frames.iter().enumerate() {
        log_event(
            Level::Debug,
            "replay.window.frame",
            format!(
                "Window {index} at {}: {} static, {} new",
                frame.begin(),
                frame.lines.len() - frame.introduced,
                frame.introduced
            ),
        );
    }

    let cues = frames_to_cues(&frames, closing, &config.layout())?;
    stats.cues = cues.len();

    Ok(ReplayOutput { cues, stats })
}

fn wrap_record(
    record: &ChatRecord,
    mapper: &TimeOffsetMapper,
    authors: &AuthorTable,
    wrapper: &MessageWrapper<'_>,
) -> Result<Vec<DisplayLine>, ReplayError> {
    let name = record.author_name()?;
    let display_name = authors.display_name(&name);
    let sent_at = mapper.map(record.sent_at()?)?;
    wrapper.wrap(display_name, sent_at, &record.text)
}

struct LoadedProject {
    config: ReplayConfig,
    records: Vec<ChatRecord>,
}

fn load_project(config: Option<&Path>, transcript: &Path) -> Result<LoadedProject> {
    let config_path = resolve_config_path(config)?;
    log_event(
        Level::Debug,
        "replay.config.path",
        format!("Using config {}", config_path.display()),
    );
    let config = ReplayConfig::load_from_path(&config_path)?;
    log_snip_table(&config)?;

    let records = load_transcript(transcript)?;
    log_event(
        Level::Info,
        "replay.transcript.loaded",
        format!("Loaded {} transcript records", records.len()),
    );

    Ok(LoadedProject { config, records })
}

fn log_snip_table(config: &ReplayConfig) -> Result<()> {
    let mapper = config.mapper()?;
    for (index, state) in mapper.snips().states().iter().enumerate() {
        log_event(
            Level::Debug,
            "replay.snips.state",
            format!(
                "Snip {index}: {} - {} (removed before: {})",
                state.absolute_start, state.absolute_end, state.removed_before
            ),
        );
    }
    log_event(
        Level::Debug,
        "replay.snips.total",
        format!(
            "Chat offset {}, {} removed by snips",
            mapper.chat_offset(),
            mapper.snips().total_removed()
        ),
    );
    Ok(())
}

pub fn handle_render(args: RenderArgs) -> Result<()> {
    log_event(
        Level::Info,
        "replay.render.start",
        format!("Rendering chat replay from {}", args.transcript.display()),
    );

    let out_path = args
        .out_file
        .clone()
        .unwrap_or_else(|| args.transcript.with_extension("ass"));
    if out_path.exists() && !args.force {
        bail!(
            "Output file {} already exists (use --force to overwrite)",
            out_path.display()
        );
    }

    let project = load_project(args.config.as_deref(), &args.transcript)?;
    let output = build_cues(&project.records, &project.config)?;

    let header = match &args.header {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read header template {}", path.display()))?,
        None => project.config.ass_header().render(),
    };
    let document = assemble_document(&header, &output.cues, &project.config.layout());
    warn_skipped(&output.stats);

    write_atomically(&out_path, &document)?;

    log_event(
        Level::Success,
        "replay.render.written",
        format!(
            "Wrote {} cues for {} messages to {}",
            output.stats.cues,
            output.stats.messages,
            out_path.display()
        ),
    );
    Ok(())
}

pub fn handle_check(args: CheckArgs) -> Result<()> {
    let project = load_project(args.config.as_deref(), &args.transcript)?;
    let output = build_cues(&project.records, &project.config)?;
    let stats = &output.stats;

    separator(true);
    let data = serde_json::to_value(stats).ok();
    crate::ui::emit(
        Level::Success,
        "replay.check.ok",
        &format!("{} is ready to render", args.transcript.display()),
        data,
    );
    warn_skipped(stats);
    // The JSON event above already carries every number.
    if get_output_format() == OutputFormat::Json {
        return Ok(());
    }
    log_event(
        Level::Info,
        "replay.check.records",
        format!(
            "Records: {} ({} with attachments, {} with reactions)",
            stats.records, stats.attachments, stats.reactions
        ),
    );
    log_event(
        Level::Info,
        "replay.check.lines",
        format!("Messages: {}, wrapped lines: {}", stats.messages, stats.lines),
    );
    log_event(
        Level::Info,
        "replay.check.cues",
        format!("Windows: {}, cues: {}", stats.frames, stats.cues),
    );
    if let (Some(first), Some(last)) = (&stats.first_message, &stats.last_message) {
        log_event(
            Level::Info,
            "replay.check.span",
            format!("Messages span {first} - {last}"),
        );
    }
    separator(true);
    Ok(())
}

/// Attachments and reactions are not drawn; text-less messages vanish entirely.
fn warn_skipped(stats: &ReplayStats) {
    if stats.skipped_attachments > 0 {
        log_event(
            Level::Warn,
            "replay.transcript.skipped",
            format!(
                "Skipped {} attachment-only messages (no text to show)",
                stats.skipped_attachments
            ),
        );
    }
}

pub fn handle_map(args: MapArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = ReplayConfig::load_from_path(&config_path)?;
    let mapper = config.mapper()?;

    let raw: Timecode = args.timestamp.parse()?;
    let mapped = mapper.map(raw)?;

    crate::ui::emit(
        Level::Info,
        "replay.map.result",
        &format!("{raw} -> {mapped}"),
        Some(serde_json::json!({ "chat": raw.to_string(), "video": mapped.to_string() })),
    );
    Ok(())
}

pub fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    let path = args
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    write_atomically(&path, DEFAULT_CONFIG_DOCUMENT)?;
    log_event(
        Level::Success,
        "replay.config.written",
        format!("Wrote default config to {}", path.display()),
    );
    Ok(())
}

/// Writes through a temp file in the destination directory so a failed run
/// never leaves a partial file behind.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    Ok(())
}
