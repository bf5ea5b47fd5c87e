use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

struct TestEnvironment {
    dir: TempDir,
}

impl TestEnvironment {
    fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

struct CommandOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// Runs the binary inside the test directory, isolated from the user's config.
fn run_chatsubs_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_chatsubs"))
        .args(args)
        .current_dir(env.path())
        .env("HOME", env.path())
        .env("XDG_CONFIG_HOME", env.path().join("xdg"))
        .env("NO_COLOR", "1")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

const CONFIG: &str = r##"
chat_offset = "04:03:52"
closing_time = "00:10:00.00"
screen_height = 3
snips = [["00:05:20.00", "00:05:54.00"]]

[palette]
mods = "#205F70"

[colors]
Bob = "mods"
Ann = "#F1C40F"
"##;

const TRANSCRIPT: &str = "AuthorID;Date;Content;Attachments;Reactions;Extra
\"Bob#0001\";\"04:08:20\";\"hello\";\"\";\"\";
\"Ann#0002\";\"04:08:25\";\"\";\"pic.png\";\"\";
\"Ann#0002\";\"04:08:25\";\"hi bob\";\"\";\"\";
";

#[test]
fn render_writes_ass_next_to_transcript() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("chatsubs.toml", CONFIG)?;
    let transcript = env.write("chat.csv", TRANSCRIPT)?;

    let output = run_chatsubs_command(&env, &["render", "chat.csv"])?;
    assert_eq!(output.exit_code, 0, "render failed: {}", output.stderr);

    let document = fs::read_to_string(transcript.with_extension("ass"))?;
    assert!(document.starts_with("[Script Info]"));
    assert!(document.contains("Style: Chat Replay,Arial,28,"));

    let dialogue: Vec<&str> = document
        .lines()
        .filter(|line| line.starts_with("Dialogue:"))
        .collect();
    assert_eq!(dialogue.len(), 6);
    assert_eq!(
        dialogue[0],
        "Dialogue: 0,00:00:00.00,00:04:28.00,Chat Replay,,0,0,0,,{\\pos(170,15)} \\N "
    );
    assert!(dialogue[3].ends_with("{\\c&H705F20&}Bob: {\\c&HFFFFFF&}hello"));
    assert!(dialogue[5].starts_with("Dialogue: 0,00:04:33.00,00:10:00.00,"));
    assert!(dialogue[5].ends_with("{\\c&H0FC4F1&}Ann: {\\c&HFFFFFF&}hi bob"));
    Ok(())
}

#[test]
fn render_refuses_to_overwrite_without_force() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("chatsubs.toml", CONFIG)?;
    env.write("chat.csv", TRANSCRIPT)?;
    let existing = env.write("out.ass", "keep me")?;

    let output = run_chatsubs_command(&env, &["render", "chat.csv", "-o", "out.ass"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("already exists"));
    assert_eq!(fs::read_to_string(&existing)?, "keep me");

    let output = run_chatsubs_command(&env, &["render", "chat.csv", "-o", "out.ass", "--force"])?;
    assert_eq!(output.exit_code, 0, "render failed: {}", output.stderr);
    assert!(fs::read_to_string(&existing)?.contains("[Events]"));
    Ok(())
}

#[test]
fn unknown_author_fails_without_output() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("chatsubs.toml", CONFIG)?;
    let transcript = env.write(
        "chat.csv",
        "AuthorID;Date;Content;Attachments;Reactions;Extra\n\"Eve#0003\";\"04:08:20\";\"hi\";\"\";\"\";\n",
    )?;

    let output = run_chatsubs_command(&env, &["render", "chat.csv"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No color configured for author 'Eve'"));
    assert!(!transcript.with_extension("ass").exists());
    Ok(())
}

#[test]
fn map_applies_offset_and_snips() -> Result<()> {
    let env = TestEnvironment::new()?;
    let config = env.write("replay.toml", CONFIG)?;
    let config = config.to_string_lossy().to_string();

    let output = run_chatsubs_command(&env, &["map", "04:08:20", "--config", &config])?;
    assert_eq!(output.exit_code, 0, "map failed: {}", output.stderr);
    assert!(output.stdout.contains("04:08:20.00 -> 00:04:28.00"));

    // 00:05:30 falls inside the snip and collapses onto its start.
    let output = run_chatsubs_command(&env, &["map", "04:09:22", "--config", &config])?;
    assert!(output.stdout.contains("-> 00:05:20.00"));

    let output = run_chatsubs_command(&env, &["map", "04:00:00", "--config", &config])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("before the video start"));
    Ok(())
}

#[test]
fn check_reports_stats_as_json() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("chatsubs.toml", CONFIG)?;
    env.write("chat.csv", TRANSCRIPT)?;

    let output = run_chatsubs_command(&env, &["--json", "check", "chat.csv"])?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);

    let events: Vec<serde_json::Value> = output
        .stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    let ok = events
        .iter()
        .find(|event| event["code"] == "replay.check.ok")
        .expect("check event");
    assert_eq!(ok["data"]["records"], 3);
    assert_eq!(ok["data"]["skipped_attachments"], 1);
    assert_eq!(ok["data"]["attachments"], 1);
    assert!(output.stderr.contains("\"code\":\"replay.transcript.skipped\""));
    assert_eq!(ok["data"]["messages"], 2);
    assert_eq!(ok["data"]["cues"], 6);
    Ok(())
}

#[test]
fn init_config_writes_a_usable_starter() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_chatsubs_command(&env, &["init-config"])?;
    assert_eq!(output.exit_code, 0, "init-config failed: {}", output.stderr);
    assert!(env.path().join("chatsubs.toml").exists());

    let output = run_chatsubs_command(&env, &["init-config"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("already exists"));

    let output = run_chatsubs_command(&env, &["map", "00:10:00"])?;
    assert_eq!(output.exit_code, 0, "map failed: {}", output.stderr);
    assert!(output.stdout.contains("-> 00:10:00.00"));
    Ok(())
}

#[test]
fn missing_config_points_at_init() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("chat.csv", TRANSCRIPT)?;

    let output = run_chatsubs_command(&env, &["check", "chat.csv"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("chatsubs init-config"));
    Ok(())
}
