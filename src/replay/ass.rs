//! ASS (Advanced SubStation Alpha) output.
//!
//! Every cue is a `Dialogue:` event anchored with `\pos`. Static lines share
//! one event joined with `\N`; freshly arrived lines get one event each,
//! faded in and pushed down with blank lines so they stack under the static
//! block.

use std::fmt::Write;

use super::config::Position;
use super::timecode::Timecode;
use super::wrap::DisplayLine;

/// Where and how cues are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueLayout {
    pub style: String,
    pub position: Position,
    pub fade_in_ms: u32,
    pub screen_height: usize,
}

/// One timed overlay instruction, ready to format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub begin: Timecode,
    pub end: Timecode,
    pub text: String,
}

impl Cue {
    pub fn to_dialogue_line(&self, layout: &CueLayout) -> String {
        format!(
            "Dialogue: 0,{begin},{end},{style},,0,0,0,,{{\\pos({x},{y})}}{text}",
            begin = self.begin,
            end = self.end,
            style = layout.style,
            x = layout.position.x,
            y = layout.position.y,
            text = self.text,
        )
    }
}

/// The unfaded block of lines already on screen. `None` when nothing is
/// static in this window.
pub fn static_cue(lines: &[DisplayLine], begin: Timecode, end: Timecode) -> Option<Cue> {
    if lines.is_empty() {
        return None;
    }
    let text = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\\N");
    Some(Cue { begin, end, text })
}

/// One faded cue per new line. The line `n` places from the bottom sits under
/// `screen_height - n` blank rows.
pub fn faded_cues(
    lines: &[DisplayLine],
    begin: Timecode,
    end: Timecode,
    layout: &CueLayout,
) -> Vec<Cue> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let from_bottom = lines.len() - index;
            // The space must come before \N, otherwise libass halves the
            // height of the blank rows.
            let padding = " \\N".repeat(layout.screen_height.saturating_sub(from_bottom));
            Cue {
                begin,
                end,
                text: format!(
                    "{{\\fad({},0)}}{padding}{}",
                    layout.fade_in_ms, line.text
                ),
            }
        })
        .collect()
}

/// Joiner placed after every chat backslash. Zero width, but it keeps `\N`,
/// `\n` and `\h` from being read as control sequences.
const BACKSLASH_BREAK: char = '\u{2060}';

/// Makes chat text render literally: backslash sequences are broken up and
/// override-block braces are escaped.
pub fn escape_ass_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => {
                escaped.push('\\');
                escaped.push(BACKSLASH_BREAK);
            }
            '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Built-in script header: script info, one style, and the events format line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssHeader {
    pub style: String,
    pub play_res: (u32, u32),
    pub font_name: String,
    pub font_size: u32,
}

impl AssHeader {
    /// Top-left aligned (7) so `\pos` anchors the first row.
    fn to_style_line(&self) -> String {
        format!(
            "Style: {name},{font},{size},&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,7,10,10,10,1",
            name = self.style,
            font = self.font_name,
            size = self.font_size,
        )
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(output, "[Script Info]");
        let _ = writeln!(output, "; Generated by chatsubs");
        let _ = writeln!(output, "ScriptType: v4.00+");
        let _ = writeln!(output, "PlayResX: {}", self.play_res.0);
        let _ = writeln!(output, "PlayResY: {}", self.play_res.1);
        let _ = writeln!(output, "WrapStyle: 2");
        let _ = writeln!(output, "ScaledBorderAndShadow: yes");
        let _ = writeln!(output);

        let _ = writeln!(output, "[V4+ Styles]");
        let _ = writeln!(
            output,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
        );
        let _ = writeln!(output, "{}", self.to_style_line());
        let _ = writeln!(output);

        let _ = writeln!(output, "[Events]");
        let _ = writeln!(
            output,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        );

        output
    }
}

/// Header text followed by one dialogue line per cue.
pub fn assemble_document(header: &str, cues: &[Cue], layout: &CueLayout) -> String {
    let mut output = String::with_capacity(header.len() + cues.len() * 96);
    output.push_str(header);
    if !header.is_empty() && !header.ends_with('\n') {
        output.push('\n');
    }
    let body = cues
        .iter()
        .map(|cue| cue.to_dialogue_line(layout))
        .collect::<Vec<_>>()
        .join("\n");
    output.push_str(&body);
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(screen_height: usize) -> CueLayout {
        CueLayout {
            style: "Chat Replay".to_string(),
            position: Position { x: 170, y: 15 },
            fade_in_ms: 1000,
            screen_height,
        }
    }

    fn line(text: &str) -> DisplayLine {
        DisplayLine::new(Timecode::ZERO, text)
    }

    #[test]
    fn dialogue_line_format() {
        let cue = Cue {
            begin: Timecode::from_hms(0, 4, 28),
            end: Timecode::from_hms(0, 4, 30),
            text: "hi".to_string(),
        };
        assert_eq!(
            cue.to_dialogue_line(&layout(24)),
            "Dialogue: 0,00:04:28.00,00:04:30.00,Chat Replay,,0,0,0,,{\\pos(170,15)}hi"
        );
    }

    #[test]
    fn static_cue_joins_with_hard_breaks() {
        let lines = [line("a"), line("b"), line("c")];
        let cue = static_cue(&lines, Timecode::ZERO, Timecode::from_centis(100)).unwrap();
        assert_eq!(cue.text, "a\\Nb\\Nc");
        assert!(static_cue(&[], Timecode::ZERO, Timecode::ZERO).is_none());
    }

    #[test]
    fn faded_cues_stack_from_the_bottom() {
        let lines = [line("first"), line("second")];
        let cues = faded_cues(&lines, Timecode::ZERO, Timecode::from_centis(100), &layout(4));
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "{\\fad(1000,0)} \\N \\Nfirst");
        assert_eq!(cues[1].text, "{\\fad(1000,0)} \\N \\N \\Nsecond");
    }

    #[test]
    fn escape_breaks_braces_and_backslash_sequences() {
        assert_eq!(escape_ass_text("{x} plain"), "\\{x\\} plain");
        assert_eq!(escape_ass_text("a\\Nb"), "a\\\u{2060}Nb");
        assert_eq!(escape_ass_text("C:\\New\\h"), "C:\\\u{2060}New\\\u{2060}h");
        assert!(!escape_ass_text("x\\ny\\hz").contains("\\n"));
    }

    #[test]
    fn header_contains_sections_and_style() {
        let header = AssHeader {
            style: "Chat Replay".to_string(),
            play_res: (1280, 720),
            font_name: "Arial".to_string(),
            font_size: 28,
        }
        .render();
        assert!(header.contains("[Script Info]"));
        assert!(header.contains("PlayResX: 1280"));
        assert!(header.contains("Style: Chat Replay,Arial,28,"));
        assert!(header.trim_end().ends_with("Effect, Text"));
    }

    #[test]
    fn document_appends_cues_after_header() {
        let cue = Cue {
            begin: Timecode::ZERO,
            end: Timecode::from_centis(50),
            text: "x".to_string(),
        };
        let doc = assemble_document("[Events]", &[cue.clone(), cue], &layout(24));
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[Events]");
        assert!(lines[1].starts_with("Dialogue: 0,00:00:00.00,00:00:00.50,"));
    }
}
