//! Chat transcript loading.
//!
//! Transcripts are semicolon-separated exports with a header row and six
//! fields per record: author, timestamp, message, attachments, reactions and
//! one unused column. Fields may be quoted; quoted fields can hold `;` and
//! line breaks, and escape `"` by doubling it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::error::ReplayError;
use super::timecode::Timecode;

pub const FIELD_COUNT: usize = 6;

/// One transcript row. Fields are kept exactly as written, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    /// 1-based line the record starts on.
    pub line: usize,
    pub author: String,
    pub timestamp: String,
    pub text: String,
    pub attachment: String,
    pub reactions: String,
}

impl ChatRecord {
    fn from_fields(line: usize, fields: Vec<String>) -> Result<Self, ReplayError> {
        let found = fields.len();
        let Ok([author, timestamp, text, attachment, reactions, _unused]) =
            <[String; FIELD_COUNT]>::try_from(fields)
        else {
            return Err(ReplayError::FieldCount {
                line,
                expected: FIELD_COUNT,
                found,
            });
        };

        Ok(Self {
            line,
            author,
            timestamp,
            text,
            attachment,
            reactions,
        })
    }

    /// True when the message carried only an attachment and no text.
    pub fn is_attachment_only(&self) -> bool {
        self.text.is_empty() || self.text == "\"\""
    }

    pub fn has_attachment(&self) -> bool {
        !unquote(&self.attachment).trim().is_empty()
    }

    pub fn has_reactions(&self) -> bool {
        !unquote(&self.reactions).trim().is_empty()
    }

    /// Author name with the `#discriminator` suffix removed.
    pub fn author_name(&self) -> Result<String, ReplayError> {
        let author = unquote(&self.author);
        match author.split_once('#') {
            Some((name, _discriminator)) => Ok(name.to_string()),
            None => Err(ReplayError::MissingDiscriminator {
                line: self.line,
                author,
            }),
        }
    }

    pub fn sent_at(&self) -> Result<Timecode, ReplayError> {
        unquote(&self.timestamp).parse()
    }
}

/// Strips one pair of surrounding quotes and collapses doubled quotes.
pub fn unquote(field: &str) -> String {
    let inner = field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(field);
    inner.replace("\"\"", "\"")
}

pub fn load_transcript(path: &Path) -> Result<Vec<ChatRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    parse_transcript(&contents)
        .with_context(|| format!("Failed to parse transcript {}", path.display()))
}

/// Parses a transcript, dropping the header row and blank lines.
pub fn parse_transcript(input: &str) -> Result<Vec<ChatRecord>, ReplayError> {
    let rows = split_rows(input)?;
    rows.into_iter()
        .skip(1)
        .filter(|(_, fields)| !(fields.len() == 1 && fields[0].trim().is_empty()))
        .map(|(line, fields)| ChatRecord::from_fields(line, fields))
        .collect()
}

/// Splits input into rows of raw fields, honoring quotes.
fn split_rows(input: &str) -> Result<Vec<(usize, Vec<String>)>, ReplayError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                field.push(c);
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ';' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                rows.push((row_start, std::mem::take(&mut fields)));
                line += 1;
                row_start = line;
            }
            '\n' => {
                field.push(c);
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ReplayError::UnterminatedQuote { line: row_start });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push((row_start, fields));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "AuthorID;Date;Content;Attachments;Reactions;Extra\n";

    #[test]
    fn parses_records_after_header() {
        let input = format!(
            "{HEADER}\"Bob#0001\";\"04:08:20\";\"hello\";\"\";\"\";\n\"Ann#0002\";\"04:08:25\";\"hi bob\";\"\";\"\";\n"
        );
        let records = parse_transcript(&input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].author_name().unwrap(), "Bob");
        assert_eq!(records[0].sent_at().unwrap(), Timecode::from_hms(4, 8, 20));
        assert_eq!(unquote(&records[1].text), "hi bob");
    }

    #[test]
    fn quoted_fields_keep_separators_and_newlines() {
        let input = format!(
            "{HEADER}\"Bob#0001\";\"04:08:20\";\"a;b\nc \"\"d\"\"\";\"\";\"\";\n\"Ann#0002\";\"04:08:21\";\"x\";\"\";\"\";\n"
        );
        let records = parse_transcript(&input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(unquote(&records[0].text), "a;b\nc \"d\"");
        assert_eq!(records[1].line, 4);
    }

    #[test]
    fn attachment_only_messages_are_detected() {
        let input = format!("{HEADER}\"Bob#0001\";\"04:08:20\";\"\";\"pic.png\";\"\";\n");
        let records = parse_transcript(&input).unwrap();
        assert!(records[0].is_attachment_only());
        assert!(records[0].has_attachment());
        assert!(!records[0].has_reactions());
    }

    #[test]
    fn wrong_field_count_is_fatal() {
        let input = format!("{HEADER}\"Bob#0001\";\"04:08:20\";\"hello\"\n");
        let err = parse_transcript(&input).unwrap_err();
        assert_eq!(
            err,
            ReplayError::FieldCount {
                line: 2,
                expected: FIELD_COUNT,
                found: 3
            }
        );
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let input = format!("{HEADER}\"Bob#0001\";\"04:08:20\";\"hello;\"\";\"\";\n");
        assert!(matches!(
            parse_transcript(&input),
            Err(ReplayError::UnterminatedQuote { line: 2 })
        ));
    }

    #[test]
    fn author_without_discriminator_is_fatal() {
        let input = format!("{HEADER}\"Bob\";\"04:08:20\";\"hello\";\"\";\"\";\n");
        let records = parse_transcript(&input).unwrap();
        assert!(matches!(
            records[0].author_name(),
            Err(ReplayError::MissingDiscriminator { line: 2, .. })
        ));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let input = "h;h;h;h;h;h\r\n\"Bob#1\";\"00:00:01\";\"hey\";\"\";\"\";\r\n";
        let records = parse_transcript(input).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reactions, "\"\"");
    }
}
