//! Minimal PO reader and writer.
//!
//! Covers the subset the manpo tools need: straight `msgid`/`msgstr` pairs
//! with adjacent string-literal concatenation, `#.`/`#:`/`#,` comment lines,
//! and the standard `\n \t \" \\` escapes. Plural and obsolete entries are
//! skipped on read.

use std::io::{BufRead, Write};

use crate::error::{CatalogError, Result};
use crate::message::MessageEntry;

/// Writes `entries` as a PO file, header included.
pub fn write_po<W: Write>(writer: &mut W, entries: &[MessageEntry]) -> Result<()> {
    writeln!(writer, "msgid \"\"")?;
    writeln!(writer, "msgstr \"\"")?;
    writeln!(writer, "\"MIME-Version: 1.0\\n\"")?;
    writeln!(writer, "\"Content-Type: text/plain; charset=UTF-8\\n\"")?;
    writeln!(writer, "\"Content-Transfer-Encoding: 8bit\\n\"")?;

    for entry in entries {
        writeln!(writer)?;
        for comment in &entry.comments {
            writeln!(writer, "#. {}", comment.trim())?;
        }
        if !entry.kind.is_empty() {
            writeln!(writer, "#. type: {}", entry.kind)?;
        }
        if !entry.references.is_empty() {
            let references = entry
                .references
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "#: {references}")?;
        }
        if !entry.wrap {
            writeln!(writer, "#, no-wrap")?;
        }
        write_field(writer, "msgid", &entry.msgid)?;
        write_field(writer, "msgstr", "")?;
    }

    Ok(())
}

fn write_field<W: Write>(writer: &mut W, keyword: &str, value: &str) -> Result<()> {
    if !value.contains('\n') {
        writeln!(writer, "{keyword} \"{}\"", escape(value))?;
        return Ok(());
    }

    writeln!(writer, "{keyword} \"\"")?;
    let mut rest = value;
    while let Some(at) = rest.find('\n') {
        writeln!(writer, "\"{}\\n\"", escape(&rest[..at]))?;
        rest = &rest[at + 1..];
    }
    if !rest.is_empty() {
        writeln!(writer, "\"{}\"", escape(rest))?;
    }
    Ok(())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(value: &str, path: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {
                return Err(CatalogError::MalformedEntry {
                    path: path.to_string(),
                    line,
                    message: "dangling backslash in string".to_string(),
                });
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Msgid,
    Msgstr,
    Skipped,
}

/// Reads `msgid → msgstr` pairs from PO-formatted input.
///
/// The header entry (empty msgid) is dropped; `#~` obsolete entries and
/// `msgid_plural`/`msgstr[n]` forms are skipped wholesale.
pub fn read_po<R: BufRead>(reader: R, path: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut msgid = String::new();
    let mut msgstr = String::new();
    let mut field = Field::None;
    let mut seen_entry = false;

    let mut finish =
        |msgid: &mut String, msgstr: &mut String, seen: &mut bool| {
            if *seen && !msgid.is_empty() {
                pairs.push((std::mem::take(msgid), std::mem::take(msgstr)));
            } else {
                msgid.clear();
                msgstr.clear();
            }
            *seen = false;
        };

    for (number, raw) in reader.lines().enumerate() {
        let line_number = number + 1;
        let raw = raw?;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            if field != Field::None {
                finish(&mut msgid, &mut msgstr, &mut seen_entry);
                field = Field::None;
            }
            continue;
        }

        if line.starts_with("msgid_plural") {
            field = Field::Skipped;
            seen_entry = false;
            continue;
        }
        if let Some(rest) = line.strip_prefix("msgid") {
            if field == Field::Msgstr {
                finish(&mut msgid, &mut msgstr, &mut seen_entry);
            }
            msgid = string_payload(rest, path, line_number)?;
            field = Field::Msgid;
            seen_entry = true;
            continue;
        }
        if let Some(rest) = line.strip_prefix("msgstr") {
            if rest.starts_with('[') {
                field = Field::Skipped;
                seen_entry = false;
                continue;
            }
            msgstr = string_payload(rest, path, line_number)?;
            field = Field::Msgstr;
            continue;
        }
        if line.starts_with('"') {
            let payload = string_payload(line, path, line_number)?;
            match field {
                Field::Msgid => msgid.push_str(&payload),
                Field::Msgstr => msgstr.push_str(&payload),
                Field::Skipped => {}
                Field::None => {
                    return Err(CatalogError::MalformedEntry {
                        path: path.to_string(),
                        line: line_number,
                        message: "string literal outside of an entry".to_string(),
                    });
                }
            }
            continue;
        }

        return Err(CatalogError::MalformedEntry {
            path: path.to_string(),
            line: line_number,
            message: format!("unrecognized line: {line}"),
        });
    }

    finish(&mut msgid, &mut msgstr, &mut seen_entry);
    Ok(pairs)
}

fn string_payload(rest: &str, path: &str, line: usize) -> Result<String> {
    let rest = rest.trim();
    let Some(inner) = rest
        .strip_prefix('"')
        .and_then(|tail| tail.strip_suffix('"'))
    else {
        return Err(CatalogError::UnterminatedString {
            path: path.to_string(),
            line,
        });
    };
    unescape(inner, path, line)
}
