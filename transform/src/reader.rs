//! Logical-line reader.
//!
//! Reassembles logical lines from physical ones: backslash continuations,
//! orphan `.B`/`.I` macros whose argument sits on the following line,
//! comment stripping with generator-marker detection, and the escape
//! canonicalization (`\\` → `\e`, `\.` → `.`) the later passes rely on.

use std::sync::LazyLock;

use manpo_core::SourceRef;
use regex::Regex;
use tracing::warn;

use crate::Transformer;
use crate::error::{Result, TransformError};

/// Lines handed to the structural handlers without any processing.
static RAW_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[.']\s*(?:if|ie|de)(?:\s|$)").expect("static regex must compile")
});

static SINGLE_FONT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.([BI])(?:\s+(.*))?$").expect("static regex must compile"));

static ALTERNATING_FONT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.(?:BI|BR|IB|IR|RB|RI)(?:\s|$)").expect("static regex must compile")
});

static SECTION_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.(SH|TP|P|PP|LP)(?:\s+(.*))?$").expect("static regex must compile")
});

static INDENTED_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\.IP\s+(")?(.*)$"#).expect("static regex must compile"));

/// A leading font escape with trailing whitespace; the whitespace must come
/// first so paragraph-start detection still sees it.
static LEADING_FONT_WS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\\f(?:\(..|\[[^\]]*\]|.))([ \t]+)").expect("static regex must compile")
});

/// Generators whose output must not be translated directly.
const FATAL_GENERATORS: &[&str] = &["Pod::Man", "docbook-to-man", "docbook2man", "db2man.xsl"];

/// Generators we tolerate with a warning.
const WARNED_GENERATORS: &[&str] = &["help2man", "latex2man", "mtex2man", "DO NOT EDIT"];

enum Orphan {
    /// The orphan font macro absorbed the following line.
    Adopted(String),
    /// The following line was rewritten and pushed back; read afresh.
    Restart,
}

impl Transformer<'_> {
    /// Returns the next logical line, newline-terminated.
    pub(crate) fn next_line(&mut self) -> Result<Option<(String, SourceRef)>> {
        'restart: loop {
            let Some((raw, reference)) = self.source.shift()? else {
                return Ok(None);
            };

            // Conditionals and definitions go to their handlers untouched.
            if RAW_REQUEST_RE.is_match(&raw) {
                return Ok(Some((format!("{raw}\n"), reference)));
            }

            let Some(mut line) = self.prepare_physical(raw, &reference)? else {
                continue 'restart;
            };

            loop {
                if line.ends_with('\\') {
                    line.pop();
                    let Some((next_raw, next_reference)) = self.source.shift()? else {
                        warn!("{reference}: continuation backslash at end of file");
                        break;
                    };
                    if RAW_REQUEST_RE.is_match(&next_raw) {
                        self.source.unshift(next_raw, next_reference);
                        line.push('\\');
                        break;
                    }
                    if let Some(next) = self.prepare_physical(next_raw, &next_reference)? {
                        line.push_str(&next);
                    }
                    continue;
                }

                if line.trim_end() == ".B" || line.trim_end() == ".I" {
                    let font = line.trim_end().chars().nth(1).expect("checked above");
                    match self.resolve_orphan_font(font, &reference)? {
                        Orphan::Adopted(adopted) => {
                            line = adopted;
                            continue;
                        }
                        Orphan::Restart => continue 'restart,
                    }
                }
                break;
            }

            line = LEADING_FONT_WS_RE.replace(&line, "$2$1").into_owned();
            line.push('\n');
            return Ok(Some((line, reference)));
        }
    }

    /// Canonicalizes one physical line and splits off its comment.
    ///
    /// Returns `None` when the line carried nothing but a comment (pushed to
    /// the pending buffer) or nothing at all.
    fn prepare_physical(&mut self, raw: String, reference: &SourceRef) -> Result<Option<String>> {
        let mut line = raw;

        // The macro parser consumed one backslash already.
        if line.starts_with('.') || line.starts_with('\'') {
            line = line.replace("\\\\", "\\");
        }
        line = line.replace("\\\\", "\\e");
        line = line.replace("\\.", ".");

        if let Some((code, marker, comment)) = split_comment(&line) {
            self.check_generator_marker(&comment, reference)?;
            let code = code.trim_end();
            let keep_comment = marker == '"' && !comment.trim().is_empty();

            if code.is_empty() || code == "." || code == "'" {
                if keep_comment {
                    self.pending_comments.push(comment);
                }
                return Ok(None);
            }
            if keep_comment {
                self.attached_comments.push(comment);
            }
            line = code.to_string();
        }

        Ok(Some(line))
    }

    fn check_generator_marker(&mut self, comment: &str, reference: &SourceRef) -> Result<()> {
        for tool in FATAL_GENERATORS {
            if comment.contains(tool) {
                return Err(TransformError::GeneratedDocument {
                    reference: reference.clone(),
                    tool: tool.to_string(),
                });
            }
        }
        for tool in WARNED_GENERATORS {
            if comment.contains(tool) {
                warn!(
                    "{reference}: this file appears to be generated ({tool}); \
                     translating the source would age better"
                );
                break;
            }
        }
        Ok(())
    }

    /// A bare `.B`/`.I` styles whatever comes next; decide what that is.
    fn resolve_orphan_font(&mut self, font: char, reference: &SourceRef) -> Result<Orphan> {
        loop {
            let Some((next_raw, next_reference)) = self.source.shift()? else {
                return Err(TransformError::MalformedInput {
                    reference: reference.clone(),
                    message: format!("font macro '.{font}' at end of file without an argument"),
                });
            };
            let Some(next) = self.prepare_physical(next_raw, &next_reference)? else {
                continue; // comment-only line; keep looking
            };

            if let Some(caps) = SINGLE_FONT_RE.captures(&next) {
                let letter = caps[1].chars().next().expect("single capture letter");
                if letter == font {
                    return Ok(Orphan::Adopted(next));
                }
                let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                if rest.is_empty() {
                    return Ok(Orphan::Adopted(format!(".{font}{letter}")));
                }
                return Ok(Orphan::Adopted(format!(".{font}{letter} {rest}")));
            }

            if ALTERNATING_FONT_RE.is_match(&next) {
                // The alternating macro already names both fonts.
                return Ok(Orphan::Adopted(next));
            }

            if let Some(caps) = SECTION_BREAK_RE.captures(&next) {
                let macro_name = caps[1].to_string();
                match caps.get(2).map(|m| m.as_str()) {
                    Some(payload) if !payload.is_empty() => {
                        self.source
                            .unshift(format!(".{macro_name} \\f{font}{payload}"), next_reference);
                    }
                    _ => {
                        warn!(
                            "{reference}: dropping '.{font}' before the argument-less \
                             '.{macro_name}'"
                        );
                        self.source.unshift(next, next_reference);
                    }
                }
                return Ok(Orphan::Restart);
            }

            if let Some(caps) = INDENTED_TAG_RE.captures(&next) {
                let payload = caps[2].to_string();
                let rewritten = if caps.get(1).is_some() {
                    format!(".IP \"\\f{font}{payload}")
                } else {
                    format!(".IP \\f{font}{payload}")
                };
                self.source.unshift(rewritten, next_reference);
                return Ok(Orphan::Restart);
            }

            if next.starts_with('.') || next.starts_with('\'') {
                return Err(TransformError::Unsupported {
                    reference: reference.clone(),
                    message: format!(
                        "font macro '.{font}' immediately followed by the macro line \
                         '{next}' ({next_reference})"
                    ),
                });
            }

            // Plain text: quote it so it becomes the macro's single argument.
            return Ok(Orphan::Adopted(format!(
                ".{font} \"{}\"",
                next.replace('"', "\\(dq")
            )));
        }
    }
}

/// Splits an unescaped `\"` or `\#` comment off a line.
fn split_comment(line: &str) -> Option<(String, char, String)> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            i += 1;
            continue;
        }
        match chars.get(i + 1).copied() {
            Some(marker @ ('"' | '#')) => {
                let code: String = chars[..i].iter().collect();
                let comment: String = chars[i + 2..].iter().collect();
                return Some((code, marker, comment));
            }
            // Any other escape pair is opaque here.
            Some(_) => i += 2,
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformOptions;
    use manpo_core::ExtractionCatalog;

    fn read_all(text: &str) -> Vec<String> {
        let mut catalog = ExtractionCatalog::new();
        let mut transformer = crate::Transformer::new(
            "test.1",
            Box::new(std::io::Cursor::new(text.to_string())),
            &mut catalog,
            TransformOptions::default(),
        );
        let mut lines = Vec::new();
        while let Some((line, _)) = transformer.next_line().expect("read") {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_backslash_continuation_joins_lines() {
        let lines = read_all("first \\\nsecond\n");
        assert_eq!(lines, vec!["first second\n"]);
    }

    #[test]
    fn test_double_backslash_becomes_escape_literal() {
        let lines = read_all("a \\\\ b\n");
        assert_eq!(lines, vec!["a \\e b\n"]);
    }

    #[test]
    fn test_macro_line_collapses_one_backslash_level() {
        let lines = read_all(".BR foo \\\\fIbar\n");
        assert_eq!(lines, vec![".BR foo \\fIbar\n"]);
    }

    #[test]
    fn test_comment_only_line_is_skipped_and_buffered() {
        let mut catalog = ExtractionCatalog::new();
        let mut transformer = crate::Transformer::new(
            "test.1",
            Box::new(std::io::Cursor::new(".\\\" remark\ntext\n".to_string())),
            &mut catalog,
            TransformOptions::default(),
        );
        let (line, _) = transformer.next_line().expect("read").expect("line");
        assert_eq!(line, "text\n");
        assert_eq!(transformer.pending_comments, vec![" remark".to_string()]);
    }

    #[test]
    fn test_orphan_bold_adopts_text_line() {
        let lines = read_all(".B\nsome words\n");
        assert_eq!(lines, vec![".B \"some words\"\n"]);
    }

    #[test]
    fn test_orphan_bold_merges_with_italic_macro() {
        let lines = read_all(".B\n.I emphasized\n");
        assert_eq!(lines, vec![".BI emphasized\n"]);
    }

    #[test]
    fn test_orphan_before_section_macro_becomes_escape() {
        let lines = read_all(".B\n.SH HEADING\n");
        assert_eq!(lines, vec![".SH \\fBHEADING\n"]);
    }

    #[test]
    fn test_orphan_before_quoted_indent_tag() {
        let lines = read_all(".I\n.IP \"tag text\" 4\n");
        assert_eq!(lines, vec![".IP \"\\fItag text\" 4\n"]);
    }

    #[test]
    fn test_orphan_before_other_macro_fails() {
        let mut catalog = ExtractionCatalog::new();
        let mut transformer = crate::Transformer::new(
            "test.1",
            Box::new(std::io::Cursor::new(".B\n.br\n".to_string())),
            &mut catalog,
            TransformOptions::default(),
        );
        assert!(transformer.next_line().is_err());
    }

    #[test]
    fn test_pod_man_marker_is_fatal() {
        let mut catalog = ExtractionCatalog::new();
        let mut transformer = crate::Transformer::new(
            "test.1",
            Box::new(std::io::Cursor::new(
                ".\\\" Automatically generated by Pod::Man\n".to_string(),
            )),
            &mut catalog,
            TransformOptions::default(),
        );
        let err = transformer.next_line().expect_err("must reject");
        assert_eq!(err.exit_code(), crate::GENERATED_DOCUMENT_EXIT_CODE);
    }

    #[test]
    fn test_leading_font_escape_swaps_with_whitespace() {
        let lines = read_all("\\fB  indented\n");
        assert_eq!(lines, vec!["  \\fBindented\n"]);
    }

    #[test]
    fn test_conditionals_pass_through_raw() {
        let lines = read_all(".if n \\{\\\nx\n");
        assert_eq!(lines[0], ".if n \\{\\\n");
    }
}
