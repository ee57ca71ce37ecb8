//! Surface-form transforms.
//!
//! The pre-translation transform turns nroff text into the form a translator
//! sees (`B<…>` font markup, `E<lt>`/`E<gt>` angle brackets, plain quotes and
//! hyphens); the post-translation transform inverts it and guards the output
//! against first-column `.`/`'` hazards.

use std::sync::LazyLock;

use manpo_core::{SourceRef, TranslateOptions};
use regex::Regex;
use tracing::debug;

use crate::Transformer;
use crate::args::NO_BREAK_SPACE_TOKEN;
use crate::error::{Result, TransformError};

/// Internal wrapper for paragraph-embedded inline macros. Folded into
/// `E<.name args>` before the catalog sees the text, so it never escapes the
/// transformer.
pub(crate) const INLINE_TOKEN: &str = "\u{0}\u{0}inline-macro\u{0}\u{0}";

/// Marks output lines that legitimately start with a control character, so
/// the `\&` guard pass leaves them alone. Stripped before the text leaves
/// the post-transform.
const LINE_GUARD: char = '\u{1}';

/// Punctuation that mdoc macros carry as a detached trailing argument.
const MDOC_TRAILING_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', ')', ']'];

static LEADING_FONT_ESCAPES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\\f(?:\(..|\[[^\]]*\]|.))+").expect("static regex must compile")
});

impl Transformer<'_> {
    /// Converts nroff text into translator surface form.
    ///
    /// Leading newlines are re-emitted directly so the catalog never sees an
    /// empty or newline-only message.
    pub(crate) fn pre_translate(&mut self, text: &str, reference: &SourceRef) -> Result<String> {
        if text.contains("\\c") {
            return Err(TransformError::Unsupported {
                reference: reference.clone(),
                message: "the \\c line-continuation escape; rejoin the source lines".to_string(),
            });
        }

        let mut surface = text.replace('>', "E<gt>");
        surface = surface.replace('<', "E<lt>");
        surface = surface.replace("EE<lt>gt>", "E<gt>");

        surface = fold_inline_markers(&surface, self.mdoc);
        surface = self.fonts.process(&surface, reference);

        while let Some(rest) = surface.strip_prefix('\n') {
            self.catalog.push_output("\n");
            surface = rest.to_string();
        }

        if !self.mdoc {
            surface = surface.replace("\\-", "-");
            surface = surface.replace("\\*(lq", "``");
            surface = surface.replace("\\*(rq", "''");
            surface = surface.replace("\\(dq", "\"");
        }
        surface = surface.replace(NO_BREAK_SPACE_TOKEN, "\\ ");

        debug!(target: "pretrans", %reference, input = text, output = %surface);
        Ok(surface)
    }

    /// Converts a translated message back into nroff.
    pub(crate) fn post_translate(&mut self, msgstr: &str, reference: &SourceRef) -> Result<String> {
        let mut out = msgstr.replace("\\-", "-");
        out = escape_hyphens(&out);
        out = collapse_newlines_in_inline(&out);
        out = expand_font_markup(&out, reference)?;
        out = expand_inline_macros(&out, self.mdoc);
        out = out.replace("E<gt>", ">");
        out = out.replace("E<lt>", "<");
        if !self.mdoc {
            out = out.replace("``", "\\*(lq");
            out = out.replace("''", "\\*(rq");
        }
        out = guard_leading_control_chars(&out);
        out = out.replace(LINE_GUARD, "");
        out = out.replace('\u{A0}', "\\ ");
        out = out.replace("\\ \n", "\\ ");

        debug!(target: "postrans", %reference, input = msgstr, output = %out);
        Ok(out)
    }

    /// Runs a string through pre-transform, catalog and post-transform.
    pub(crate) fn translate_text(
        &mut self,
        text: &str,
        reference: &SourceRef,
        kind: &str,
        wrap: bool,
        comment: Option<String>,
    ) -> Result<String> {
        let msgid = self.pre_translate(text, reference)?;
        if msgid.is_empty() {
            return Ok(String::new());
        }
        let options = TranslateOptions { wrap, comment };
        let msgstr = self.catalog.translate(&msgid, reference, kind, options);
        self.post_translate(&msgstr, reference)
    }
}

/// Wraps an inline macro invocation for embedding into a paragraph.
pub(crate) fn inline_marker(name: &str, arguments: &str) -> String {
    let arguments = arguments.trim();
    if arguments.is_empty() {
        format!("{INLINE_TOKEN}:.{name}:{INLINE_TOKEN}")
    } else {
        format!("{INLINE_TOKEN}:.{name} {arguments}:{INLINE_TOKEN}")
    }
}

fn fold_inline_markers(text: &str, mdoc: bool) -> String {
    let open = format!("{INLINE_TOKEN}:");
    let close = format!(":{INLINE_TOKEN}");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        out.push_str(&rest[..start]);
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let content = &after[..end];
        match mdoc_detached_punctuation(content).filter(|_| mdoc) {
            Some((body, punctuation)) => {
                out.push_str("E<");
                out.push_str(body);
                out.push('>');
                out.push(punctuation);
            }
            None => {
                out.push_str("E<");
                out.push_str(content);
                out.push('>');
            }
        }
        rest = &after[end + close.len()..];
    }

    out.push_str(rest);
    out
}

/// Splits `.Xr foo 1 .` into the macro body and its detached trailing
/// punctuation argument.
fn mdoc_detached_punctuation(content: &str) -> Option<(&str, char)> {
    let last = content.chars().last()?;
    if !MDOC_TRAILING_PUNCTUATION.contains(&last) {
        return None;
    }
    let body = content[..content.len() - last.len_utf8()].strip_suffix(' ')?;
    Some((body, last))
}

/// Re-escapes hyphens, skipping positions where a hyphen is part of another
/// escape: a `\s` size change, a `\(xx` glyph name, or a `\h'…'` motion.
fn escape_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' && i + 1 < chars.len() {
            match chars[i + 1] {
                '(' => {
                    for offset in 0..4.min(chars.len() - i) {
                        out.push(chars[i + offset]);
                    }
                    i += 4.min(chars.len() - i);
                }
                's' => {
                    out.push_str("\\s");
                    i += 2;
                    if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                        out.push(chars[i]);
                        i += 1;
                    }
                }
                'h' if chars.get(i + 2) == Some(&'\'') => {
                    out.push_str("\\h'");
                    i += 3;
                    while i < chars.len() {
                        let inner = chars[i];
                        out.push(inner);
                        i += 1;
                        if inner == '\'' {
                            break;
                        }
                    }
                }
                other => {
                    out.push('\\');
                    out.push(other);
                    i += 2;
                }
            }
        } else if ch == '-' {
            out.push_str("\\-");
            i += 1;
        } else {
            out.push(ch);
            i += 1;
        }
    }

    out
}

/// Replaces newlines inside `E<.…>` inline macros with spaces, undoing
/// translator-side line wrapping.
fn collapse_newlines_in_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == 'E' && chars.get(i + 1) == Some(&'<') && chars.get(i + 2) == Some(&'.') {
            out.push_str("E<.");
            i += 3;
            let mut depth = 1usize;
            while i < chars.len() && depth > 0 {
                match chars[i] {
                    '<' => depth += 1,
                    '>' => depth -= 1,
                    _ => {}
                }
                out.push(if chars[i] == '\n' { ' ' } else { chars[i] });
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

fn marker_at(chars: &[char], at: usize) -> Option<(usize, &'static str)> {
    match chars.get(at) {
        Some('C') if chars.get(at + 1) == Some(&'W') && chars.get(at + 2) == Some(&'<') => {
            Some((3, "(CW"))
        }
        Some('B') if chars.get(at + 1) == Some(&'<') => Some((2, "B")),
        Some('I') if chars.get(at + 1) == Some(&'<') => Some((2, "I")),
        Some('R') if chars.get(at + 1) == Some(&'<') => Some((2, "R")),
        _ => None,
    }
}

/// Expands `B<…>`/`I<…>`/`R<…>`/`CW<…>` into font escapes.
///
/// A top-level span directly followed by another span leaves the closing
/// escape to its successor, and the last top-level span closes with `\fR`;
/// nested spans pop with `\fP`. This reproduces the compact alternating
/// form (`\fBfoo\fIbar\fBbaz\fR`) that the pre-transform flattened.
fn expand_font_markup(text: &str, reference: &SourceRef) -> Result<String> {
    expand_markup_at_depth(text, reference, 0)
}

fn expand_markup_at_depth(text: &str, reference: &SourceRef, depth: usize) -> Result<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let Some((marker_len, font)) = marker_at(&chars, i) else {
            out.push(chars[i]);
            i += 1;
            continue;
        };

        let content_start = i + marker_len;
        let mut nesting = 1usize;
        let mut j = content_start;
        while j < chars.len() {
            match chars[j] {
                '<' => nesting += 1,
                '>' => {
                    nesting -= 1;
                    if nesting == 0 {
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }
        if nesting != 0 {
            return Err(TransformError::UnbalancedMarkup {
                reference: reference.clone(),
                snippet: text.chars().take(60).collect(),
            });
        }

        let inner: String = chars[content_start..j].iter().collect();
        out.push_str("\\f");
        out.push_str(font);
        out.push_str(&expand_markup_at_depth(&inner, reference, depth + 1)?);

        let followed_by_marker = marker_at(&chars, j + 1).is_some();
        if depth == 0 {
            if !followed_by_marker {
                out.push_str("\\fR");
            }
        } else {
            out.push_str("\\fP");
        }
        i = j + 1;
    }

    Ok(out)
}

/// Moves `E<.name args>` inline macros onto their own output lines,
/// restoring detached mdoc punctuation as a trailing argument.
fn expand_inline_macros(text: &str, mdoc: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !(chars[i] == 'E' && chars.get(i + 1) == Some(&'<') && chars.get(i + 2) == Some(&'.')) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let content_start = i + 2;
        let mut depth = 1usize;
        let mut j = content_start;
        while j < chars.len() {
            match chars[j] {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }
        if depth != 0 {
            // Unterminated form; leave it alone.
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let invocation: String = chars[content_start..j].iter().collect();
        while out.ends_with(' ') {
            out.pop();
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push(LINE_GUARD);
        out.push_str(&invocation);
        i = j + 1;

        // Detached punctuation written right after the span goes back on the
        // macro line as its own argument.
        if mdoc
            && let Some(&punctuation) = chars.get(i)
            && MDOC_TRAILING_PUNCTUATION.contains(&punctuation)
        {
            out.push(' ');
            out.push(punctuation);
            i += 1;
        }
        out.push('\n');

        // The macro owns the line break; swallow one following separator.
        if matches!(chars.get(i), Some(&' ') | Some(&'\n')) {
            i += 1;
        }
    }

    out
}

/// Prefixes `\&` to lines that would otherwise start with `.` or `'`,
/// skipping over leading font escapes. When the previous line ends with a
/// backslash the join must stay escape-free, so the control character is
/// preceded by a plain space instead (an imperfect, degraded protection).
fn guard_leading_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_ends_backslash = false;

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        if line.starts_with(LINE_GUARD) {
            out.push_str(line);
            previous_ends_backslash = line.ends_with('\\');
            continue;
        }

        let prefix_len = LEADING_FONT_ESCAPES_RE
            .find(line)
            .map(|found| found.end())
            .unwrap_or(0);
        let tail = &line[prefix_len..];
        if tail.starts_with('.') || tail.starts_with('\'') {
            out.push_str(&line[..prefix_len]);
            if previous_ends_backslash {
                out.push(' ');
            } else {
                out.push_str("\\&");
            }
            out.push_str(tail);
        } else {
            out.push_str(line);
        }
        previous_ends_backslash = line.ends_with('\\');
    }

    out
}
