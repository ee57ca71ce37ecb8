//! Macro argument splitting.
//!
//! Arguments are separated by unquoted runs of spaces. A double-quoted region
//! forms one argument; `""` inside it is a literal quote. A backslash before
//! a space turns the space into a non-breaking one, represented by
//! [`NO_BREAK_SPACE_TOKEN`] so that splitting and translation leave it
//! intact; it is restored to `\ ` when arguments are emitted.

use manpo_core::SourceRef;
use tracing::{debug, warn};

use crate::error::{Result, TransformError};

/// Internal stand-in for the `\ ` non-breaking space.
///
/// Chosen so that it cannot occur in any real document: NUL bytes never
/// survive text processing pipelines that produce manual pages.
pub const NO_BREAK_SPACE_TOKEN: &str = "\u{0}\u{0}no-break-space\u{0}\u{0}";

/// Splits a macro's argument string into arguments.
pub fn split_args(arguments: &str, reference: &SourceRef) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut has_current = false;
    let mut in_quotes = false;
    let mut chars = arguments.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                has_current = true;
                match chars.next() {
                    Some(' ') => current.push_str(NO_BREAK_SPACE_TOKEN),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => {
                        return Err(TransformError::MalformedInput {
                            reference: reference.clone(),
                            message: "escaped space at the end of macro arguments".to_string(),
                        });
                    }
                }
            }
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push_str("\\(dq");
                } else {
                    in_quotes = false;
                    args.push(std::mem::take(&mut current));
                    has_current = false;
                }
            }
            '"' => {
                if has_current {
                    // A quote in the middle of a token is literal.
                    current.push_str("\\(dq");
                } else {
                    in_quotes = true;
                    has_current = true;
                }
            }
            ' ' | '\t' if !in_quotes => {
                if has_current {
                    args.push(std::mem::take(&mut current));
                    has_current = false;
                }
            }
            other => {
                has_current = true;
                current.push(other);
            }
        }
    }

    if in_quotes {
        warn!("{reference}: unterminated quote in macro arguments");
    }
    if has_current {
        args.push(current);
    }

    debug!(target: "splitargs", input = arguments, args = ?args);
    Ok(args)
}

/// Restores non-breaking spaces in an argument about to be emitted.
pub fn restore_no_break_spaces(argument: &str) -> String {
    argument.replace(NO_BREAK_SPACE_TOKEN, "\\ ")
}

/// Renders a macro invocation line, quoting arguments where needed. Embedded
/// quotes become the `\(dq` glyph so the quoting stays unambiguous.
pub fn build_macro_line(name: &str, args: &[String]) -> String {
    let mut line = format!(".{name}");
    for arg in args {
        let restored = restore_no_break_spaces(arg).replace('"', "\\(dq");
        line.push(' ');
        if restored.is_empty() || restored.contains(' ') || restored.contains('\t') {
            line.push('"');
            line.push_str(&restored);
            line.push('"');
        } else {
            line.push_str(&restored);
        }
    }
    line.push('\n');
    line
}
