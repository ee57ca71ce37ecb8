//! Macro dispatch tables.
//!
//! Every request a document may use must be present in the active table;
//! unknown macros abort with a diagnostic so that silent mistranslation is
//! impossible. Handlers come in the fixed variants below plus free-form
//! structural functions for requests that drive the parser themselves.

pub(crate) mod man;
pub(crate) mod mdoc;

use std::collections::{HashMap, HashSet};

use manpo_core::SourceRef;

use crate::Transformer;
use crate::error::Result;
use crate::options::TransformOptions;

/// One dispatched macro invocation.
#[derive(Debug)]
pub(crate) struct MacroCall<'l> {
    /// Macro name without the control character.
    pub name: &'l str,
    /// Raw argument portion of the line, leading whitespace stripped.
    pub arguments: &'l str,
    /// The whole logical line, without its trailing newline.
    pub line: &'l str,
    pub reference: &'l SourceRef,
}

pub(crate) type StructuralFn = fn(&mut Transformer<'_>, &MacroCall<'_>) -> Result<()>;

/// How a macro is treated when encountered.
#[derive(Clone)]
pub(crate) enum MacroHandler {
    /// Emit the line verbatim, arguments included.
    Untranslated,
    /// Emit verbatim; the macro takes no arguments, so warn when given any.
    NoArg,
    /// Translate the concatenated argument string as one unit.
    TranslateJoined,
    /// Translate each argument independently; `keep_first` leaves the first
    /// (tag) argument untranslated.
    TranslateEach { keep_first: bool },
    /// Embed into the surrounding paragraph instead of breaking it.
    Inline,
    /// One of the eight font macros; expands into inline font escapes
    /// appended to the paragraph.
    Font,
    /// Custom handler that may consume further lines.
    Structural(StructuralFn),
}

impl std::fmt::Debug for MacroHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Untranslated => "Untranslated",
            Self::NoArg => "NoArg",
            Self::TranslateJoined => "TranslateJoined",
            Self::TranslateEach { .. } => "TranslateEach",
            Self::Inline => "Inline",
            Self::Font => "Font",
            Self::Structural(_) => "Structural",
        };
        f.write_str(name)
    }
}

pub(crate) type MacroTable = HashMap<String, MacroHandler>;

/// Applies the user's registration lists on top of a built-in table.
pub(crate) fn apply_option_lists(table: &mut MacroTable, options: &TransformOptions) {
    for name in &options.untranslated {
        table.insert(normalize_name(name), MacroHandler::Untranslated);
    }
    for name in &options.noarg {
        table.insert(normalize_name(name), MacroHandler::NoArg);
    }
    for name in &options.translate_joined {
        table.insert(normalize_name(name), MacroHandler::TranslateJoined);
    }
    for name in &options.translate_each {
        let (name, keep_first) = match name.strip_prefix("keepfirst:") {
            Some(rest) => (rest, true),
            None => (name.as_str(), false),
        };
        table.insert(
            normalize_name(name),
            MacroHandler::TranslateEach { keep_first },
        );
    }
    for name in &options.inline {
        table.insert(normalize_name(name), MacroHandler::Inline);
    }
}

/// Builds the no-wrap begin/end sets: the built-in trio plus the user's
/// `begin:end` pairs. Ends close any begin, never just their own.
pub(crate) fn build_no_wrap_sets(options: &TransformOptions) -> (HashSet<String>, HashSet<String>) {
    let mut begin: HashSet<String> = ["nf", "EX", "EQ"].iter().map(|s| s.to_string()).collect();
    let mut end: HashSet<String> = ["fi", "EE", "EN"].iter().map(|s| s.to_string()).collect();

    for pair in &options.no_wrap {
        if let Some((open, close)) = pair.split_once(':') {
            begin.insert(normalize_name(open));
            end.insert(normalize_name(close));
        } else {
            begin.insert(normalize_name(pair));
        }
    }

    (begin, end)
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_option_lists_overrides_and_parses_keep_first() {
        let mut table = MacroTable::new();
        let mut options = TransformOptions::default();
        options.untranslated = vec![".Xx".to_string()];
        options.translate_each = vec!["keepfirst:Tg".to_string(), "Ea".to_string()];
        apply_option_lists(&mut table, &options);

        assert!(matches!(table.get("Xx"), Some(MacroHandler::Untranslated)));
        assert!(matches!(
            table.get("Tg"),
            Some(MacroHandler::TranslateEach { keep_first: true })
        ));
        assert!(matches!(
            table.get("Ea"),
            Some(MacroHandler::TranslateEach { keep_first: false })
        ));
    }

    #[test]
    fn test_no_wrap_pairs_extend_the_builtin_sets() {
        let mut options = TransformOptions::default();
        options.no_wrap = vec!["Vb:Ve".to_string()];
        let (begin, end) = build_no_wrap_sets(&options);

        assert!(begin.contains("nf"));
        assert!(begin.contains("Vb"));
        assert!(end.contains("fi"));
        assert!(end.contains("Ve"));
    }
}
