//! Message units and the catalog interface consumed by document parsers.

use serde::{Deserialize, Serialize};

use crate::reference::SourceRef;

/// Width used when re-flowing wrappable segments.
pub const WRAP_COLUMN: usize = 76;

/// Per-call options for [`MessageCatalog::translate`].
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Whether the catalog may re-flow the translated text.
    pub wrap: bool,
    /// Free-form comment shown to the translator next to the entry.
    pub comment: Option<String>,
}

impl TranslateOptions {
    pub fn wrapped() -> Self {
        Self {
            wrap: true,
            comment: None,
        }
    }

    pub fn unwrapped() -> Self {
        Self {
            wrap: false,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// One translatable unit recorded during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// The text presented to the translator, in surface form.
    pub msgid: String,
    /// Every place the text appears in the input documents.
    pub references: Vec<SourceRef>,
    /// Short classifier of where the text came from (`SH`, `tbl table`, ...).
    pub kind: String,
    /// Whether the segment may be re-flowed.
    pub wrap: bool,
    /// Comments harvested from the source document.
    pub comments: Vec<String>,
}

/// The translation side consumed by a document parser.
///
/// A parser funnels every user-visible string through [`translate`] and every
/// reproduced document line through [`push_output`]. Lines handed to
/// `push_output` are complete, including their trailing newline.
///
/// [`translate`]: MessageCatalog::translate
/// [`push_output`]: MessageCatalog::push_output
pub trait MessageCatalog {
    /// Returns the translation for `msgid`, which may be `msgid` itself.
    ///
    /// When `options.wrap` is set the returned text may be re-flowed to
    /// [`WRAP_COLUMN`]; otherwise it is returned byte-faithfully.
    fn translate(
        &mut self,
        msgid: &str,
        reference: &SourceRef,
        kind: &str,
        options: TranslateOptions,
    ) -> String;

    /// Appends a line (or several newline-terminated lines) to the
    /// reproduced document.
    fn push_output(&mut self, line: &str);
}

/// Greedily re-flows `text` to [`WRAP_COLUMN`] columns.
///
/// Existing newlines count as ordinary separators, so wrappable segments are
/// fully re-flowed rather than merely folded.
pub fn wrap_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0usize;
    for word in text.split_whitespace() {
        if column == 0 {
            out.push_str(word);
            column = word.len();
        } else if column + 1 + word.len() > WRAP_COLUMN {
            out.push('\n');
            out.push_str(word);
            column = word.len();
        } else {
            out.push(' ');
            out.push_str(word);
            column += 1 + word.len();
        }
    }
    out
}
