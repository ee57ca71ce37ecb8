//! Bidirectional converter between nroff man pages and message catalogs.
//!
//! The transformer reads a man(7) or mdoc(7) document, presents every
//! user-visible string to a [`MessageCatalog`] in a normalized surface form
//! (`B<…>` font markup, `E<lt>`/`E<gt>` angle brackets, plain hyphens and
//! quotes), and reproduces a faithful nroff document from the catalog's
//! answers. Extraction and translation are the same pass with different
//! catalogs.
//!
//! # Architecture
//!
//! - [`source`](LineSource) — physical lines with push-back.
//! - `reader` — reassembles logical lines: continuations, orphan `.B`/`.I`
//!   macros, comment stripping, generator-marker detection.
//! - `fonts` — the current/previous/regular font stack and the rewrite of
//!   inline `\f` escapes into surface markup.
//! - `surface` — the pre/post translation transforms.
//! - `macros` — the man(7), groff and mdoc(7) dispatch tables.
//!
//! # Example
//!
//! ```
//! use manpo_core::ExtractionCatalog;
//! use manpo_transform::{TransformOptions, transform_text};
//!
//! let mut catalog = ExtractionCatalog::new();
//! transform_text(
//!     "hello.1",
//!     ".TH HELLO 1\n.SH NAME\nhello \\- greet the world\n",
//!     &mut catalog,
//!     TransformOptions::default(),
//! )
//! .expect("well-formed document");
//!
//! assert!(catalog.entries().iter().any(|e| e.msgid == "hello - greet the world"));
//! ```

mod args;
mod error;
mod fonts;
mod macros;
mod options;
mod reader;
mod source;
mod surface;

pub use error::{GENERATED_DOCUMENT_EXIT_CODE, Result, TransformError};
pub use options::{GroffCodePolicy, TransformOptions};
pub use source::LineSource;

use std::collections::HashSet;
use std::io::BufRead;

use manpo_core::{MessageCatalog, SourceRef};
use tracing::warn;

use crate::args::{build_macro_line, split_args};
use crate::fonts::FontStack;
use crate::macros::{MacroCall, MacroHandler, MacroTable};

/// Comment block emitted once, immediately before the first `.TH` or `.Dd`.
const BANNER: &str = "\
.\\\"*******************************************************************
.\\\"
.\\\" This file was generated by manpo. Translate the source manual
.\\\" page rather than editing this rendition.
.\\\"
.\\\"*******************************************************************
";

/// Whether the current paragraph may be re-flowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapMode {
    /// Default; reflow permitted.
    Yes,
    /// A leading-whitespace line was seen; suppressed for this paragraph only.
    No,
    /// Inside a no-wrap region; persists until an end macro.
    MacroNo,
}

/// Per-document parser state.
///
/// All state lives here: the font stack, comment buffers, paragraph buffer,
/// wrap mode, dispatch table and mdoc flag. Processing several documents
/// concurrently means one `Transformer` per document.
pub struct Transformer<'a> {
    pub(crate) options: TransformOptions,
    pub(crate) catalog: &'a mut dyn MessageCatalog,
    pub(crate) source: LineSource,
    pub(crate) table: MacroTable,
    pub(crate) no_wrap_begin: HashSet<String>,
    pub(crate) no_wrap_end: HashSet<String>,
    pub(crate) fonts: FontStack,
    wrap: WrapMode,
    paragraph: String,
    paragraph_reference: Option<SourceRef>,
    pub(crate) attached_comments: Vec<String>,
    pub(crate) pending_comments: Vec<String>,
    pub(crate) mdoc: bool,
    banner_emitted: bool,
}

impl<'a> Transformer<'a> {
    pub fn new(
        path: &str,
        input: Box<dyn BufRead>,
        catalog: &'a mut dyn MessageCatalog,
        options: TransformOptions,
    ) -> Self {
        let table = macros::man::build_table(&options);
        let (no_wrap_begin, no_wrap_end) = macros::build_no_wrap_sets(&options);
        Self {
            options,
            catalog,
            source: LineSource::new(path, input),
            table,
            no_wrap_begin,
            no_wrap_end,
            fonts: FontStack::new(),
            wrap: WrapMode::Yes,
            paragraph: String::new(),
            paragraph_reference: None,
            attached_comments: Vec::new(),
            pending_comments: Vec::new(),
            mdoc: false,
            banner_emitted: false,
        }
    }

    /// Processes the whole document.
    pub fn run(&mut self) -> Result<()> {
        while let Some((line, reference)) = self.next_line()? {
            self.process_line(&line, &reference)?;
        }
        self.flush_paragraph()?;
        self.flush_trailing_comments();
        Ok(())
    }

    fn process_line(&mut self, line: &str, reference: &SourceRef) -> Result<()> {
        let body = line.strip_suffix('\n').unwrap_or(line);

        if body.starts_with('.') || body.starts_with('\'') {
            return self.handle_macro_line(body, reference);
        }

        if body.trim().is_empty() {
            self.flush_paragraph()?;
            self.catalog.push_output(line);
            if self.wrap == WrapMode::No {
                self.wrap = WrapMode::Yes;
            }
            return Ok(());
        }

        if (body.starts_with(' ') || body.starts_with('\t')) && self.wrap == WrapMode::Yes {
            self.wrap = WrapMode::No;
        }
        self.begin_paragraph(reference);
        self.paragraph.push_str(line);
        Ok(())
    }

    fn handle_macro_line(&mut self, body: &str, reference: &SourceRef) -> Result<()> {
        let rest = body[1..].trim_start();
        if rest.is_empty() {
            self.flush_paragraph()?;
            self.push_verbatim(body);
            return Ok(());
        }

        let name = rest.split_whitespace().next().unwrap_or_default();
        let arguments = rest[name.len()..].trim_start();

        if self.no_wrap_begin.contains(name) {
            self.flush_paragraph()?;
            self.wrap = WrapMode::MacroNo;
            self.push_verbatim(body);
            return Ok(());
        }
        if self.no_wrap_end.contains(name) {
            self.flush_paragraph()?;
            self.wrap = WrapMode::Yes;
            self.push_verbatim(body);
            return Ok(());
        }

        let Some(handler) = self.handler_for(name) else {
            return Err(TransformError::UnknownMacro {
                reference: reference.clone(),
                name: name.to_string(),
            });
        };

        match handler {
            MacroHandler::Inline => {
                self.begin_paragraph(reference);
                self.paragraph
                    .push_str(&surface::inline_marker(name, arguments));
                self.paragraph.push('\n');
                Ok(())
            }
            MacroHandler::Font => self.append_font_macro(name, arguments, reference),
            MacroHandler::Untranslated => {
                self.flush_paragraph()?;
                self.push_verbatim(body);
                Ok(())
            }
            MacroHandler::NoArg => {
                self.flush_paragraph()?;
                if !arguments.is_empty() {
                    warn!("{reference}: macro '.{name}' takes no arguments; keeping them verbatim");
                }
                self.push_verbatim(body);
                Ok(())
            }
            MacroHandler::TranslateJoined => {
                self.flush_paragraph()?;
                self.translate_joined(name, arguments, body, reference)
            }
            MacroHandler::TranslateEach { keep_first } => {
                self.flush_paragraph()?;
                self.translate_each(name, arguments, body, reference, keep_first)
            }
            MacroHandler::Structural(handler) => {
                self.flush_paragraph()?;
                let name = name.to_string();
                let arguments = arguments.to_string();
                let call = MacroCall {
                    name: &name,
                    arguments: &arguments,
                    line: body,
                    reference,
                };
                handler(self, &call)
            }
        }
    }

    fn append_font_macro(
        &mut self,
        name: &str,
        arguments: &str,
        reference: &SourceRef,
    ) -> Result<()> {
        let args = split_args(arguments, reference)?;
        let text = macros::man::font_macro_text(name, &args, reference)?;
        self.begin_paragraph(reference);
        self.paragraph.push_str(&text);
        self.paragraph.push('\n');
        Ok(())
    }

    fn translate_joined(
        &mut self,
        name: &str,
        arguments: &str,
        body: &str,
        reference: &SourceRef,
    ) -> Result<()> {
        let args = split_args(arguments, reference)?;
        if args.is_empty() {
            self.push_verbatim(body);
            return Ok(());
        }
        let translated = self.translate_text(&args.join(" "), reference, name, false, None)?;
        self.emit_macro_line(name, &[macros::man::single_line(&translated)]);
        Ok(())
    }

    fn translate_each(
        &mut self,
        name: &str,
        arguments: &str,
        body: &str,
        reference: &SourceRef,
        keep_first: bool,
    ) -> Result<()> {
        let args = split_args(arguments, reference)?;
        if args.is_empty() {
            self.push_verbatim(body);
            return Ok(());
        }
        let mut out = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            if index == 0 && keep_first {
                out.push(arg.clone());
            } else {
                let translated = self.translate_text(arg, reference, name, false, None)?;
                out.push(macros::man::single_line(&translated));
            }
        }
        self.emit_macro_line(name, &out);
        Ok(())
    }

    /// Hands the accumulated paragraph to the catalog and emits the result,
    /// preceded by its attached comments as `.\"` lines. A `No` wrap mode
    /// reverts to `Yes` once the paragraph is out.
    pub(crate) fn flush_paragraph(&mut self) -> Result<()> {
        if self.paragraph.is_empty() {
            return Ok(());
        }

        let mut paragraph = std::mem::take(&mut self.paragraph);
        let reference = self
            .paragraph_reference
            .take()
            .unwrap_or_else(|| SourceRef::new(self.source.path(), 0));
        while paragraph.ends_with('\n') {
            paragraph.pop();
        }

        let wrap = self.wrap == WrapMode::Yes;
        if self.wrap == WrapMode::No {
            self.wrap = WrapMode::Yes;
        }

        let comments = std::mem::take(&mut self.attached_comments);
        for comment in &comments {
            self.catalog.push_output(&format!(".\\\"{comment}\n"));
        }
        let comment = if comments.is_empty() {
            None
        } else {
            Some(comments.join("\n"))
        };

        let translated = self.translate_text(&paragraph, &reference, "Plain text", wrap, comment)?;
        self.push_translated_block(&translated);
        Ok(())
    }

    /// Marks the start of a paragraph: comments buffered from macro-only
    /// lines precede this paragraph, so they become its attached comments.
    /// They come from earlier lines than any comment the paragraph's first
    /// line carries itself, so they go in front to keep source order.
    fn begin_paragraph(&mut self, reference: &SourceRef) {
        if !self.paragraph.is_empty() {
            return;
        }
        self.paragraph_reference = Some(reference.clone());
        if !self.pending_comments.is_empty() {
            let mut comments = std::mem::take(&mut self.pending_comments);
            comments.append(&mut self.attached_comments);
            self.attached_comments = comments;
        }
    }

    fn flush_trailing_comments(&mut self) {
        let attached = std::mem::take(&mut self.attached_comments);
        let pending = std::mem::take(&mut self.pending_comments);
        for comment in attached.iter().chain(pending.iter()) {
            self.catalog.push_output(&format!(".\\\"{comment}\n"));
        }
    }

    /// Emits the generated-file banner exactly once.
    pub(crate) fn emit_banner(&mut self) {
        if self.banner_emitted {
            return;
        }
        self.banner_emitted = true;
        self.catalog.push_output(BANNER);
    }

    pub(crate) fn handler_for(&self, name: &str) -> Option<MacroHandler> {
        self.table.get(name).cloned()
    }

    /// Swaps the active table for the mdoc one; `.Bd`/`.Ed` join the no-wrap
    /// sets.
    pub(crate) fn install_mdoc_table(&mut self) {
        self.table = macros::mdoc::build_table(&self.options);
        self.no_wrap_begin.insert("Bd".to_string());
        self.no_wrap_end.insert("Ed".to_string());
    }

    /// Emits `body` as its own output line.
    pub(crate) fn push_verbatim(&mut self, body: &str) {
        self.catalog.push_output(&format!("{body}\n"));
    }

    /// Emits a translated block with exactly one trailing newline.
    pub(crate) fn push_translated_block(&mut self, translated: &str) {
        let content = translated.trim_end_matches('\n');
        if content.is_empty() {
            return;
        }
        self.catalog.push_output(&format!("{content}\n"));
    }

    /// Emits a macro invocation, quoting arguments as needed.
    pub(crate) fn emit_macro_line(&mut self, name: &str, args: &[String]) {
        self.catalog.push_output(&build_macro_line(name, args));
    }

    pub(crate) fn shift_raw_line(&mut self) -> Result<Option<(String, SourceRef)>> {
        self.source.shift()
    }

    pub(crate) fn unshift_line(&mut self, line: String, reference: SourceRef) {
        self.source.unshift(line, reference);
    }
}

impl std::fmt::Debug for Transformer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source)
            .field("wrap", &self.wrap)
            .field("mdoc", &self.mdoc)
            .finish()
    }
}

/// Transforms one document read from `input`.
pub fn transform_document(
    path: &str,
    input: Box<dyn BufRead>,
    catalog: &mut dyn MessageCatalog,
    options: TransformOptions,
) -> Result<()> {
    Transformer::new(path, input, catalog, options).run()
}

/// Transforms one document held in memory. Convenience for tests and small
/// callers.
pub fn transform_text(
    path: &str,
    text: &str,
    catalog: &mut dyn MessageCatalog,
    options: TransformOptions,
) -> Result<()> {
    let cursor = std::io::Cursor::new(text.to_string());
    transform_document(path, Box::new(cursor), catalog, options)
}
