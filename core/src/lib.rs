//! Core message-catalog primitives for the manpo tools.
//!
//! This crate defines the vocabulary shared between document parsers and
//! translation catalogs:
//!
//! - [`SourceRef`] — a `path:line` position attached to every message.
//! - [`MessageEntry`] — one translatable unit with references, kind,
//!   wrap flag, and harvested comments.
//! - [`MessageCatalog`] — the interface a parser drives: `translate` for
//!   every user-visible string, `push_output` for every reproduced line.
//! - [`ExtractionCatalog`] — records entries and reproduces the document
//!   untranslated; writes the entries as a PO file.
//! - [`TranslatingCatalog`] — serves translations read from a PO file,
//!   falling back to the msgid for missing or empty entries.
//!
//! # Example
//!
//! ```
//! use manpo_core::{ExtractionCatalog, MessageCatalog, SourceRef, TranslateOptions};
//!
//! let mut catalog = ExtractionCatalog::new();
//! let reference = SourceRef::new("ls.1", 12);
//! let text = catalog.translate("list files", &reference, "", TranslateOptions::wrapped());
//! catalog.push_output(&format!("{text}\n"));
//!
//! assert_eq!(catalog.entries().len(), 1);
//! assert_eq!(catalog.output(), "list files\n");
//! ```

mod catalog;
mod error;
mod message;
mod po;
mod reference;

pub use catalog::{ExtractionCatalog, TranslatingCatalog};
pub use error::{CatalogError, Result};
pub use message::{MessageCatalog, MessageEntry, TranslateOptions, WRAP_COLUMN, wrap_text};
pub use po::{read_po, write_po};
pub use reference::SourceRef;
