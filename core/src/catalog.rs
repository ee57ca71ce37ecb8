//! Concrete catalogs: extraction (document → entries) and translation
//! (entries → document).

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::error::Result;
use crate::message::{MessageCatalog, MessageEntry, TranslateOptions, wrap_text};
use crate::po;
use crate::reference::SourceRef;

/// Catalog that records every message it sees and translates identically.
///
/// Used for the extraction pass: the parser runs once, the catalog ends up
/// holding all translatable units (for the PO file) and the reproduced
/// document (for a faithful untranslated rendition).
#[derive(Debug, Default)]
pub struct ExtractionCatalog {
    entries: Vec<MessageEntry>,
    index: HashMap<String, usize>,
    output: String,
}

impl ExtractionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, in first-seen order.
    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    /// The reproduced document.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Writes the recorded entries as a PO file.
    pub fn write_po<W: Write>(&self, writer: &mut W) -> Result<()> {
        po::write_po(writer, &self.entries)
    }
}

impl MessageCatalog for ExtractionCatalog {
    fn translate(
        &mut self,
        msgid: &str,
        reference: &SourceRef,
        kind: &str,
        options: TranslateOptions,
    ) -> String {
        match self.index.get(msgid) {
            Some(&at) => {
                let entry = &mut self.entries[at];
                if !entry.references.contains(reference) {
                    entry.references.push(reference.clone());
                }
                if let Some(comment) = options.comment
                    && !entry.comments.contains(&comment)
                {
                    entry.comments.push(comment);
                }
                // A single unwrappable occurrence pins the whole entry.
                entry.wrap &= options.wrap;
            }
            None => {
                self.index.insert(msgid.to_string(), self.entries.len());
                self.entries.push(MessageEntry {
                    msgid: msgid.to_string(),
                    references: vec![reference.clone()],
                    kind: kind.to_string(),
                    wrap: options.wrap,
                    comments: options.comment.into_iter().collect(),
                });
            }
        }

        if options.wrap {
            wrap_text(msgid)
        } else {
            msgid.to_string()
        }
    }

    fn push_output(&mut self, line: &str) {
        self.output.push_str(line);
    }
}

/// Catalog backed by a `msgid → msgstr` map read from a PO file.
///
/// Entries with an empty msgstr fall back to the msgid, so a partially
/// translated catalog still produces a complete document.
#[derive(Debug, Default)]
pub struct TranslatingCatalog {
    messages: HashMap<String, String>,
    output: String,
}

impl TranslatingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads translations from PO-formatted input.
    pub fn from_po<R: BufRead>(reader: R, path: &str) -> Result<Self> {
        let mut catalog = Self::new();
        for (msgid, msgstr) in po::read_po(reader, path)? {
            catalog.insert(&msgid, &msgstr);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, msgid: &str, msgstr: &str) {
        self.messages.insert(msgid.to_string(), msgstr.to_string());
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

impl MessageCatalog for TranslatingCatalog {
    fn translate(
        &mut self,
        msgid: &str,
        _reference: &SourceRef,
        _kind: &str,
        options: TranslateOptions,
    ) -> String {
        let msgstr = match self.messages.get(msgid) {
            Some(translation) if !translation.is_empty() => translation.as_str(),
            _ => msgid,
        };
        if options.wrap {
            wrap_text(msgstr)
        } else {
            msgstr.to_string()
        }
    }

    fn push_output(&mut self, line: &str) {
        self.output.push_str(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(line: usize) -> SourceRef {
        SourceRef::new("test.1", line)
    }

    #[test]
    fn test_extraction_catalog_deduplicates_by_msgid() {
        let mut catalog = ExtractionCatalog::new();
        catalog.translate("same text", &reference(1), "", TranslateOptions::wrapped());
        catalog.translate("same text", &reference(9), "", TranslateOptions::wrapped());

        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(catalog.entries()[0].references.len(), 2);
    }

    #[test]
    fn test_extraction_catalog_pins_wrap_off() {
        let mut catalog = ExtractionCatalog::new();
        catalog.translate("text", &reference(1), "", TranslateOptions::wrapped());
        catalog.translate("text", &reference(2), "", TranslateOptions::unwrapped());

        assert!(!catalog.entries()[0].wrap);
    }

    #[test]
    fn test_translating_catalog_falls_back_to_msgid() {
        let mut catalog = TranslatingCatalog::new();
        catalog.insert("hello", "bonjour");
        catalog.insert("empty", "");

        let hello = catalog.translate("hello", &reference(1), "", TranslateOptions::unwrapped());
        let empty = catalog.translate("empty", &reference(2), "", TranslateOptions::unwrapped());
        let missing = catalog.translate("missing", &reference(3), "", TranslateOptions::unwrapped());

        assert_eq!(hello, "bonjour");
        assert_eq!(empty, "empty");
        assert_eq!(missing, "missing");
    }
}
