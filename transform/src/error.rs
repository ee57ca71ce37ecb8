//! Error types for the man-page transformer.
//!
//! Every parse-time failure carries the `path:line` reference of the
//! offending input. The transformer surfaces the first error per document
//! and does not attempt recovery.

use manpo_core::SourceRef;
use thiserror::Error;

/// Process exit code for documents that were generated by another tool and
/// must be translated at their source instead.
pub const GENERATED_DOCUMENT_EXIT_CODE: i32 = 254;

/// Errors that can occur while transforming a document.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The input is the output of a documentation generator; the original
    /// source should be translated instead of this rendition.
    #[error(
        "{reference}: this file was generated by {tool}; translate the original \
         source document instead of this rendition"
    )]
    GeneratedDocument { reference: SourceRef, tool: String },

    /// A construct the transformer deliberately does not handle.
    #[error("{reference}: unsupported: {message}")]
    Unsupported { reference: SourceRef, message: String },

    /// A macro absent from every dispatch table.
    #[error(
        "{reference}: unknown macro '.{name}'; register it with one of the \
         untranslated, noarg, translate_joined, translate_each or inline options"
    )]
    UnknownMacro { reference: SourceRef, name: String },

    /// Input that is shaped wrongly for the construct it uses.
    #[error("{reference}: {message}")]
    MalformedInput { reference: SourceRef, message: String },

    /// A translation with unbalanced font markup brackets.
    #[error("{reference}: unbalanced '<' or '>' in font markup: {snippet}")]
    UnbalancedMarkup { reference: SourceRef, snippet: String },

    /// Catalog I/O failure.
    #[error(transparent)]
    Catalog(#[from] manpo_core::CatalogError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TransformError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::GeneratedDocument { .. } => GENERATED_DOCUMENT_EXIT_CODE,
            _ => 1,
        }
    }
}

/// Convenience alias for results with [`TransformError`].
pub type Result<T> = std::result::Result<T, TransformError>;
