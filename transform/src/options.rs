//! Behavior options for the transformer.
//!
//! The list options mirror the comma-separated registration lists accepted on
//! the command line: each adds macros to the dispatch table with the named
//! handler, overriding the built-in registration when one exists.

use serde::{Deserialize, Serialize};

/// Policy for `.de`, `.ie` and `.if` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroffCodePolicy {
    /// Reject the document.
    #[default]
    Fail,
    /// Copy the block to the output unchanged.
    Verbatim,
    /// Hand the whole block to the catalog as one unwrapped unit.
    Translate,
}

impl GroffCodePolicy {
    /// Parses the command-line spelling of the policy.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fail" => Some(Self::Fail),
            "verbatim" => Some(Self::Verbatim),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }
}

/// Runtime configuration for a single document transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Increase diagnostic chatter.
    pub verbose: bool,
    /// Policy for `.de`/`.ie`/`.if` blocks.
    pub groff_code: GroffCodePolicy,
    /// Macros emitted verbatim, arguments included.
    pub untranslated: Vec<String>,
    /// Macros emitted verbatim that take no arguments (warn when given any).
    pub noarg: Vec<String>,
    /// Macros whose concatenated arguments form one translation unit.
    pub translate_joined: Vec<String>,
    /// Macros whose arguments are translated independently. An entry of the
    /// form `keepfirst:NAME` leaves the first (tag) argument untranslated.
    pub translate_each: Vec<String>,
    /// Macros embedded into the surrounding paragraph as `E<.name args>`.
    pub inline: Vec<String>,
    /// `begin:end` pairs added to the no-wrap macro sets. Ends are not
    /// matched against their begins: any end macro closes any begin macro.
    pub no_wrap: Vec<String>,
}

impl TransformOptions {
    /// Splits a comma-separated command-line list into entries.
    pub fn parse_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}
