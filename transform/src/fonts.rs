//! Font-stack engine.
//!
//! Tracks the current, previous and regular fonts of a document and rewrites
//! a paragraph's inline `\f` escapes into the surface markup shown to
//! translators (`B<…>`, `I<…>`, `R<…>`, `CW<…>`).
//!
//! Font names are stored in canonical internal form: a single letter (`B`),
//! a paren pair for two-letter names (`(CW`), or a bracketed name (`[foo]`).

use std::sync::LazyLock;

use manpo_core::SourceRef;
use regex::{Captures, Regex};
use tracing::debug;

/// Inline font escape: `\fX`, `\f(XX` or `\f[name]`.
static FONT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\f(?:\((..)|\[([^\]]*)\]|(.))").expect("static regex must compile")
});

const REGULAR: &str = "R";

#[derive(Debug, Clone)]
pub struct FontStack {
    current: String,
    previous: String,
    regular: String,
}

impl Default for FontStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStack {
    pub fn new() -> Self {
        Self {
            current: REGULAR.to_string(),
            previous: REGULAR.to_string(),
            regular: REGULAR.to_string(),
        }
    }

    pub fn regular(&self) -> &str {
        &self.regular
    }

    /// Changes the ambient font of the enclosing context (`B` inside section
    /// headings, `R` elsewhere).
    pub fn set_regular(&mut self, name: &str) {
        self.regular = name.to_string();
    }

    /// Drops back to the regular font, forgetting the previous one.
    /// Paragraph-reset macros call this.
    pub fn reset(&mut self) {
        self.current = self.regular.clone();
        self.previous = self.regular.clone();
    }

    /// Applies a `.ft` request. Without an argument the request swaps back
    /// to the previous font.
    pub fn apply_request(&mut self, name: Option<&str>) {
        match name {
            None => self.apply(None),
            Some(raw) => self.apply(normalize_request_name(raw)),
        }
    }

    fn apply(&mut self, font: Option<String>) {
        match font {
            None => std::mem::swap(&mut self.current, &mut self.previous),
            Some(font) => {
                self.previous = std::mem::replace(&mut self.current, font);
            }
        }
    }

    /// Rewrites a paragraph's `\f` escapes into surface markup.
    ///
    /// The carried-over state is prepended as two synthetic escapes so that
    /// the paragraph starts from the right current/previous pair; consecutive
    /// identical selectors collapse, empty fragments vanish, and the result
    /// always returns to the regular font.
    pub fn process(&mut self, text: &str, reference: &SourceRef) -> String {
        let mut prefixed = escape_for(&self.previous);
        prefixed.push_str(&escape_for(&self.current));
        prefixed.push_str(text);

        let mut runs: Vec<(String, String)> = Vec::new();
        let mut last_end = 0usize;
        for caps in FONT_RE.captures_iter(&prefixed) {
            let whole = caps.get(0).expect("regex match has a whole group");
            if whole.start() > last_end {
                push_run(
                    &mut runs,
                    &self.current,
                    &prefixed[last_end..whole.start()],
                );
            }
            self.apply(normalize_selector(&caps));
            last_end = whole.end();
        }
        if last_end < prefixed.len() {
            push_run(&mut runs, &self.current, &prefixed[last_end..]);
        }

        let mut out = String::with_capacity(text.len());
        for (font, chunk) in &runs {
            if *font == self.regular {
                out.push_str(chunk);
            } else if let Some(marker) = surface_marker(font) {
                out.push_str(marker);
                out.push('<');
                out.push_str(chunk);
                out.push('>');
            } else {
                out.push_str(&escape_for(font));
                out.push_str(chunk);
                out.push_str(&escape_for(&self.regular));
            }
        }

        debug!(target: "fonts", %reference, input = text, output = %out);
        out
    }
}

fn push_run(runs: &mut Vec<(String, String)>, font: &str, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    if let Some(last) = runs.last_mut()
        && last.0 == font
    {
        last.1.push_str(chunk);
        return;
    }
    runs.push((font.to_string(), chunk.to_string()));
}

/// Resolves one regex capture to a canonical font name; `None` selects the
/// previous font.
fn normalize_selector(caps: &Captures<'_>) -> Option<String> {
    if let Some(pair) = caps.get(1) {
        return Some(format!("({}", pair.as_str()));
    }
    if let Some(bracketed) = caps.get(2) {
        return normalize_request_name(bracketed.as_str());
    }
    let single = caps
        .get(3)
        .expect("font regex alternation is exhaustive")
        .as_str();
    match single {
        "P" => None,
        "1" => Some("R".to_string()),
        "2" => Some("I".to_string()),
        "3" => Some("B".to_string()),
        "4" => Some("(BI".to_string()),
        other => Some(other.to_string()),
    }
}

/// Canonicalizes a font name given without escape syntax (`.ft` argument or
/// bracketed selector payload).
fn normalize_request_name(name: &str) -> Option<String> {
    match name {
        "" | "P" => None,
        "1" => Some("R".to_string()),
        "2" => Some("I".to_string()),
        "3" => Some("B".to_string()),
        "4" => Some("(BI".to_string()),
        single if single.chars().count() == 1 => Some(single.to_string()),
        pair if pair.chars().count() == 2 => Some(format!("({pair}")),
        longer => Some(format!("[{longer}]")),
    }
}

/// Renders a canonical font name as an inline escape. The canonical form
/// already carries the paren or bracket syntax, so this is a plain prefix.
fn escape_for(font: &str) -> String {
    format!("\\f{font}")
}

/// Marker letter(s) for fonts that have a translator-visible surface form.
fn surface_marker(font: &str) -> Option<&'static str> {
    match font {
        "B" => Some("B"),
        "I" => Some("I"),
        "R" => Some("R"),
        "(CW" => Some("CW"),
        _ => None,
    }
}
