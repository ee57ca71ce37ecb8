//! Source references attached to every extracted message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in an input document, as `path:line`.
///
/// Line numbers are 1-based. A reference stays attached to a message through
/// extraction so that translators can locate the original text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Path of the input document, as given on the command line.
    pub path: String,
    /// 1-based line number inside the document.
    pub line: usize,
}

impl SourceRef {
    pub fn new(path: &str, line: usize) -> Self {
        Self {
            path: path.to_string(),
            line,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_path_and_line() {
        let reference = SourceRef::new("man/ls.1", 42);
        assert_eq!(reference.to_string(), "man/ls.1:42");
    }
}
