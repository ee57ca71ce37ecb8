//! Buffered physical-line source with push-back.

use std::io::BufRead;

use manpo_core::SourceRef;

use crate::error::Result;

/// Physical lines of one input document, with an unbounded push-back stack.
///
/// The logical-line reader pulls from here while assembling continuations and
/// pushes back lines it consumed too eagerly. Lines are returned without
/// their trailing newline.
pub struct LineSource {
    path: String,
    reader: Box<dyn BufRead>,
    next_line: usize,
    pushed: Vec<(String, SourceRef)>,
    at_eof: bool,
}

impl LineSource {
    pub fn new(path: &str, reader: Box<dyn BufRead>) -> Self {
        Self {
            path: path.to_string(),
            reader,
            next_line: 1,
            pushed: Vec::new(),
            at_eof: false,
        }
    }

    /// Path of the underlying document.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the next physical line, newline stripped.
    pub fn shift(&mut self) -> Result<Option<(String, SourceRef)>> {
        if let Some(entry) = self.pushed.pop() {
            return Ok(Some(entry));
        }
        if self.at_eof {
            return Ok(None);
        }

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            self.at_eof = true;
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        let reference = SourceRef::new(&self.path, self.next_line);
        self.next_line += 1;
        Ok(Some((line, reference)))
    }

    /// Returns a line so the next [`shift`](Self::shift) yields it again.
    pub fn unshift(&mut self, line: String, reference: SourceRef) {
        self.pushed.push((line, reference));
    }
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("path", &self.path)
            .field("next_line", &self.next_line)
            .field("pushed", &self.pushed.len())
            .finish()
    }
}
