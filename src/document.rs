//! Conversion between text and the line sequences the applier works on.

/// Split a multi-line change field into a block.
///
/// Splits on `\n` only. The empty string yields a single empty line, and a
/// trailing newline yields a trailing empty line, so `"a\n"` is the block
/// `["a", ""]`.
pub fn split_block(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}

/// A target file decoded into lines.
///
/// Only a single trailing newline is tracked so that `render` reproduces the
/// input for ordinary text files. Other line-ending details are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl Document {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: false,
        }
    }

    /// Decode file text. Empty text is an empty document.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };
        Self {
            lines: split_block(body),
            trailing_newline,
        }
    }

    /// Encode back to file text, restoring the trailing newline if the
    /// parsed text had one.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// Same newline convention, new content.
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: self.trailing_newline,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
