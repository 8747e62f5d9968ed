//! A cursor over a single line of text, used by the header parser and the
//! ASCII body decoder.

/// An explicit position into an immutable line.
///
/// Every method either advances the position past what it matched or leaves
/// it untouched. Nothing is copied.
#[derive(Debug, Clone)]
pub(crate) struct LineCursor<'a> {
    line: &'a str,
    pos: usize,
}

/// PLY only uses spaces and tabs as separators within a line.
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

impl<'a> LineCursor<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    /// The part of the line that was not consumed yet.
    pub(crate) fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    /// Skips all spaces and tabs at the current position. Returns the number
    /// of skipped bytes.
    pub(crate) fn skip_whitespace(&mut self) -> usize {
        let n = self.rest().bytes().take_while(|&b| is_blank(b)).count();
        self.pos += n;
        n
    }

    /// Requires at least one whitespace byte at the current position and
    /// skips all whitespace. Returns `false` (without moving) if there is
    /// none.
    pub(crate) fn separator(&mut self) -> bool {
        self.skip_whitespace() > 0
    }

    /// Returns the next word (everything up to the next whitespace or the
    /// end of the line) without skipping leading whitespace. Returns `None`
    /// if the cursor is at whitespace or at the end.
    pub(crate) fn word(&mut self) -> Option<&'a str> {
        let len = self.rest().bytes().take_while(|&b| !is_blank(b)).count();
        if len == 0 {
            return None;
        }

        let out = &self.rest()[..len];
        self.pos += len;
        Some(out)
    }

    /// Skips leading whitespace, then returns the next word.
    pub(crate) fn next_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        self.word()
    }

    /// Returns the rest of the line with whitespace trimmed on both ends and
    /// moves to the end.
    pub(crate) fn take_rest(&mut self) -> &'a str {
        let out = self.rest().trim_matches(|c: char| c == ' ' || c == '\t');
        self.pos = self.line.len();
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_and_separators() {
        let mut c = LineCursor::new("property  list\tuchar int vertex_indices ");

        assert_eq!(c.word(), Some("property"));
        assert!(c.separator());
        assert_eq!(c.word(), Some("list"));
        assert!(c.separator());
        assert_eq!(c.word(), Some("uchar"));
        assert_eq!(c.word(), None);
        assert_eq!(c.next_word(), Some("int"));
        assert_eq!(c.next_word(), Some("vertex_indices"));
        assert_eq!(c.rest(), " ");
        assert_eq!(c.next_word(), None);
        assert_eq!(c.rest(), "");
    }

    #[test]
    fn missing_separator_does_not_move() {
        let mut c = LineCursor::new("formatascii");
        assert_eq!(c.word(), Some("formatascii"));
        assert!(!c.separator());
        assert_eq!(c.rest(), "");

        let mut c = LineCursor::new("format ascii");
        assert_eq!(c.word(), Some("format"));
        assert_eq!(c.word(), None);
        assert_eq!(c.rest(), " ascii");
    }

    #[test]
    fn rest_is_trimmed() {
        let mut c = LineCursor::new("comment   made by hand  ");
        assert_eq!(c.word(), Some("comment"));
        assert_eq!(c.take_rest(), "made by hand");
        assert_eq!(c.rest(), "");
        assert_eq!(c.take_rest(), "");
    }
}
