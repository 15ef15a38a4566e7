/// Character-level source iterator for the Pfn lexer.
///
/// The cursor wraps a source string and provides character-by-character
/// iteration with byte-offset and line/column position tracking. Offsets
/// are byte positions into the original UTF-8 source; line and column are
/// 1-based, with a newline resetting the column.
pub struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    line: u32,
    column: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            chars: source.chars(),
        }
    }

    /// Look at the current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Look at the character after the current one without consuming anything.
    pub fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume the current character and advance the position.
    ///
    /// Returns the consumed character, or `None` at end of input. A newline
    /// increments the line counter and resets the column to 1.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the current character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Current byte position in the source text.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current 1-based column number.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Whether there are no more characters to consume.
    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Advance while the predicate holds for the current character.
    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Extract a slice of the source text by byte offsets.
    ///
    /// # Panics
    ///
    /// Panics if start or end are out of bounds or not on UTF-8 boundaries.
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cursor_starts_at_origin() {
        let cursor = Cursor::new("hello");
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.column(), 1);
        assert!(!cursor.is_eof());
    }

    #[test]
    fn peek_does_not_advance() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn peek_next_looks_ahead() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("a\nbc");
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!((cursor.line(), cursor.column()), (1, 2));
        assert_eq!(cursor.advance(), Some('\n'));
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        assert_eq!(cursor.advance(), Some('b'));
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn advance_tracks_multibyte_utf8() {
        // U+00E9 (e with accent) is 2 bytes in UTF-8
        let mut cursor = Cursor::new("\u{00E9}a");
        assert_eq!(cursor.advance(), Some('\u{00E9}'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.pos(), 3);
    }

    #[test]
    fn eat_consumes_only_on_match() {
        let mut cursor = Cursor::new("->");
        assert!(!cursor.eat('>'));
        assert!(cursor.eat('-'));
        assert!(cursor.eat('>'));
        assert!(cursor.is_eof());
    }

    #[test]
    fn eat_while_consumes_matching() {
        let mut cursor = Cursor::new("aaab");
        cursor.eat_while(|c| c == 'a');
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.peek(), Some('b'));
    }

    #[test]
    fn slice_extracts_text() {
        let cursor = Cursor::new("hello world");
        assert_eq!(cursor.slice(0, 5), "hello");
        assert_eq!(cursor.slice(6, 11), "world");
    }
}
