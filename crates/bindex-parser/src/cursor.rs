//! A cursor over expression text with a movable position and an
//! optional right limit.
//!
//! Components rewind the cursor freely when a speculative parse fails, so
//! the cursor is position-based rather than slice-based. The limit lets a
//! component parse a sub-range (the true branch of a condition, say)
//! without the inner parse running past its delimiter.

use bindex_core::error::{ParseError, ParseErrorKind};

pub struct Cursor<'src> {
    source: &'src str,
    position: usize,
    limit: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            limit: source.len(),
        }
    }

    /// The full source text, ignoring any limit.
    #[inline]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Current byte offset from the start of the source.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to an absolute byte offset.
    ///
    /// Rejects positions beyond the end of the source. Moving backwards
    /// past an active limit is allowed; the limit stays where it is.
    pub fn set_position(&mut self, position: usize) -> Result<(), ParseError> {
        if position > self.source.len() || !self.source.is_char_boundary(position) {
            return Err(ParseError::new(
                ParseErrorKind::OutOfRange,
                position as u32,
                format!("cannot seek to byte {position}"),
            ));
        }
        self.position = position;
        Ok(())
    }

    /// Current right limit (exclusive).
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Restrict reads to end before `limit`.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), ParseError> {
        if limit < self.position || limit > self.source.len() || !self.source.is_char_boundary(limit)
        {
            return Err(ParseError::new(
                ParseErrorKind::InvalidLimit,
                self.position as u32,
                format!("cannot limit to byte {limit}"),
            ));
        }
        self.limit = limit;
        Ok(())
    }

    /// Remove any limit, restoring reads to the end of the source.
    pub fn clear_limit(&mut self) {
        self.limit = self.source.len();
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.position >= self.limit
    }

    /// The unread text between the position and the limit.
    #[inline]
    pub fn rest(&self) -> &'src str {
        &self.source[self.position..self.limit]
    }

    /// A slice of the source by absolute offsets, ignoring the limit.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.source[start..end]
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        if self.position >= self.limit {
            return None;
        }
        let byte = self.source.as_bytes()[self.position];
        if byte < 128 {
            Some(byte as char)
        } else {
            self.rest().chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Check if the upcoming text matches the given string.
    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume the current character and advance.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the given string if the upcoming text matches it.
    #[inline]
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.check_str(s) {
            self.position += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches.
    ///
    /// Returns the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.position;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.position]
    }

    /// Skip whitespace, returning whether any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.check(char::is_whitespace) {
            self.advance();
        }
        self.position > start
    }

    /// Consume an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    ///
    /// Returns `None` without moving if the current character cannot
    /// start an identifier.
    pub fn eat_identifier(&mut self) -> Option<&'src str> {
        if !self.check(|c| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }
        Some(self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    /// Whether the character at an absolute offset continues an
    /// identifier. Used to keep word operators like `and` from matching
    /// inside `android`.
    pub fn is_identifier_char_at(&self, offset: usize) -> bool {
        if offset >= self.source.len() {
            return false;
        }
        let byte = self.source.as_bytes()[offset];
        byte.is_ascii_alphanumeric() || byte == b'_'
    }
}
