//! Read position and bounded lookahead over an immutable body buffer.

use crate::error::FormError;

/// Cursor over a borrowed buffer. The cursor only ever moves forward, and only
/// when a caller explicitly accepts a token.
#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.cursor >= self.data.len()
    }

    /// Bytes from the cursor to the end of the buffer
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.cursor..]
    }

    /// Fails unless more than `n` bytes remain after the cursor.
    pub(crate) fn require(&self, n: usize) -> Result<(), FormError> {
        if self.cursor + n < self.data.len() {
            Ok(())
        } else {
            Err(FormError::unexpected_end(format!(
                "needed {n} more bytes at offset {} of {}",
                self.cursor,
                self.data.len()
            )))
        }
    }

    /// Compares the bytes at the cursor without advancing. False when fewer
    /// than `bytes.len()` bytes remain.
    pub(crate) fn peek_equals(&self, bytes: &[u8]) -> bool {
        self.rest().starts_with(bytes)
    }

    /// Advances the cursor by `n` bytes.
    pub(crate) fn skip(&mut self, n: usize) -> Result<(), FormError> {
        if n > self.remaining() {
            return Err(FormError::unexpected_end(format!(
                "cannot skip {n} bytes at offset {}",
                self.cursor
            )));
        }
        self.cursor += n;
        Ok(())
    }

    /// Moves the cursor to an absolute offset at or after the current one.
    pub(crate) fn seek(&mut self, offset: usize) {
        debug_assert!(offset >= self.cursor && offset <= self.data.len());
        self.cursor = offset;
    }

    /// Looks ahead for `trigger` and returns the text before it together with
    /// the trigger's offset. The cursor itself is left untouched.
    pub(crate) fn scan_until(&self, trigger: u8) -> Result<(&'a str, usize), FormError> {
        let mut lookahead = self.cursor;
        while lookahead < self.data.len() {
            if self.data[lookahead] == trigger {
                let span = &self.data[self.cursor..lookahead];
                let text = std::str::from_utf8(span).map_err(|e| {
                    FormError::InvalidTextEncoding(format!(
                        "span at offset {} is not UTF-8: {e}",
                        self.cursor
                    ))
                })?;
                return Ok((text, lookahead));
            }
            lookahead += 1;
        }

        Err(FormError::unexpected_end(format!(
            "no {:?} found after offset {}",
            trigger as char, self.cursor
        )))
    }
}
