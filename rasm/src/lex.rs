//! Low level scanning helpers shared by the preprocessor and both passes.

use rm20::Word;

/// True for characters that terminate a line.
pub fn is_eol(c: char) -> bool {
    c == '\0' || c == '\r' || c == '\n'
}

/// True if `s` contains only whitespace. The empty string counts as
/// whitespace.
pub fn is_whitespace_string(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Scanning cursor over a single source line. Hands out whitespace delimited
/// fields as slices of the line; never advances past the end of the line.
pub struct Cursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Cursor<'a> {
        Cursor { line, pos: 0 }
    }

    /// Unread remainder of the line.
    pub fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    /// Skips leading whitespace and reads up to the next whitespace. Returns
    /// the empty string when only whitespace remains.
    pub fn next_field(&mut self) -> &'a str {
        let rest = &self.line[self.pos..];
        let start = match rest.find(|c: char| !c.is_whitespace()) {
            Some(start) => start,
            None => {
                self.pos = self.line.len();
                return "";
            }
        };

        let field = &rest[start..];
        let end = field
            .find(|c: char| c.is_whitespace() || is_eol(c))
            .unwrap_or_else(|| field.len());

        self.pos += start + end;
        &field[..end]
    }
}

/// Parses a signed decimal integer: optional leading whitespace, an optional
/// single `+` or `-`, one or more digits, and nothing but whitespace after
/// them. No radix prefixes. Accumulation wraps; callers mask the value into
/// the field they encode.
pub fn parse_number(tok: &str) -> Option<Word> {
    let tok = tok.trim_start();

    let (negative, digits) = match tok.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, tok.strip_prefix('+').unwrap_or(tok)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or_else(|| digits.len());
    if end == 0 || !is_whitespace_string(&digits[end..]) {
        return None;
    }

    let mut value: Word = 0;
    for c in digits[..end].bytes() {
        value = value.wrapping_mul(10).wrapping_add(Word::from(c - b'0'));
    }

    Some(if negative { value.wrapping_neg() } else { value })
}
