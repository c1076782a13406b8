// The reader either keeps string bodies exactly as written, or decodes the
// escapes \n, \" and \\ at read time. The escape table is shared with the
// printer, which always re-escapes for readable display.

use bimap::BiMap;
use std::fmt;
use std::str::Chars;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StringMode {
    /// Keep the characters between the quotes untouched.
    Raw,
    /// Decode backslash escapes while reading.
    Unescaped,
}

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m
    };
}

#[derive(Debug)]
pub enum BuildError {
    UnknownEscape(char),
    TrailingBackslash,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownEscape(c) => write!(f, "unknown escape \\{}", c),
            BuildError::TrailingBackslash => write!(f, "backslash at end of string literal"),
        }
    }
}

struct Unescaper<'a> {
    chars: Chars<'a>,
}

impl Iterator for Unescaper<'_> {
    type Item = Result<char, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.chars.next()? {
            '\\' => match self.chars.next() {
                None => Err(BuildError::TrailingBackslash),
                Some(c) => ESCAPES
                    .get_by_left(&c)
                    .copied()
                    .ok_or(BuildError::UnknownEscape(c)),
            },
            c => Ok(c),
        };
        Some(result)
    }
}

pub fn build_string(raw: &str, mode: StringMode) -> Result<String, BuildError> {
    match mode {
        StringMode::Raw => Ok(raw.to_string()),
        StringMode::Unescaped => Unescaper { chars: raw.chars() }.collect(),
    }
}

/// Quotes the text for readable display. Raw-mode strings still carry their
/// escape pairs verbatim, so only the quote itself needs escaping there;
/// unescaped strings are re-escaped in full so the repr reads back.
pub fn string_repr(text: &str, mode: StringMode) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match mode {
            StringMode::Raw => {
                if c == '"' {
                    out.push('\\');
                }
                out.push(c);
            }
            StringMode::Unescaped => match ESCAPES.get_by_right(&c) {
                Some(&escape) => {
                    out.push('\\');
                    out.push(escape);
                }
                None => out.push(c),
            },
        }
    }
    out.push('"');
    out
}
