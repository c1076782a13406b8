use regex::Regex;
use std::fmt;
use std::io;

// Literary bracket markers that may stand in for 【 and 】 in source text.
const OPEN_MARKERS: [&str; 6] = ["【", "~其", "~然", "~是", "~此", "~斯"];
const CLOSE_MARKERS: [&str; 6] = ["】", "也~", "者~", "耳~", "焉~", "哉~"];

#[derive(Debug, Eq, PartialEq)]
pub enum Token {
    Open,
    Close,
    /// The text between the quotes, escapes untouched.
    StringLiteral(String),
    PlainChars(String),
}

#[derive(Debug)]
pub enum TokenizerError {
    UnbalancedString,
    NoCapture(String),
    Io(io::Error),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnbalancedString => write!(f, "unbalanced string literal"),
            TokenizerError::NoCapture(line) => {
                write!(f, "token pattern did not match {:?}", line)
            }
            TokenizerError::Io(e) => write!(f, "could not read source line: {}", e),
        }
    }
}

/// Where the interpreter's lines come from: a file, a pipe, or a prompting
/// terminal. `None` means the source is truly exhausted.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl<B: io::BufRead> LineSource for io::Lines<B> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.next().transpose()
    }
}

pub struct TokenSource<S> {
    source: S,
    line: String,
}

impl<S: LineSource> TokenSource<S> {
    pub fn new(source: S) -> Self {
        TokenSource {
            source,
            line: String::new(),
        }
    }

    /// The next non-blank, non-comment token, or `None` at end of input.
    /// Fresh lines are pulled from the source as the buffer runs dry.
    pub fn next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        lazy_static! {
            static ref TOKEN_RE: Regex = Regex::new(
                r#"(?x)                 # verbose mode
                    \s*                 # leading whitespace, ignored
                    (                   # token capture group
                        【
                        |】
                        |"(?:           # string literal contents:
                            \\.         #   escape pairs
                            |[^\\"]     #   anything but backslash or quote
                          )*
                          "?            #   possibly missing its closing quote
                        |;.*            # line comment
                        |[^\s【】";]*    # maximal run of plain characters
                    )
                "#
            )
            .unwrap();
        }
        loop {
            if self.line.is_empty() {
                match self.source.next_line().map_err(TokenizerError::Io)? {
                    None => return Ok(None),
                    Some(raw) => self.line = substitute(&raw),
                }
            }
            let caps = TOKEN_RE
                .captures(&self.line)
                .ok_or_else(|| TokenizerError::NoCapture(self.line.clone()))?;
            let lexeme = caps.get(1).unwrap().as_str().to_string();
            let consumed = caps.get(0).unwrap().end();
            self.line = self.line[consumed..].to_string();
            if lexeme.is_empty() || lexeme.starts_with(';') {
                // A blank or commented-out stretch; retry on what remains.
                continue;
            }
            return create_token(&lexeme).map(Some);
        }
    }
}

/// The fixed text substitutions applied to every freshly read line, in
/// order: bracket markers, fullwidth comments, fullwidth quotes, fullwidth
/// semicolon.
fn substitute(raw: &str) -> String {
    lazy_static! {
        static ref COMMENT_RE: Regex = Regex::new("（.*）").unwrap();
    }
    let mut line = raw.to_string();
    for marker in &OPEN_MARKERS {
        line = line.replace(marker, " 【 ");
    }
    for marker in &CLOSE_MARKERS {
        line = line.replace(marker, " 】 ");
    }
    let line = COMMENT_RE.replace_all(&line, "");
    line.replace('“', "\"").replace('”', "\"").replace('；', ";")
}

fn create_token(lexeme: &str) -> Result<Token, TokenizerError> {
    match lexeme {
        "【" => Ok(Token::Open),
        "】" => Ok(Token::Close),
        _ if lexeme.starts_with('"') => tokenize_string_literal(lexeme),
        _ => Ok(Token::PlainChars(lexeme.to_string())),
    }
}

fn tokenize_string_literal(lexeme: &str) -> Result<Token, TokenizerError> {
    let bytes = lexeme.as_bytes();
    if bytes.len() == 1 || bytes[bytes.len() - 1] != b'"' {
        return Err(TokenizerError::UnbalancedString);
    }
    // A literal ending in \" has not really been closed.
    let trailing_backslashes = bytes
        .iter()
        .rev()
        .skip(1)
        .take_while(|&&byte| byte == b'\\')
        .count();
    if trailing_backslashes % 2 == 1 {
        return Err(TokenizerError::UnbalancedString);
    }
    Ok(Token::StringLiteral(lexeme[1..lexeme.len() - 1].to_string()))
}
