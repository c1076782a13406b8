use crate::environment::Environment;
use crate::evaluator::{self, evaluate};
use crate::printer;
use crate::reader::{self, read_expression};
use crate::strings::StringMode;
use crate::tokens::{LineSource, TokenSource, TokenizerError};
use crate::types::Value;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::rc::Rc;

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Read(_) => "SyntaxError",
            Error::Eval(e) => e.kind(),
        }
    }

    // Losing the input stream ends the session; everything else is local to
    // the one offending form.
    fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Read(reader::Error::Tokenizer(TokenizerError::Io(_)))
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "{}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

pub struct Options {
    pub strings: StringMode,
    /// Echo the value of each top-level form. On for live sessions, off for
    /// program files, where only 输出 speaks.
    pub echo_results: bool,
}

/// The read–evaluate–print loop. A failing form is reported on stderr and
/// abandoned; the loop itself only stops at end of input or when the source
/// breaks underneath it.
pub fn run<S: LineSource>(tokens: &mut TokenSource<S>, env: &Rc<Environment>, options: &Options) {
    loop {
        let outcome = match read_expression(tokens, options.strings) {
            Ok(None) => break,
            Ok(Some(expr)) => evaluate(&expr, env).map_err(Error::Eval),
            Err(e) => Err(Error::Read(e)),
        };
        match outcome {
            Ok(Value::Nothing) => {}
            Ok(value) => {
                if options.echo_results {
                    println!("{}", printer::pr_str(&value, options.strings));
                }
            }
            Err(error) => {
                report(&error);
                if error.is_fatal() {
                    break;
                }
            }
        }
    }
}

fn report(error: &Error) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{}: {}", ansi_term::Colour::Red.paint(error.kind()), error);
    } else {
        eprintln!("{}: {}", error.kind(), error);
    }
}

/// Runs a program file against the given root environment, quietly: no
/// prompt, no echo. Only the failure to open the file propagates.
pub fn load_file(path: &str, env: &Rc<Environment>, strings: StringMode) -> io::Result<()> {
    let file = File::open(path)?;
    let mut tokens = TokenSource::new(BufReader::new(file).lines());
    run(
        &mut tokens,
        env,
        &Options {
            strings,
            echo_results: false,
        },
    );
    Ok(())
}
