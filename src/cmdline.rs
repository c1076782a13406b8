use crate::core;
use crate::environment::Environment;
use crate::interpreter::{self, Options};
use crate::strings::StringMode;
use crate::tokens::{LineSource, TokenSource};
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Entry point behind `main`: parses the arguments, builds the root
/// environment and dispatches to a script run, a piped run or a live
/// session.
pub fn launch(args: Vec<String>) -> Result<(), Error> {
    let mut strings = StringMode::Raw;
    let mut script = None;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--unescape-strings" => strings = StringMode::Unescaped,
            path => script = Some(path.to_string()),
        }
    }
    let env = core::root_environment(strings);
    match script {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let mut tokens = TokenSource::new(BufReader::new(file).lines());
            interpreter::run(
                &mut tokens,
                &env,
                &Options {
                    strings,
                    echo_results: false,
                },
            );
            Ok(())
        }
        None if atty::is(atty::Stream::Stdin) => interactive(&env, strings),
        None => {
            // Piped input: no prompt, but results still land on stdout.
            let stdin = io::stdin();
            let mut tokens = TokenSource::new(stdin.lock().lines());
            interpreter::run(
                &mut tokens,
                &env,
                &Options {
                    strings,
                    echo_results: true,
                },
            );
            Ok(())
        }
    }
}

fn interactive(env: &Rc<Environment>, strings: StringMode) -> Result<(), Error> {
    let interface = setup()?;
    let mut tokens = TokenSource::new(PromptedLines {
        interface: &interface,
    });
    interpreter::run(
        &mut tokens,
        env,
        &Options {
            strings,
            echo_results: true,
        },
    );
    save_history(&interface)?;
    Ok(())
}

fn setup() -> io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("xumeng")?;
    interface.set_prompt("絮梦>>> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    }
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    let mut path = dirs::data_dir()?;
    path.push(".xumeng_history");
    Some(path)
}

fn save_history<T: Terminal>(interface: &Interface<T>) -> io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// Feeds the tokenizer from the line editor, one prompted line at a time.
struct PromptedLines<'a, T: Terminal> {
    interface: &'a Interface<T>,
}

impl<'a, T: Terminal> LineSource for PromptedLines<'a, T> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.interface.read_line()? {
                ReadResult::Eof => return Ok(None),
                ReadResult::Signal(sig) => {
                    writeln!(self.interface, "received signal {:?}", sig).ok();
                }
                ReadResult::Input(line) => {
                    self.interface.add_history_unique(line.clone());
                    return Ok(Some(line));
                }
            }
        }
    }
}
