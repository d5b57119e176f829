use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use gojo_common::error::{report_err, ErrorS};
use gojo_common::types::Position;
use gojo_interpreter::{Interpreter, Value};
use reedline::Signal;
use termcolor::{ColorChoice, StandardStream};

use crate::repl::{self, Prompt};

/// Exit status for malformed input (a syntax error).
const EXIT_DATAERR: u8 = 65;
/// Exit status for an error raised while running.
const EXIT_SOFTWARE: u8 = 70;
/// Exit status for a script that could not be read.
const EXIT_IOERR: u8 = 74;

#[derive(Debug, Parser)]
#[clap(about, disable_help_subcommand = true, propagate_version = true, version)]
pub struct Cmd {
    /// Start the REPL when no subcommand is given
    #[clap(long, env = "GOJO_REPL_MODE")]
    repl_mode: bool,
    #[clap(subcommand)]
    subcommand: Option<Subcmd>,
}

#[derive(Debug, Subcommand)]
enum Subcmd {
    /// Start an interactive session
    Repl,
    /// Run a script
    Run {
        #[clap(env = "GOJO_INPUT_FILE")]
        path: PathBuf,
        /// Print the parsed program and the final global bindings to stderr
        #[clap(long, env = "GOJO_VERBOSE")]
        verbose: bool,
        /// Print the token stream to stderr
        #[clap(long, env = "GOJO_MEGA_VERBOSE")]
        tokens: bool,
    },
}

impl Cmd {
    pub fn run(&self) -> Result<ExitCode> {
        match &self.subcommand {
            Some(Subcmd::Repl) => repl(),
            Some(Subcmd::Run { path, verbose, tokens }) => run(path, *verbose, *tokens),
            None if self.repl_mode => repl(),
            None => {
                Cmd::command().print_help().context("could not print help")?;
                Ok(ExitCode::from(2))
            }
        }
    }
}

fn repl() -> Result<ExitCode> {
    let mut editor = repl::editor()?;
    let mut interpreter = Interpreter::new(io::stdout());
    let stderr = &mut StandardStream::stderr(ColorChoice::Auto);

    println!("Welcome to the gojo REPL. Type \"exit\" or press Ctrl-D to quit.");
    loop {
        match editor.read_line(&Prompt).context("could not read from terminal")? {
            Signal::Success(line) => {
                if matches!(line.trim(), "exit" | "quit") {
                    break;
                }
                let program = match gojo_syntax::parse(&line) {
                    Ok(program) => program,
                    Err(e) => {
                        report(stderr, "<stdin>", &line, &e)?;
                        continue;
                    }
                };
                match interpreter.eval(&program) {
                    Ok(Some(Value::Undefined) | None) => {}
                    Ok(Some(value)) => println!("{}", value.repr()),
                    Err(e) => report(stderr, "<stdin>", &line, &e)?,
                }
            }
            Signal::CtrlC => eprintln!("CTRL-C"),
            Signal::CtrlD => break,
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run(path: &Path, verbose: bool, tokens: bool) -> Result<ExitCode> {
    let name = path.display().to_string();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read {name:?}: {e}");
            return Ok(ExitCode::from(EXIT_IOERR));
        }
    };
    let stderr = &mut StandardStream::stderr(ColorChoice::Auto);

    if tokens {
        match gojo_syntax::tokenize(&source) {
            Ok(tokens) => {
                for (start, token, _) in tokens {
                    let position = Position::new(&source, start).to_string();
                    writeln!(stderr, "{position:<8} {token:?}").context("could not write tokens")?;
                }
            }
            Err(e) => {
                report(stderr, &name, &source, &e)?;
                return Ok(ExitCode::from(EXIT_DATAERR));
            }
        }
    }

    let program = match gojo_syntax::parse(&source) {
        Ok(program) => program,
        Err(e) => {
            report(stderr, &name, &source, &e)?;
            return Ok(ExitCode::from(EXIT_DATAERR));
        }
    };
    if verbose {
        writeln!(stderr, "{program:#?}").context("could not write program")?;
    }

    let stdout = io::stdout();
    let mut interpreter = Interpreter::new(stdout.lock());
    let result = interpreter.run(&program);

    if verbose {
        writeln!(stderr, "globals:").context("could not write globals")?;
        for (name, value) in interpreter.globals().bindings() {
            writeln!(stderr, "  {name} = {}", value.repr()).context("could not write globals")?;
        }
    }

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report(stderr, &name, &source, &e)?;
            Ok(ExitCode::from(EXIT_SOFTWARE))
        }
    }
}

fn report(stderr: &mut StandardStream, name: &str, source: &str, e: &ErrorS) -> Result<()> {
    report_err(stderr, name, source, e).context("could not write diagnostic")
}
