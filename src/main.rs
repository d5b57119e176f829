mod cmd;
mod repl;

use std::process::ExitCode;

use clap::Parser;

use crate::cmd::Cmd;

fn main() -> ExitCode {
    human_panic::setup_panic!();
    match Cmd::parse().run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
