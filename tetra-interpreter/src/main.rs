//!
//! This is the command-line runner for the Tetra language.
//!
#![warn(missing_docs)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use tetra_interpreter::compiler;
use tetra_interpreter::interpreter::Interpreter;
use tetra_interpreter::universe::Universe;

#[derive(Debug, Clone, PartialEq, Parser)]
#[clap(about, author)]
struct Options {
    /// File to evaluate.
    file: PathBuf,

    /// Extra directories searched by `require`.
    #[clap(long, short)]
    load_path: Vec<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let opts: Options = Options::parse();

    let source = std::fs::read_to_string(&opts.file)
        .with_context(|| format!("could not read '{}'", opts.file.display()))?;

    let mut load_path = opts.load_path;
    if let Some(directory) = opts.file.parent() {
        load_path.push(directory.to_path_buf());
    }

    let unit = match compiler::compile_source(&source, &opts.file.to_string_lossy()) {
        Ok(unit) => unit,
        Err(error) => {
            eprintln!("{}: {}", opts.file.display(), error);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut universe = Universe::with_load_path(load_path);
    let mut interpreter = Interpreter::new();
    interpreter.push_unit_frame(unit, universe.main_object.clone());

    match interpreter.run(&mut universe) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            let file = error.file.as_deref().unwrap_or("?");
            let line = error.line.unwrap_or_default();
            eprintln!("{error}");
            eprintln!("\tfrom {file}:{line}");
            Ok(ExitCode::FAILURE)
        }
    }
}
