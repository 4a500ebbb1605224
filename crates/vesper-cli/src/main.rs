use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;
use vesper::{ErrorKind, ReplSession, Runner};

/// A tree-walking R5RS Scheme interpreter.
#[derive(Debug, Parser)]
#[command(name = "vesper", version)]
struct Cli {
    /// Run a full garbage collection on every allocation.
    #[arg(long)]
    debug_memory: bool,

    /// Script files evaluated in order; with none, an interactive REPL
    /// starts.
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.files.is_empty() {
        repl(cli.debug_memory)
    } else {
        batch(cli.debug_memory, &cli.files)
    }
}

/// Evaluates each file against one shared environment. An evaluation error
/// is reported and the next file still runs; only a file that cannot be
/// opened makes the exit status non-zero.
fn batch(debug_memory: bool, files: &[PathBuf]) -> ExitCode {
    let runner = Runner::new();
    runner.set_debug_memory(debug_memory);

    let mut failed_to_open = false;
    for file in files {
        if let Err(err) = runner.eval_file(file) {
            eprintln!("{err}");
            if err.kind() == ErrorKind::Io {
                failed_to_open = true;
            }
        }
    }
    if failed_to_open { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn repl(debug_memory: bool) -> ExitCode {
    let mut session = ReplSession::new();
    session.set_debug_memory(debug_memory);

    let mut editor = match rustyline::DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("failed to initialize line editor: {err}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                match session.execute(&line) {
                    Ok(Some(printed)) => println!("{printed}"),
                    Ok(None) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
            Err(ReadlineError::Interrupted) => {}
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
