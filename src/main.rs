use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use schemer::eval::Interp;
use schemer::reader::LineSource;
use schemer::value::Value;

/// Line input backed by rustyline, so the interactive loop gets history
/// and line editing.
struct ReplSource {
    editor: DefaultEditor,
}

impl ReplSource {
    fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| io::Error::other(e.to_string()))?;
        Ok(ReplSource { editor })
    }
}

impl LineSource for ReplSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let interactive = io::stdin().is_terminal();
    let mut interp = if interactive {
        match ReplSource::new() {
            Ok(source) => Interp::with_io(Box::new(source), Box::new(io::stdout())),
            Err(e) => {
                eprintln!("Failed to initialize line editor: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Interp::new()
    };

    if std::env::var("SCHEMER_TRACE").map(|v| v == "1").unwrap_or(false) {
        interp.trace = true;
    }

    match args.len() {
        // REPL only.
        1 => {
            if interactive {
                run_repl(&mut interp);
            } else {
                return run_piped(&mut interp);
            }
        }
        // Load a file, then exit.
        2 => {
            if let Some(code) = load_file(&mut interp, &args[1]) {
                return code;
            }
        }
        // Load a file, then drop into the REPL.
        3 if args[2] == "-" => {
            if let Some(code) = load_file(&mut interp, &args[1]) {
                return code;
            }
            run_repl(&mut interp);
        }
        _ => {
            eprintln!("Usage: schemer [file] [-]");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Load and evaluate a whole file. Returns an exit code on failure.
fn load_file(interp: &mut Interp, path: &str) -> Option<ExitCode> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            return Some(ExitCode::FAILURE);
        }
    };
    match interp.load_source(&text) {
        Ok(()) => None,
        Err(e) => {
            eprintln!("{}", e);
            Some(ExitCode::FAILURE)
        }
    }
}

/// Interactive loop: read, evaluate, print anything that is a value,
/// keep going past errors. Ends with a farewell at end of input.
fn run_repl(interp: &mut Interp) {
    loop {
        match interp.read_expression("> ", "| ") {
            Ok(Value::Eof) => {
                println!("Goodbye");
                return;
            }
            Ok(expr) => {
                let env = interp.global_env();
                match interp.evaluate(expr, &env) {
                    Ok(Value::None) => {}
                    Ok(v) => println!("{}", interp.stringify(&v, true)),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }
}

/// Non-terminal stdin: read everything, evaluate expression by
/// expression, print each result.
fn run_piped(interp: &mut Interp) -> ExitCode {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Failed to read input: {}", e);
        return ExitCode::FAILURE;
    }

    interp.feed_source(&input);
    loop {
        match interp.next_expression() {
            Ok(Some(expr)) => {
                let env = interp.global_env();
                match interp.evaluate(expr, &env) {
                    Ok(Value::None) => {}
                    Ok(v) => println!("{}", interp.stringify(&v, true)),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }
}
