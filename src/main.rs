use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::{env, fs};

use finch::{logging, Environment, ExecutionError};

const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;

fn main() -> ExitCode {
    logging::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => run_prompt(),
        [path] => run_file(path),
        _ => {
            eprintln!("Usage: finch [script]");
            ExitCode::from(EX_USAGE)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => {
            eprintln!("Could not read script '{path}': {error}");
            return ExitCode::from(EX_NOINPUT);
        }
    };

    let mut output_writer = io::stdout().lock();
    let mut env = Environment::new(&mut output_writer);
    match finch::execute(&contents, &mut env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

// Errors are reported and the session carries on with the next line.
fn run_prompt() -> ExitCode {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output_writer = io::stdout();
    let mut env = Environment::new(&mut output_writer);
    let mut buffer = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        buffer.clear();
        match input.read_line(&mut buffer) {
            // end of input
            Ok(0) => {
                println!();
                return ExitCode::SUCCESS;
            }
            Ok(_) => {
                if let Err(error) = finch::execute(&buffer, &mut env) {
                    report(&error);
                }
            }
            Err(error) => {
                eprintln!("Could not read input: {error}");
                return ExitCode::FAILURE;
            }
        }
    }
}

fn report(error: &ExecutionError) {
    eprintln!("{error}");
}
