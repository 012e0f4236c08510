use std::process::ExitCode;
use std::{env, fs};

use finch::logging;

const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;

// Print the parsed program as S-expressions, one top-level statement per line.
fn main() -> ExitCode {
    logging::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let [path] = args.as_slice() else {
        eprintln!("Usage: finch-ast [script]");
        return ExitCode::from(EX_USAGE);
    };

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => {
            eprintln!("Could not read script '{path}': {error}");
            return ExitCode::from(EX_NOINPUT);
        }
    };

    match finch::compile(&contents) {
        Ok(statements) => {
            println!("{}", finch::print_program(&statements));
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}
