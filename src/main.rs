use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::debug;
use minipar::{ast, interpreter::lexer, parse_program, run_program, tokenize};

/// Interpreter for the Minipar language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the token stream instead of running the program.
    #[arg(short = 't', long = "tok")]
    tokens: bool,

    /// Print the abstract syntax tree instead of running the program.
    #[arg(short = 'a', long = "ast")]
    tree: bool,

    /// Enable verbose logging of the interpreter phases.
    #[arg(short, long)]
    verbose: bool,

    /// Run the path exactly as given, without looking it up among the
    /// bundled demo programs.
    #[arg(short = 'r', long = "raw")]
    raw: bool,

    /// Program read from a script file.
    name: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version output are not usage errors.
            let code = if e.use_stderr() { 64 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        },
    };

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let path = resolve_path(&args.name, args.raw);
    debug!("running {}", path.display());

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("minipar: cannot read '{}': {e}", path.display());
            return ExitCode::from(64);
        },
    };

    if args.tokens {
        return match tokenize(&source) {
            Ok(tokens) => {
                print!("{}", lexer::dump_tokens(&tokens));
                ExitCode::SUCCESS
            },
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(1)
            },
        };
    }

    if args.tree {
        return match parse_program(&source) {
            Ok(module) => {
                print!("{}", ast::dump(&module));
                ExitCode::SUCCESS
            },
            Err(e) => {
                eprintln!("{e}");
                exit_code_of(&e)
            },
        };
    }

    match run_program(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            exit_code_of(&e)
        },
    }
}

/// Resolves a program name to a path.
///
/// A bare name that does not exist on disk is looked up among the bundled
/// demo programs (`demos/<name>.mp`); `--raw` disables the lookup.
fn resolve_path(name: &str, raw: bool) -> PathBuf {
    let direct = PathBuf::from(name);
    if raw || direct.exists() {
        return direct;
    }
    let demo = PathBuf::from("demos").join(format!("{name}.mp"));
    if demo.exists() { demo } else { direct }
}

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn exit_code_of(e: &minipar::error::Error) -> ExitCode {
    ExitCode::from(e.exit_code() as u8)
}
