// tealfront: IFJ21 scanner and parser driver

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as _;
use tracing_subscriber::{fmt, EnvFilter};

use tealfront::parser::lexer::{Lexer, TokenKind};
use tealfront::parser::{Parser, ParserConfig, RecoveryPolicy};

/// Scan and parse an IFJ21 program, reporting lexical, syntax and scoping errors.
#[derive(Debug, clap::Parser)]
#[command(name = "tealfront", version, about)]
struct Args {
    /// Source file to read; standard input when omitted
    file: Option<PathBuf>,

    /// Keep parsing after an error and report every diagnostic
    #[arg(short = 'k', long)]
    keep_going: bool,

    /// Give up after this many diagnostics
    #[arg(long, default_value_t = 64, value_name = "N")]
    max_errors: usize,

    /// Print the token stream instead of parsing
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the syntax tree of a successful parse
    #[arg(long)]
    ast: bool,

    /// Do not pre-declare the runtime functions (write, reads, ...)
    #[arg(long)]
    no_builtins: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let (name, source) = read_source(&args)?;
    tracing::info!(file = %name, bytes = source.len(), "source loaded");

    if args.tokens {
        return Ok(dump_tokens(&source));
    }

    let config = ParserConfig {
        recovery: if args.keep_going {
            RecoveryPolicy::Continue
        } else {
            RecoveryPolicy::StopAtFirst
        },
        max_errors: args.max_errors.max(1),
        builtins: !args.no_builtins,
    };

    let mut parser = Parser::with_config(&source, config);
    match parser.parse_program() {
        Ok(program) => {
            if args.ast {
                println!("{:#?}", program);
            }
            let functions: Vec<&str> = program.function_names().collect();
            tracing::info!(
                statements = program.body.len(),
                functions = %functions.join(", "),
                "parse finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            for diagnostic in &errors {
                eprintln!("{}: {}", name, diagnostic);
            }
            tracing::info!(count = errors.len(), "parse failed");
            Ok(exit_code(errors.exit_code()))
        }
    }
}

/// `RUST_LOG` wins over `-v`; logs go to stderr so token and tree dumps stay clean.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn read_source(args: &Args) -> anyhow::Result<(String, String)> {
    match &args.file {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read standard input")?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

fn dump_tokens(source: &str) -> ExitCode {
    let mut status = ExitCode::SUCCESS;
    for token in Lexer::new(source) {
        println!(
            "{:>4}:{:<4} {}",
            token.location.line, token.location.column, token
        );
        if matches!(token.kind, TokenKind::Error(_)) {
            status = exit_code(1);
        }
    }
    status
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}
