//! Cinder CLI
//!
//! Main entry point for the `cinder` command.

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cinder::interp::Payload;
use cinder::{Interpreter, SourceFile};

#[derive(Parser)]
#[command(name = "cinder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Cinder expression language interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Cinder source file
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Start the interactive REPL
    Repl,

    /// Parse a source file and dump the AST as JSON
    Ast {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Dump the token stream of a source file
    Tokens {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Run { input } => run(&input),
        Commands::Repl => repl(),
        Commands::Ast { input } => dump_ast(&input),
        Commands::Tokens { input } => dump_tokens(&input),
    }
}

fn read_source(input: &std::path::Path) -> Result<SourceFile> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;
    Ok(SourceFile::new(input.to_string_lossy().to_string(), content))
}

fn run(input: &std::path::Path) -> Result<()> {
    tracing::info!("Running {:?}", input);

    let file = read_source(input)?;
    let mut interpreter = Interpreter::new();
    let result = interpreter.evaluate_program(&file)?;

    // Only print non-unit results
    match result.payload() {
        Payload::Unit => {}
        _ => println!("{}", result),
    }
    Ok(())
}

fn repl() -> Result<()> {
    println!("Cinder REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut editor = rustyline::DefaultEditor::new()
        .map_err(|e| miette::miette!("Failed to start line editor: {}", e))?;
    let mut interpreter = Interpreter::new();
    // Session bindings live in a child of the root frame
    interpreter.enter_scope();

    loop {
        let line = match editor.readline("cinder> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => continue,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            ":quit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :help, :h    Show this help");
                println!("  :quit, :q    Exit the REPL");
                println!();
            }
            _ => {
                let file = SourceFile::new("<repl>", trimmed);
                match interpreter.evaluate_line(&file) {
                    Ok(value) => println!("{}", value),
                    Err(report) => eprintln!("{:?}", report),
                }
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn dump_ast(input: &std::path::Path) -> Result<()> {
    let file = read_source(input)?;
    let tokens = cinder::lexer::lex(&file)?;
    let ast = cinder::parser::parse(&tokens, &file)?;
    let json = serde_json::to_string_pretty(&ast)
        .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn dump_tokens(input: &std::path::Path) -> Result<()> {
    let file = read_source(input)?;
    let tokens = cinder::lexer::lex(&file)?;
    for token in &tokens {
        println!(
            "{:>4}..{:<4} {:?} {}",
            token.span.start, token.span.end, token.kind, token.text
        );
    }
    Ok(())
}
