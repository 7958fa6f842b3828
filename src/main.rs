//! # Tern
//!
//! Command line driver: run, assemble and disassemble Tern programs.
//!

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod term;

#[derive(Parser, Debug)]
#[command(name = "tern")]
#[command(about = "Run, assemble and disassemble Tern bytecode", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a program. `.tasm` files are assembled first.
    Run {
        file: PathBuf,

        /// Instructions executed between interrupt checks
        #[arg(long, default_value = "5000")]
        budget: usize,

        /// Bound local ids by the function's declared slots
        #[arg(long)]
        declared_locals: bool,

        /// Treat unknown opcodes as fatal instead of skipping them
        #[arg(long)]
        strict_opcodes: bool,

        /// Collect garbage whenever this many objects are live
        #[arg(long)]
        gc_threshold: Option<usize>,

        /// Maximum nesting of script calls
        #[arg(long, default_value = "1024")]
        max_call_depth: usize,
    },
    /// Assemble a text program into a bytecode file.
    Asm {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a listing of a program.
    Dis { file: PathBuf },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tern=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ok = match cli.command {
        Command::Run {
            file,
            budget,
            declared_locals,
            strict_opcodes,
            gc_threshold,
            max_call_depth,
        } => {
            let options = term::options(declared_locals, strict_opcodes, gc_threshold, max_call_depth);
            term::run(&file, options, budget)
        }
        Command::Asm { input, output } => term::asm(&input, &output),
        Command::Dis { file } => term::dis(&file),
    };
    if !ok {
        std::process::exit(1);
    }
}
