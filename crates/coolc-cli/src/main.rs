//! coolc - Cool compiler command line
//!
//! Input programs are JSON ASTs produced by an external parser.

use clap::{Parser, Subcommand};
use coolc_cli::commands::{build, check, dump};
use coolc_cli::logging::{init_logging, LogLevel};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coolc")]
#[command(about = "Cool type checker and LLVM IR generator", long_about = None)]
#[command(version)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a program
    Check {
        /// JSON AST file
        file: PathBuf,
    },

    /// Type-check and emit LLVM IR
    Build {
        /// JSON AST file
        file: PathBuf,
        /// Output file (default: input with .ll extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Lower unsupported constructs to void with a warning instead of
        /// failing (debugging aid)
        #[arg(long)]
        lenient: bool,
    },

    /// Print class layouts and vtable slots as JSON
    DumpClasses {
        /// JSON AST file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Check { file } => check::execute(&file)?,
        Commands::Build {
            file,
            output,
            lenient,
        } => {
            let output = build::execute(&file, output, lenient)?;
            println!("Wrote {}", output.display());
        }
        Commands::DumpClasses { file } => dump::execute(&file)?,
    }

    Ok(())
}
