//! Command-line interface for papermark.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

use papermark::{ParseOptions, Result};

#[derive(Parser)]
#[command(name = "papermark", version, about = "Convert PDF documents to Markdown")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a PDF file to Markdown
    Convert {
        /// Input PDF file
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on any page error instead of skipping the page
        #[arg(long)]
        strict: bool,

        /// Process pages sequentially
        #[arg(long)]
        sequential: bool,
    },

    /// Dump the document's structure tree as JSON
    Inspect {
        /// Input PDF file
        input: PathBuf,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show format information about a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Convert {
            input,
            output,
            strict,
            sequential,
        } => {
            let mut options = ParseOptions::default();
            if strict {
                options = options.strict();
            }
            if sequential {
                options = options.sequential();
            }
            let markdown = papermark::to_markdown_with_options(&input, options)?;
            match output {
                Some(path) => {
                    fs::write(&path, markdown)?;
                    eprintln!("{} {}", "wrote".green(), path.display());
                }
                None => print!("{}", markdown),
            }
            Ok(())
        }
        Command::Inspect { input, pretty } => {
            let dump = papermark::inspect_structure(&input)?;
            let json = if pretty {
                serde_json::to_string_pretty(&dump)
            } else {
                serde_json::to_string(&dump)
            }
            .map_err(|e| papermark::Error::Other(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
        Command::Info { input } => {
            let format = papermark::detect_format_from_path(&input)?;
            let doc = lopdf::Document::load(&input)?;
            let pages = doc.get_pages().len();
            let tagged = papermark::structure::read_structure_tree(&doc)?
                .map(|root| root.has_elements())
                .unwrap_or(false);
            println!("{}: {}", "format".bold(), format);
            println!("{}: {}", "pages".bold(), pages);
            println!("{}: {}", "tagged".bold(), if tagged { "yes" } else { "no" });
            Ok(())
        }
    }
}
