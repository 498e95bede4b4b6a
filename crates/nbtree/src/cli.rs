//! Command-line surface for packing and unpacking notebooks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::extract::extract;
use crate::app::pack::{PackOptions, normalize_output_path, pack_to_path};
use crate::app::scan::IgnoreSet;
use crate::app::unpack::{EmptyResultPolicy, UnpackOptions, WriteMode, unpack};
use crate::domain::errors::NbtreeError;
use crate::domain::model::Document;
use crate::infra::config::Config;
use crate::infra::notebook::read_notebook;
use crate::infra::prompt::ConsoleConfirm;

#[derive(Debug, Parser)]
#[command(
    name = "nbtree",
    author,
    version,
    about = "Pack a source tree into a notebook and unpack it again",
    long_about = None
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a directory into a notebook, one heading and code cell per file
    Pack(PackArgs),
    /// Recreate files on disk from a packed notebook
    Unpack(UnpackArgs),
    /// Print the file paths a notebook would unpack to
    List {
        notebook: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct PackArgs {
    /// Directory to pack
    source: PathBuf,
    /// Output notebook; the .ipynb extension is enforced
    #[arg(short, long)]
    output: PathBuf,
    /// Markdown file placed in the first cell
    #[arg(long)]
    preamble: Option<PathBuf>,
    /// Extra file or directory names to leave out
    #[arg(long, num_args = 1.., action = ArgAction::Append)]
    ignore: Vec<String>,
    /// Prefix heading paths with the source directory's name
    #[arg(long)]
    include_root_name: bool,
    /// Skip the ignore file installed next to the binary
    #[arg(long)]
    no_ignore_file: bool,
}

#[derive(Debug, Args)]
struct UnpackArgs {
    /// Notebook to unpack
    notebook: PathBuf,
    /// Directory file paths are resolved against
    #[arg(short, long, default_value = ".")]
    target: PathBuf,
    /// Overwrite policy for existing files
    #[arg(long, value_enum)]
    mode: Option<WriteMode>,
    /// Outcome when the notebook holds no file cells
    #[arg(long, value_enum)]
    on_empty: Option<EmptyResultPolicy>,
}

/// Execute the parsed command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pack(args) => run_pack(args, &Config::load()?),
        Commands::Unpack(args) => run_unpack(args, &Config::load()?),
        Commands::List { notebook } => run_list(&notebook),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "nbtree", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_pack(args: PackArgs, config: &Config) -> Result<()> {
    if !args.source.is_dir() {
        return Err(NbtreeError::InvalidSource(args.source).into());
    }

    let preamble = match &args.preamble {
        Some(path) if !path.is_file() => {
            return Err(NbtreeError::MissingPreamble(path.clone()).into());
        }
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read preamble {}", path.display()))?,
        ),
        None => None,
    };

    let output = normalize_output_path(&args.output);
    if output != args.output {
        println!("Note: output will be written to {}", output.display());
    }

    let ignore = resolve_ignore_set(config, &args)?;
    tracing::debug!(entries = ignore.len(), "resolved ignore set");

    let mut options = PackOptions::new(ignore)
        .with_root_name(args.include_root_name || config.pack.include_root_name);
    if let Some(preamble) = preamble {
        options = options.with_preamble(preamble);
    }

    let report = pack_to_path(&args.source, &output, &options)?;
    for skipped in &report.skipped {
        println!("Skipped file {}", skipped.display());
    }
    println!("Notebook saved to {}", output.display());
    println!(
        "Files packed: {}, total cells created: {}",
        report.packed.len(),
        report.cells
    );
    Ok(())
}

fn resolve_ignore_set(config: &Config, args: &PackArgs) -> Result<IgnoreSet> {
    let mut ignore = if args.no_ignore_file {
        IgnoreSet::new()
    } else {
        match config.pack.resolve_ignore_file() {
            Some(path) => IgnoreSet::load(&path)?,
            None => IgnoreSet::new(),
        }
    };
    ignore.extend(&config.pack.ignore);
    ignore.extend(&args.ignore);
    Ok(ignore)
}

fn run_unpack(args: UnpackArgs, config: &Config) -> Result<()> {
    let document = load_notebook(&args.notebook)?;

    let options = UnpackOptions::new(&args.target)
        .with_mode(args.mode.unwrap_or_else(|| config.unpack.write_mode()))
        .with_on_empty(args.on_empty.unwrap_or_else(|| config.unpack.on_empty()));
    tracing::debug!(mode = options.mode.as_str(), target = %args.target.display(), "unpacking");

    let mut confirmer = ConsoleConfirm::stdio();
    let report = unpack(&document, &args.notebook, &options, &mut confirmer)?;

    if report.total() == 0 {
        println!("No file path and code pairs found in the notebook.");
        return Ok(());
    }
    for path in &report.written {
        println!("Wrote {}", path.display());
    }
    for path in &report.declined {
        println!("Skipped writing to {}", path.display());
    }
    println!(
        "Unpack finished: {} written, {} unchanged, {} skipped.",
        report.written.len(),
        report.unchanged.len(),
        report.declined.len()
    );
    Ok(())
}

fn run_list(notebook: &Path) -> Result<()> {
    let document = load_notebook(notebook)?;
    for record in extract(&document) {
        println!("{}\t{} bytes", record.path, record.content.len());
    }
    Ok(())
}

fn load_notebook(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(NbtreeError::InvalidNotebook(path.to_path_buf()).into());
    }
    Ok(read_notebook(path)?)
}
