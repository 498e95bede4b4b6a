use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest across the workspace
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Run tests through cargo-insta, optionally accepting changed snapshots
    Snapshots {
        #[arg(long)]
        accept: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Snapshots { accept } => run_snapshots(accept)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run").arg("--workspace");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    run(cmd, "cargo nextest run")
}

fn run_snapshots(accept: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["insta", "test", "-p", "nbtree"]);
    if accept {
        cmd.arg("--accept");
    }
    run(cmd, "cargo insta test")
}

fn run(mut cmd: Command, label: &str) -> Result<()> {
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
