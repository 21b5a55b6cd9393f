// crates/fastpred-cli/src/main.rs

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod cmd;
mod io;

#[derive(Parser)]
#[command(name = "fastpred")]
#[command(about = "Fingerprint similarity screening (Tanimoto + z-score consensus)", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build one .qbfp query stream per molecule from .fpf fingerprint files
    PackQuery(cmd::pack_query::PackQueryArgs),

    /// Build a .bfp reference collection from an .fpf fingerprint file
    PackDb(cmd::pack_db::PackDbArgs),

    /// Screen query streams against reference collections
    Screen(cmd::screen::ScreenArgs),

    /// Inspect a query stream or reference collection (counts, popcounts, ids)
    Inspect(cmd::inspect::InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.cmd {
        Commands::PackQuery(args) => cmd::pack_query::run(args),
        Commands::PackDb(args) => cmd::pack_db::run(args),
        Commands::Screen(args) => cmd::screen::run(args),
        Commands::Inspect(args) => cmd::inspect::run(args),
    }
}
