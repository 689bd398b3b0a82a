use std::path::PathBuf;

use clap::Parser;

/// Feeder — batch source uploader driving a live browser tab.
#[derive(Debug, Parser)]
#[command(name = "feeder", version, about)]
pub struct Cli {
    /// Input file: a URL list (whitespace/comma/semicolon separated), or a
    /// CSV with `--csv`.
    pub input: PathBuf,

    /// Treat the input as CSV with a header row; the URL column is taken
    /// from `--column` or the config, row indexes become item identities.
    #[arg(long)]
    pub csv: bool,

    /// CSV column holding the URLs (overrides the config).
    #[arg(long)]
    pub column: Option<String>,

    /// Automation bridge endpoint (overrides the config).
    #[arg(long)]
    pub bridge: Option<String>,

    /// Directory for the completion-marker state file (overrides the config).
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Config file path.
    #[arg(long, default_value = "feeder.toml")]
    pub config: PathBuf,

    /// Also log to the terminal, not just ./feeder.log.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}
