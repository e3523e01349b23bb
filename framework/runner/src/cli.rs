use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct GustCli {
    /// Hostname of the target API.
    ///
    /// Falls back to the `HOST` environment variable, then `localhost`.
    #[clap(long)]
    pub host: Option<String>,

    /// Port of the target API.
    ///
    /// Falls back to the `PORT` environment variable, then `8080`.
    #[clap(long)]
    pub port: Option<u16>,

    /// Directory that report artifacts are written to.
    ///
    /// Falls back to the `OUTPUT_DIR` environment variable, then `results`.
    #[clap(long)]
    pub out_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[clap(long, default_value = "30")]
    pub request_timeout: u64,

    /// Cap every scenario's duration at this many seconds.
    #[clap(long)]
    pub duration: Option<u64>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked
    /// at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// How the run summary is reported.
    #[clap(long, value_enum, default_value_t = ReporterOpt::Table)]
    pub reporter: ReporterOpt,

    /// Use a fixed run id instead of a generated one.
    #[clap(long)]
    pub run_id: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterOpt {
    /// Table digest on stdout plus the JSONL summary file.
    Table,
    /// Table digest, HTML artifact and the JSONL summary file.
    Html,
    /// No report output at all. Useful in tests.
    Noop,
}

/// Initialise logging and parse the command line for a scenario binary.
pub fn init() -> GustCli {
    env_logger::init();

    GustCli::parse()
}
