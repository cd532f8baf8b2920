#[macro_use]
extern crate log;

use std::fs::File;
use std::path::PathBuf;

use anyhow::Error;
use clap::Parser;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, TermLogger, TerminalMode, WriteLogger,
};

use crate::program::Program;

mod mirror;
mod program;

/// Name of the log file written next to the terminal output.
const LOG_NAME: &str = "alist_strm.log";

/// Mirrors a remote alist directory tree onto local storage: video files
/// become `.strm` stream descriptors pointing at the remote, images,
/// subtitles and metadata are downloaded in full.
#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Args {
    /// Remote directory to mirror, e.g. /media/films
    #[arg(long)]
    pub(crate) remote_path: String,

    /// Local directory receiving the mirrored tree
    #[arg(long)]
    pub(crate) local_path: PathBuf,

    /// Account name on the remote host
    #[arg(long)]
    pub(crate) username: String,

    /// Account password; read from ALIST_PASSWORD when omitted
    #[arg(long)]
    pub(crate) password: Option<String>,

    /// Base URL of the remote host, e.g. https://pan.example.com
    #[arg(long)]
    pub(crate) host: String,

    /// Number of concurrent download workers
    #[arg(long, default_value_t = 5)]
    pub(crate) threads: usize,

    /// Stage into --tmp-dir and copy into --local-path on completion
    #[arg(long)]
    pub(crate) use_temp: bool,

    /// Staging directory used with --use-temp
    #[arg(long, default_value = "/tmp/alist_strm")]
    pub(crate) tmp_dir: PathBuf,

    /// Rewrite existing stream descriptors instead of skipping them
    #[arg(long)]
    pub(crate) overwrite_strm: bool,

    /// Look up the access signature per file when the listing has none
    #[arg(long)]
    pub(crate) fetch_sign: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    initialize_logger();
    let args = Args::parse();
    Program::new(args).run().await
}

/// Initializes the logger with preset filtering. Falls back to terminal-only
/// logging when the log file cannot be created.
fn initialize_logger() {
    let mut config = ConfigBuilder::new();
    config.add_filter_allow_str("alist_strm");

    let term_logger = || {
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
    };

    match File::create(LOG_NAME) {
        Ok(file) => {
            if CombinedLogger::init(vec![
                term_logger(),
                WriteLogger::new(LevelFilter::max(), config.build(), file),
            ])
            .is_err()
            {
                eprintln!(
                    "Failed to initialize combined logger. Falling back to terminal-only logging."
                );
                let _ = CombinedLogger::init(vec![term_logger()]);
            }
        }
        Err(err) => {
            eprintln!("Failed to create {LOG_NAME}: {err}. Logging will only output to terminal.");
            let _ = CombinedLogger::init(vec![term_logger()]);
        }
    }
}
