use std::path::PathBuf;

use clap::Parser;

/// `cubedb-server` command-line configuration. An unrecognized flag is a
/// fatal startup error — `clap` already exits the process with a
/// diagnostic for us.
#[derive(Debug, Parser)]
#[command(name = "cubedb-server", about = "In-memory columnar aggregation store")]
pub struct Config {
    /// TCP port to listen on.
    #[arg(long, default_value = "1985")]
    pub port: String,

    /// Verbosity, passed through to `env_logger` as a filter level.
    #[arg(long, default_value_t = 2)]
    pub log_level: i32,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Listen backlog.
    #[arg(long, default_value_t = 64)]
    pub connections: i32,

    /// Directory of `<cube>.cdb` files to load at startup and dump to on `DUMP`.
    #[arg(long)]
    pub dump_path: Option<PathBuf>,
}

impl Config {
    /// Maps `--log-level` onto an `env_logger`/`log` filter, the way the
    /// original's integer verbosity levels select among `log_info` /
    /// `log_verb` / `log_warn`.
    pub fn log_filter(&self) -> log::LevelFilter {
        match self.log_level {
            i32::MIN..=0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
