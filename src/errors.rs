use std::path::PathBuf;

use thiserror::Error;

/// The only errors that ever escalate out of the reactor: both happen at
/// startup, before the event loop runs, and both terminate the process.
#[derive(Debug, Error)]
pub enum CubeDbError {
    #[error("failed to bind listener on port {port}: {source}")]
    Listen {
        port: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load dump at {path}: {source}")]
    DumpLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
