//! Application error type.

use inkboard_core::{ConfigError, StoreError, SyncError};
use inkboard_render::ExportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("invalid script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot infer export format from {}; pass --format", .0.display())]
    UnknownFormat(PathBuf),
}

pub type AppResult<T> = Result<T, AppError>;
