//! inkboard application shell.
//!
//! Drives the scene engine against a file-backed document store: board
//! management, export and scripted input replay.

pub mod commands;
pub mod error;
pub mod script;

pub use commands::{BoardInfo, ExportFormat, ReplayOutcome};
pub use error::{AppError, AppResult};
pub use script::{ReplayReport, ScriptStep};
