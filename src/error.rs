//! Error types for metashield

use std::path::PathBuf;
use thiserror::Error;

/// Protection pipeline error types
#[derive(Debug, Error)]
pub enum ShieldError {
    /// Write access to the toolchain installation could not be obtained
    #[error("the current user does not have full access to \"{}\" and its subfolders and files", .0.display())]
    AccessDenied(PathBuf),

    /// The user dismissed the elevation prompt
    #[error("access elevation was cancelled by the user")]
    ElevationCancelled,

    /// The metadata artifact was not found where the build should have put it
    #[error("metadata artifact not found at \"{}\"", .0.display())]
    ArtifactMissing(PathBuf),

    /// The native transformation engine reported a failure
    #[error("engine error: {0}")]
    Engine(#[from] anyhow::Error),

    /// Settings serialization failed
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for protection operations
pub type ShieldResult<T> = Result<T, ShieldError>;
