//! Error taxonomy for layer resolution and image composition.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing from (or malformed in) the platform database.
    #[error("platform database: '{platform}' is missing required field '{field}'")]
    ConfigParse {
        platform: &'static str,
        field: &'static str,
    },

    #[error("failed to read database '{}': {source}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown platform '{0}'; expected one of: linux, retroarch, pcsx2, rpcs3, wine")]
    UnknownPlatform(String),

    #[error("layer '{identifier}' not found for platform '{platform}'")]
    LayerNotFound {
        platform: &'static str,
        identifier: String,
    },

    #[error("project '{0}' not found in build database")]
    ProjectNotFound(String),

    #[error("layer file does not exist: {}", .0.display())]
    LayerMissing(PathBuf),

    #[error(
        "layer for platform '{platform}' missing from cache: {}{}",
        path.display(),
        locator.as_deref().map(|l| format!(" (fetch from {l})")).unwrap_or_default()
    )]
    PlatformLayerMissing {
        platform: &'static str,
        path: PathBuf,
        locator: Option<String>,
    },

    #[error("image file does not exist: {}", .0.display())]
    ImageMissing(PathBuf),

    #[error("build directory does not exist: {}", .0.display())]
    BuildDirMissing(PathBuf),

    #[error("launcher binary does not exist: {}", .0.display())]
    LauncherMissing(PathBuf),

    #[error("image is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("failed to spawn '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' {command} failed with {status}: {stderr}", program.display())]
    Subprocess {
        program: PathBuf,
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn database(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Database {
            path: path.into(),
            source: source.into(),
        }
    }
}
