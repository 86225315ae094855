use std::path::PathBuf;

use meadow_core::error::CoreError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Alias for `Result<T, PersistError>`.
pub type PersistResult<T> = Result<T, PersistError>;

/// Errors raised while driving the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// World or catalog error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Saving or loading failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Time speed must be finite and non-negative.
    #[error("invalid time speed {0}: must be finite and non-negative")]
    InvalidSpeed(f32),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimError {
    /// Returns `true` for errors caused by corrupt static data.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Core(e) => e.is_fatal(),
            Self::Persist(e) => e.is_fatal(),
            Self::InvalidSpeed(_) | Self::InvalidConfig(_) => false,
        }
    }
}

/// Errors raised by saving and loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed save.
    #[error("malformed save file: {0}")]
    Json(#[from] serde_json::Error),

    /// The save was written by an incompatible version.
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// The save parsed but is internally inconsistent.
    #[error("invalid save file: {0}")]
    Invalid(String),

    /// The save references catalog data that does not exist.
    #[error("save file does not match the catalog: {0}")]
    Catalog(CoreError),
}

impl PersistError {
    /// Returns `true` if the error signals corrupt static data.
    ///
    /// Everything else leaves the world untouched and can be reported and
    /// ignored.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Catalog(e) if e.is_fatal())
    }
}
