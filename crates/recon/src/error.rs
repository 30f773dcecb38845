use std::fmt;

use taxgrid_engine::{BuildError, ErrorKind, ExtractionError};
use taxgrid_io::{GridError, WriteError};

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Read(String),
    /// TOML parse / deserialization error.
    Parse(String),
    /// Values parsed but are out of range.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "cannot read config: {msg}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// First failure of a pipeline run.
///
/// `Extraction` and `Build` carry messages meant for the person who supplied
/// the file and are shown verbatim. `Read` and `Write` are environment
/// failures.
#[derive(Debug)]
pub enum PipelineError {
    Extraction(ExtractionError),
    Build(BuildError),
    Read(GridError),
    Write(WriteError),
}

impl PipelineError {
    /// Core error kind, `None` for I/O failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Extraction(e) => Some(e.kind()),
            Self::Build(e) => Some(e.kind()),
            Self::Read(_) | Self::Write(_) => None,
        }
    }

    /// True when the input was rejected, false when the environment failed.
    pub fn is_client_error(&self) -> bool {
        self.kind().is_some()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(e) => e.fmt(f),
            Self::Build(e) => e.fmt(f),
            Self::Read(e) => e.fmt(f),
            Self::Write(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Extraction(e) => Some(e),
            Self::Build(e) => Some(e),
            Self::Read(e) => Some(e),
            Self::Write(e) => Some(e),
        }
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

impl From<BuildError> for PipelineError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<GridError> for PipelineError {
    fn from(e: GridError) -> Self {
        Self::Read(e)
    }
}

impl From<WriteError> for PipelineError {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}
