use std::path::PathBuf;

/// Failures of the host-facing primitives (file reads, JSON parsing).
///
/// None of these reach an editor request: the cache and the resolvers turn them
/// into "found nothing" and log them at `debug`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("uri is not a file path: {0}")]
    InvalidUri(String),
}

impl Error {
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
