use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Infrastructure failures while running an inference. These are the only
/// errors that reach the client as a server error.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not persist artifact {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not spawn predictor `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("predictor exited unsuccessfully (code {code:?})")]
    Exit { code: Option<i32> },

    #[error("predictor did not finish within {0:?}")]
    Timeout(Duration),

    #[error("predictor I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Reasons an upload is refused before any artifact is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No image uploaded")]
    Missing,

    #[error("Only image files are allowed")]
    NotAnImage(String),

    #[error("Image exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Unexpected field")]
    UnexpectedField(String),

    #[error("Malformed multipart body")]
    Malformed(String),
}
