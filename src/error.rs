use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// Every phase aborts on the first error; a failed possession check is
// `Ok(false)` from `verify_proof`, never one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("authentication failed in full key generation for identity {identity:?}")]
    Authentication { identity: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}
