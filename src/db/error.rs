use std::path::PathBuf;

use bitcoin::p2p::Magic;

/// A ban list file is untrusted as a whole and contributes no entries.
#[derive(Debug)]
pub enum CodecError {
    /// The file was written for a different network.
    WrongNetwork {
        /// The prefix of the running network.
        expected: Magic,
        /// The prefix found in the file.
        found: Magic,
    },
    /// The integrity hash does not match the contents.
    ChecksumMismatch,
    /// The file is too short to hold a network prefix and integrity hash.
    TooShort,
    /// The checksum passed, but the contents do not follow the legacy layout.
    Deserialize(bitcoin::consensus::encode::Error),
    /// Bytes follow the last entry of the legacy layout.
    TrailingBytes,
    /// The file is not well-formed JSON.
    Json(serde_json::Error),
    /// The top level JSON value is not an object.
    NotAnObject,
    /// The top level JSON object has no `banned_nets` array.
    MissingBanList,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::WrongNetwork { expected, found } => write!(
                f,
                "the ban list belongs to another network. expected: {expected}, found: {found}"
            ),
            CodecError::ChecksumMismatch => {
                write!(f, "the ban list checksum does not match its contents.")
            }
            CodecError::TooShort => write!(f, "the ban list is truncated."),
            CodecError::Deserialize(e) => {
                write!(f, "the ban list could not be deserialized: {e}")
            }
            CodecError::TrailingBytes => {
                write!(f, "unexpected data after the last ban list entry.")
            }
            CodecError::Json(e) => write!(f, "the ban list is not valid JSON: {e}"),
            CodecError::NotAnObject => write!(f, "the ban list is not a JSON object."),
            CodecError::MissingBanList => {
                write!(f, "the ban list has no banned_nets array.")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Deserialize(e) => Some(e),
            CodecError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bitcoin::consensus::encode::Error> for CodecError {
    fn from(value: bitcoin::consensus::encode::Error) -> Self {
        Self::Deserialize(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Errors reading or writing a ban list file.
#[derive(Debug)]
pub enum PersistenceError {
    /// The file exists but could not be read.
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The temporary file could not be written.
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The temporary file could not replace the ban list.
    Rename {
        /// The file that was to be replaced.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The ban list could not be serialized.
    Serialize(serde_json::Error),
}

impl core::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Read { path, source } => {
                write!(f, "could not read {}: {source}", path.display())
            }
            PersistenceError::Write { path, source } => {
                write!(f, "could not write {}: {source}", path.display())
            }
            PersistenceError::Rename { path, source } => {
                write!(f, "could not replace {}: {source}", path.display())
            }
            PersistenceError::Serialize(e) => {
                write!(f, "the ban list could not be serialized: {e}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Read { source, .. } => Some(source),
            PersistenceError::Write { source, .. } => Some(source),
            PersistenceError::Rename { source, .. } => Some(source),
            PersistenceError::Serialize(e) => Some(e),
        }
    }
}
