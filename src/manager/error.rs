use crate::db::error::PersistenceError;
use crate::{impl_sourceless_error, SubNet};

/// Errors changing the ban list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanError {
    /// The subnet is the reserved invalid value or otherwise unusable. Nothing was changed.
    InvalidSubnet(SubNet),
    /// The ban list has not been loaded from disk yet.
    NotLoaded,
    /// The ban list was already loaded from disk.
    AlreadyLoaded,
    /// The manager has shut down and no longer accepts changes.
    Stopped,
}

impl core::fmt::Display for BanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BanError::InvalidSubnet(subnet) => {
                write!(f, "{subnet} is not a valid subnet to ban.")
            }
            BanError::NotLoaded => write!(f, "the ban list has not been loaded."),
            BanError::AlreadyLoaded => write!(f, "the ban list was already loaded."),
            BanError::Stopped => write!(f, "the ban manager has shut down."),
        }
    }
}

impl_sourceless_error!(BanError);

/// Errors from the maintenance loop of a ban manager.
#[derive(Debug)]
pub enum RunError {
    /// The maintenance loop was already started.
    AlreadyRunning,
    /// The ban list must be loaded before the manager is run.
    NotLoaded,
    /// The manager has shut down.
    Stopped,
    /// The ban list could not be written when the manager stopped.
    Persistence(PersistenceError),
    /// The task writing the ban list at shutdown did not complete.
    Interrupted,
}

impl core::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::AlreadyRunning => write!(f, "the ban manager is already running."),
            RunError::NotLoaded => write!(f, "the ban list has not been loaded."),
            RunError::Stopped => write!(f, "the ban manager has shut down."),
            RunError::Persistence(e) => write!(f, "the final write of the ban list failed: {e}"),
            RunError::Interrupted => {
                write!(f, "the final write of the ban list was interrupted.")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors occurring when the client is talking to the ban manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// The channel to the manager was likely closed and dropped from memory.
    SendError,
}

impl core::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::SendError => {
                write!(f, "the receiver of this message was dropped from memory.")
            }
        }
    }
}

impl_sourceless_error!(ClientError);
