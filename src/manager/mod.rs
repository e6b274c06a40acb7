//! A concurrency-safe ban list for a peer-to-peer node.
//!
//! A [`BanManager`](banman::BanManager) owns the registry of banned subnets. It is loaded once
//! from disk before being shared, then answers admission checks from any thread while bans are
//! added and lifted. The ban list is written back to disk periodically by
//! [`BanManager::run`](banman::BanManager::run), on request, and once more at shutdown.
//!
//! Diagnostics are not logged directly. They are sent to the [`Client`](client::Client) returned
//! by the [`Builder`](builder::Builder), which may forward them to any logging framework.

use std::fmt::Display;

/// The ban manager and its operations.
pub mod banman;
/// Convenient way to configure a ban manager.
pub mod builder;
/// Structures to receive diagnostics from a ban manager.
pub mod client;
pub(crate) mod config;
pub(crate) mod dialog;
mod discourage;
/// Errors associated with a ban manager.
pub mod error;
/// Messages the ban manager may send a client.
pub mod messages;

/// The lifecycle of a ban manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Built, but the ban list has not been read from disk. Bans may not be changed.
    Uninitialized,
    /// The ban list was read from disk and may be changed.
    Loaded,
    /// The maintenance loop is sweeping and writing the ban list.
    Running,
    /// The ban list was written a final time. Bans may no longer be changed.
    Stopped,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "uninitialized"),
            Phase::Loaded => write!(f, "loaded"),
            Phase::Running => write!(f, "running"),
            Phase::Stopped => write!(f, "stopped"),
        }
    }
}

/// What a single ban list file contributed while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLoad {
    /// There is no such file.
    Missing,
    /// The file exists but could not be read.
    Unreadable(String),
    /// The file was read, but is corrupt or belongs to another network.
    Rejected(String),
    /// The file was read and validated entry by entry.
    Loaded {
        /// The number of entries kept.
        accepted: usize,
        /// The number of entries dropped.
        dropped: usize,
    },
}

impl FileLoad {
    /// The number of entries this file contributed.
    pub fn accepted(&self) -> usize {
        match self {
            FileLoad::Loaded { accepted, .. } => *accepted,
            _ => 0,
        }
    }
}

/// The outcome of reading the ban lists from disk. Loading always succeeds, so this describes
/// what each file contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// The legacy binary ban list, read first.
    pub legacy: FileLoad,
    /// The JSON ban list, read second. Its entries replace legacy entries for the same subnet.
    pub json: FileLoad,
    /// The number of loaded bans that had already expired.
    pub expired: usize,
}

impl LoadReport {
    /// The number of entries accepted across both files, before expired bans were removed.
    pub fn accepted(&self) -> usize {
        self.legacy.accepted() + self.json.accepted()
    }
}
