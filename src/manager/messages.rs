use std::path::PathBuf;

use crate::db::Diagnostic;
use crate::SubNet;

use super::Phase;

/// Informational messages emitted by a ban manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Info {
    /// The manager moved to a new phase of its lifecycle.
    StateChange(Phase),
    /// The ban list was read from disk.
    Loaded {
        /// The number of bans in effect after loading.
        entries: usize,
    },
    /// The ban list was written to disk.
    Flushed {
        /// The number of bans written.
        entries: usize,
    },
}

impl core::fmt::Display for Info {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Info::StateChange(phase) => write!(f, "Ban manager state: {phase}"),
            Info::Loaded { entries } => {
                write!(f, "Loaded {entries} banned node addresses/subnets")
            }
            Info::Flushed { entries } => {
                write!(f, "Flushed {entries} banned node addresses/subnets to disk")
            }
        }
    }
}

/// Warnings a ban manager may issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A single entry of a ban list file was dropped. The rest of the file was kept.
    DroppedEntry {
        /// The file the entry was read from.
        file: PathBuf,
        /// Why the entry was dropped.
        diagnostic: Diagnostic,
    },
    /// A ban list file was ignored in full.
    CorruptedBanList {
        /// The file that was ignored.
        file: PathBuf,
        /// Why the file is untrusted.
        reason: String,
    },
    /// A ban list file could not be read or written.
    FailedPersistence {
        /// Additional context for the persistence failure.
        warning: String,
    },
    /// A request to ban an unusable subnet was ignored.
    RejectedBan {
        /// The subnet that was requested.
        subnet: SubNet,
    },
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Warning::DroppedEntry { diagnostic, .. } => write!(f, "{diagnostic}"),
            Warning::CorruptedBanList { file, reason } => {
                write!(f, "Ignoring ban list {}: {reason}", file.display())
            }
            Warning::FailedPersistence { warning } => {
                write!(f, "A ban list failed to persist: {warning}")
            }
            Warning::RejectedBan { subnet } => {
                write!(f, "Refusing to ban an invalid subnet: {subnet}")
            }
        }
    }
}

/// Changes to the ban list a consumer may act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Bans were added, lifted, or expired. Connected peers may need to be checked again.
    BanListChanged,
}

/// Commands to issue a running ban manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientMessage {
    /// Flush the ban list and stop.
    Shutdown,
    /// Flush the ban list now rather than at the next interval.
    Dump,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_entry_names_value() {
        let warning = Warning::DroppedEntry {
            file: PathBuf::from("banlist.json"),
            diagnostic: Diagnostic::UnparseableAddress("aaaaaaaaa".into()),
        };
        assert_eq!(
            warning.to_string(),
            "Dropping entry with unparseable address or subnet: aaaaaaaaa"
        );
    }
}
