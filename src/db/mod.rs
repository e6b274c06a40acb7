use std::fmt::Display;

use crate::SubNet;

/// Errors a ban list file may produce.
pub mod error;
/// Reading and atomically replacing ban list files.
pub mod file;
/// The structured text ban list format.
pub mod json;
/// The legacy binary ban list format.
pub mod legacy;
/// The in-memory map of banned subnets.
pub mod registry;

/// The schema version stamped on every entry written by this crate.
pub const CURRENT_VERSION: i32 = 1;
/// Schema versions the decoders will accept.
pub const KNOWN_VERSIONS: &[i32] = &[CURRENT_VERSION];

/// The metadata of a single ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BanEntry {
    /// The schema version this entry was read with.
    pub version: i32,
    /// When the ban started, in seconds since the UNIX epoch.
    pub created_at: i64,
    /// When the ban is lifted, in seconds since the UNIX epoch.
    pub expires_at: i64,
}

impl BanEntry {
    /// An `expires_at` that is never reached.
    pub const PERMANENT: i64 = i64::MAX;

    /// Build a new entry with the current schema version.
    pub fn new(created_at: i64, expires_at: i64) -> Self {
        Self {
            version: CURRENT_VERSION,
            created_at,
            expires_at,
        }
    }

    /// A ban that never expires.
    pub fn permanent(created_at: i64) -> Self {
        Self::new(created_at, Self::PERMANENT)
    }

    /// Has the ban been lifted as of `now`. Entries that expire before they were created are
    /// treated as expired rather than corrupt.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// The result of decoding a ban list file: every entry that passed validation, along with
/// a diagnostic for every entry that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    /// Valid entries in file order. A later entry for the same subnet replaces an earlier one.
    pub entries: Vec<(SubNet, BanEntry)>,
    /// One diagnostic per dropped entry.
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode a ban list file into a filtered set of entries.
///
/// Decoders are pure, so they may be tested without a running manager. An `Err` means the
/// file as a whole is untrusted and contributes nothing.
pub trait BanListDecoder {
    /// Parse and validate the contents of a file.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, error::CodecError>;
}

/// Why a single entry was dropped while the rest of the file was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The entry uses a schema version this crate does not understand.
    UnknownVersion(i64),
    /// The address of the entry could not be parsed into a subnet.
    UnparseableAddress(String),
    /// The entry is keyed by the reserved invalid subnet, or a subnet that cannot be used.
    InvalidSubnet(String),
    /// The entry is missing fields or has fields of the wrong type.
    MalformedRecord(String),
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownVersion(version) => {
                write!(f, "Dropping entry with unknown version ({version}) from ban list")
            }
            Diagnostic::UnparseableAddress(address) => {
                write!(f, "Dropping entry with unparseable address or subnet: {address}")
            }
            Diagnostic::InvalidSubnet(subnet) => {
                write!(f, "Cannot parse banned address or subnet: {subnet}")
            }
            Diagnostic::MalformedRecord(record) => {
                write!(f, "Dropping malformed entry from ban list: {record}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let entry = BanEntry::new(100, 200);
        assert!(!entry.is_expired(100));
        assert!(!entry.is_expired(199));
        assert!(entry.is_expired(200));
        let backwards = BanEntry::new(200, 100);
        assert!(backwards.is_expired(150));
        let permanent = BanEntry::permanent(0);
        assert!(!permanent.is_expired(i64::MAX - 1));
    }

    #[test]
    fn test_diagnostic_messages() {
        assert_eq!(
            Diagnostic::UnknownVersion(2).to_string(),
            "Dropping entry with unknown version (2) from ban list"
        );
        assert_eq!(
            Diagnostic::UnparseableAddress("aaaaaaaaa".into()).to_string(),
            "Dropping entry with unparseable address or subnet: aaaaaaaaa"
        );
        assert_eq!(
            Diagnostic::InvalidSubnet(SubNet::invalid().to_string()).to_string(),
            "Cannot parse banned address or subnet: ::/0"
        );
    }
}
