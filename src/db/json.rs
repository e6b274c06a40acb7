use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SubNet;

use super::error::CodecError;
use super::{BanEntry, BanListDecoder, Decoded, Diagnostic, CURRENT_VERSION, KNOWN_VERSIONS};

const BANNED_NETS: &str = "banned_nets";
const VERSION: &str = "version";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BanRecord {
    version: i64,
    ban_created: i64,
    banned_until: i64,
    address: String,
}

#[derive(Debug, Serialize)]
struct BanListFile {
    banned_nets: Vec<BanRecord>,
}

/// Reads and writes the JSON ban list.
///
/// ```json
/// { "banned_nets": [ { "version": 1, "ban_created": 0, "banned_until": 778, "address": "1.0.0.0/8" } ] }
/// ```
///
/// Records are validated one at a time, so a record with an unknown version or an address
/// that does not parse is dropped while the rest are kept. A file without the top level
/// object or the `banned_nets` array is rejected outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl JsonCodec {
    /// A new codec.
    pub fn new() -> Self {
        Self
    }

    /// Serialize the bans, stamping every record with the current schema version.
    pub fn encode(&self, bans: &[(SubNet, BanEntry)]) -> Result<Vec<u8>, serde_json::Error> {
        let banned_nets = bans
            .iter()
            .map(|(subnet, entry)| BanRecord {
                version: CURRENT_VERSION.into(),
                ban_created: entry.created_at,
                banned_until: entry.expires_at,
                address: subnet.to_string(),
            })
            .collect();
        serde_json::to_vec_pretty(&BanListFile { banned_nets })
    }
}

impl BanListDecoder for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let object = value.as_object().ok_or(CodecError::NotAnObject)?;
        let records = object
            .get(BANNED_NETS)
            .and_then(Value::as_array)
            .ok_or(CodecError::MissingBanList)?;
        let mut decoded = Decoded::default();
        for record in records {
            match decode_record(record) {
                Ok(ban) => decoded.entries.push(ban),
                Err(diagnostic) => decoded.diagnostics.push(diagnostic),
            }
        }
        Ok(decoded)
    }
}

fn decode_record(record: &Value) -> Result<(SubNet, BanEntry), Diagnostic> {
    let version = record
        .get(VERSION)
        .and_then(Value::as_i64)
        .ok_or_else(|| Diagnostic::MalformedRecord(record.to_string()))?;
    let version = i32::try_from(version)
        .ok()
        .filter(|version| KNOWN_VERSIONS.contains(version))
        .ok_or(Diagnostic::UnknownVersion(version))?;
    let record = BanRecord::deserialize(record)
        .map_err(|_| Diagnostic::MalformedRecord(record.to_string()))?;
    let subnet = record
        .address
        .parse::<SubNet>()
        .map_err(|_| Diagnostic::UnparseableAddress(record.address.clone()))?;
    Ok((
        subnet,
        BanEntry {
            version,
            created_at: record.ban_created,
            expires_at: record.banned_until,
        },
    ))
}
