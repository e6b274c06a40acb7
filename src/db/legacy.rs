//! The binary ban list format written by older nodes.
//!
//! A file is the network prefix, a length-prefixed list of entries, and a trailing
//! double-SHA256 of everything before it:
//!
//! ```text
//! magic(4) | compact_size(n) | n * (addrv2 | prefix(1) | version(4) | created(8) | until(8)) | sha256d(32)
//! ```
//!
//! Files are only ever read by the manager. The encoder exists to produce fixtures and
//! for tooling that needs to hand a ban list to an older node.
use std::net::IpAddr;

use bitcoin::consensus::encode::{serialize, VarInt};
use bitcoin::consensus::Decodable;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::hex::DisplayHex;
use bitcoin::p2p::address::AddrV2;
use bitcoin::p2p::Magic;
use bitcoin::Network;

use crate::SubNet;

use super::error::CodecError;
use super::{BanEntry, BanListDecoder, Decoded, Diagnostic, KNOWN_VERSIONS};

const MAGIC_LEN: usize = 4;
const CHECKSUM_LEN: usize = 32;

/// Reads and writes the legacy binary ban list for a single network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyCodec {
    network: Network,
}

impl LegacyCodec {
    /// A codec that only accepts files written for this network.
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Serialize the bans with the network prefix and integrity hash.
    pub fn encode(&self, bans: &[(SubNet, BanEntry)]) -> Vec<u8> {
        let mut data = serialize(&self.network.magic());
        data.extend(serialize(&VarInt(bans.len() as u64)));
        for (subnet, entry) in bans {
            let addr = match subnet.network() {
                IpAddr::V4(ip) => AddrV2::Ipv4(ip),
                IpAddr::V6(ip) => AddrV2::Ipv6(ip),
            };
            data.extend(serialize(&addr));
            data.extend(serialize(&subnet.prefix_len()));
            data.extend(serialize(&entry.version));
            data.extend(serialize(&entry.created_at));
            data.extend(serialize(&entry.expires_at));
        }
        let checksum = sha256d::Hash::hash(&data);
        data.extend_from_slice(checksum.as_byte_array());
        data
    }
}

impl BanListDecoder for LegacyCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        if bytes.len() < MAGIC_LEN + CHECKSUM_LEN {
            return Err(CodecError::TooShort);
        }
        let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let mut reader = payload;
        let found = Magic::consensus_decode(&mut reader)?;
        let expected = self.network.magic();
        if found != expected {
            return Err(CodecError::WrongNetwork { expected, found });
        }
        if sha256d::Hash::hash(payload).as_byte_array() != checksum {
            return Err(CodecError::ChecksumMismatch);
        }
        let count = VarInt::consensus_decode(&mut reader)?.0;
        let mut decoded = Decoded::default();
        // The count is untrusted, so entries are decoded until it is reached or the reader errors.
        for _ in 0..count {
            let addr = AddrV2::consensus_decode(&mut reader)?;
            let prefix = u8::consensus_decode(&mut reader)?;
            let version = i32::consensus_decode(&mut reader)?;
            let created_at = i64::consensus_decode(&mut reader)?;
            let expires_at = i64::consensus_decode(&mut reader)?;
            if !KNOWN_VERSIONS.contains(&version) {
                decoded
                    .diagnostics
                    .push(Diagnostic::UnknownVersion(version.into()));
                continue;
            }
            match subnet_from_addr(&addr, prefix) {
                Ok(subnet) => decoded.entries.push((
                    subnet,
                    BanEntry {
                        version,
                        created_at,
                        expires_at,
                    },
                )),
                Err(raw) => decoded.diagnostics.push(Diagnostic::InvalidSubnet(raw)),
            }
        }
        if !reader.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(decoded)
    }
}

// Returns the printable form of the subnet if it cannot be used.
fn subnet_from_addr(addr: &AddrV2, prefix: u8) -> Result<SubNet, String> {
    let ip = match addr {
        AddrV2::Ipv4(ip) => IpAddr::V4(*ip),
        AddrV2::Ipv6(ip) => IpAddr::V6(*ip),
        AddrV2::TorV2(key) => return Err(format!("torv2:{}/{prefix}", key[..].as_hex())),
        AddrV2::TorV3(key) => return Err(format!("torv3:{}/{prefix}", key[..].as_hex())),
        AddrV2::I2p(hash) => return Err(format!("i2p:{}/{prefix}", hash[..].as_hex())),
        AddrV2::Cjdns(ip) => return Err(format!("cjdns:{ip}/{prefix}")),
        AddrV2::Unknown(network, bytes) => {
            return Err(format!("unknown({network}):{}/{prefix}", bytes[..].as_hex()))
        }
    };
    match SubNet::from_parts(ip, prefix) {
        Some(subnet) if subnet.is_valid() => Ok(subnet),
        Some(subnet) => Err(subnet.to_string()),
        None => Err(format!("{ip}/{prefix}")),
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use crate::db::CURRENT_VERSION;
    use super::*;

    fn ban(subnet: &str, until: i64) -> (SubNet, BanEntry) {
        (subnet.parse().unwrap(), BanEntry::new(0, until))
    }

    #[test]
    fn test_decodes_valid_entries() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        let bans = vec![ban("1.0.0.0/8", 778), ban("2001:db8::/32", 1000)];
        let decoded = codec.decode(&codec.encode(&bans)).unwrap();
        assert_eq!(decoded.entries, bans);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_subnet_dropped() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        let bans = vec![
            (SubNet::invalid(), BanEntry::new(0, 778)),
            ban("1.2.3.4/8", 778),
        ];
        let decoded = codec.decode(&codec.encode(&bans)).unwrap();
        assert_eq!(decoded.entries, vec![ban("1.0.0.0/8", 778)]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::InvalidSubnet("::/0".into())]
        );
        assert_eq!(
            decoded.diagnostics[0].to_string(),
            "Cannot parse banned address or subnet: ::/0"
        );
    }

    // Builds a checksum-valid file from raw address encodings, which the encoder cannot produce.
    fn raw_file(network: Network, records: &[(AddrV2, u8)]) -> Vec<u8> {
        let mut data = serialize(&network.magic());
        data.extend(serialize(&VarInt(records.len() as u64)));
        for (addr, prefix) in records {
            data.extend(serialize(addr));
            data.extend(serialize(prefix));
            data.extend(serialize(&CURRENT_VERSION));
            data.extend(serialize(&0i64));
            data.extend(serialize(&10i64));
        }
        let checksum = sha256d::Hash::hash(&data);
        data.extend_from_slice(checksum.as_byte_array());
        data
    }

    #[test]
    fn test_out_of_range_prefix_dropped() {
        let codec = LegacyCodec::new(Network::Signet);
        let bytes = raw_file(
            Network::Signet,
            &[
                (AddrV2::Ipv4(Ipv4Addr::new(1, 2, 3, 4)), 40),
                (AddrV2::Ipv4(Ipv4Addr::new(5, 6, 7, 8)), 32),
            ],
        );
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.entries, vec![ban("5.6.7.8", 10)]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::InvalidSubnet("1.2.3.4/40".into())]
        );
    }

    #[test]
    fn test_overlay_address_dropped() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        let bytes = raw_file(
            Network::Bitcoin,
            &[
                (AddrV2::TorV3([7; 32]), 32),
                (AddrV2::Ipv4(Ipv4Addr::new(1, 2, 3, 4)), 32),
            ],
        );
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.entries, vec![ban("1.2.3.4", 10)]);
        let expected = format!("torv3:{}/32", "07".repeat(32));
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::InvalidSubnet(expected.clone())]
        );
        assert_eq!(
            decoded.diagnostics[0].to_string(),
            format!("Cannot parse banned address or subnet: {expected}")
        );
    }

    #[test]
    fn test_unknown_version_dropped() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        let mut future = ban("9.9.9.9", 10);
        future.1.version = 7;
        let decoded = codec
            .decode(&codec.encode(&[future, ban("8.8.8.8", 10)]))
            .unwrap();
        assert_eq!(decoded.entries, vec![ban("8.8.8.8", 10)]);
        assert_eq!(decoded.diagnostics, vec![Diagnostic::UnknownVersion(7)]);
    }

    #[test]
    fn test_any_flipped_byte_rejects_file() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        let bytes = codec.encode(&[ban("1.2.3.0/24", 778), ban("4.5.6.7", 900)]);
        for index in 0..bytes.len() - CHECKSUM_LEN {
            let mut tampered = bytes.clone();
            tampered[index] ^= 0x01;
            assert!(
                codec.decode(&tampered).is_err(),
                "flipping byte {index} was not detected"
            );
        }
    }

    #[test]
    fn test_wrong_network_rejected() {
        let testnet = LegacyCodec::new(Network::Testnet);
        let bytes = testnet.encode(&[ban("1.2.3.0/24", 778)]);
        let mainnet = LegacyCodec::new(Network::Bitcoin);
        assert!(matches!(
            mainnet.decode(&bytes),
            Err(CodecError::WrongNetwork { .. })
        ));
    }

    #[test]
    fn test_structural_errors() {
        let codec = LegacyCodec::new(Network::Bitcoin);
        assert!(matches!(codec.decode(&[0; 10]), Err(CodecError::TooShort)));
        // A checksum-valid file that claims more entries than it holds.
        let mut data = serialize(&Network::Bitcoin.magic());
        data.extend(serialize(&VarInt(3)));
        let checksum = sha256d::Hash::hash(&data);
        data.extend_from_slice(checksum.as_byte_array());
        assert!(matches!(
            codec.decode(&data),
            Err(CodecError::Deserialize(_))
        ));
        // And one with data after the last entry.
        let mut data = serialize(&Network::Bitcoin.magic());
        data.extend(serialize(&VarInt(0)));
        data.push(0xff);
        let checksum = sha256d::Hash::hash(&data);
        data.extend_from_slice(checksum.as_byte_array());
        assert!(matches!(codec.decode(&data), Err(CodecError::TrailingBytes)));
    }

    #[test]
    fn test_empty_list() {
        let codec = LegacyCodec::new(Network::Regtest);
        let decoded = codec.decode(&codec.encode(&[])).unwrap();
        assert_eq!(decoded, Decoded::default());
    }
}
