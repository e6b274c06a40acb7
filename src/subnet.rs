use std::fmt::Display;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

// Length of the `::ffff:0:0/96` prefix that embeds IPv4 addresses in IPv6.
const MAPPED_PREFIX_BITS: u8 = 96;

/// A network address together with a prefix length, denoting either a single host or a
/// contiguous range of addresses.
///
/// IPv4-mapped IPv6 addresses are treated as IPv4, and the address bits below the prefix
/// are always cleared, so two subnets covering the same range compare equal.
///
/// The [`Default`] subnet, printed as `::/0`, is the canonical invalid value. Every `/0`
/// is invalid, as is a single host at the unspecified or broadcast address. Invalid subnets
/// never match any address and are never stored in a ban list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubNet {
    net: IpNet,
}

impl SubNet {
    /// Build a subnet from an address and prefix length, returning `None` if the result is
    /// not a valid subnet.
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        Self::from_parts(addr, prefix).filter(SubNet::is_valid)
    }

    /// A subnet that covers exactly one address.
    pub fn host(addr: IpAddr) -> Self {
        let net = match canonical(addr) {
            IpAddr::V4(v4) => IpNet::V4(Ipv4Net::from(v4)),
            IpAddr::V6(v6) => IpNet::V6(Ipv6Net::from(v6)),
        };
        Self { net }
    }

    /// The reserved invalid subnet, `::/0`.
    pub fn invalid() -> Self {
        Self::default()
    }

    // `None` when the prefix does not fit the address family.
    pub(crate) fn from_parts(addr: IpAddr, prefix: u8) -> Option<Self> {
        let (addr, prefix) = match addr {
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) if prefix >= MAPPED_PREFIX_BITS => {
                    (IpAddr::V4(v4), prefix - MAPPED_PREFIX_BITS)
                }
                _ => (addr, prefix),
            },
            IpAddr::V4(_) => (addr, prefix),
        };
        let net = IpNet::new(addr, prefix).ok()?.trunc();
        Some(Self { net })
    }

    /// The first address of the range.
    pub fn network(&self) -> IpAddr {
        self.net.network()
    }

    /// The number of leading bits shared by every address in the range.
    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// Does this subnet describe a usable range of addresses.
    pub fn is_valid(&self) -> bool {
        if self.net.prefix_len() == 0 {
            return false;
        }
        if !self.is_single_host() {
            return true;
        }
        match self.net.network() {
            IpAddr::V4(v4) => !v4.is_unspecified() && !v4.is_broadcast(),
            IpAddr::V6(v6) => !v6.is_unspecified(),
        }
    }

    /// Does this subnet cover exactly one address.
    pub fn is_single_host(&self) -> bool {
        self.net.prefix_len() == self.net.max_prefix_len()
    }

    /// Does the address fall within the range of this subnet.
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.is_valid() && self.net.contains(&canonical(addr))
    }
}

impl Default for SubNet {
    fn default() -> Self {
        Self {
            net: IpNet::V6(Ipv6Net::default()),
        }
    }
}

impl From<IpAddr> for SubNet {
    fn from(value: IpAddr) -> Self {
        SubNet::host(value)
    }
}

impl From<Ipv4Addr> for SubNet {
    fn from(value: Ipv4Addr) -> Self {
        SubNet::host(IpAddr::V4(value))
    }
}

impl From<Ipv6Addr> for SubNet {
    fn from(value: Ipv6Addr) -> Self {
        SubNet::host(IpAddr::V6(value))
    }
}

impl Display for SubNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.net, f)
    }
}

/// Errors parsing a [`SubNet`] from a string.
#[derive(Debug, Clone, PartialEq)]
pub enum SubNetParseError {
    /// The address portion is not an IP address.
    InvalidAddress(AddrParseError),
    /// The portion after the `/` is neither a prefix length nor a netmask of the same family,
    /// or the prefix is too long for the address.
    InvalidPrefix(String),
    /// The netmask has a gap in its leading ones.
    NonContiguousMask,
    /// The string parsed, but describes the reserved invalid subnet.
    Invalid(SubNet),
}

impl Display for SubNetParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubNetParseError::InvalidAddress(e) => write!(f, "invalid address: {e}"),
            SubNetParseError::InvalidPrefix(prefix) => {
                write!(f, "invalid prefix length or netmask: {prefix}")
            }
            SubNetParseError::NonContiguousMask => write!(f, "the netmask is not contiguous"),
            SubNetParseError::Invalid(subnet) => write!(f, "{subnet} is not a valid subnet"),
        }
    }
}

impl std::error::Error for SubNetParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubNetParseError::InvalidAddress(e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for SubNet {
    type Err = SubNetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, mask) = match s.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (s, None),
        };
        let addr = addr
            .strip_prefix('[')
            .and_then(|addr| addr.strip_suffix(']'))
            .unwrap_or(addr);
        let addr = IpAddr::from_str(addr).map_err(SubNetParseError::InvalidAddress)?;
        let subnet = match mask {
            None => SubNet::host(addr),
            Some(mask) => {
                let prefix = match mask.parse::<u8>() {
                    Ok(prefix) => prefix,
                    Err(_) => prefix_from_netmask(addr, mask)?,
                };
                SubNet::from_parts(addr, prefix)
                    .ok_or_else(|| SubNetParseError::InvalidPrefix(mask.to_string()))?
            }
        };
        if subnet.is_valid() {
            Ok(subnet)
        } else {
            Err(SubNetParseError::Invalid(subnet))
        }
    }
}

fn prefix_from_netmask(addr: IpAddr, mask: &str) -> Result<u8, SubNetParseError> {
    let netmask = IpAddr::from_str(mask)
        .map_err(|_| SubNetParseError::InvalidPrefix(mask.to_string()))?;
    let net = match (addr, netmask) {
        (IpAddr::V4(addr), IpAddr::V4(netmask)) => Ipv4Net::with_netmask(addr, netmask)
            .map(IpNet::V4)
            .map_err(|_| SubNetParseError::NonContiguousMask)?,
        (IpAddr::V6(addr), IpAddr::V6(netmask)) => Ipv6Net::with_netmask(addr, netmask)
            .map(IpNet::V6)
            .map_err(|_| SubNetParseError::NonContiguousMask)?,
        _ => return Err(SubNetParseError::InvalidPrefix(mask.to_string())),
    };
    Ok(net.prefix_len())
}

fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(addr),
        IpAddr::V4(_) => addr,
    }
}
