use std::collections::HashMap;
use std::net::IpAddr;

use crate::SubNet;

use super::BanEntry;

/// A map of banned subnets to their ban metadata.
///
/// Every key is a valid [`SubNet`]. Lookups by address scan every stored range, so an
/// address is found even if it only falls within a banned subnet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BanRegistry {
    bans: HashMap<SubNet, BanEntry>,
}

impl BanRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            bans: HashMap::new(),
        }
    }

    /// Add a ban, replacing any existing ban for the same subnet. Invalid subnets are
    /// ignored and `false` is returned.
    pub fn insert_or_replace(&mut self, subnet: SubNet, entry: BanEntry) -> bool {
        if !subnet.is_valid() {
            return false;
        }
        self.bans.insert(subnet, entry);
        true
    }

    /// Remove the ban on exactly this subnet, returning `false` if there was none.
    pub fn remove(&mut self, subnet: &SubNet) -> bool {
        self.bans.remove(subnet).is_some()
    }

    /// The ban keyed by exactly this subnet.
    pub fn find(&self, subnet: &SubNet) -> Option<BanEntry> {
        self.bans.get(subnet).copied()
    }

    /// Any stored subnet whose range covers the address, expired or not.
    pub fn contains_address(&self, addr: IpAddr) -> Option<(SubNet, BanEntry)> {
        self.bans
            .iter()
            .find(|(subnet, _)| subnet.contains(addr))
            .map(|(subnet, entry)| (*subnet, *entry))
    }

    /// Is the address covered by a ban that is still in effect at `now`.
    pub fn contains_active(&self, addr: IpAddr, now: i64) -> bool {
        self.bans
            .iter()
            .any(|(subnet, entry)| !entry.is_expired(now) && subnet.contains(addr))
    }

    /// A copy of every ban, in no particular order.
    pub fn all(&self) -> Vec<(SubNet, BanEntry)> {
        self.bans
            .iter()
            .map(|(subnet, entry)| (*subnet, *entry))
            .collect()
    }

    /// Remove every ban.
    pub fn clear(&mut self) {
        self.bans.clear()
    }

    /// Remove every ban that has expired at `now`, returning how many were removed.
    pub fn remove_expired(&mut self, now: i64) -> usize {
        let before = self.bans.len();
        self.bans.retain(|_, entry| !entry.is_expired(now));
        before - self.bans.len()
    }

    /// The number of bans, including expired bans that have not been swept.
    pub fn len(&self) -> usize {
        self.bans.len()
    }

    /// Are there no bans.
    pub fn is_empty(&self) -> bool {
        self.bans.is_empty()
    }
}

impl Extend<(SubNet, BanEntry)> for BanRegistry {
    fn extend<T: IntoIterator<Item = (SubNet, BanEntry)>>(&mut self, iter: T) {
        for (subnet, entry) in iter {
            self.insert_or_replace(subnet, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(s: &str) -> SubNet {
        s.parse().unwrap()
    }

    #[test]
    fn test_registry() {
        let mut registry = BanRegistry::new();
        let entry = BanEntry::new(0, 100);
        assert!(registry.insert_or_replace(subnet("1.2.3.0/24"), entry));
        assert!(registry.insert_or_replace(subnet("5.6.7.8"), entry));
        assert_eq!(registry.len(), 2);
        let longer = BanEntry::new(0, 500);
        assert!(registry.insert_or_replace(subnet("5.6.7.8"), longer));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find(&subnet("5.6.7.8")), Some(longer));
        assert_eq!(registry.find(&subnet("5.6.7.9")), None);
        assert!(registry.remove(&subnet("5.6.7.8")));
        assert!(!registry.remove(&subnet("5.6.7.8")));
        assert_eq!(registry.all(), vec![(subnet("1.2.3.0/24"), entry)]);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_subnet_ignored() {
        let mut registry = BanRegistry::new();
        assert!(!registry.insert_or_replace(SubNet::invalid(), BanEntry::new(0, 100)));
        assert!(registry.is_empty());
        registry.extend(vec![
            (SubNet::invalid(), BanEntry::new(0, 100)),
            (subnet("1.2.3.4"), BanEntry::new(0, 100)),
        ]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_contains_address() {
        let mut registry = BanRegistry::new();
        let entry = BanEntry::new(0, 100);
        registry.insert_or_replace(subnet("1.2.3.0/24"), entry);
        assert_eq!(
            registry.contains_address("1.2.3.4".parse().unwrap()),
            Some((subnet("1.2.3.0/24"), entry))
        );
        assert_eq!(registry.contains_address("1.2.4.4".parse().unwrap()), None);
        assert!(registry.contains_active("1.2.3.4".parse().unwrap(), 99));
        assert!(!registry.contains_active("1.2.3.4".parse().unwrap(), 100));
    }

    #[test]
    fn test_remove_expired() {
        let mut registry = BanRegistry::new();
        registry.insert_or_replace(subnet("1.1.1.1"), BanEntry::new(0, 10));
        registry.insert_or_replace(subnet("2.2.2.2"), BanEntry::new(0, 20));
        registry.insert_or_replace(subnet("3.3.3.3"), BanEntry::permanent(0));
        registry.insert_or_replace(subnet("4.4.4.4"), BanEntry::new(30, 5));
        assert_eq!(registry.remove_expired(10), 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.remove_expired(10), 0);
        assert_eq!(registry.remove_expired(i64::MAX - 1), 1);
        assert_eq!(registry.all(), vec![(subnet("3.3.3.3"), BanEntry::permanent(0))]);
    }
}
