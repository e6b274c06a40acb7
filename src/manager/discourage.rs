use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;

use crate::SubNet;

// Addresses flagged for misbehavior that did not warrant a ban. Never persisted. When full,
// the address discouraged longest ago is forgotten first.
#[derive(Debug)]
pub(crate) struct DiscouragedSet {
    members: HashSet<IpAddr>,
    order: VecDeque<IpAddr>,
    capacity: usize,
}

impl DiscouragedSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            members: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub(crate) fn insert(&mut self, addr: IpAddr) {
        let addr = SubNet::host(addr).network();
        if self.members.insert(addr) {
            self.order.push_back(addr);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    pub(crate) fn contains(&self, addr: IpAddr) -> bool {
        self.members.contains(&SubNet::host(addr).network())
    }
}
