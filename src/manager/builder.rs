use std::{path::PathBuf, time::Duration};

use bitcoin::Network;

use super::{banman::BanManager, client::Client, config::BanManagerConfig};
use crate::LogLevel;

const MIN_DUMP_INTERVAL: Duration = Duration::from_secs(1);

/// Build a [`BanManager`] in an additive way.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use banman::{Builder, Network};
///
/// let (mut manager, client) = Builder::new(Network::Bitcoin)
///     .data_dir("/var/lib/node")
///     .default_ban_time(Duration::from_secs(60 * 60))
///     .build();
/// let report = manager.load_from_disk().unwrap();
/// println!("Loaded {} bans", report.accepted());
/// ```
pub struct Builder {
    config: BanManagerConfig,
    network: Network,
}

impl Builder {
    /// Create a new [`Builder`].
    pub fn new(network: Network) -> Self {
        Self {
            config: BanManagerConfig::default(),
            network,
        }
    }

    /// Fetch the [`Network`] for the builder.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The directory holding `banlist.dat` and `banlist.json`. If none is provided, the current
    /// working directory will be used.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = Some(path.into());
        self
    }

    /// How long a ban lasts when no expiry is given. If none is provided, bans last a day.
    pub fn default_ban_time(mut self, duration: Duration) -> Self {
        self.config.default_ban_time = duration;
        self
    }

    /// How often a running manager removes expired bans and writes the ban list to disk.
    /// If none is provided, every fifteen minutes. Intervals under a second are raised to one second.
    pub fn dump_interval(mut self, interval: Duration) -> Self {
        self.config.dump_interval = interval.max(MIN_DUMP_INTERVAL);
        self
    }

    /// The number of discouraged addresses to remember before the oldest are forgotten.
    pub fn discouragement_capacity(mut self, capacity: usize) -> Self {
        self.config.discouragement_capacity = capacity;
        self
    }

    /// Set the verbosity of the messages sent to the [`Client`]. Warnings are always sent.
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.config.log_level = log_level;
        self
    }

    /// Consume the builder and receive a [`BanManager`] and [`Client`]. The manager holds no
    /// bans until [`BanManager::load_from_disk`] is called.
    pub fn build(self) -> (BanManager, Client) {
        BanManager::new(self.network, self.config)
    }
}
