//! A persistent ban list for Bitcoin peer-to-peer nodes.
//!
//! Misbehaving peers are banned by address or by subnet until a point in time. Bans survive
//! restarts: they are read from the legacy binary `banlist.dat` and the JSON `banlist.json` at
//! startup, and written back to `banlist.json` periodically and at shutdown.
//!
//! # Example usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use banman::{unix_time_now, Builder, Network, SubNet};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut manager, mut client) = Builder::new(Network::Signet)
//!         .data_dir(".banman")
//!         .build();
//!     manager.load_from_disk().unwrap();
//!     let manager = Arc::new(manager);
//!     let handle = tokio::task::spawn(Arc::clone(&manager).run());
//!
//!     let subnet: SubNet = "1.2.3.0/24".parse().unwrap();
//!     manager.ban_for(subnet, Duration::from_secs(3600)).unwrap();
//!     assert!(manager.is_banned("1.2.3.4".parse().unwrap(), unix_time_now()));
//!
//!     client.requester.shutdown().unwrap();
//!     handle.await.unwrap().unwrap();
//!     while let Ok(warning) = client.warn_rx.try_recv() {
//!         eprintln!("{warning}");
//!     }
//! }
//! ```

/// Ban list storage: the in-memory registry and the on-disk formats.
pub mod db;
/// Tools to build and run a ban manager.
pub mod manager;
mod prelude;
mod subnet;

pub use bitcoin::Network;

pub use crate::db::file::{BanFile, BanFileFormat};
pub use crate::db::json::JsonCodec;
pub use crate::db::legacy::LegacyCodec;
pub use crate::db::registry::BanRegistry;
pub use crate::db::{BanEntry, BanListDecoder, Decoded, Diagnostic};
pub use crate::manager::banman::BanManager;
pub use crate::manager::builder::Builder;
pub use crate::manager::client::{Client, Requester};
pub use crate::manager::error::{BanError, ClientError, RunError};
pub use crate::manager::messages::{Event, Info, Warning};
pub use crate::manager::{FileLoad, LoadReport, Phase};
pub use crate::prelude::unix_time_now;
pub use crate::subnet::{SubNet, SubNetParseError};

/// How much a ban manager tells its [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Every message, including a line for each change to the ban list.
    Debug,
    /// Lifecycle changes, loads, and flushes.
    #[default]
    Info,
    /// Only warnings and events.
    Warning,
}
