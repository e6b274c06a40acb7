use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use bitcoin::Network;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::MissedTickBehavior;

use crate::db::error::PersistenceError;
use crate::db::file::{BanFile, BanFileFormat};
use crate::db::json::JsonCodec;
use crate::db::legacy::LegacyCodec;
use crate::db::registry::BanRegistry;
use crate::db::{BanEntry, BanListDecoder};
use crate::prelude::{seconds_from_now, unix_time_now};
use crate::SubNet;

use super::client::Client;
use super::config::BanManagerConfig;
use super::dialog::Dialog;
use super::discourage::DiscouragedSet;
use super::error::{BanError, RunError};
use super::messages::{ClientMessage, Event, Info, Warning};
use super::{FileLoad, LoadReport, Phase};

const LOG_CAPACITY: usize = 32;

#[derive(Debug)]
struct BanState {
    registry: BanRegistry,
    phase: Phase,
    // The registry changed since it was last written to disk.
    dirty: bool,
}

impl BanState {
    fn check_mutable(&self) -> Result<(), BanError> {
        match self.phase {
            Phase::Uninitialized => Err(BanError::NotLoaded),
            Phase::Stopped => Err(BanError::Stopped),
            Phase::Loaded | Phase::Running => Ok(()),
        }
    }
}

/// The ban list of a node.
///
/// A manager is built by a [`Builder`](super::builder::Builder), loaded with
/// [`load_from_disk`](Self::load_from_disk) while it is still exclusively owned, and may then be
/// shared behind an [`Arc`] with the connection handling, administrative, and timer paths.
///
/// Every query and change takes a single lock for the duration of one map operation. Disk I/O is
/// never performed while the lock is held.
#[derive(Debug)]
pub struct BanManager {
    state: Mutex<BanState>,
    discouraged: Mutex<DiscouragedSet>,
    // Serializes writers so two dumps never race on the temporary file.
    dump_lock: Mutex<()>,
    legacy_file: BanFile,
    json_file: BanFile,
    network: Network,
    default_ban_time: Duration,
    dump_interval: Duration,
    dialog: Dialog,
    client_recv: Mutex<Option<UnboundedReceiver<ClientMessage>>>,
}

impl BanManager {
    pub(crate) fn new(network: Network, config: BanManagerConfig) -> (Self, Client) {
        let BanManagerConfig {
            data_path,
            default_ban_time,
            dump_interval,
            discouragement_capacity,
            log_level,
        } = config;
        // Set up a communication channel between the manager and client
        let (log_tx, log_rx) = mpsc::channel::<String>(LOG_CAPACITY);
        let (info_tx, info_rx) = mpsc::channel::<Info>(LOG_CAPACITY);
        let (warn_tx, warn_rx) = mpsc::unbounded_channel::<Warning>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        let (ctx, crx) = mpsc::unbounded_channel::<ClientMessage>();
        let client = Client::new(log_rx, info_rx, warn_rx, event_rx, ctx);
        let dialog = Dialog::new(log_level, log_tx, info_tx, warn_tx, event_tx);
        let data_path = data_path.unwrap_or_else(|| ".".into());
        (
            Self {
                state: Mutex::new(BanState {
                    registry: BanRegistry::new(),
                    phase: Phase::Uninitialized,
                    dirty: false,
                }),
                discouraged: Mutex::new(DiscouragedSet::new(discouragement_capacity)),
                dump_lock: Mutex::new(()),
                legacy_file: BanFile::legacy_in(&data_path),
                json_file: BanFile::json_in(&data_path),
                network,
                default_ban_time,
                dump_interval,
                dialog,
                client_recv: Mutex::new(Some(crx)),
            },
            client,
        )
    }

    /// The network whose legacy ban lists are accepted.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Read the legacy ban list, then the JSON ban list, keeping every valid entry. A ban in the
    /// JSON file replaces a legacy ban for the same subnet.
    ///
    /// Missing, unreadable, or corrupt files contribute no entries and are reported as warnings,
    /// so the node may always start. Entries that expired while the node was offline are
    /// removed immediately.
    ///
    /// # Errors
    ///
    /// If the ban list was already loaded.
    pub fn load_from_disk(&mut self) -> Result<LoadReport, BanError> {
        if self.state.get_mut().phase != Phase::Uninitialized {
            return Err(BanError::AlreadyLoaded);
        }
        let mut registry = BanRegistry::new();
        let legacy = self.load_file(&self.legacy_file, &mut registry);
        let json = self.load_file(&self.json_file, &mut registry);
        let expired = registry.remove_expired(unix_time_now());
        let entries = registry.len();
        // Migrate legacy bans and recreate a missing or corrupt JSON file at the next dump.
        let dirty =
            legacy.accepted() > 0 || expired > 0 || !matches!(json, FileLoad::Loaded { .. });
        let state = self.state.get_mut();
        state.registry = registry;
        state.dirty = dirty;
        state.phase = Phase::Loaded;
        self.dialog.send_info(Info::Loaded { entries });
        self.dialog.send_info(Info::StateChange(Phase::Loaded));
        Ok(LoadReport {
            legacy,
            json,
            expired,
        })
    }

    fn load_file(&self, file: &BanFile, registry: &mut BanRegistry) -> FileLoad {
        let bytes = match file.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.dialog.send_dialog(format!(
                    "No {} ban list at {}",
                    file.format,
                    file.path.display()
                ));
                return FileLoad::Missing;
            }
            Err(e) => {
                self.dialog.send_warning(Warning::FailedPersistence {
                    warning: e.to_string(),
                });
                return FileLoad::Unreadable(e.to_string());
            }
        };
        let decoded = match file.format {
            BanFileFormat::Legacy => LegacyCodec::new(self.network).decode(&bytes),
            BanFileFormat::Json => JsonCodec::new().decode(&bytes),
        };
        match decoded {
            Ok(decoded) => {
                let dropped = decoded.diagnostics.len();
                for diagnostic in decoded.diagnostics {
                    self.dialog.send_warning(Warning::DroppedEntry {
                        file: file.path.clone(),
                        diagnostic,
                    });
                }
                let accepted = decoded.entries.len();
                registry.extend(decoded.entries);
                self.dialog.send_dialog(format!(
                    "Read {accepted} bans from {}, dropped {dropped}",
                    file.path.display()
                ));
                FileLoad::Loaded { accepted, dropped }
            }
            Err(e) => {
                self.dialog.send_warning(Warning::CorruptedBanList {
                    file: file.path.clone(),
                    reason: e.to_string(),
                });
                FileLoad::Rejected(e.to_string())
            }
        }
    }

    /// Write the ban list to the JSON file, removing expired bans first. Nothing is written if
    /// the ban list has not changed since the last successful write.
    ///
    /// The registry is only locked to copy it, so admission checks are not blocked by a slow disk.
    /// Returns whether the file was written.
    ///
    /// # Errors
    ///
    /// If the file could not be written. The bans in memory are not affected, and the next dump
    /// will try again.
    pub fn dump_to_disk(&self) -> Result<bool, PersistenceError> {
        let _writer = self.dump_lock.lock();
        self.sweep_expired(unix_time_now());
        let mut snapshot = {
            let mut state = self.state.lock();
            if state.phase == Phase::Uninitialized || !state.dirty {
                return Ok(false);
            }
            state.dirty = false;
            state.registry.all()
        };
        snapshot.sort_by(|(left, _), (right, _)| left.cmp(right));
        let written = JsonCodec::new()
            .encode(&snapshot)
            .map_err(PersistenceError::Serialize)
            .and_then(|bytes| self.json_file.write_atomic(&bytes));
        match written {
            Ok(()) => {
                self.dialog.send_info(Info::Flushed {
                    entries: snapshot.len(),
                });
                Ok(true)
            }
            Err(e) => {
                self.state.lock().dirty = true;
                self.dialog.send_warning(Warning::FailedPersistence {
                    warning: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Ban a subnet, or a single address, until the given UNIX time in seconds. An existing ban
    /// on the same subnet is replaced.
    ///
    /// # Errors
    ///
    /// If the subnet is invalid, in which case nothing is changed, or the manager is not
    /// accepting changes.
    pub fn ban(&self, subnet: impl Into<SubNet>, until: i64) -> Result<(), BanError> {
        let subnet = subnet.into();
        if !subnet.is_valid() {
            self.dialog.send_warning(Warning::RejectedBan { subnet });
            return Err(BanError::InvalidSubnet(subnet));
        }
        let entry = BanEntry::new(unix_time_now(), until);
        {
            let mut state = self.state.lock();
            state.check_mutable()?;
            state.registry.insert_or_replace(subnet, entry);
            state.dirty = true;
        }
        self.dialog
            .send_dialog(format!("Banned {subnet} until {until}"));
        self.dialog.send_event(Event::BanListChanged);
        Ok(())
    }

    /// Ban a subnet for a duration starting now.
    ///
    /// # Errors
    ///
    /// See [`ban`](Self::ban).
    pub fn ban_for(&self, subnet: impl Into<SubNet>, duration: Duration) -> Result<(), BanError> {
        let until = seconds_from_now(unix_time_now(), duration.as_secs());
        self.ban(subnet, until)
    }

    /// Ban a subnet for the configured default ban time.
    ///
    /// # Errors
    ///
    /// See [`ban`](Self::ban).
    pub fn ban_for_default(&self, subnet: impl Into<SubNet>) -> Result<(), BanError> {
        self.ban_for(subnet, self.default_ban_time)
    }

    /// Lift the ban on exactly this subnet, returning `false` if there was none.
    ///
    /// # Errors
    ///
    /// If the manager is not accepting changes.
    pub fn unban(&self, subnet: impl Into<SubNet>) -> Result<bool, BanError> {
        let subnet = subnet.into();
        let removed = {
            let mut state = self.state.lock();
            state.check_mutable()?;
            let removed = state.registry.remove(&subnet);
            state.dirty |= removed;
            removed
        };
        if removed {
            self.dialog.send_dialog(format!("Unbanned {subnet}"));
            self.dialog.send_event(Event::BanListChanged);
        }
        Ok(removed)
    }

    /// Lift every ban.
    ///
    /// # Errors
    ///
    /// If the manager is not accepting changes.
    pub fn clear_all(&self) -> Result<(), BanError> {
        {
            let mut state = self.state.lock();
            state.check_mutable()?;
            state.registry.clear();
            state.dirty = true;
        }
        self.dialog.send_dialog("Cleared all bans");
        self.dialog.send_event(Event::BanListChanged);
        Ok(())
    }

    /// Is the address covered by a ban that has not expired at `now`. Expired bans that have
    /// not been swept yet do not count.
    pub fn is_banned(&self, addr: IpAddr, now: i64) -> bool {
        self.state.lock().registry.contains_active(addr, now)
    }

    /// Is exactly this subnet banned at `now`. Bans on wider or narrower subnets do not count.
    pub fn is_subnet_banned(&self, subnet: &SubNet, now: i64) -> bool {
        self.state
            .lock()
            .registry
            .find(subnet)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove every ban that has expired at `now`, returning how many were removed.
    pub fn sweep_expired(&self, now: i64) -> usize {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.registry.remove_expired(now);
            state.dirty |= removed > 0;
            removed
        };
        if removed > 0 {
            self.dialog
                .send_dialog(format!("Removed {removed} expired bans"));
            self.dialog.send_event(Event::BanListChanged);
        }
        removed
    }

    /// Every ban in effect at `now`, ordered by subnet. Expired bans are swept first.
    pub fn banned(&self, now: i64) -> Vec<(SubNet, BanEntry)> {
        self.sweep_expired(now);
        let mut bans = self.state.lock().registry.all();
        bans.sort_by(|(left, _), (right, _)| left.cmp(right));
        bans
    }

    /// Flag an address for misbehavior that does not warrant a ban. Discouraged addresses are
    /// kept in memory only and may be forgotten when many others are discouraged.
    pub fn discourage(&self, addr: IpAddr) {
        self.discouraged.lock().insert(addr);
        self.dialog.send_dialog(format!("Discouraged {addr}"));
    }

    /// Was this address discouraged.
    pub fn is_discouraged(&self, addr: IpAddr) -> bool {
        self.discouraged.lock().contains(addr)
    }

    /// Stop accepting changes and write the ban list a final time. Calling this again has no
    /// effect.
    ///
    /// # Errors
    ///
    /// If the final write failed.
    pub fn shutdown(&self) -> Result<(), PersistenceError> {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.phase, Phase::Stopped)
        };
        if previous == Phase::Stopped {
            return Ok(());
        }
        self.dialog.send_info(Info::StateChange(Phase::Stopped));
        if previous == Phase::Uninitialized {
            return Ok(());
        }
        self.dump_to_disk().map(|_| ())
    }

    /// Periodically remove expired bans and write the ban list to disk until a
    /// [`Requester`](super::client::Requester) asks to shut down, or every requester is dropped.
    /// The ban list is written a final time before returning.
    ///
    /// # Errors
    ///
    /// If the ban list has not been loaded, the manager has shut down, or it is already running.
    /// Also if the final write of the ban list failed, although the manager is stopped either way.
    pub async fn run(self: Arc<Self>) -> Result<(), RunError> {
        let mut client_recv = {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Uninitialized => return Err(RunError::NotLoaded),
                Phase::Stopped => return Err(RunError::Stopped),
                Phase::Running => return Err(RunError::AlreadyRunning),
                Phase::Loaded => (),
            }
            let client_recv = self
                .client_recv
                .lock()
                .take()
                .ok_or(RunError::AlreadyRunning)?;
            state.phase = Phase::Running;
            client_recv
        };
        self.dialog.send_info(Info::StateChange(Phase::Running));
        let mut interval = tokio::time::interval(self.dump_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    Arc::clone(&self).flush().await;
                }
                message = client_recv.recv() => {
                    match message {
                        Some(ClientMessage::Dump) => Arc::clone(&self).flush().await,
                        Some(ClientMessage::Shutdown) | None => break,
                    }
                }
            }
            // The manager may be shut down directly rather than through a requester.
            if self.phase() == Phase::Stopped {
                break;
            }
        }
        let manager = Arc::clone(&self);
        tokio::task::spawn_blocking(move || manager.shutdown())
            .await
            .map_err(|_| RunError::Interrupted)?
            .map_err(RunError::Persistence)
    }

    // Failures are reported to the client by the dump itself.
    async fn flush(self: Arc<Self>) {
        let _ = tokio::task::spawn_blocking(move || self.dump_to_disk()).await;
    }
}
