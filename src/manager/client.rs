use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;

use super::error::ClientError;
use super::messages::{ClientMessage, Event, Info, Warning};

/// A [`Client`] receives the diagnostics of a ban manager and may command its maintenance loop.
#[derive(Debug)]
pub struct Client {
    /// Send commands to a running manager.
    pub requester: Requester,
    /// Receive log/debug messages from the manager.
    pub log_rx: mpsc::Receiver<String>,
    /// Receive informational messages from the manager.
    pub info_rx: mpsc::Receiver<Info>,
    /// Receive warning messages from the manager, including every dropped ban list entry.
    pub warn_rx: mpsc::UnboundedReceiver<Warning>,
    /// Receive [`Event`] from the manager to act on.
    pub event_rx: mpsc::UnboundedReceiver<Event>,
}

impl Client {
    pub(crate) fn new(
        log_rx: mpsc::Receiver<String>,
        info_rx: mpsc::Receiver<Info>,
        warn_rx: mpsc::UnboundedReceiver<Warning>,
        event_rx: mpsc::UnboundedReceiver<Event>,
        ntx: UnboundedSender<ClientMessage>,
    ) -> Self {
        Self {
            requester: Requester::new(ntx),
            log_rx,
            info_rx,
            warn_rx,
            event_rx,
        }
    }
}

/// Send messages to a running ban manager.
#[derive(Debug, Clone)]
pub struct Requester {
    ntx: UnboundedSender<ClientMessage>,
}

impl Requester {
    fn new(ntx: UnboundedSender<ClientMessage>) -> Self {
        Self { ntx }
    }

    /// Tell the manager to write the ban list one last time and stop.
    ///
    /// # Errors
    ///
    /// If the manager has already stopped running.
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.ntx
            .send(ClientMessage::Shutdown)
            .map_err(|_| ClientError::SendError)
    }

    /// Write the ban list now instead of waiting for the next interval.
    ///
    /// # Errors
    ///
    /// If the manager has already stopped running.
    pub fn dump(&self) -> Result<(), ClientError> {
        self.ntx
            .send(ClientMessage::Dump)
            .map_err(|_| ClientError::SendError)
    }
}
