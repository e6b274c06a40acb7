use tokio::sync::mpsc::{Sender, UnboundedSender};

use super::messages::{Event, Info, Warning};
use crate::LogLevel;

// Every method is synchronous so it may be called while a ban is being checked on any thread.
// Logs and info are lossy when the client falls behind, while warnings and events are not.
#[derive(Debug, Clone)]
pub(crate) struct Dialog {
    pub(crate) log_level: LogLevel,
    log_tx: Sender<String>,
    info_tx: Sender<Info>,
    warn_tx: UnboundedSender<Warning>,
    event_tx: UnboundedSender<Event>,
}

impl Dialog {
    pub(crate) fn new(
        log_level: LogLevel,
        log_tx: Sender<String>,
        info_tx: Sender<Info>,
        warn_tx: UnboundedSender<Warning>,
        event_tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            log_level,
            log_tx,
            info_tx,
            warn_tx,
            event_tx,
        }
    }

    pub(crate) fn send_dialog(&self, dialog: impl Into<String>) {
        if self.log_level == LogLevel::Debug {
            let _ = self.log_tx.try_send(dialog.into());
        }
    }

    pub(crate) fn send_info(&self, info: Info) {
        if self.log_level <= LogLevel::Info {
            let _ = self.info_tx.try_send(info);
        }
    }

    pub(crate) fn send_warning(&self, warning: Warning) {
        let _ = self.warn_tx.send(warning);
    }

    pub(crate) fn send_event(&self, message: Event) {
        let _ = self.event_tx.send(message);
    }
}
