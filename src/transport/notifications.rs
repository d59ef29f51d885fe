//! Module `notifications`
//!
//! The standalone server-to-client stream of one session, opened by GET.
//! At most one stream is open at a time; a stream whose receiver has gone
//! away frees the slot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::mpsc;

use crate::protocol::{JsonRpcNotification, Notifier};

pub type NotificationReceiver = mpsc::UnboundedReceiver<JsonRpcNotification>;

#[derive(Debug, PartialEq, Eq)]
pub struct StreamConflict;

#[derive(Default)]
pub struct NotificationStream {
    sender: Mutex<Option<mpsc::UnboundedSender<JsonRpcNotification>>>,
}

impl NotificationStream {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<JsonRpcNotification>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the stream, failing if a live one already exists.
    pub fn open(&self) -> Result<NotificationReceiver, StreamConflict> {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(StreamConflict);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(tx);
        Ok(rx)
    }

    /// Drops the sender, which ends the client's event stream.
    pub fn close(&self) {
        if self.slot().take().is_some() {
            debug!("Notification stream closed");
        }
    }
}

impl Notifier for NotificationStream {
    fn notify(&self, notification: JsonRpcNotification) -> bool {
        match self.slot().as_ref() {
            Some(tx) => tx.send(notification).is_ok(),
            None => false,
        }
    }
}
