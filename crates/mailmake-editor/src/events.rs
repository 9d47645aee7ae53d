//! Channel-backed collaborators
//!
//! A session can report to an unbounded channel instead of dedicated
//! navigator and notifier implementations; the receiving end sees every
//! request in emission order.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::navigation::{HistoryMode, NavigationTarget, Navigator};
use crate::notice::{Notice, Notifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Navigate {
        target: NavigationTarget,
        mode: HistoryMode,
    },
    Notice(Notice),
}

impl Navigator for UnboundedSender<SessionEvent> {
    fn navigate(&self, target: NavigationTarget, mode: HistoryMode) {
        if self.send(SessionEvent::Navigate { target, mode }).is_err() {
            debug!("navigation dropped, receiver closed");
        }
    }
}

impl Notifier for UnboundedSender<SessionEvent> {
    fn notify(&self, notice: Notice) {
        if self.send(SessionEvent::Notice(notice)).is_err() {
            debug!("notice dropped, receiver closed");
        }
    }
}
