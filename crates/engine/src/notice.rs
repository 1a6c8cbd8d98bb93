use shiftgrid_core::{SessionId, SubMode};
use tokio::sync::mpsc;

/// Transient message for the user, shown once and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EditStarted { session: SessionId },
    Saved { row: usize, day: usize },
    SaveFailed { row: usize, day: usize, message: String },
    SubModeChanged(SubMode),
    Committed,
    Cancelled,
    RollbackFailed { message: String },
    ReloadFailed { message: String },
    /// Session state is no longer written through; a restart will lose it.
    PersistenceLost,
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::SaveFailed { .. }
                | Notice::RollbackFailed { .. }
                | Notice::ReloadFailed { .. }
                | Notice::PersistenceLost
        )
    }
}

#[derive(Clone)]
pub(crate) struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub(crate) fn send(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.tx.send(notice);
    }
}
