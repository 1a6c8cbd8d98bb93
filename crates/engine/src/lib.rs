pub mod error;
pub mod notice;
pub mod overlay;
pub mod saves;
pub mod session;
pub mod undo;
pub mod view;

pub use error::EngineError;
pub use notice::Notice;
pub use overlay::EditOverlay;
pub use saves::{CounterBoard, PendingSave};
pub use session::{AutoConfirm, ConfirmGate, EditSession, SessionState, SubModeChange};
pub use undo::UndoManager;
pub use view::{CellDescriptor, GridView};

use std::sync::Arc;

use shiftgrid_config::Settings;
use shiftgrid_remote::{HttpOptions, HttpScheduleStore};
use shiftgrid_storage::{PersistedSessionStore, SqliteSessionStore};

/// Open the session store named by `settings`, falling back to memory when
/// there is no usable location.
pub fn open_store(settings: &Settings) -> Result<Box<dyn PersistedSessionStore + Send>, EngineError> {
    let Some(path) = settings.session.effective_store_path() else {
        tracing::warn!("no data directory, session will not survive a restart");
        return Ok(Box::new(SqliteSessionStore::open_in_memory()?));
    };
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!(path = %parent.display(), error = %e, "cannot create session store directory");
    }
    let store = SqliteSessionStore::open_or_memory(&path.to_string_lossy())?;
    Ok(Box::new(store))
}

/// Wire up an [`EditSession`] against the HTTP backend and the configured
/// session store.
pub fn open_session(settings: &Settings) -> Result<EditSession, EngineError> {
    settings.validate()?;
    let remote = HttpScheduleStore::new(HttpOptions {
        api_url: settings.remote.api_url.clone(),
        timeout: settings.remote.timeout(),
        retry_attempts: settings.remote.retry_attempts,
        retry_delay: settings.remote.retry_delay(),
    })?;
    let store = open_store(settings)?;
    let session = EditSession::restore(Arc::new(remote), store);
    tracing::info!(
        api_url = %settings.remote.api_url,
        persistent = session.is_persistent(),
        "session opened"
    );
    Ok(session)
}
