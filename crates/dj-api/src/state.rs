use std::sync::Arc;

use dj_core::traits::{MediaStore, SessionProvider};
use dj_core::EntryService;

/// Handles shared by every request. Nothing in here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub entries: EntryService,
    pub sessions: Arc<dyn SessionProvider>,
    pub media: Arc<dyn MediaStore>,
    /// Cookie carrying the session token for browser requests
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(
        entries: EntryService,
        sessions: Arc<dyn SessionProvider>,
        media: Arc<dyn MediaStore>,
        session_cookie: &str,
    ) -> Self {
        Self {
            entries,
            sessions,
            media,
            session_cookie: Arc::from(session_cookie),
        }
    }
}
