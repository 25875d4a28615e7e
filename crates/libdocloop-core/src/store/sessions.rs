use std::sync::Arc;

use crate::backend::{read_json, write_json, StorageBackend};
use crate::error::DocloopError;
use crate::types::session::FeedbackSession;

const SESSIONS_PREFIX: &str = "sessions";

/// One JSON document per session under `sessions/`
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn save(&self, session: &FeedbackSession) -> Result<(), DocloopError> {
        write_json(self.backend.as_ref(), &session_key(&session.session_id), session)
    }

    pub fn load(&self, session_id: &str) -> Result<FeedbackSession, DocloopError> {
        read_json(self.backend.as_ref(), &session_key(session_id))?
            .ok_or_else(|| DocloopError::session_not_found(session_id))
    }

    /// Every stored session, in key order
    pub fn load_all(&self) -> Result<Vec<FeedbackSession>, DocloopError> {
        let mut sessions = Vec::new();
        for key in self.backend.list(SESSIONS_PREFIX)? {
            if !key.ends_with(".json") {
                continue;
            }
            if let Some(session) = read_json(self.backend.as_ref(), &key)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}/{}.json", SESSIONS_PREFIX, session_id)
}
