//! Persisted session state.
//!
//! The persistent server writes two small plain-text files - the engine's
//! WebSocket endpoint and a random hex session id - so later invocations can
//! attach to the same running browser. Readers must tolerate stale files
//! (left behind by a crash): a missing, unreadable, or unparseable file is
//! "no session", never an error, and the real validation is attempting to
//! connect.

use std::fs;
use std::path::{Path, PathBuf};

use emrpilot_protocol::WsEndpoint;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

const WS_URL_FILE: &str = ".emrpilot_ws_url";
const SESSION_ID_FILE: &str = ".emrpilot_session_id";

/// The session the persistent server owns: where its files live, the
/// endpoint it advertises, and its identifier.
///
/// Constructed once at server startup and passed explicitly to the signal
/// cleanup routine and to anything that reports on the session - there is no
/// ambient global holding these.
#[derive(Debug, Clone)]
pub struct SessionContext {
    state_dir: PathBuf,
    pub endpoint: WsEndpoint,
    pub session_id: String,
}

impl SessionContext {
    /// Creates a fresh session: generates a random hex id and persists both
    /// files under `state_dir` (created if needed).
    pub fn create(state_dir: &Path, endpoint: WsEndpoint) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        let session_id = Uuid::new_v4().simple().to_string();

        let ctx = Self {
            state_dir: state_dir.to_path_buf(),
            endpoint,
            session_id,
        };
        fs::write(ctx.ws_url_path(), ctx.endpoint.as_str())?;
        fs::write(ctx.session_id_path(), &ctx.session_id)?;
        Ok(ctx)
    }

    /// Loads a previously persisted session, if a plausible one exists.
    ///
    /// Any defect - missing files, unreadable content, an endpoint that does
    /// not parse - yields `None`.
    pub fn load(state_dir: &Path) -> Option<Self> {
        let endpoint_raw = fs::read_to_string(state_dir.join(WS_URL_FILE)).ok()?;
        let endpoint = WsEndpoint::parse(&endpoint_raw)?;
        let session_id = fs::read_to_string(state_dir.join(SESSION_ID_FILE))
            .ok()?
            .trim()
            .to_string();
        if session_id.is_empty() {
            return None;
        }

        Some(Self {
            state_dir: state_dir.to_path_buf(),
            endpoint,
            session_id,
        })
    }

    /// Deletes the persisted files. Missing files are fine; this runs from
    /// signal handlers where the earlier cleanup may already have won.
    pub fn cleanup(&self) {
        for path in [self.ws_url_path(), self.session_id_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(target = "emrpilot.session", path = %path.display(), "removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!(target = "emrpilot.session", path = %path.display(), error = %e, "cleanup failed"),
            }
        }
    }

    pub fn ws_url_path(&self) -> PathBuf {
        self.state_dir.join(WS_URL_FILE)
    }

    pub fn session_id_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_ID_FILE)
    }
}

/// Where session files live by default: the current working directory, so
/// sibling invocations from the same checkout find each other.
pub fn default_state_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn endpoint() -> WsEndpoint {
        WsEndpoint::parse("ws://localhost:40001/ab12cd34").unwrap()
    }

    #[test]
    fn create_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let created = SessionContext::create(dir.path(), endpoint()).unwrap();
        assert_eq!(created.session_id.len(), 32);

        let loaded = SessionContext::load(dir.path()).unwrap();
        assert_eq!(loaded.endpoint, created.endpoint);
        assert_eq!(loaded.session_id, created.session_id);
    }

    #[test]
    fn load_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        assert!(SessionContext::load(dir.path()).is_none());
    }

    #[test]
    fn load_tolerates_stale_garbage() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(WS_URL_FILE), "not an endpoint").unwrap();
        fs::write(dir.path().join(SESSION_ID_FILE), "abcd").unwrap();
        assert!(SessionContext::load(dir.path()).is_none());
    }

    #[test]
    fn cleanup_removes_files_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = SessionContext::create(dir.path(), endpoint()).unwrap();
        assert!(ctx.ws_url_path().exists());

        ctx.cleanup();
        assert!(!ctx.ws_url_path().exists());
        assert!(!ctx.session_id_path().exists());

        // A second pass must not fail.
        ctx.cleanup();
    }
}
