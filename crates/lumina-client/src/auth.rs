//! Credential store: the single piece of process-wide mutable state.
//!
//! Holds at most one basic-auth credential, persisted best-effort to a JSON
//! record on disk and published to subscribers over a watch channel. Writes
//! happen only in [`CredentialStore::install`] and
//! [`CredentialStore::invalidate`]; everything else observes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// File name of the persisted credential record.
pub const CREDENTIAL_FILE: &str = "credentials.json";

/// A logged-in identity: the username plus the pre-encoded basic-auth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Account name the token was issued for.
    pub username: String,
    /// `base64(username:password)`, ready for the `Authorization` header.
    pub token: String,
}

impl Credential {
    /// Encode a username/secret pair into a credential.
    #[must_use]
    pub fn encode(username: &str, secret: &str) -> Self {
        let token = general_purpose::STANDARD.encode(format!("{username}:{secret}"));
        Self {
            username: username.to_string(),
            token,
        }
    }

    /// Full `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.token)
    }
}

/// Shared handle over the optional credential.
///
/// Cloning is cheap; all clones observe the same state. Pass the handle
/// explicitly to the components that need it rather than reaching for an
/// ambient singleton.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: Option<PathBuf>,
    tx: watch::Sender<Option<Credential>>,
}

impl CredentialStore {
    /// Open a store backed by `path`, loading any previously persisted
    /// record. `None` keeps the store memory-only.
    #[must_use]
    pub fn open(path: Option<PathBuf>) -> Self {
        let initial = path.as_deref().and_then(load_record);
        let (tx, _rx) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner { path, tx }),
        }
    }

    /// Open a store at the conventional per-user location
    /// (`<config-dir>/lumina/credentials.json`).
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(default_credential_path())
    }

    /// A store with no backing file, for tests and ephemeral sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(None)
    }

    /// The credential currently held, if any.
    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        self.inner.tx.borrow().clone()
    }

    /// Whether a credential is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.tx.borrow().is_some()
    }

    /// Observe credential changes. The receiver yields the current value
    /// immediately and every replacement thereafter.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.inner.tx.subscribe()
    }

    /// Install a validated credential: persist best-effort, then publish.
    ///
    /// A persistence failure is logged and swallowed so the login still
    /// holds for the current session.
    pub fn install(&self, credential: Credential) {
        if let Some(path) = self.inner.path.as_deref() {
            persist_record(path, &credential);
        }
        self.inner.tx.send_replace(Some(credential));
    }

    /// Clear the credential: remove the persisted record best-effort, then
    /// publish `None`. Idempotent; this is both the logout path and the
    /// forced-invalidation path taken when any call observes a 401.
    pub fn invalidate(&self) {
        if let Some(path) = self.inner.path.as_deref() {
            remove_record(path);
        }
        self.inner.tx.send_replace(None);
    }
}

/// Conventional location of the credential record for the current user.
#[must_use]
pub fn default_credential_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lumina").join(CREDENTIAL_FILE))
}

fn load_record(path: &Path) -> Option<Credential> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(credential) => Some(credential),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable credential record");
            None
        }
    }
}

fn persist_record(path: &Path, credential: &Credential) {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(credential)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(path, raw)
    };
    if let Err(err) = write() {
        tracing::warn!(path = %path.display(), error = %err, "failed to persist credential; continuing in-memory");
    }
}

fn remove_record(path: &Path) {
    if let Err(err) = std::fs::remove_file(path)
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove persisted credential");
    }
}
