use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, StoreError};
use crate::model::{ClientInfo, JellyfinClient};

/// Access token and the user it belongs to. Always stored together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(access_token: String, user_id: String) -> Self {
        Self {
            access_token,
            user_id,
            issued_at: Utc::now(),
        }
    }
}

/// What the user typed at login, plus the token obtained with it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub hostname: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AccessToken>,
}

impl Credentials {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            token: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !(self.hostname.is_empty() || self.username.is_empty() || self.password.is_empty())
    }
}

/// Narrow load/save capability behind which credentials are persisted
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>, StoreError>;
    fn save(&self, credentials: &Credentials) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file store, readable by the owner only on unix
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "Saved credentials to disk");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-process store, nothing survives a restart
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("No saved credentials")]
    MissingCredentials,
}

/// Credentials, their store and the client built from them.
///
/// Loaded once at start-up and passed to whoever needs the server.
pub struct Session {
    store: Box<dyn CredentialStore>,
    credentials: Option<Credentials>,
    client: Option<JellyfinClient>,
    client_info: ClientInfo,
    timeout: Duration,
}

impl Session {
    pub fn open(
        store: Box<dyn CredentialStore>,
        client_info: ClientInfo,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let credentials = match store.load() {
            Ok(creds) => creds,
            // A corrupt file means the user logs in again
            Err(e @ StoreError::Json(_)) => {
                tracing::warn!(error = %e, "Saved credentials are malformed, ignoring them");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            store,
            credentials,
            client: None,
            client_info,
            timeout,
        })
    }

    pub fn has_valid_credentials(&self) -> bool {
        self.credentials.as_ref().is_some_and(Credentials::is_complete)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn client(&self) -> Option<&JellyfinClient> {
        self.client.as_ref()
    }

    /// Persist a new host/user/password triple. Any cached token is dropped.
    pub fn save_credentials(&mut self, hostname: &str, username: &str, password: &str) -> Result<(), SessionError> {
        let credentials = Credentials::new(hostname.trim(), username.trim(), password);
        self.store.save(&credentials)?;
        self.credentials = Some(credentials);
        self.client = None;
        tracing::info!(hostname = hostname.trim(), username = username.trim(), "Credentials saved");
        Ok(())
    }

    /// Return an authenticated client, logging in with the saved password when no
    /// token is cached. A freshly obtained token is persisted.
    pub async fn ensure_authenticated(&mut self) -> Result<JellyfinClient, SessionError> {
        if let Some(client) = &self.client {
            if client.is_authenticated() {
                return Ok(client.clone());
            }
        }

        let credentials = self
            .credentials
            .clone()
            .filter(Credentials::is_complete)
            .ok_or(SessionError::MissingCredentials)?;

        let client = JellyfinClient::new(&credentials.hostname, self.client_info.clone(), self.timeout)?;

        match credentials.token.clone() {
            Some(token) => {
                tracing::info!(user_id = %token.user_id, "Reusing cached access token");
                client.set_token(Some(token));
            }
            None => {
                let token = client
                    .authenticate_by_name(&credentials.username, &credentials.password)
                    .await?;
                tracing::info!(user_id = %token.user_id, "Authenticated with server");

                let updated = Credentials {
                    token: Some(token),
                    ..credentials
                };
                self.store.save(&updated)?;
                self.credentials = Some(updated);
            }
        }

        self.client = Some(client.clone());
        Ok(client)
    }

    pub async fn login(&mut self, hostname: &str, username: &str, password: &str) -> Result<JellyfinClient, SessionError> {
        self.save_credentials(hostname, username, password)?;
        self.ensure_authenticated().await
    }

    /// Forget the cached token so the next call re-authenticates (server said 401)
    pub fn invalidate_token(&mut self) -> Result<(), SessionError> {
        self.client = None;
        if let Some(creds) = self.credentials.as_mut() {
            if creds.token.take().is_some() {
                self.store.save(creds)?;
            }
        }
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.credentials = None;
        self.client = None;
        tracing::info!("Logged out, credentials cleared");
        Ok(())
    }
}
