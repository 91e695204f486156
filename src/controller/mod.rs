//! Controller module - Application logic and event handling
//!
//! - `input`: key and focus event handling
//! - `playback`: playback control methods
//! - `navigation`: login, library and track list navigation
//! - `player_events`: playback service snapshot listener

mod input;
mod playback;
mod navigation;
mod player_events;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use reqwest::StatusCode;

use crate::auth::{Session, SessionError};
use crate::error::{ClientError, EngineError};
use crate::model::{AppModel, JellyfinClient};
use crate::player::PlayerHandle;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) session: Arc<Mutex<Session>>,
    pub(crate) player: PlayerHandle,
    library_load_delay: Duration,
}

impl AppController {
    pub fn new(model: Arc<AppModel>, session: Arc<Mutex<Session>>, player: PlayerHandle) -> Self {
        Self {
            model,
            session,
            player,
            library_load_delay: Duration::ZERO,
        }
    }

    pub fn with_library_load_delay(mut self, delay: Duration) -> Self {
        self.library_load_delay = delay;
        self
    }

    /// Authenticated client, logging in with the saved password if needed
    pub(crate) async fn client(&self) -> Result<JellyfinClient, SessionError> {
        self.session.lock().await.ensure_authenticated().await
    }

    /// Report a failure to the user. An expired token is dropped so the next request
    /// logs in again with the saved password.
    pub(crate) async fn report_error(&self, context: &str, error: anyhow::Error) {
        tracing::error!(context, error = %error, "Operation failed");

        if Self::is_unauthorized(&error) {
            let result = self.session.lock().await.invalidate_token();
            if let Err(e) = result {
                tracing::warn!(error = %e, "Could not drop expired token");
            }
        }

        self.model.set_content_loading(false).await;
        self.model.set_error(Self::format_error(&error)).await;
    }

    fn is_unauthorized(error: &anyhow::Error) -> bool {
        let client_error = error.downcast_ref::<ClientError>().or_else(|| match error.downcast_ref::<SessionError>() {
            Some(SessionError::Client(e)) => Some(e),
            _ => None,
        });
        matches!(
            client_error,
            Some(ClientError::Status {
                status: StatusCode::UNAUTHORIZED,
                ..
            })
        )
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        if let Some(e) = error.downcast_ref::<SessionError>() {
            return match e {
                SessionError::Client(e) => Self::format_client_error(e),
                SessionError::MissingCredentials => "No saved login. Please log in.".to_string(),
                SessionError::Store(e) => format!("Could not save login: {}", e),
            };
        }
        if let Some(e) = error.downcast_ref::<ClientError>() {
            return Self::format_client_error(e);
        }
        if let Some(e) = error.downcast_ref::<EngineError>() {
            return format!("Playback failed: {}", e);
        }
        format!("Error: {}", error)
    }

    fn format_client_error(error: &ClientError) -> String {
        match error {
            ClientError::Http(e) if e.is_timeout() => "Server did not respond in time.".to_string(),
            ClientError::Http(e) if e.is_connect() => "Could not reach the server. Check the address.".to_string(),
            ClientError::Http(e) => format!("Network error: {}", e),
            ClientError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                "Session expired. Try again or log in again.".to_string()
            }
            ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                "Not found on the server.".to_string()
            }
            ClientError::Status { status, .. } => format!("Server error ({}).", status),
            ClientError::Auth(reason) => format!("Login failed: {}.", reason),
            ClientError::NotAuthenticated => "Not logged in.".to_string(),
            ClientError::InvalidUrl(address) => format!("Invalid server address: {}", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_session_and_client_errors() {
        let err = anyhow::Error::from(SessionError::MissingCredentials);
        assert_eq!(AppController::format_error(&err), "No saved login. Please log in.");

        let err = anyhow::Error::from(ClientError::Auth("invalid username or password".to_string()));
        assert_eq!(AppController::format_error(&err), "Login failed: invalid username or password.");

        let err = anyhow::Error::from(SessionError::Client(ClientError::InvalidUrl("::".to_string())));
        assert_eq!(AppController::format_error(&err), "Invalid server address: ::");

        let err = anyhow::anyhow!("something else");
        assert_eq!(AppController::format_error(&err), "Error: something else");
    }

    #[test]
    fn formats_status_errors() {
        let unauthorized = anyhow::Error::from(ClientError::Status {
            operation: "get_libraries",
            status: StatusCode::UNAUTHORIZED,
        });
        assert!(AppController::is_unauthorized(&unauthorized));
        assert_eq!(
            AppController::format_error(&unauthorized),
            "Session expired. Try again or log in again."
        );

        let server = anyhow::Error::from(SessionError::Client(ClientError::Status {
            operation: "get_items",
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }));
        assert!(!AppController::is_unauthorized(&server));
        assert_eq!(AppController::format_error(&server), "Server error (500 Internal Server Error).");
    }
}
