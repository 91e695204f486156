//! Navigation-related controller methods (login, libraries, tracks)

use std::time::Duration;

use crate::model::{Item, LoginForm, Screen};
use super::AppController;

/// How long the loading screen waits for the playback service to report a bound UI
const BIND_TIMEOUT: Duration = Duration::from_secs(5);

impl AppController {
    /// Resolve the loading screen: once the playback service is bound, load the libraries
    /// and show them. Failure falls back to the login screen.
    pub async fn finish_loading(&self) {
        let mut snapshots = self.player.subscribe();
        if tokio::time::timeout(BIND_TIMEOUT, snapshots.wait_for(|s| s.ui_bound))
            .await
            .is_err()
        {
            tracing::warn!("Playback service did not bind in time, loading anyway");
        }

        if !self.library_load_delay.is_zero() {
            tokio::time::sleep(self.library_load_delay).await;
        }

        if self.load_libraries().await {
            self.model.reset_to(Screen::Libraries).await;
        } else {
            self.prefill_login().await;
            self.model.reset_to(Screen::Login).await;
        }
    }

    /// Fill the login form from saved credentials, keeping the password blank
    pub async fn prefill_login(&self) {
        let form = {
            let session = self.session.lock().await;
            session
                .credentials()
                .map(|c| LoginForm::prefilled(&c.hostname, &c.username))
                .unwrap_or_default()
        };
        self.model.set_login_form(form).await;
    }

    pub async fn submit_login(&self) {
        let form = self.model.get_login_form().await;
        if !form.can_submit() {
            tracing::debug!("Login submitted with blank fields, ignoring");
            return;
        }

        tracing::info!(hostname = %form.hostname, username = %form.username, "Logging in");
        self.model.set_content_loading(true).await;

        let result = self
            .session
            .lock()
            .await
            .login(&form.hostname, &form.username, &form.password)
            .await;

        match result {
            Ok(_) => {
                self.model.set_login_form(LoginForm::prefilled(&form.hostname, &form.username)).await;
                self.model.reset_to(Screen::Libraries).await;
                self.load_libraries().await;
            }
            Err(e) => self.report_error("login", e.into()).await,
        }
    }

    /// Fetch the music libraries into the model. Returns whether it worked.
    pub async fn load_libraries(&self) -> bool {
        self.model.set_content_loading(true).await;

        let result = async {
            let client = self.client().await?;
            Ok::<_, anyhow::Error>(client.get_libraries().await?)
        }
        .await;

        match result {
            Ok(libraries) => {
                tracing::info!(count = libraries.len(), "Libraries loaded");
                self.model.set_libraries(libraries).await;
                true
            }
            Err(e) => {
                self.report_error("load_libraries", e).await;
                false
            }
        }
    }

    /// Fetch a library's tracks and show them
    pub async fn open_library(&self, library: Item) {
        if let Some(tracks) = self.fetch_tracks(&library).await {
            self.model.set_tracks(library, tracks).await;
            self.model.navigate_to(Screen::Tracks).await;
        }
    }

    pub(crate) async fn fetch_tracks(&self, library: &Item) -> Option<Vec<Item>> {
        tracing::debug!(library_id = %library.id, library = %library.name, "Fetching library tracks");
        self.model.set_content_loading(true).await;

        let result = async {
            let client = self.client().await?;
            Ok::<_, anyhow::Error>(client.get_items(&library.id).await?)
        }
        .await;

        match result {
            Ok(tracks) => {
                self.model.set_content_loading(false).await;
                Some(tracks)
            }
            Err(e) => {
                self.report_error("fetch_tracks", e).await;
                None
            }
        }
    }

    /// Forget the login, stop playback and go back to the login screen
    pub async fn logout(&self) {
        self.player.stop();

        let result = self.session.lock().await.logout();
        if let Err(e) = result {
            self.report_error("logout", e.into()).await;
            return;
        }

        self.model.set_libraries(Vec::new()).await;
        self.model.set_login_form(LoginForm::default()).await;
        self.model.reset_to(Screen::Login).await;
    }

    pub async fn go_back(&self) {
        if !self.model.navigate_back().await {
            tracing::trace!("Already at the root screen");
        }
    }
}
