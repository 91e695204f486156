//! Jellyfin API client wrapper

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::auth::AccessToken;
use crate::error::{ClientError, Result};
use crate::{log_api_request, log_api_result};

use super::content::{AuthenticationResult, Item, ItemsResult};

/// Identity reported to the server with every request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientInfo {
    pub client: String,
    pub device: String,
    pub device_id: String,
    pub version: String,
}

impl ClientInfo {
    pub fn new(client: impl Into<String>, device: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            device: device.into(),
            device_id: device_id.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Turn user input like `media.local:8096/` into `http://media.local:8096`
pub fn normalize_base_url(hostname: &str) -> Result<String> {
    let trimmed = hostname.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidUrl("hostname is empty".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", hostname, e)))?;
    if url.host_str().is_none() {
        return Err(ClientError::InvalidUrl(hostname.to_string()));
    }

    Ok(with_scheme)
}

/// Jellyfin API client. Cheap to clone; clones share the access token.
#[derive(Clone)]
pub struct JellyfinClient {
    http: reqwest::Client,
    base_url: String,
    client_info: ClientInfo,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl JellyfinClient {
    pub fn new(hostname: &str, client_info: ClientInfo, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(hostname)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::debug!(base_url = %base_url, "Jellyfin client created");

        Ok(Self {
            http,
            base_url,
            client_info,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<AccessToken>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub fn token(&self) -> Option<AccessToken> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Value of the `Authorization` header, including the token once logged in
    pub fn authorization_header(&self) -> String {
        let info = &self.client_info;
        let mut header = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            info.client, info.device, info.device_id, info.version
        );
        if let Some(token) = self.token() {
            header.push_str(&format!(", Token=\"{}\"", token.access_token));
        }
        header
    }

    pub async fn authenticate_by_name(&self, username: &str, password: &str) -> Result<AccessToken> {
        log_api_request!("authenticate_by_name", username);

        let result = self.do_authenticate(username, password).await;
        log_api_result!("authenticate_by_name", result);

        let token = result?;
        self.set_token(Some(token.clone()));
        Ok(token)
    }

    async fn do_authenticate(&self, username: &str, password: &str) -> Result<AccessToken> {
        let response = self
            .http
            .post(format!("{}/Users/AuthenticateByName", self.base_url))
            .header("Authorization", self.authorization_header())
            .json(&json!({ "Username": username, "Pw": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ClientError::Auth("invalid username or password".to_string()));
            }
            status if !status.is_success() => {
                return Err(ClientError::Status {
                    operation: "authenticate_by_name",
                    status,
                });
            }
            _ => {}
        }

        let body: AuthenticationResult = response.json().await?;
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Auth("server returned no access token".to_string()))?;
        let user = body
            .user
            .ok_or_else(|| ClientError::Auth("server returned no user".to_string()))?;

        Ok(AccessToken::new(access_token, user.id))
    }

    /// User views whose collection type is `music`
    pub async fn get_libraries(&self) -> Result<Vec<Item>> {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        log_api_request!("get_libraries", user_id = %token.user_id);

        let result: Result<ItemsResult> = self
            .get_json("get_libraries", &format!("/Users/{}/Views", token.user_id), &[])
            .await;
        log_api_result!("get_libraries", result);

        let views = result?;
        let total = views.items.len();
        let libraries: Vec<Item> = views.items.into_iter().filter(Item::is_music_library).collect();
        tracing::debug!(total, music = libraries.len(), "Filtered user views");
        Ok(libraries)
    }

    /// Audio items anywhere below `library_id`, sorted by name
    pub async fn get_items(&self, library_id: &str) -> Result<Vec<Item>> {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        log_api_request!("get_items", library_id);

        let result: Result<ItemsResult> = self
            .get_json(
                "get_items",
                &format!("/Users/{}/Items", token.user_id),
                &[
                    ("ParentId", library_id),
                    ("Recursive", "true"),
                    ("IncludeItemTypes", "Audio"),
                    ("SortBy", "SortName"),
                ],
            )
            .await;
        log_api_result!("get_items", result);

        let items = result?.items;
        tracing::info!(library_id, count = items.len(), "Fetched library items");
        Ok(items)
    }

    /// Direct-stream URL for an item
    pub fn audio_url(&self, item_id: &str) -> Result<String> {
        let token = self.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(format!(
            "{}/Audio/{}/stream?api_key={}&container=mp3&static=true",
            self.base_url, item_id, token.access_token
        ))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", self.authorization_header())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { operation, status });
        }

        Ok(response.json().await?)
    }
}
