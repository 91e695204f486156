//! End-to-end flow against a local fake Jellyfin server

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use jellyfin_rs::audio::{event_channel, RepeatMode, SilentEngine};
use jellyfin_rs::auth::{AccessToken, CredentialStore, Credentials, MemoryCredentialStore, Session, SessionError};
use jellyfin_rs::controller::AppController;
use jellyfin_rs::error::ClientError;
use jellyfin_rs::model::{AppModel, ClientInfo, LoginForm, Screen};
use jellyfin_rs::player::{LogNotifier, PlaybackService, PlayerHandle, PlayerSnapshot};

const USER_ID: &str = "user-1";
const TOKEN: &str = "tok-1";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("MediaBrowser ") && v.contains(&format!("Token=\"{}\"", TOKEN)))
}

async fn authenticate(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["Username"] == "u" && body["Pw"] == "p" {
        Ok(Json(json!({ "AccessToken": TOKEN, "User": { "Id": USER_ID, "Name": "u" } })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn views(Path(user_id): Path<String>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) || user_id != USER_ID {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "Items": [
            { "Id": "lib-music", "Name": "Music", "CollectionType": "music" },
            { "Id": "lib-movies", "Name": "Movies", "CollectionType": "movies" },
            { "Id": "lib-books", "Name": "Books", "CollectionType": "books" }
        ],
        "TotalRecordCount": 3
    })))
}

async fn items(
    Path(user_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) || user_id != USER_ID {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if query.get("IncludeItemTypes").map(String::as_str) != Some("Audio") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let items = match query.get("ParentId").map(String::as_str) {
        Some("lib-music") => json!([
            { "Id": "t1", "Name": "First", "AlbumArtist": "Band", "RunTimeTicks": 1_800_000_000u64 },
            { "Id": "t2", "Name": "Second", "AlbumArtist": "Band" },
            { "Id": "t3", "Name": "Third" }
        ]),
        _ => json!([]),
    };
    Ok(Json(json!({ "Items": items })))
}

async fn broken_views() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_server() -> SocketAddr {
    serve(
        Router::new()
            .route("/Users/AuthenticateByName", post(authenticate))
            .route("/Users/:user_id/Views", get(views))
            .route("/Users/:user_id/Items", get(items)),
    )
    .await
}

/// Logs in fine but cannot list views
async fn spawn_broken_server() -> SocketAddr {
    serve(
        Router::new()
            .route("/Users/AuthenticateByName", post(authenticate))
            .route("/Users/:user_id/Views", get(broken_views)),
    )
    .await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_info() -> ClientInfo {
    ClientInfo::new("jellyfin-rs", "test", "test-device")
}

fn open_session(store: MemoryCredentialStore) -> Session {
    Session::open(Box::new(store), client_info(), Duration::from_secs(5)).unwrap()
}

fn spawn_player() -> PlayerHandle {
    let (events_tx, events_rx) = event_channel();
    let engine = SilentEngine::new(events_tx);
    let (handle, _task) =
        PlaybackService::spawn(Box::new(engine), events_rx, Box::new(LogNotifier), RepeatMode::All);
    handle
}

async fn wait_for(handle: &PlayerHandle, pred: impl FnMut(&PlayerSnapshot) -> bool) -> PlayerSnapshot {
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for player")
        .expect("player gone")
        .clone()
}

#[tokio::test]
async fn login_list_and_play() {
    let addr = spawn_server().await;
    let host = format!("http://{}", addr);

    let mut session = open_session(MemoryCredentialStore::new());
    assert!(!session.has_valid_credentials());

    let client = session.login(&host, "u", "p").await.unwrap();
    assert!(session.has_valid_credentials());
    let saved = session.credentials().unwrap();
    assert_eq!(saved.token.as_ref().unwrap().access_token, TOKEN);
    assert_eq!(saved.token.as_ref().unwrap().user_id, USER_ID);

    let libraries = client.get_libraries().await.unwrap();
    assert_eq!(libraries.len(), 1);
    assert_eq!(libraries[0].id, "lib-music");

    let tracks = client.get_items(&libraries[0].id).await.unwrap();
    assert_eq!(tracks.len(), 3);

    let player = spawn_player();
    player.start(tracks.clone(), 0, false, Arc::new(client));
    let snapshot = wait_for(&player, |s| s.is_playing).await;
    assert_eq!(snapshot.current.as_ref(), Some(&tracks[0]));
    assert_eq!(player.current_song(), Some(tracks[0].clone()));

    session.logout().unwrap();
    assert!(!session.has_valid_credentials());
}

#[tokio::test]
async fn wrong_password_is_an_auth_error() {
    let addr = spawn_server().await;
    let mut session = open_session(MemoryCredentialStore::new());

    let result = session.login(&format!("http://{}", addr), "u", "nope").await;
    assert!(matches!(result, Err(SessionError::Client(ClientError::Auth(_)))));
    // The triple is kept so the form can be corrected
    assert!(session.has_valid_credentials());
    assert!(session.credentials().unwrap().token.is_none());
}

#[tokio::test]
async fn saved_password_logs_in_without_the_form() {
    let addr = spawn_server().await;
    let store = MemoryCredentialStore::new();
    store
        .save(&Credentials::new(format!("http://{}", addr), "u", "p"))
        .unwrap();

    let mut session = open_session(store);
    let client = session.ensure_authenticated().await.unwrap();
    assert_eq!(client.get_libraries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn controller_walks_the_screens() {
    let addr = spawn_server().await;

    let session = Arc::new(Mutex::new(open_session(MemoryCredentialStore::new())));
    let player = spawn_player();
    let model = Arc::new(AppModel::new(Screen::Login));
    let controller = AppController::new(model.clone(), session.clone(), player.clone());
    let _listener = controller.start_player_event_listener();
    player.bind();

    // Submit is ignored until every field is filled
    model
        .set_login_form(LoginForm {
            hostname: format!("http://{}", addr),
            username: "u".to_string(),
            ..LoginForm::default()
        })
        .await;
    controller.submit_login().await;
    assert_eq!(model.current_screen().await, Screen::Login);

    model
        .set_login_form(LoginForm {
            hostname: format!("http://{}", addr),
            username: "u".to_string(),
            password: "p".to_string(),
            ..LoginForm::default()
        })
        .await;
    controller.submit_login().await;

    let ui = model.get_ui_state().await;
    assert_eq!(ui.screen, Screen::Libraries);
    assert_eq!(ui.libraries.len(), 1);
    assert!(ui.error_message.is_none());

    controller.open_library(ui.libraries[0].clone()).await;
    assert_eq!(model.current_screen().await, Screen::Tracks);

    controller.play_selected_track().await;
    assert_eq!(model.current_screen().await, Screen::NowPlaying);
    let snapshot = wait_for(&player, |s| s.is_playing).await;
    assert_eq!(snapshot.current.unwrap().id, "t1");

    controller.stop_playback().await;
    assert_eq!(model.current_screen().await, Screen::Libraries);
    wait_for(&player, |s| s.queue_len == 0).await;

    controller.logout().await;
    assert_eq!(model.current_screen().await, Screen::Login);
    assert!(!session.lock().await.has_valid_credentials());
}

fn saved_store(host: &str, token: Option<&str>) -> MemoryCredentialStore {
    let store = MemoryCredentialStore::new();
    let mut creds = Credentials::new(host, "u", "p");
    creds.token = token.map(|t| AccessToken::new(t.to_string(), USER_ID.to_string()));
    store.save(&creds).unwrap();
    store
}

fn loading_controller(store: MemoryCredentialStore) -> (Arc<AppModel>, Arc<Mutex<Session>>, AppController) {
    let session = Arc::new(Mutex::new(open_session(store)));
    let player = spawn_player();
    let model = Arc::new(AppModel::new(Screen::Loading));
    let controller = AppController::new(model.clone(), session.clone(), player.clone());
    player.bind();
    (model, session, controller)
}

#[tokio::test]
async fn loading_resolves_to_libraries() {
    let addr = spawn_server().await;
    let (model, _session, controller) = loading_controller(saved_store(&format!("http://{}", addr), None));

    controller.finish_loading().await;

    let ui = model.get_ui_state().await;
    assert_eq!(ui.screen, Screen::Libraries);
    assert_eq!(ui.libraries.len(), 1);
    assert!(!ui.is_loading);
}

#[tokio::test]
async fn loading_failure_falls_back_to_prefilled_login() {
    let addr = spawn_broken_server().await;
    let host = format!("http://{}", addr);
    let (model, _session, controller) = loading_controller(saved_store(&host, None));

    controller.finish_loading().await;

    let ui = model.get_ui_state().await;
    assert_eq!(ui.screen, Screen::Login);
    assert_eq!(ui.login.hostname, host);
    assert_eq!(ui.login.username, "u");
    assert!(ui.login.password.is_empty());
    assert!(ui.error_message.is_some());
}

#[tokio::test]
async fn expired_token_relogs_on_next_action() {
    let addr = spawn_server().await;
    let (model, session, controller) =
        loading_controller(saved_store(&format!("http://{}", addr), Some("stale")));

    // Server answers 401 for the cached token
    assert!(!controller.load_libraries().await);
    assert!(model.has_error().await);
    {
        let session = session.lock().await;
        assert!(session.credentials().unwrap().token.is_none());
        assert!(session.has_valid_credentials());
    }

    model.clear_error().await;
    assert!(controller.load_libraries().await);
    assert_eq!(model.get_ui_state().await.libraries.len(), 1);
    let session = session.lock().await;
    assert_eq!(session.credentials().unwrap().token.as_ref().unwrap().access_token, TOKEN);
}

#[tokio::test]
async fn unreachable_server_shows_an_error() {
    let session = Arc::new(Mutex::new(open_session(MemoryCredentialStore::new())));
    let player = spawn_player();
    let model = Arc::new(AppModel::new(Screen::Login));
    let controller = AppController::new(model.clone(), session, player);

    model
        .set_login_form(LoginForm {
            hostname: "http://127.0.0.1:9".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            ..LoginForm::default()
        })
        .await;
    controller.submit_login().await;

    let ui = model.get_ui_state().await;
    assert_eq!(ui.screen, Screen::Login);
    assert!(!ui.is_loading);
    assert!(ui.error_message.is_some());
}
