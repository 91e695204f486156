//! Model module - Application state and data types
//!
//! - `types`: screens, login form and UI state
//! - `playback`: now-playing metadata and progress timing
//! - `content`: server item types
//! - `queue`: the ordered play queue
//! - `jellyfin_client`: HTTP client for the Jellyfin API
//! - `app_model`: main application model with state management methods

mod types;
mod playback;
mod content;
mod queue;
mod jellyfin_client;
mod app_model;

pub use types::{initial_screen, LibraryEntry, LoginField, LoginForm, Screen, UiState};

pub use playback::{PlaybackInfo, PlaybackTiming, TrackMetadata, NO_SONG, UNKNOWN_ARTIST};

pub use content::{AuthenticationResult, CollectionType, Item, ItemsResult, UserDto};

pub use queue::PlayQueue;

pub use jellyfin_client::{normalize_base_url, ClientInfo, JellyfinClient};

pub use app_model::AppModel;
