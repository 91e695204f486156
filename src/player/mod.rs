//! Background playback service.
//!
//! One task owns the engine and the play queue. Everything else talks to it through a
//! [`PlayerHandle`]: commands go in over an mpsc channel, state comes back as
//! [`PlayerSnapshot`]s on a watch channel.

mod lifecycle;
mod service;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::error::ClientError;
use crate::model::{Item, JellyfinClient};

pub use lifecycle::{
    default_notifier, ForegroundLifecycle, ForegroundNotice, ForegroundNotifier, LifecycleState, LogNotifier,
};
#[cfg(feature = "notify")]
pub use lifecycle::DesktopNotifier;
pub use service::PlaybackService;

/// Maps a track to the URL the engine should stream
pub trait StreamResolver: Send + Sync {
    fn stream_url(&self, item: &Item) -> Result<String, ClientError>;
}

impl StreamResolver for JellyfinClient {
    fn stream_url(&self, item: &Item) -> Result<String, ClientError> {
        self.audio_url(&item.id)
    }
}

pub enum PlayerCommand {
    Start {
        tracks: Vec<Item>,
        start_index: usize,
        shuffle: bool,
        resolver: Arc<dyn StreamResolver>,
    },
    Pause,
    Resume,
    Next,
    Previous,
    Stop,
    Bind,
    Unbind,
    Shutdown,
}

/// What observers know about playback
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub current: Option<Item>,
    pub index: usize,
    pub queue_len: usize,
    pub is_playing: bool,
    pub ui_bound: bool,
    pub lifecycle: LifecycleState,
    pub last_error: Option<String>,
}

/// Cloneable front door to the playback service
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    snapshot: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    fn send(&self, command: PlayerCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Playback service is not running");
        }
    }

    pub fn start(&self, tracks: Vec<Item>, start_index: usize, shuffle: bool, resolver: Arc<dyn StreamResolver>) {
        self.send(PlayerCommand::Start {
            tracks,
            start_index,
            shuffle,
            resolver,
        });
    }

    pub fn pause(&self) {
        self.send(PlayerCommand::Pause);
    }

    pub fn resume(&self) {
        self.send(PlayerCommand::Resume);
    }

    pub fn next(&self) {
        self.send(PlayerCommand::Next);
    }

    pub fn previous(&self) {
        self.send(PlayerCommand::Previous);
    }

    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    pub fn bind(&self) {
        self.send(PlayerCommand::Bind);
    }

    pub fn unbind(&self) {
        self.send(PlayerCommand::Unbind);
    }

    pub fn shutdown(&self) {
        self.send(PlayerCommand::Shutdown);
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn current_song(&self) -> Option<Item> {
        self.snapshot.borrow().current.clone()
    }
}
