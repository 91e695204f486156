//! Terminal client for a Jellyfin media server.
//!
//! Logs in, lists music libraries and their tracks, and plays them through a background
//! playback service that keeps going while the terminal is out of focus.

pub mod audio;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod player;
pub mod view;
