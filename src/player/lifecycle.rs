//! Foreground promotion of the playback service.
//!
//! While a UI is attached the service runs silently. When the UI detaches during
//! playback, a notification is raised so the user can find their way back; it is
//! dismissed as soon as a UI attaches again.

use crate::model::Item;

const NOTIFICATION_TITLE: &str = "Jellyfin";
const NOTIFICATION_BODY: &str = "Tap to open media controls";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifecycleState {
    /// UI attached or nothing playing; no notification
    #[default]
    Bound,
    /// UI detached while playing; notification shown
    Foreground,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForegroundNotice {
    pub title: String,
    pub body: String,
}

impl ForegroundNotice {
    pub fn for_track(track: Option<&Item>) -> Self {
        let body = match track {
            Some(item) => format!("{} - {}", item.display_name(), NOTIFICATION_BODY),
            None => NOTIFICATION_BODY.to_string(),
        };
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body,
        }
    }
}

pub trait ForegroundNotifier: Send {
    fn show(&mut self, notice: &ForegroundNotice);
    fn dismiss(&mut self);
}

/// Writes the notification to the log only
#[derive(Default)]
pub struct LogNotifier;

impl ForegroundNotifier for LogNotifier {
    fn show(&mut self, notice: &ForegroundNotice) {
        tracing::info!(title = %notice.title, body = %notice.body, "Playing in background");
    }

    fn dismiss(&mut self) {
        tracing::info!("Back in foreground");
    }
}

#[cfg(feature = "notify")]
pub use desktop::DesktopNotifier;

#[cfg(feature = "notify")]
mod desktop {
    use notify_rust::Notification;

    use super::{ForegroundNotice, ForegroundNotifier};

    /// Desktop notification through the platform notification daemon
    #[derive(Default)]
    pub struct DesktopNotifier {
        #[cfg(all(unix, not(target_os = "macos")))]
        handle: Option<notify_rust::NotificationHandle>,
    }

    impl ForegroundNotifier for DesktopNotifier {
        fn show(&mut self, notice: &ForegroundNotice) {
            let mut notification = Notification::new();
            notification.summary(&notice.title).body(&notice.body).appname("jellyfin-rs");

            #[cfg(all(unix, not(target_os = "macos")))]
            match notification.show() {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => tracing::warn!(error = %e, "Could not show notification"),
            }

            #[cfg(not(all(unix, not(target_os = "macos"))))]
            if let Err(e) = notification.show() {
                tracing::warn!(error = %e, "Could not show notification");
            }
        }

        fn dismiss(&mut self) {
            #[cfg(all(unix, not(target_os = "macos")))]
            if let Some(handle) = self.handle.take() {
                handle.close();
            }
        }
    }
}

/// Best notifier available in this build
pub fn default_notifier() -> Box<dyn ForegroundNotifier> {
    #[cfg(feature = "notify")]
    {
        Box::new(DesktopNotifier::default())
    }
    #[cfg(not(feature = "notify"))]
    {
        Box::new(LogNotifier)
    }
}

pub struct ForegroundLifecycle {
    state: LifecycleState,
    ui_attached: bool,
    notifier: Box<dyn ForegroundNotifier>,
}

impl ForegroundLifecycle {
    pub fn new(notifier: Box<dyn ForegroundNotifier>) -> Self {
        Self {
            state: LifecycleState::Bound,
            ui_attached: false,
            notifier,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn ui_attached(&self) -> bool {
        self.ui_attached
    }

    /// A UI attached (first bind or rebind)
    pub fn on_bind(&mut self) {
        self.ui_attached = true;
        if self.state == LifecycleState::Foreground {
            self.notifier.dismiss();
            self.state = LifecycleState::Bound;
            tracing::debug!("Lifecycle: foreground -> bound");
        }
    }

    /// The UI detached. Promote to foreground only when something is playing.
    pub fn on_unbind(&mut self, is_playing: bool, now_playing: Option<&Item>) {
        self.ui_attached = false;
        if is_playing && self.state == LifecycleState::Bound {
            self.notifier.show(&ForegroundNotice::for_track(now_playing));
            self.state = LifecycleState::Foreground;
            tracing::debug!("Lifecycle: bound -> foreground");
        }
    }

    pub fn teardown(&mut self) {
        if self.state == LifecycleState::Foreground {
            self.notifier.dismiss();
        }
        self.state = LifecycleState::Bound;
        self.ui_attached = false;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Notifier that records what it was asked to do
    #[derive(Clone, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) calls: Arc<Mutex<Vec<String>>>,
    }

    impl ForegroundNotifier for RecordingNotifier {
        fn show(&mut self, notice: &ForegroundNotice) {
            self.calls.lock().unwrap().push(format!("show:{}", notice.body));
        }

        fn dismiss(&mut self) {
            self.calls.lock().unwrap().push("dismiss".to_string());
        }
    }

    fn lifecycle() -> (ForegroundLifecycle, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        (ForegroundLifecycle::new(Box::new(notifier.clone())), notifier)
    }

    #[test]
    fn unbind_while_playing_promotes() {
        let (mut lc, notifier) = lifecycle();
        lc.on_bind();
        lc.on_unbind(true, None);

        assert_eq!(lc.state(), LifecycleState::Foreground);
        assert!(!lc.ui_attached());
        assert_eq!(*notifier.calls.lock().unwrap(), vec!["show:Tap to open media controls"]);
    }

    #[test]
    fn unbind_while_idle_stays_bound() {
        let (mut lc, notifier) = lifecycle();
        lc.on_bind();
        lc.on_unbind(false, None);

        assert_eq!(lc.state(), LifecycleState::Bound);
        assert!(notifier.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn rebind_dismisses_notification() {
        let (mut lc, notifier) = lifecycle();
        lc.on_unbind(true, None);
        lc.on_bind();

        assert_eq!(lc.state(), LifecycleState::Bound);
        assert!(lc.ui_attached());
        assert_eq!(notifier.calls.lock().unwrap().last().unwrap(), "dismiss");
    }

    #[test]
    fn repeated_unbind_shows_once() {
        let (mut lc, notifier) = lifecycle();
        lc.on_unbind(true, None);
        lc.on_unbind(true, None);
        assert_eq!(notifier.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn teardown_from_foreground_dismisses() {
        let (mut lc, notifier) = lifecycle();
        lc.on_unbind(true, None);
        lc.teardown();
        assert_eq!(lc.state(), LifecycleState::Bound);
        assert_eq!(notifier.calls.lock().unwrap().last().unwrap(), "dismiss");
    }

    #[test]
    fn notice_names_the_track() {
        let item: Item = serde_json::from_str(r#"{"Id": "1", "Name": "Song"}"#).unwrap();
        let notice = ForegroundNotice::for_track(Some(&item));
        assert_eq!(notice.body, "Song - Tap to open media controls");
    }
}
