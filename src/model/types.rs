//! Core type definitions for the application

use std::time::Instant;

use super::content::Item;

/// Screens of the navigation graph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Login,
    Libraries,
    Tracks,
    NowPlaying,
}

/// Pick the first screen shown at start-up.
///
/// Saved credentials lead to the library list, otherwise to login. Libraries cannot be
/// listed before the playback service is bound, so that case shows a loading screen
/// first. A bound service with a current song goes straight to now-playing.
pub fn initial_screen(credentials_present: bool, service_bound: bool, current_song_present: bool) -> Screen {
    let start = if credentials_present {
        Screen::Libraries
    } else {
        Screen::Login
    };

    if !service_bound && start == Screen::Libraries {
        Screen::Loading
    } else if service_bound && current_song_present {
        Screen::NowPlaying
    } else {
        start
    }
}

/// Which login field has focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Hostname,
    Username,
    Password,
}

impl LoginField {
    pub fn next(self) -> Self {
        match self {
            LoginField::Hostname => LoginField::Username,
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Hostname,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginField::Hostname => LoginField::Password,
            LoginField::Username => LoginField::Hostname,
            LoginField::Password => LoginField::Username,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub focused: LoginField,
}

impl LoginForm {
    pub fn prefilled(hostname: &str, username: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            username: username.to_string(),
            ..Self::default()
        }
    }

    /// Submit is only offered once every field has something in it
    pub fn can_submit(&self) -> bool {
        !self.hostname.trim().is_empty() && !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focused {
            LoginField::Hostname => &mut self.hostname,
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.field_mut().pop();
    }

    pub fn masked_password(&self) -> String {
        "•".repeat(self.password.chars().count())
    }
}

/// A row of the library list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LibraryEntry {
    Library(Item),
    Logout,
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub screen: Screen,
    pub navigation_stack: Vec<Screen>,
    pub login: LoginForm,
    pub libraries: Vec<Item>,
    /// `libraries.len()` selects the trailing Logout row
    pub library_selected: usize,
    pub current_library: Option<Item>,
    pub tracks: Vec<Item>,
    pub track_selected: usize,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl UiState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            navigation_stack: Vec::new(),
            login: LoginForm::default(),
            libraries: Vec::new(),
            library_selected: 0,
            current_library: None,
            tracks: Vec::new(),
            track_selected: 0,
            is_loading: screen == Screen::Loading,
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
        }
    }

    pub fn selected_library_entry(&self) -> LibraryEntry {
        match self.libraries.get(self.library_selected) {
            Some(library) => LibraryEntry::Library(library.clone()),
            None => LibraryEntry::Logout,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(Screen::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_screen_table() {
        assert_eq!(initial_screen(false, false, false), Screen::Login);
        assert_eq!(initial_screen(false, true, false), Screen::Login);
        assert_eq!(initial_screen(true, false, false), Screen::Loading);
        assert_eq!(initial_screen(true, false, true), Screen::Loading);
        assert_eq!(initial_screen(true, true, false), Screen::Libraries);
        assert_eq!(initial_screen(true, true, true), Screen::NowPlaying);
        assert_eq!(initial_screen(false, true, true), Screen::NowPlaying);
    }

    #[test]
    fn login_needs_every_field() {
        let mut form = LoginForm::default();
        assert!(!form.can_submit());

        form.hostname = "h".to_string();
        form.username = "u".to_string();
        assert!(!form.can_submit());

        form.password = "   ".to_string();
        assert!(!form.can_submit());

        form.password = "p".to_string();
        assert!(form.can_submit());
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let mut form = LoginForm::default();
        form.push_char('h');
        form.focused = form.focused.next();
        form.push_char('u');
        form.focused = form.focused.next();
        form.push_char('p');
        form.push_char('w');
        form.backspace();

        assert_eq!(form.hostname, "h");
        assert_eq!(form.username, "u");
        assert_eq!(form.password, "p");
        assert_eq!(form.masked_password(), "•");
        assert_eq!(form.focused.next(), LoginField::Hostname);
        assert_eq!(LoginField::Hostname.prev(), LoginField::Password);
    }

    #[test]
    fn logout_row_follows_libraries() {
        let mut state = UiState::new(Screen::Libraries);
        assert_eq!(state.selected_library_entry(), LibraryEntry::Logout);

        state.libraries = vec![serde_json::from_str(r#"{"Id": "1", "Name": "Music"}"#).unwrap()];
        assert!(matches!(state.selected_library_entry(), LibraryEntry::Library(item) if item.id == "1"));
        state.library_selected = 1;
        assert_eq!(state.selected_library_entry(), LibraryEntry::Logout);
    }
}
