use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;

use jellyfin_rs::audio::{self, PlaybackEngine, SilentEngine};
use jellyfin_rs::auth::{FileCredentialStore, Session};
use jellyfin_rs::config::AppConfig;
use jellyfin_rs::controller::AppController;
use jellyfin_rs::logging;
use jellyfin_rs::model::{initial_screen, AppModel, ClientInfo, LoginForm, Screen};
use jellyfin_rs::player::{default_notifier, PlaybackService};
use jellyfin_rs::view::AppView;

#[derive(Parser, Debug)]
#[command(name = "jellyfin-rs")]
#[command(about = "Terminal music player for Jellyfin")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address to prefill on the login screen
    #[arg(short, long)]
    server: Option<String>,

    /// Log level for jellyfin-rs modules (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = logging::init_logging(args.log_level.as_deref()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== jellyfin-rs starting ===");

    let config = AppConfig::load(args.config.as_deref())?;
    let client_info = ClientInfo::new(&config.client_name, &config.device_name, &config.device_id);

    let store = FileCredentialStore::new(&config.credentials_path);
    let session = Session::open(Box::new(store), client_info, config.request_timeout())?;
    let credentials_present = session.has_valid_credentials();
    tracing::info!(credentials_present, "Session opened");

    // Playback service
    let (events_tx, events_rx) = audio::event_channel();
    let engine = build_engine(events_tx, config.request_timeout());
    let (player, service_task) = PlaybackService::spawn(engine, events_rx, default_notifier(), config.repeat_mode);

    // The service was just spawned: nothing is bound and nothing is queued yet
    let start = initial_screen(credentials_present, false, false);
    tracing::info!(screen = ?start, "Initial screen");

    let model = Arc::new(AppModel::new(start));
    let controller = AppController::new(model.clone(), Arc::new(Mutex::new(session)), player.clone())
        .with_library_load_delay(config.library_load_delay());

    controller.prefill_login().await;
    if let Some(server) = args.server.as_deref() {
        let form = model.get_login_form().await;
        model
            .set_login_form(LoginForm {
                hostname: server.to_string(),
                ..form
            })
            .await;
    }

    let _listener = controller.start_player_event_listener();
    player.bind();

    if start == Screen::Loading {
        let controller_for_loading = controller.clone();
        tokio::spawn(async move {
            controller_for_loading.finish_loading().await;
        });
    }

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    player.shutdown();
    if tokio::time::timeout(Duration::from_secs(2), service_task).await.is_err() {
        tracing::warn!("Playback service did not stop in time");
    }

    tracing::info!("jellyfin-rs shutting down");
    Ok(())
}

fn build_engine(events: audio::EngineEventSender, timeout: Duration) -> Box<dyn PlaybackEngine> {
    #[cfg(feature = "audio")]
    {
        match audio::RodioEngine::new(events.clone(), timeout) {
            Ok(engine) => return Box::new(engine),
            Err(e) => tracing::warn!(error = %e, "No audio output, falling back to silent engine"),
        }
    }
    #[cfg(not(feature = "audio"))]
    {
        let _ = timeout;
        tracing::info!("Built without audio support, using silent engine");
    }

    Box::new(SilentEngine::new(events))
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<AppModel>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Auto-clear old errors (after 5 seconds)
        model.auto_clear_old_errors().await;

        let playback = model.get_playback_info().await;
        let ui_state = model.get_ui_state().await;

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state);
        })?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    // Errors are reported through the model
                    let _ = controller.handle_key_event(key).await;
                }
                Event::FocusGained => controller.handle_focus_change(true),
                Event::FocusLost => controller.handle_focus_change(false),
                _ => {}
            }
        }

        if model.should_quit().await {
            break;
        }
    }

    Ok(())
}
