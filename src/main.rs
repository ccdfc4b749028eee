// ============================================================================
// MarketHeat - Heatmap de marché en terminal
// ============================================================================
// Programme TUI : heatmap des titres par secteur, cartes de résumé et
// historique du ticker sélectionné. Données Polygon.io avec repli sur des
// données de démonstration.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements, résultats et rendering
// 3. Async dans sync : le runtime tokio tourne à côté de la boucle de l'UI
// 4. Ownership : la boucle possède App, le worker ne renvoie que des messages
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use tracing::{debug, error, info, warn};

use marketheat::api::{MarketGateway, PolygonClient};
use marketheat::app::App;
use marketheat::config::Config;
use marketheat::ui::events::Event;
use marketheat::ui::{render, EventHandler};
use marketheat::worker::{Command, RefreshTimer, Worker, WorkerEvent};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier avec rotation quotidienne
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/marketheat/logs
/// - macOS : ~/Library/Application Support/marketheat/logs
/// - Windows : C:\Users\<user>\AppData\Local\marketheat\logs
/// - Sinon : ./logs
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("marketheat").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/marketheat/logs/marketheat.log.*
/// RUST_LOG=marketheat=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "marketheat.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour marketheat, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketheat=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("MarketHeat starting up");

    let config = Config::from_env().context("Configuration invalide")?;
    if !config.has_api_key() {
        warn!("POLYGON_API_KEY not set, running on demo data");
    }
    info!(
        base_url = %config.base_url,
        refresh = ?config.refresh_interval,
        max_tickers = config.max_tickers,
        policy = ?config.percent_change_policy,
        "Configuration loaded"
    );

    let client = PolygonClient::from_config(&config)?;
    let gateway = Arc::new(MarketGateway::from_config(Arc::new(client), &config));

    // CONCEPT RUST : Runtime multi-thread + Handle
    // - Les fetches tournent sur les threads du runtime
    // - La boucle de l'UI reste synchrone sur le thread principal
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let (worker, worker_events) = Worker::spawn(runtime.handle(), gateway);
    let (timer, ticks) = RefreshTimer::start(runtime.handle(), config.refresh_interval);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new();
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &worker, worker_events, ticks);

    // Plus de tick après la sortie de la boucle
    drop(timer);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    drop(worker);
    runtime.shutdown_background();
    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker et ticks du timer (non bloquant)
//   1. Render
//   2. Input (bloquant au plus 250ms)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    worker: &Worker,
    mut worker_events: UnboundedReceiver<WorkerEvent>,
    mut ticks: UnboundedReceiver<()>,
) -> Result<()> {
    let mut worker_connected = true;

    while app.is_running() {
        // 0a. Résultats du worker
        worker_connected = drain_worker_events(app, &mut worker_events, worker_connected);

        // 0b. Ticks du timer : plusieurs ticks en retard = un seul refresh
        let mut due = false;
        while ticks.try_recv().is_ok() {
            due = true;
        }
        if due {
            debug!("Periodic refresh");
            dispatch(worker, Command::RefreshMarket(app.begin_refresh()));
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, worker),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker ; les résultats périmés sont ignorés par App
/// Applique tous les résultats en attente
///
/// Retourne false dès que le worker a disparu ; la déconnexion n'est
/// signalée qu'une fois, les appels suivants ne lisent plus le canal.
fn drain_worker_events(
    app: &mut App,
    worker_events: &mut UnboundedReceiver<WorkerEvent>,
    connected: bool,
) -> bool {
    if !connected {
        return false;
    }

    loop {
        match worker_events.try_recv() {
            Ok(event) => apply_worker_event(app, event),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => {
                error!("Worker disconnected, no more market updates");
                return false;
            }
        }
    }
}

fn apply_worker_event(app: &mut App, event: WorkerEvent) {
    match event {
        WorkerEvent::MarketLoaded {
            generation,
            snapshot,
            sectors,
        } => {
            app.apply_snapshot(generation, snapshot, sectors);
        }
        WorkerEvent::MarketFailed { generation, reason } => {
            app.fail_refresh(generation, &reason);
        }
        WorkerEvent::HistoryLoaded { generation, series } => {
            app.apply_history(generation, series);
        }
        WorkerEvent::HistoryFailed { generation, reason } => {
            app.fail_history(generation, &reason);
        }
    }
}

fn dispatch(worker: &Worker, command: Command) {
    if let Err(e) = worker.send(command) {
        error!(error = ?e, "Failed to send command to worker");
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement clavier
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Le mode recherche capture toutes les touches en premier
/// - Puis les touches globales, puis celles propres à chaque écran
fn handle_event(app: &mut App, event: Event, worker: &Worker) {
    use marketheat::ui::events::{
        get_char_from_event, is_backspace_event, is_cursor_left_event, is_cursor_right_event,
        is_down_event, is_enter_event, is_escape_event, is_next_sector_event,
        is_next_timeframe_event, is_pan_left_event, is_pan_right_event, is_previous_sector_event,
        is_previous_timeframe_event, is_quit_event, is_refresh_event, is_reset_zoom_event,
        is_search_char_event, is_search_event, is_tab_event, is_up_event, is_zoom_in_event,
        is_zoom_out_event,
    };

    if matches!(event, Event::Tick) {
        return;
    }

    // Toute touche autre que 'q' annule la confirmation de quit
    if !is_quit_event(&event) || app.is_in_search_mode() {
        app.cancel_quit();
    }

    // ========================================
    // Mode recherche
    // ========================================
    if app.is_in_search_mode() {
        if is_escape_event(&event) {
            debug!("User cancelled search");
            app.cancel_search();
        } else if is_enter_event(&event) {
            app.submit_search();
            info!(query = %app.search_query, "User submitted search");
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if is_search_char_event(&event) {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        return;
    }

    match event {
        // Two-step quit
        _ if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        _ if is_tab_event(&event) => app.toggle_screen(),

        _ if is_refresh_event(&event) => {
            info!("User requested refresh");
            dispatch(worker, Command::RefreshMarket(app.begin_refresh()));
        }

        _ if is_next_timeframe_event(&event) => {
            if let Some(request) = app.next_timeframe() {
                info!(timeframe = app.timeframe.code(), "User changed timeframe");
                dispatch(worker, Command::LoadHistory(request));
            }
        }
        _ if is_previous_timeframe_event(&event) => {
            if let Some(request) = app.previous_timeframe() {
                info!(timeframe = app.timeframe.code(), "User changed timeframe");
                dispatch(worker, Command::LoadHistory(request));
            }
        }

        // ========================================
        // Heatmap
        // ========================================
        _ if is_up_event(&event) && app.is_on_heatmap() => app.navigate_up(),
        _ if is_down_event(&event) && app.is_on_heatmap() => app.navigate_down(),

        _ if is_enter_event(&event) && app.is_on_heatmap() => {
            if let Some(request) = app.select_current() {
                info!(ticker = %request.ticker, "User opened history");
                dispatch(worker, Command::LoadHistory(request));
                app.show_historical();
            }
        }

        _ if is_search_event(&event) && app.is_on_heatmap() => app.start_search(),

        _ if is_next_sector_event(&event) && app.is_on_heatmap() => {
            app.next_sector();
            debug!(sector = %app.sector_filter.label(), "User changed sector filter");
        }
        _ if is_previous_sector_event(&event) && app.is_on_heatmap() => {
            app.previous_sector();
            debug!(sector = %app.sector_filter.label(), "User changed sector filter");
        }

        // Zoom sur un secteur ; ← → passent au secteur voisin
        _ if is_zoom_in_event(&event) && app.is_on_heatmap() => app.focus_sector(),
        _ if (is_zoom_out_event(&event) || is_reset_zoom_event(&event)) && app.is_on_heatmap() => {
            app.unfocus_sector()
        }
        _ if is_pan_left_event(&event) && app.is_on_heatmap() => app.previous_focused_sector(),
        _ if is_pan_right_event(&event) && app.is_on_heatmap() => app.next_focused_sector(),

        // ESC : sort du zoom, puis efface la recherche
        _ if is_escape_event(&event) && app.is_on_heatmap() => {
            if app.is_heatmap_zoomed() {
                app.unfocus_sector();
            } else {
                app.clear_search();
            }
        }

        // ========================================
        // Historique
        // ========================================
        _ if is_escape_event(&event) && app.is_on_historical() => app.show_heatmap(),
        _ if is_zoom_in_event(&event) && app.is_on_historical() => app.zoom_in(),
        _ if is_zoom_out_event(&event) && app.is_on_historical() => app.zoom_out(),
        _ if is_reset_zoom_event(&event) && app.is_on_historical() => app.reset_zoom(),
        _ if is_pan_left_event(&event) && app.is_on_historical() => app.pan_left(),
        _ if is_pan_right_event(&event) && app.is_on_historical() => app.pan_right(),
        _ if is_cursor_left_event(&event) && app.is_on_historical() => app.cursor_left(),
        _ if is_cursor_right_event(&event) && app.is_on_historical() => app.cursor_right(),

        _ => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Impossible d'activer le raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Impossible de créer le terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
