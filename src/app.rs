// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global du dashboard (le "contrôleur de vue")
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Vues dérivées : &self -> Vec<&Stock>, jamais de tri en place
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les résultats réseau arrivent avec un numéro de génération : seul le
//   plus récent est appliqué
// ============================================================================

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{
    DataSource, HistoricalPoint, HistoricalSeries, MarketSnapshot, Sector, SectorFilter, Stock,
    Timeframe,
};
use crate::views::{filter_stocks, group_by_sector, summarize, MarketSummary};

/// Message affiché quand le rafraîchissement échoue de façon inattendue
pub const STOCK_ERROR_MESSAGE: &str = "Failed to fetch stock data. Please try again later.";

/// Message affiché quand l'historique échoue de façon inattendue
pub const HISTORY_ERROR_MESSAGE: &str = "Failed to fetch historical data. Please try again later.";

/// Bornes du zoom du graphique
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 5.0;
const ZOOM_STEP: f64 = 1.25;

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : heatmap + cartes de résumé
    Heatmap,

    /// Vue graphique : historique du ticker sélectionné
    Historical,

    /// Mode saisie : la recherche est en cours d'édition
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Enter valide, ESC annule
    Search,
}

/// État d'un cycle de fetch
///
/// Idle -> Loading -> { Idle, Error } ; Error n'est pas terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Loading,
    Error(String),
}

/// Demande de rafraîchissement du marché (titres + secteurs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub generation: u64,
}

/// Demande d'historique pour un couple (ticker, timeframe)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub ticker: String,
    pub timeframe: Timeframe,
    pub generation: u64,
}

/// Fenêtre visible du graphique (indices dans la série)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    pub start: usize,
    pub end: usize,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Tableau canonique des titres (remplacé en entier à chaque refresh)
    pub stocks: Vec<Stock>,

    /// Liste de référence des secteurs
    pub sectors: Vec<Sector>,

    /// Historique du ticker sélectionné
    pub history: Option<HistoricalSeries>,

    /// Ticker sélectionné (None : pas encore de drill-down)
    pub selected_ticker: Option<String>,

    /// Timeframe du graphique
    pub timeframe: Timeframe,

    /// Texte de recherche (appliqué)
    pub search_query: String,

    /// Buffer de saisie pendant le mode Search
    pub input_buffer: String,

    /// Filtre secteur
    pub sector_filter: SectorFilter,

    /// Index du curseur dans l'ordre des tuiles de la heatmap
    pub selected_index: usize,

    /// Secteur agrandi sur la heatmap (None : tous les secteurs)
    pub heatmap_focus: Option<String>,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Indique si des données sont en cours de chargement
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,

    /// Dernière erreur visible (effacée au prochain succès)
    pub error: Option<String>,

    /// Provenance du dernier snapshot appliqué
    pub data_source: Option<DataSource>,

    /// Heure du dernier snapshot appliqué
    pub last_refresh: Option<DateTime<Utc>>,

    /// Facteur de zoom du graphique (1.0 = série entière)
    pub chart_zoom: f64,

    /// Décalage vers le passé, en barres, depuis la fin de la série
    pub chart_pan: usize,

    /// Barre inspectée (None : dernière barre visible)
    pub chart_cursor: Option<usize>,

    /// Two-step quit : première pression de 'q' -> true
    pub confirm_quit: bool,

    // Générations : le dernier numéro émis pour chaque type de requête
    market_generation: u64,
    history_generation: u64,
    // Requêtes en vol, pour savoir quand couper l'indicateur de chargement
    market_pending: bool,
    history_pending: bool,
}

impl App {
    /// Crée une nouvelle instance vide, sur la heatmap, timeframe 1 jour
    pub fn new() -> Self {
        Self {
            running: true,
            stocks: Vec::new(),
            sectors: Vec::new(),
            history: None,
            selected_ticker: None,
            timeframe: Timeframe::OneDay,
            search_query: String::new(),
            input_buffer: String::new(),
            sector_filter: SectorFilter::All,
            selected_index: 0,
            heatmap_focus: None,
            current_screen: Screen::Heatmap,
            is_loading: false,
            loading_message: None,
            error: None,
            data_source: None,
            last_refresh: None,
            chart_zoom: MIN_ZOOM,
            chart_pan: 0,
            chart_cursor: None,
            confirm_quit: false,
            market_generation: 0,
            history_generation: 0,
            market_pending: false,
            history_pending: false,
        }
    }

    /// Crée une App avec des titres déjà chargés
    pub fn with_stocks(stocks: Vec<Stock>, sectors: Vec<Sector>) -> Self {
        Self {
            stocks,
            sectors,
            ..Self::new()
        }
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Rafraîchissement du marché
    // ========================================================================

    /// Démarre un rafraîchissement : Loading + nouvelle génération
    pub fn begin_refresh(&mut self) -> RefreshRequest {
        self.market_generation += 1;
        self.market_pending = true;
        self.start_loading(Some("Chargement des données de marché...".to_string()));
        debug!(generation = self.market_generation, "Market refresh started");
        RefreshRequest {
            generation: self.market_generation,
        }
    }

    /// Applique un snapshot s'il correspond à la dernière demande
    ///
    /// Retourne false si le résultat est périmé (ignoré)
    pub fn apply_snapshot(&mut self, generation: u64, snapshot: MarketSnapshot, sectors: Vec<Sector>) -> bool {
        if generation != self.market_generation {
            debug!(generation, latest = self.market_generation, "Discarding stale market snapshot");
            return false;
        }

        info!(stocks = snapshot.stocks.len(), source = ?snapshot.source, "Applying market snapshot");
        self.stocks = snapshot.stocks;
        self.sectors = sectors;
        self.data_source = Some(snapshot.source);
        self.last_refresh = Some(snapshot.fetched_at);
        self.error = None;
        self.market_pending = false;
        self.finish_loading();
        self.clamp_selection();
        true
    }

    /// Marque l'échec d'un rafraîchissement
    pub fn fail_refresh(&mut self, generation: u64, reason: &str) -> bool {
        if generation != self.market_generation {
            debug!(generation, "Discarding stale market failure");
            return false;
        }

        warn!(generation, reason, "Market refresh failed");
        self.error = Some(STOCK_ERROR_MESSAGE.to_string());
        self.market_pending = false;
        self.finish_loading();
        true
    }

    // ========================================================================
    // Historique
    // ========================================================================

    /// Sélectionne un ticker (drill-down) et demande son historique
    pub fn select_ticker(&mut self, ticker: &str) -> Option<HistoryRequest> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return None;
        }
        info!(ticker = %ticker, "Ticker selected");
        self.selected_ticker = Some(ticker);
        self.reset_zoom();
        self.request_history()
    }

    /// Drill-down sur le titre sous le curseur
    pub fn select_current(&mut self) -> Option<HistoryRequest> {
        let ticker = self.selected_stock()?.ticker.clone();
        self.select_ticker(&ticker)
    }

    /// Change de timeframe ; recharge l'historique si un ticker est choisi
    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> Option<HistoryRequest> {
        if self.timeframe == timeframe {
            return None;
        }
        self.timeframe = timeframe;
        self.reset_zoom();
        self.request_history()
    }

    /// Passe au timeframe suivant
    pub fn next_timeframe(&mut self) -> Option<HistoryRequest> {
        self.set_timeframe(self.timeframe.next())
    }

    /// Passe au timeframe précédent
    pub fn previous_timeframe(&mut self) -> Option<HistoryRequest> {
        self.set_timeframe(self.timeframe.previous())
    }

    /// Nouvelle demande pour (selected_ticker, timeframe), None sans ticker
    fn request_history(&mut self) -> Option<HistoryRequest> {
        let ticker = self.selected_ticker.clone()?;
        self.history_generation += 1;
        self.history_pending = true;
        self.start_loading(Some(format!(
            "Chargement de l'historique {} ({})...",
            ticker,
            self.timeframe.label()
        )));

        Some(HistoryRequest {
            ticker,
            timeframe: self.timeframe,
            generation: self.history_generation,
        })
    }

    /// Applique un historique s'il correspond à la dernière demande
    pub fn apply_history(&mut self, generation: u64, series: HistoricalSeries) -> bool {
        if generation != self.history_generation {
            debug!(generation, latest = self.history_generation, ticker = %series.ticker, "Discarding stale history");
            return false;
        }

        info!(ticker = %series.ticker, points = series.len(), source = ?series.source, "Applying history");
        self.history = Some(series);
        self.chart_cursor = None;
        self.error = None;
        self.history_pending = false;
        self.finish_loading();
        true
    }

    /// Marque l'échec d'un historique
    pub fn fail_history(&mut self, generation: u64, reason: &str) -> bool {
        if generation != self.history_generation {
            return false;
        }

        warn!(generation, reason, "History fetch failed");
        self.error = Some(HISTORY_ERROR_MESSAGE.to_string());
        self.history_pending = false;
        self.finish_loading();
        true
    }

    // ========================================================================
    // Chargement
    // ========================================================================

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    /// Coupe l'indicateur seulement quand plus rien n'est en vol
    fn finish_loading(&mut self) {
        if !self.market_pending && !self.history_pending {
            self.stop_loading();
        }
    }

    /// État du cycle de fetch
    pub fn fetch_state(&self) -> FetchState {
        if self.is_loading {
            FetchState::Loading
        } else if let Some(error) = &self.error {
            FetchState::Error(error.clone())
        } else {
            FetchState::Idle
        }
    }

    // ========================================================================
    // Vues dérivées
    // ========================================================================

    /// Titres visibles (recherche + secteur), recalculés à chaque appel
    pub fn filtered_stocks(&self) -> Vec<&Stock> {
        filter_stocks(&self.stocks, &self.search_query, &self.sector_filter)
    }

    /// Cartes de résumé sur le tableau complet
    pub fn summary(&self) -> MarketSummary<'_> {
        summarize(&self.stocks)
    }

    /// Titres de la heatmap dans l'ordre des tuiles : secteur par secteur
    ///
    /// C'est l'ordre que suit le curseur. Avec un secteur agrandi, seuls ses
    /// titres restent.
    pub fn heatmap_stocks(&self) -> Vec<&Stock> {
        let stocks = self.filtered_stocks();
        match self.focused_sector() {
            Some(sector) => stocks.into_iter().filter(|s| s.sector == sector).collect(),
            None => group_by_sector(&stocks)
                .into_iter()
                .flat_map(|group| group.stocks)
                .collect(),
        }
    }

    /// Secteur agrandi, s'il a encore des titres visibles
    pub fn focused_sector(&self) -> Option<&str> {
        let sector = self.heatmap_focus.as_deref()?;
        self.filtered_stocks()
            .iter()
            .any(|s| s.sector == sector)
            .then_some(sector)
    }

    /// Titre sous le curseur
    pub fn selected_stock(&self) -> Option<&Stock> {
        self.heatmap_stocks().get(self.selected_index).copied()
    }

    /// Titre correspondant au ticker du drill-down
    pub fn selected_ticker_stock(&self) -> Option<&Stock> {
        let ticker = self.selected_ticker.as_deref()?;
        self.stocks.iter().find(|s| s.ticker == ticker)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Tuile précédente
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Tuile suivante
    pub fn navigate_down(&mut self) {
        let max_index = self.heatmap_stocks().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Ramène le curseur dans la heatmap après un changement de données
    fn clamp_selection(&mut self) {
        let max_index = self.heatmap_stocks().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    /// Replace le curseur sur `ticker` (ou sur la première tuile)
    fn reselect(&mut self, ticker: &str) {
        let position = self.heatmap_stocks().iter().position(|s| s.ticker == ticker);
        self.selected_index = position.unwrap_or(0);
    }

    pub fn show_heatmap(&mut self) {
        self.current_screen = Screen::Heatmap;
    }

    pub fn show_historical(&mut self) {
        self.current_screen = Screen::Historical;
    }

    /// Bascule Heatmap <-> Historical (onglets)
    pub fn toggle_screen(&mut self) {
        self.current_screen = match self.current_screen {
            Screen::Heatmap => Screen::Historical,
            Screen::Historical | Screen::Search => Screen::Heatmap,
        };
    }

    pub fn is_on_heatmap(&self) -> bool {
        self.current_screen == Screen::Heatmap
    }

    pub fn is_on_historical(&self) -> bool {
        self.current_screen == Screen::Historical
    }

    // ========================================================================
    // Recherche (Input Mode)
    // ========================================================================

    /// Entre en mode recherche, pré-rempli avec la recherche courante
    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
        self.input_buffer = self.search_query.clone();
    }

    /// Ajoute un caractère et filtre en direct
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
        self.set_search(self.input_buffer.clone());
    }

    /// Supprime le dernier caractère
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
        self.set_search(self.input_buffer.clone());
    }

    /// Valide la recherche et retourne à la heatmap
    pub fn submit_search(&mut self) {
        let query = std::mem::take(&mut self.input_buffer);
        self.set_search(query);
        self.current_screen = Screen::Heatmap;
    }

    /// Annule la recherche (vide le filtre)
    pub fn cancel_search(&mut self) {
        self.input_buffer.clear();
        self.clear_search();
        self.current_screen = Screen::Heatmap;
    }

    pub fn set_search(&mut self, query: String) {
        self.search_query = query;
        self.clamp_selection();
    }

    pub fn clear_search(&mut self) {
        self.set_search(String::new());
    }

    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::Search
    }

    // ========================================================================
    // Filtre secteur
    // ========================================================================

    pub fn set_sector_filter(&mut self, filter: SectorFilter) {
        self.sector_filter = filter;
        self.heatmap_focus = None;
        self.clamp_selection();
    }

    /// Cycle : All -> secteur 1 -> ... -> secteur N -> All
    pub fn next_sector(&mut self) {
        let options = self.sector_options();
        let current = self.sector_position(&options);
        let next = (current + 1) % options.len();
        self.set_sector_filter(options[next].clone());
    }

    /// Cycle inverse
    pub fn previous_sector(&mut self) {
        let options = self.sector_options();
        let current = self.sector_position(&options);
        let previous = (current + options.len() - 1) % options.len();
        self.set_sector_filter(options[previous].clone());
    }

    /// "all" puis chaque secteur de la liste de référence
    fn sector_options(&self) -> Vec<SectorFilter> {
        std::iter::once(SectorFilter::All)
            .chain(self.sectors.iter().map(|s| SectorFilter::Named(s.name.clone())))
            .collect()
    }

    fn sector_position(&self, options: &[SectorFilter]) -> usize {
        options
            .iter()
            .position(|o| *o == self.sector_filter)
            .unwrap_or(0)
    }

    // ========================================================================
    // Zoom de la heatmap
    // ========================================================================
    // Un niveau de zoom : le secteur du titre sous le curseur occupe toute la
    // zone. Le pan passe d'un secteur agrandi au suivant.
    // ========================================================================

    /// Agrandit le secteur du titre sous le curseur
    pub fn focus_sector(&mut self) {
        let (sector, ticker) = match self.selected_stock() {
            Some(stock) => (stock.sector.clone(), stock.ticker.clone()),
            None => return,
        };
        debug!(sector = %sector, "Heatmap zoomed on sector");
        self.heatmap_focus = Some(sector);
        self.reselect(&ticker);
    }

    /// Revient à tous les secteurs sans perdre le titre sous le curseur
    pub fn unfocus_sector(&mut self) {
        let ticker = self.selected_stock().map(|s| s.ticker.clone());
        self.heatmap_focus = None;
        match ticker {
            Some(ticker) => self.reselect(&ticker),
            None => self.clamp_selection(),
        }
    }

    pub fn is_heatmap_zoomed(&self) -> bool {
        self.focused_sector().is_some()
    }

    /// Secteur agrandi suivant (sans effet hors zoom)
    pub fn next_focused_sector(&mut self) {
        self.shift_focus(true);
    }

    /// Secteur agrandi précédent (sans effet hors zoom)
    pub fn previous_focused_sector(&mut self) {
        self.shift_focus(false);
    }

    fn shift_focus(&mut self, forward: bool) {
        let current = match self.focused_sector() {
            Some(sector) => sector.to_string(),
            None => return,
        };
        let names: Vec<String> = group_by_sector(&self.filtered_stocks())
            .iter()
            .map(|group| group.name.to_string())
            .collect();
        let position = match names.iter().position(|name| *name == current) {
            Some(position) => position,
            None => return,
        };

        let next = if forward {
            (position + 1) % names.len()
        } else {
            (position + names.len() - 1) % names.len()
        };
        self.heatmap_focus = Some(names[next].clone());
        self.selected_index = 0;
    }

    // ========================================================================
    // Zoom / pan du graphique
    // ========================================================================

    pub fn zoom_in(&mut self) {
        self.chart_zoom = (self.chart_zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.chart_zoom = (self.chart_zoom / ZOOM_STEP).max(MIN_ZOOM);
        if self.chart_zoom == MIN_ZOOM {
            self.chart_pan = 0;
        }
    }

    /// Décale la fenêtre vers le passé
    pub fn pan_left(&mut self) {
        self.chart_pan = self.chart_pan.saturating_add(1);
    }

    /// Décale la fenêtre vers le présent
    pub fn pan_right(&mut self) {
        self.chart_pan = self.chart_pan.saturating_sub(1);
    }

    pub fn reset_zoom(&mut self) {
        self.chart_zoom = MIN_ZOOM;
        self.chart_pan = 0;
        self.chart_cursor = None;
    }

    // ========================================================================
    // Inspection barre par barre
    // ========================================================================

    /// Barre inspectée pour une série de `len` barres
    ///
    /// Toujours dans la fenêtre visible : un zoom ou un pan ramène le curseur
    /// au bord le plus proche.
    pub fn focused_bar(&self, len: usize) -> Option<usize> {
        let window = self.chart_window(len);
        if window.start == window.end {
            return None;
        }
        let last = window.end - 1;
        Some(self.chart_cursor.map_or(last, |i| i.clamp(window.start, last)))
    }

    /// Barre précédente, bornée au début de la fenêtre
    pub fn cursor_left(&mut self) {
        let len = self.history_len();
        if let Some(bar) = self.focused_bar(len) {
            let start = self.chart_window(len).start;
            self.chart_cursor = Some(bar.saturating_sub(1).max(start));
        }
    }

    /// Barre suivante, bornée à la fin de la fenêtre
    pub fn cursor_right(&mut self) {
        let len = self.history_len();
        if let Some(bar) = self.focused_bar(len) {
            let last = self.chart_window(len).end - 1;
            self.chart_cursor = Some((bar + 1).min(last));
        }
    }

    /// Point OHLCV sous le curseur
    pub fn focused_point(&self) -> Option<&HistoricalPoint> {
        let series = self.history.as_ref()?;
        series.points.get(self.focused_bar(series.len())?)
    }

    fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, |series| series.len())
    }

    /// Fenêtre visible pour une série de `len` barres
    ///
    /// CONCEPT : zoom = len / largeur visible, pan borné pour rester dans la série
    pub fn chart_window(&self, len: usize) -> ChartWindow {
        if len == 0 {
            return ChartWindow { start: 0, end: 0 };
        }
        let visible = ((len as f64 / self.chart_zoom).ceil() as usize).clamp(2.min(len), len);
        let max_pan = len - visible;
        let pan = self.chart_pan.min(max_pan);
        let end = len - pan;
        ChartWindow {
            start: end - visible,
            end,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fallback::{mock_sectors, mock_stocks};
    use crate::api::synthetic::generate_history;

    fn loaded_app() -> App {
        App::with_stocks(mock_stocks(), mock_sectors())
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.stocks.is_empty());
        assert_eq!(app.timeframe, Timeframe::OneDay);
        assert!(app.selected_ticker.is_none());
        assert_eq!(app.fetch_state(), FetchState::Idle);
    }

    #[test]
    fn test_refresh_cycle() {
        let mut app = App::new();
        let request = app.begin_refresh();
        assert_eq!(app.fetch_state(), FetchState::Loading);

        let snapshot = MarketSnapshot::new(mock_stocks(), DataSource::Synthetic);
        assert!(app.apply_snapshot(request.generation, snapshot, mock_sectors()));
        assert_eq!(app.fetch_state(), FetchState::Idle);
        assert_eq!(app.stocks.len(), 20);
        assert_eq!(app.sectors.len(), 11);
        assert_eq!(app.data_source, Some(DataSource::Synthetic));
    }

    #[test]
    fn test_error_state_is_not_terminal() {
        let mut app = App::new();
        let first = app.begin_refresh();
        assert!(app.fail_refresh(first.generation, "task panicked"));
        assert_eq!(app.fetch_state(), FetchState::Error(STOCK_ERROR_MESSAGE.to_string()));

        let second = app.begin_refresh();
        assert_eq!(app.fetch_state(), FetchState::Loading);
        let snapshot = MarketSnapshot::new(mock_stocks(), DataSource::Live);
        assert!(app.apply_snapshot(second.generation, snapshot, vec![]));
        assert!(app.error.is_none());
        assert_eq!(app.fetch_state(), FetchState::Idle);
    }

    #[test]
    fn test_stale_snapshot_is_discarded() {
        let mut app = App::new();
        let old = app.begin_refresh();
        let new = app.begin_refresh();

        let fresh = MarketSnapshot::new(mock_stocks()[..2].to_vec(), DataSource::Live);
        assert!(app.apply_snapshot(new.generation, fresh, vec![]));

        let stale = MarketSnapshot::new(mock_stocks(), DataSource::Synthetic);
        assert!(!app.apply_snapshot(old.generation, stale, vec![]));
        assert_eq!(app.stocks.len(), 2);
        assert_eq!(app.data_source, Some(DataSource::Live));
    }

    #[test]
    fn test_no_ticker_means_no_history_request() {
        let mut app = loaded_app();
        assert!(app.set_timeframe(Timeframe::OneYear).is_none());
        assert!(!app.is_loading);
    }

    #[test]
    fn test_select_ticker_issues_request() {
        let mut app = loaded_app();
        let request = app.select_ticker("aapl").unwrap();
        assert_eq!(request.ticker, "AAPL");
        assert_eq!(request.timeframe, Timeframe::OneDay);
        assert!(app.is_loading);

        let request = app.next_timeframe().unwrap();
        assert_eq!(request.timeframe, Timeframe::OneWeek);
        assert_eq!(request.generation, 2);
    }

    #[test]
    fn test_stale_history_is_discarded() {
        let mut app = loaded_app();
        let first = app.select_ticker("AAPL").unwrap();
        let second = app.select_ticker("MSFT").unwrap();

        assert!(app.apply_history(second.generation, generate_history("MSFT", Timeframe::OneDay)));
        // La réponse lente pour AAPL arrive après : ignorée
        assert!(!app.apply_history(first.generation, generate_history("AAPL", Timeframe::OneDay)));
        assert_eq!(app.history.as_ref().unwrap().ticker, "MSFT");
        assert!(!app.is_loading);
    }

    #[test]
    fn test_loading_stays_on_while_other_request_in_flight() {
        let mut app = loaded_app();
        let refresh = app.begin_refresh();
        let history = app.select_ticker("AAPL").unwrap();

        app.apply_history(history.generation, generate_history("AAPL", Timeframe::OneDay));
        assert!(app.is_loading);

        let snapshot = MarketSnapshot::new(mock_stocks(), DataSource::Synthetic);
        app.apply_snapshot(refresh.generation, snapshot, mock_sectors());
        assert!(!app.is_loading);
    }

    #[test]
    fn test_history_failure_sets_error() {
        let mut app = loaded_app();
        let request = app.select_ticker("AAPL").unwrap();
        assert!(app.fail_history(request.generation, "panic"));
        assert_eq!(app.error.as_deref(), Some(HISTORY_ERROR_MESSAGE));
    }

    #[test]
    fn test_stale_failures_are_ignored() {
        let mut app = loaded_app();
        let old_refresh = app.begin_refresh();
        let new_refresh = app.begin_refresh();
        let old_history = app.select_ticker("AAPL").unwrap();
        let new_history = app.select_ticker("MSFT").unwrap();

        assert!(!app.fail_refresh(old_refresh.generation, "late panic"));
        assert!(!app.fail_history(old_history.generation, "late panic"));
        assert!(app.error.is_none());
        assert_eq!(app.fetch_state(), FetchState::Loading);

        let snapshot = MarketSnapshot::new(mock_stocks(), DataSource::Live);
        assert!(app.apply_snapshot(new_refresh.generation, snapshot, mock_sectors()));
        assert!(app.apply_history(new_history.generation, generate_history("MSFT", Timeframe::OneDay)));
        assert_eq!(app.fetch_state(), FetchState::Idle);
    }

    #[test]
    fn test_summary_does_not_mutate_canonical_order() {
        let app = loaded_app();
        let before: Vec<String> = app.stocks.iter().map(|s| s.ticker.clone()).collect();

        assert_eq!(app.summary().top_gainer.unwrap().ticker, "INTC");
        let after: Vec<String> = app.stocks.iter().map(|s| s.ticker.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_search_mode_filters_live() {
        let mut app = loaded_app();
        app.start_search();
        for c in "appl".chars() {
            app.append_char(c);
        }
        assert_eq!(app.filtered_stocks().len(), 1);

        app.submit_search();
        assert_eq!(app.search_query, "appl");
        assert!(app.is_on_heatmap());

        app.start_search();
        app.cancel_search();
        assert!(app.search_query.is_empty());
        assert_eq!(app.filtered_stocks().len(), 20);
    }

    #[test]
    fn test_sector_cycle() {
        let mut app = loaded_app();
        app.next_sector();
        assert_eq!(app.sector_filter, SectorFilter::Named("Technology".to_string()));

        app.previous_sector();
        assert_eq!(app.sector_filter, SectorFilter::All);

        app.previous_sector();
        assert_eq!(app.sector_filter, SectorFilter::Named("Utilities".to_string()));
        // Aucun titre "Utilities" dans le mock
        assert!(app.filtered_stocks().is_empty());
        assert!(app.selected_stock().is_none());
    }

    #[test]
    fn test_navigation_is_bounded_by_filtered_view() {
        let mut app = loaded_app();
        app.set_sector_filter(SectorFilter::parse("Healthcare"));

        for _ in 0..10 {
            app.navigate_down();
        }
        assert_eq!(app.selected_index, 3);
        assert_eq!(app.selected_stock().unwrap().ticker, "MRK");

        app.set_search("pfizer".to_string());
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.select_current().unwrap().ticker, "PFE");
    }

    #[test]
    fn test_navigation_follows_treemap_order() {
        let mut app = loaded_app();
        let mut visited = vec![app.selected_stock().unwrap().ticker.clone()];
        for _ in 0..6 {
            app.navigate_down();
            visited.push(app.selected_stock().unwrap().ticker.clone());
        }

        // Toute la Technology d'abord, puis Consumer Cyclical
        assert_eq!(visited, vec!["AAPL", "MSFT", "GOOGL", "META", "NVDA", "INTC", "AMZN"]);
    }

    #[test]
    fn test_heatmap_sector_zoom() {
        let mut app = loaded_app();
        for _ in 0..6 {
            app.navigate_down();
        }
        app.focus_sector();

        assert!(app.is_heatmap_zoomed());
        let tickers: Vec<&str> = app.heatmap_stocks().iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AMZN", "TSLA", "HD"]);
        assert_eq!(app.selected_stock().unwrap().ticker, "AMZN");

        app.next_focused_sector();
        assert_eq!(app.focused_sector(), Some("Financial Services"));
        assert_eq!(app.selected_stock().unwrap().ticker, "JPM");

        // Retour à la vue complète, toujours sur JPM
        app.unfocus_sector();
        assert!(!app.is_heatmap_zoomed());
        assert_eq!(app.selected_index, 9);
        assert_eq!(app.selected_stock().unwrap().ticker, "JPM");

        app.previous_focused_sector();
        assert!(app.heatmap_focus.is_none());
    }

    #[test]
    fn test_sector_filter_drops_heatmap_zoom() {
        let mut app = loaded_app();
        app.focus_sector();
        assert_eq!(app.focused_sector(), Some("Technology"));

        app.set_sector_filter(SectorFilter::parse("Healthcare"));
        assert!(app.heatmap_focus.is_none());
        assert_eq!(app.heatmap_stocks().len(), 4);
    }

    #[test]
    fn test_bar_cursor_stays_in_window() {
        let mut app = loaded_app();
        let request = app.select_ticker("AAPL").unwrap();
        let series = generate_history("AAPL", Timeframe::OneMonth);
        let len = series.len();
        let last_date = series.points[len - 1].date;
        app.apply_history(request.generation, series);

        // Par défaut : dernière barre
        assert_eq!(app.focused_bar(len), Some(len - 1));
        assert_eq!(app.focused_point().unwrap().date, last_date);

        app.cursor_right();
        assert_eq!(app.focused_bar(len), Some(len - 1));

        for _ in 0..(len + 5) {
            app.cursor_left();
        }
        assert_eq!(app.focused_bar(len), Some(0));

        // Le zoom ramène le curseur dans la fenêtre visible
        app.chart_zoom = 2.0;
        let window = app.chart_window(len);
        assert_eq!(app.focused_bar(len), Some(window.start));
        app.cursor_left();
        assert_eq!(app.focused_bar(len), Some(window.start));

        app.reset_zoom();
        assert!(app.chart_cursor.is_none());
        assert_eq!(app.focused_bar(len), Some(len - 1));
        assert_eq!(app.focused_bar(0), None);
    }

    #[test]
    fn test_chart_window() {
        let mut app = App::new();
        assert_eq!(app.chart_window(31), ChartWindow { start: 0, end: 31 });

        app.chart_zoom = 2.0;
        assert_eq!(app.chart_window(30), ChartWindow { start: 15, end: 30 });

        app.chart_pan = 100;
        assert_eq!(app.chart_window(30), ChartWindow { start: 0, end: 15 });

        app.chart_zoom = MAX_ZOOM;
        app.chart_pan = 0;
        assert_eq!(app.chart_window(2), ChartWindow { start: 0, end: 2 });
        assert_eq!(app.chart_window(0), ChartWindow { start: 0, end: 0 });
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut app = App::new();
        for _ in 0..20 {
            app.zoom_in();
        }
        assert_eq!(app.chart_zoom, MAX_ZOOM);

        app.pan_left();
        for _ in 0..20 {
            app.zoom_out();
        }
        assert_eq!(app.chart_zoom, MIN_ZOOM);
        assert_eq!(app.chart_pan, 0);
    }
}
