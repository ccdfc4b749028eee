// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : une fonction helper par action
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Aucun événement pendant le délai de poll
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::with_tick_rate(Duration::from_millis(250))
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus tick_rate
    /// - Sans événement, retourne Event::Tick ; la boucle en profite pour
    ///   vider les résultats du worker
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : KeyEvent -> action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' : quitter (deux pressions)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_tab_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Tab | KeyCode::BackTab))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j')))
}

/// '/' : ouvre la recherche
pub fn is_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('/')))
}

/// 's' : secteur suivant
pub fn is_next_sector_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('s')))
}

/// 'S' : secteur précédent
pub fn is_previous_sector_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('S')))
}

/// ']' : timeframe suivant
pub fn is_next_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(']')))
}

/// '[' : timeframe précédent
pub fn is_previous_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('[')))
}

/// 'r' : rafraîchir maintenant
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// '+' (ou '=' sans Shift) : zoom avant
pub fn is_zoom_in_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('+') | KeyCode::Char('=')))
}

pub fn is_zoom_out_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('-')))
}

pub fn is_reset_zoom_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('0')))
}

pub fn is_pan_left_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left))
}

pub fn is_pan_right_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right))
}

/// ',' : barre précédente sous le curseur du graphique
pub fn is_cursor_left_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(',')))
}

/// '.' : barre suivante
pub fn is_cursor_right_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('.')))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Caractère accepté dans la recherche (ticker ou nom de société)
pub fn is_search_char_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char(c)) if c.is_alphanumeric() || " .-&'".contains(c)
    )
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_sector_keys_are_case_sensitive() {
        assert!(is_next_sector_event(&key(KeyCode::Char('s'))));
        assert!(!is_next_sector_event(&key(KeyCode::Char('S'))));
        assert!(is_previous_sector_event(&key(KeyCode::Char('S'))));
    }

    #[test]
    fn test_navigation_keys() {
        assert!(is_up_event(&key(KeyCode::Up)));
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(is_down_event(&key(KeyCode::Char('j'))));
        assert!(is_next_timeframe_event(&key(KeyCode::Char(']'))));
        assert!(is_previous_timeframe_event(&key(KeyCode::Char('['))));
        assert!(is_zoom_in_event(&key(KeyCode::Char('+'))));
        assert!(is_pan_left_event(&key(KeyCode::Left)));
        assert!(is_cursor_left_event(&key(KeyCode::Char(','))));
        assert!(is_cursor_right_event(&key(KeyCode::Char('.'))));
        assert!(!is_cursor_right_event(&key(KeyCode::Right)));
    }

    #[test]
    fn test_search_chars() {
        assert!(is_search_char_event(&key(KeyCode::Char('a'))));
        assert!(is_search_char_event(&key(KeyCode::Char('&'))));
        assert!(is_search_char_event(&key(KeyCode::Char(' '))));
        assert!(!is_search_char_event(&key(KeyCode::Char('/'))));
        assert!(!is_search_char_event(&key(KeyCode::Enter)));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('x'))), Some('x'));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }
}
