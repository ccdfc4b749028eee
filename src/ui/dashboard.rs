// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, FetchState, Screen};
use crate::models::{DataSource, Stock};
use crate::ui::{chart, heatmap};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (tous les écrans gérés)
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.current_screen {
        Screen::Heatmap | Screen::Search => render_heatmap_screen(frame, app, chunks[1]),
        Screen::Historical => chart::render_chart(frame, app, chunks[1]),
    }

    if app.is_in_search_mode() {
        render_search_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }
}

/// Header, contenu, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header : titre + statut
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

/// Cartes de résumé, détail du titre sélectionné, puis la heatmap
fn render_heatmap_screen(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    render_summary(frame, app, chunks[0]);
    render_selection(frame, app, chunks[1]);
    heatmap::render_heatmap(frame, app, chunks[2]);
}

// ============================================================================
// Détail du titre sous le curseur
// ============================================================================
// Toujours visible, même quand la tuile est trop petite pour être dessinée
// ============================================================================

fn render_selection(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Sélection ");

    let line = match app.selected_stock() {
        Some(stock) => selection_line(stock),
        None => Line::from(Span::styled("-", Style::default().fg(Color::Gray))),
    };

    let paragraph = Paragraph::new(vec![line]).block(block);
    frame.render_widget(paragraph, area);
}

fn selection_line(stock: &Stock) -> Line<'_> {
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White);
    let color = if stock.is_positive() { Color::Green } else { Color::Red };

    Line::from(vec![
        Span::styled(
            stock.ticker.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(stock.name.as_str(), value),
        Span::styled("   Prix ", label),
        Span::styled(format!("${:.2}", stock.price), value),
        Span::styled("   Clôture préc. ", label),
        Span::styled(format!("${:.2}", stock.previous_close), value),
        Span::raw("   "),
        Span::styled(stock.change_label(), Style::default().fg(color)),
        Span::styled("   Vol. ", label),
        Span::styled(stock.volume_label(), value),
        Span::styled("   Cap. ", label),
        Span::styled(stock.market_cap_label(), value),
        Span::styled("   ", label),
        Span::styled(stock.sector.as_str(), label),
    ])
}

// ============================================================================
// Header : titre, filtres et statut
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" MarketHeat ")
        .title_alignment(Alignment::Center);

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let search = if app.search_query.is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", app.search_query)
    };

    let filters = Line::from(vec![
        Span::styled("Recherche: ", label),
        Span::styled(search, value),
        Span::styled("   Secteur: ", label),
        Span::styled(app.sector_filter.label().to_string(), value),
        Span::styled("   Période: ", label),
        Span::styled(app.timeframe.label(), value),
        Span::raw("   "),
        source_badge(app.data_source),
    ]);

    let status = match app.fetch_state() {
        FetchState::Loading => Line::from(Span::styled(
            app.loading_message
                .clone()
                .unwrap_or_else(|| "Chargement...".to_string()),
            Style::default().fg(Color::Yellow),
        )),
        FetchState::Error(message) => Line::from(Span::styled(
            format!("⚠ {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        FetchState::Idle => Line::from(Span::styled(
            app.last_refresh
                .map(|t| format!("Mis à jour à {} UTC", t.format("%H:%M:%S")))
                .unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        )),
    };

    let paragraph = Paragraph::new(vec![filters, status])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Badge de provenance des données
fn source_badge(source: Option<DataSource>) -> Span<'static> {
    match source {
        Some(DataSource::Live) => Span::styled(" LIVE ", Style::default().fg(Color::Black).bg(Color::Green)),
        Some(DataSource::Synthetic) => {
            Span::styled(" DEMO ", Style::default().fg(Color::Black).bg(Color::Yellow))
        }
        None => Span::raw(""),
    }
}

// ============================================================================
// Cartes de résumé
// ============================================================================

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let summary = app.summary();
    render_card(frame, chunks[0], "Top Gainer", summary.top_gainer, |s| s.change_label());
    render_card(frame, chunks[1], "Top Loser", summary.top_loser, |s| s.change_label());
    render_card(frame, chunks[2], "Most Active", summary.most_active, |s| {
        format!("Vol. {}", s.volume_label())
    });
}

fn render_card<F>(frame: &mut Frame, area: Rect, title: &str, stock: Option<&Stock>, detail: F)
where
    F: Fn(&Stock) -> String,
{
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));

    let lines = match stock {
        Some(stock) => {
            let color = if stock.is_positive() { Color::Green } else { Color::Red };
            vec![
                Line::from(vec![
                    Span::styled(
                        stock.ticker.as_str(),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("  ${:.2}", stock.price)),
                ]),
                Line::from(Span::styled(detail(stock), Style::default().fg(color))),
            ]
        }
        None => vec![Line::from(Span::styled("-", Style::default().fg(Color::Gray)))],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_on_historical() {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[Esc/Tab]", key),
            Span::raw(" Heatmap  "),
            Span::styled("[ ]", key),
            Span::raw(" Period  "),
            Span::styled("[+ -]", key),
            Span::raw(" Zoom  "),
            Span::styled("[← →]", key),
            Span::raw(" Pan  "),
            Span::styled("[, .]", key),
            Span::raw(" Bar  "),
            Span::styled("[0]", key),
            Span::raw(" Reset"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[↑↓ / j k]", key),
            Span::raw(" Navigate  "),
            Span::styled("[Enter]", key),
            Span::raw(" History  "),
            Span::styled("[/]", key),
            Span::raw(" Search  "),
            Span::styled("[s/S]", key),
            Span::raw(" Sector  "),
            Span::styled("[+ -]", key),
            Span::raw(if app.is_heatmap_zoomed() { " Zoom [← →] Next  " } else { " Zoom  " }),
            Span::styled("[ ]", key),
            Span::raw(" Period  "),
            Span::styled("[r]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode recherche : ligne de saisie
///
/// CONCEPT : Modal input (Vim-like)
/// - Le filtre s'applique en direct pendant la saisie
/// - ESC annule, Enter valide
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(Span::styled(
            " [Enter] Confirm  [ESC] Cancel ",
            Style::default().fg(Color::Gray),
        ));

    let input_line = Line::from(vec![
        Span::styled(
            "Search: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let paragraph = Paragraph::new(vec![input_line])
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fallback::{mock_sectors, mock_stocks};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_heatmap_screen_shows_cards_and_tiles() {
        let app = App::with_stocks(mock_stocks(), mock_sectors());
        let screen = draw(&app);

        assert!(screen.contains("MarketHeat"));
        assert!(screen.contains("Top Gainer"));
        assert!(screen.contains("INTC"));
        assert!(screen.contains("All Sectors"));
    }

    #[test]
    fn test_selection_panel_shows_stock_details() {
        let app = App::with_stocks(mock_stocks(), mock_sectors());
        let screen = draw(&app);

        assert!(screen.contains("AAPL  Apple Inc."));
        assert!(screen.contains("Prix $175.34"));
        assert!(screen.contains("Clôture préc. $173.21"));
        assert!(screen.contains("Vol. 65.43M"));
        assert!(screen.contains("Cap. 2800.00B"));
    }

    #[test]
    fn test_selection_panel_on_small_terminal() {
        let mut app = App::with_stocks(mock_stocks(), mock_sectors());
        // UNH : 16e tuile, après Technology, Consumer Cyclical, Financial
        // Services, Consumer Defensive et JNJ
        for _ in 0..15 {
            app.navigate_down();
        }
        assert_eq!(app.selected_stock().unwrap().ticker, "UNH");

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(screen.contains("UNH  UnitedHealth Group Inc."));
    }

    #[test]
    fn test_zoomed_heatmap_shows_one_sector() {
        let mut app = App::with_stocks(mock_stocks(), mock_sectors());
        for _ in 0..6 {
            app.navigate_down();
        }
        app.focus_sector();
        let screen = draw(&app);

        assert!(screen.contains("Consumer Cyclical  [-] tous les secteurs"));
        assert!(screen.contains("AMZN"));
        assert!(screen.contains("HD"));
        assert!(!screen.contains("AAPL"));
    }

    #[test]
    fn test_search_footer_shows_buffer() {
        let mut app = App::with_stocks(mock_stocks(), mock_sectors());
        app.start_search();
        app.append_char('a');
        app.append_char('a');
        let screen = draw(&app);

        assert!(screen.contains("Search: aa"));
    }

    #[test]
    fn test_quit_confirmation_footer() {
        let mut app = App::new();
        app.request_quit();
        assert!(draw(&app).contains("à nouveau pour quitter"));
    }
}
