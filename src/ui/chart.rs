// ============================================================================
// Chart - Historique du ticker sélectionné
// ============================================================================
// Graphique ligne des clôtures, coloré selon la tendance de la période
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::models::{DataSource, HistoricalPoint, HistoricalSeries, Timeframe, Trend};

/// Marge verticale autour des extrêmes (1%)
const Y_PADDING: f64 = 0.01;

/// Bornes Y : [plus bas * 0.99, plus haut * 1.01]
pub fn price_bounds(points: &[HistoricalPoint]) -> Option<[f64; 2]> {
    let low = points.iter().map(|p| p.low).min_by(|a, b| a.total_cmp(b))?;
    let high = points.iter().map(|p| p.high).max_by(|a, b| a.total_cmp(b))?;
    Some([low * (1.0 - Y_PADDING), high * (1.0 + Y_PADDING)])
}

/// Couleur de la courbe selon la tendance
pub fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
        Trend::Flat => Color::Gray,
    }
}

/// Résumé OHLCV d'une barre : date, O/H/L/C et volume en millions
pub fn bar_summary(point: &HistoricalPoint) -> String {
    format!(
        "{}  O ${:.2}  H ${:.2}  L ${:.2}  C ${:.2}  Vol. {:.2}M",
        point.date.format("%Y-%m-%d"),
        point.open,
        point.high,
        point.low,
        point.close,
        point.volume as f64 / 1_000_000.0
    )
}

/// Dessine l'écran historique
pub fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let ticker = match &app.selected_ticker {
        Some(ticker) => ticker,
        None => {
            render_no_data(frame, area, "Aucun ticker sélectionné : [Enter] sur la heatmap");
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_timeframe_tabs(frame, app, chunks[0]);

    // L'historique affiché peut encore être celui de la demande précédente
    match &app.history {
        Some(series) if series.ticker == *ticker && series.timeframe == app.timeframe => {
            render_chart_graph(frame, app, series, chunks[1]);
        }
        _ if app.is_loading => {
            render_no_data(frame, chunks[1], &format!("Chargement de l'historique {}...", ticker));
        }
        _ => render_no_data(frame, chunks[1], &format!("Pas de données pour {}", ticker)),
    }
}

/// Onglets de période + infos du ticker
fn render_timeframe_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Timeframe::all()
        .into_iter()
        .map(|tf| Line::from(tf.label()))
        .collect();
    let selected = Timeframe::all()
        .iter()
        .position(|tf| *tf == app.timeframe)
        .unwrap_or(0);

    let title = match app.selected_ticker_stock() {
        Some(stock) => format!(" {} - {}  ${:.2}  {} ", stock.ticker, stock.name, stock.price, stock.change_label()),
        None => format!(" {} ", app.selected_ticker.as_deref().unwrap_or("")),
    };

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Dessine le graphique ligne sur la fenêtre visible, puis la barre inspectée
fn render_chart_graph(frame: &mut Frame, app: &App, series: &HistoricalSeries, area: Rect) {
    let window = app.chart_window(series.len());
    let visible = &series.points[window.start..window.end];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);
    let area = chunks[0];

    let bounds = match price_bounds(visible) {
        Some(bounds) => bounds,
        None => {
            render_no_data(frame, area, "Pas de données à afficher");
            return;
        }
    };

    let points: Vec<(f64, f64)> = visible
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.close))
        .collect();

    // Position du curseur, relative à la fenêtre
    let focused = app.focused_bar(series.len());
    let cursor: Vec<(f64, f64)> = focused
        .and_then(|i| series.points.get(i).map(|p| ((i - window.start) as f64, p.close)))
        .into_iter()
        .collect();

    let color = trend_color(series.trend());
    let datasets = vec![
        Dataset::default()
            .name(series.ticker.as_str())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points),
        Dataset::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&cursor),
    ];

    let first_date = visible.first().map(|p| p.date.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let last_date = visible.last().map(|p| p.date.format("%Y-%m-%d").to_string()).unwrap_or_default();

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, (points.len().max(2) - 1) as f64])
        .labels(vec![Span::raw(first_date), Span::raw(last_date)]);

    let y_axis = Axis::default()
        .title("Prix ($)")
        .style(Style::default().fg(Color::Gray))
        .bounds(bounds)
        .labels(vec![
            Span::raw(format!("${:.2}", bounds[0])),
            Span::raw(format!("${:.2}", (bounds[0] + bounds[1]) / 2.0)),
            Span::raw(format!("${:.2}", bounds[1])),
        ]);

    let source = match series.source {
        DataSource::Live => "",
        DataSource::Synthetic => " (synthétique)",
    };
    let change = series
        .change_percent()
        .map(|c| format!("{:+.2}%", c))
        .unwrap_or_default();
    let zoom = if app.chart_zoom > 1.0 {
        format!("  zoom x{:.2}", app.chart_zoom)
    } else {
        String::new()
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " {} - {}{}  {}{} ",
                    series.ticker,
                    series.timeframe.label(),
                    source,
                    change,
                    zoom
                )),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
    render_inspector(frame, app, chunks[1]);
}

/// Ligne OHLCV de la barre sous le curseur
fn render_inspector(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Barre [, .] ");

    let text = app
        .focused_point()
        .map(bar_summary)
        .unwrap_or_else(|| "-".to_string());

    let paragraph = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(Color::White))))
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Message quand il n'y a rien à tracer
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Historique ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled("[ESC] Retour", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
