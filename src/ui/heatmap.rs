// ============================================================================
// Heatmap - Treemap des titres par secteur
// ============================================================================
// Deux niveaux : secteur -> titre. Surface d'une tuile proportionnelle à
// sqrt(volume), couleur selon la variation du jour.
//
// ALGORITHME : slice-and-dice
// - Niveau 1 : la zone est découpée en bandes (une par secteur) le long du
//   côté le plus long
// - Niveau 2 : chaque bande est découpée dans l'autre sens (une tuile par titre)
// - Bornes entières calculées sur les poids cumulés : les tuiles couvrent la
//   zone exactement, sans trou ni chevauchement
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::Stock;
use crate::views::{change_color, group_by_sector, tile_weight};

/// Sens du découpage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Bandes verticales, côte à côte
    Horizontal,
    /// Bandes horizontales, empilées
    Vertical,
}

impl Split {
    /// Découpe le long du côté le plus long
    ///
    /// Une cellule de terminal est environ deux fois plus haute que large.
    pub fn for_area(area: Rect) -> Split {
        if area.width >= area.height.saturating_mul(2) {
            Split::Horizontal
        } else {
            Split::Vertical
        }
    }

    fn flip(self) -> Split {
        match self {
            Split::Horizontal => Split::Vertical,
            Split::Vertical => Split::Horizontal,
        }
    }
}

/// Découpe `area` en tranches proportionnelles à `weights`
///
/// Poids tous nuls (ou non finis) : tranches égales.
pub fn slice(area: Rect, weights: &[f64], split: Split) -> Vec<Rect> {
    if weights.is_empty() {
        return Vec::new();
    }

    let clean: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let total: f64 = clean.iter().sum();
    let clean = if total > 0.0 { clean } else { vec![1.0; weights.len()] };
    let total: f64 = clean.iter().sum();

    let length = match split {
        Split::Horizontal => area.width,
        Split::Vertical => area.height,
    };

    let mut rects = Vec::with_capacity(clean.len());
    let mut cumulative = 0.0;
    let mut start: u16 = 0;
    for weight in clean {
        cumulative += weight;
        let end = ((cumulative / total) * length as f64).round() as u16;
        let end = end.clamp(start, length);
        let size = end - start;

        rects.push(match split {
            Split::Horizontal => Rect::new(area.x + start, area.y, size, area.height),
            Split::Vertical => Rect::new(area.x, area.y + start, area.width, size),
        });
        start = end;
    }
    rects
}

/// Une tuile positionnée
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<'a> {
    pub stock: &'a Stock,
    pub area: Rect,
}

/// Un secteur positionné avec ses tuiles
#[derive(Debug, Clone, PartialEq)]
pub struct SectorTile<'a> {
    pub name: &'a str,
    pub area: Rect,
    pub tiles: Vec<Tile<'a>>,
}

/// Calcule le treemap complet pour les titres visibles
///
/// Les tuiles sont placées dans `inner(sector_area)` : la bordure du secteur
/// est retirée avant le second découpage.
pub fn layout_treemap<'a, F>(area: Rect, stocks: &[&'a Stock], inner: F) -> Vec<SectorTile<'a>>
where
    F: Fn(Rect) -> Rect,
{
    let groups = group_by_sector(stocks);
    let weights: Vec<f64> = groups.iter().map(|g| g.weight()).collect();
    let outer_split = Split::for_area(area);

    groups
        .into_iter()
        .zip(slice(area, &weights, outer_split))
        .map(|(group, sector_area)| {
            let content = inner(sector_area);
            let stock_weights: Vec<f64> = group.stocks.iter().map(|s| tile_weight(s)).collect();
            let tiles = group
                .stocks
                .iter()
                .zip(slice(content, &stock_weights, outer_split.flip()))
                .map(|(&stock, area)| Tile { stock, area })
                .collect();

            SectorTile {
                name: group.name,
                area: sector_area,
                tiles,
            }
        })
        .collect()
}

/// Titre sélectionné dont la tuile n'a reçu aucune cellule
///
/// Arrive quand la zone est plus petite que le nombre de titres.
pub fn hidden_selection<'a>(sector: &SectorTile<'a>, selected: Option<&str>) -> Option<&'a Stock> {
    let selected = selected?;
    sector
        .tiles
        .iter()
        .find(|tile| tile.stock.ticker == selected)
        .filter(|tile| tile.area.width == 0 || tile.area.height == 0)
        .map(|tile| tile.stock)
}

// ============================================================================
// Rendu
// ============================================================================

fn sector_block(name: &str, zoomed: bool) -> Block<'_> {
    let title = if zoomed {
        format!(" {}  [-] tous les secteurs ", name)
    } else {
        format!(" {} ", name)
    };
    let border = if zoomed { Color::Cyan } else { Color::DarkGray };

    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        ))
}

/// Dessine la heatmap dans `area`
///
/// Secteur agrandi : seul ce secteur est dessiné, sur toute la zone.
pub fn render_heatmap(frame: &mut Frame, app: &App, area: Rect) {
    let stocks = app.heatmap_stocks();
    if stocks.is_empty() {
        let text = if app.stocks.is_empty() {
            "Chargement des données de marché..."
        } else {
            "Aucun titre ne correspond aux filtres"
        };
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from(text)])
            .block(Block::default().borders(Borders::ALL).title(" Heatmap "))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = app.selected_stock().map(|s| s.ticker.as_str());
    let zoomed = app.is_heatmap_zoomed();
    let layout = layout_treemap(area, &stocks, |r| sector_block("", zoomed).inner(r));

    for sector in &layout {
        let mut block = sector_block(sector.name, zoomed);
        // Tuile sélectionnée sans surface : signalée sur le cadre du secteur
        if let Some(stock) = hidden_selection(sector, selected) {
            block = block
                .border_style(Style::default().fg(Color::Yellow))
                .title(Span::styled(
                    format!(" ▸ {} ", stock.ticker),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ));
        }
        frame.render_widget(block, sector.area);

        for tile in &sector.tiles {
            if tile.area.width == 0 || tile.area.height == 0 {
                continue;
            }
            render_tile(frame, tile, selected == Some(tile.stock.ticker.as_str()));
        }
    }
}

/// Une tuile : fond coloré, ticker et variation
fn render_tile(frame: &mut Frame, tile: &Tile, is_selected: bool) {
    let (r, g, b) = change_color(tile.stock.percent_change);
    let mut style = Style::default().bg(Color::Rgb(r, g, b)).fg(Color::White);
    if is_selected {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }

    let mut lines = vec![Line::from(Span::styled(
        tile.stock.ticker.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if tile.area.height >= 2 {
        lines.push(Line::from(format!("{:+.2}%", tile.stock.percent_change)));
    }
    if tile.area.height >= 3 {
        lines.push(Line::from(format!("${:.2}", tile.stock.price)));
    }

    let paragraph = Paragraph::new(lines)
        .style(style)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, tile.area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fallback::mock_stocks;

    fn area(r: &Rect) -> u32 {
        r.width as u32 * r.height as u32
    }

    #[test]
    fn test_slice_covers_length_exactly() {
        let full = Rect::new(3, 1, 100, 10);
        let rects = slice(full, &[1.0, 2.0, 1.0], Split::Horizontal);

        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], Rect::new(3, 1, 25, 10));
        assert_eq!(rects[1], Rect::new(28, 1, 50, 10));
        assert_eq!(rects[2], Rect::new(78, 1, 25, 10));
    }

    #[test]
    fn test_slice_zero_weights_are_equal() {
        let rects = slice(Rect::new(0, 0, 10, 9), &[0.0, 0.0, 0.0], Split::Vertical);
        let heights: Vec<u16> = rects.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![3, 3, 3]);
    }

    #[test]
    fn test_split_direction() {
        assert_eq!(Split::for_area(Rect::new(0, 0, 120, 30)), Split::Horizontal);
        assert_eq!(Split::for_area(Rect::new(0, 0, 40, 30)), Split::Vertical);
    }

    #[test]
    fn test_treemap_covers_area_without_overlap() {
        let stocks = mock_stocks();
        let refs: Vec<&Stock> = stocks.iter().collect();
        let full = Rect::new(0, 0, 160, 40);

        let layout = layout_treemap(full, &refs, |r| r);
        assert_eq!(layout.len(), 6);

        let tiles: Vec<&Tile> = layout.iter().flat_map(|s| s.tiles.iter()).collect();
        assert_eq!(tiles.len(), 20);

        let total: u32 = tiles.iter().map(|t| area(&t.area)).sum();
        assert_eq!(total, area(&full));

        for (i, a) in tiles.iter().enumerate() {
            for b in tiles.iter().skip(i + 1) {
                assert!(a.area.intersection(b.area).area() == 0);
            }
        }
    }

    #[test]
    fn test_hidden_selection_on_tiny_area() {
        let stocks = mock_stocks();
        let refs: Vec<&Stock> = stocks.iter().collect();
        // 6 titres Technology sur 4 lignes : au moins deux tuiles vides
        let layout = layout_treemap(Rect::new(0, 0, 12, 4), &refs, |r| r);
        let tech = layout.iter().find(|s| s.name == "Technology").unwrap();

        let empty = tech.tiles.iter().find(|t| t.area.height == 0).unwrap();
        let visible = tech.tiles.iter().find(|t| t.area.height > 0).unwrap();

        let hidden = hidden_selection(tech, Some(empty.stock.ticker.as_str())).unwrap();
        assert_eq!(hidden.ticker, empty.stock.ticker);
        assert!(hidden_selection(tech, Some(visible.stock.ticker.as_str())).is_none());
        assert!(hidden_selection(tech, Some("KO")).is_none());
        assert!(hidden_selection(tech, None).is_none());
    }

    #[test]
    fn test_heavier_sector_gets_more_room() {
        let stocks = mock_stocks();
        let refs: Vec<&Stock> = stocks.iter().collect();
        let layout = layout_treemap(Rect::new(0, 0, 200, 40), &refs, |r| r);

        let tech = layout.iter().find(|s| s.name == "Technology").unwrap();
        let telecom = layout.iter().find(|s| s.name == "Communication Services").unwrap();
        assert!(area(&tech.area) > area(&telecom.area));
    }
}
