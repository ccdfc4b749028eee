// ============================================================================
// Vues dérivées
// ============================================================================
// Projections pures du tableau canonique de titres, recalculées à chaque
// rendu. Aucune fonction ici ne modifie ni ne réordonne sa source.
//
// CONCEPT RUST : &[Stock] -> Vec<&Stock>
// - On emprunte la source en lecture seule (le borrow checker interdit de
//   la trier en place depuis ici)
// - Le résultat est un nouveau Vec de références, sans copie des titres
// ============================================================================

use std::collections::HashMap;

use crate::models::{SectorFilter, Stock};

/// Filtre recherche + secteur
///
/// Un titre passe si son ticker ou son nom contient `query` (sans tenir compte
/// de la casse) ET si le filtre secteur l'accepte.
pub fn filter_stocks<'a>(stocks: &'a [Stock], query: &str, sector: &SectorFilter) -> Vec<&'a Stock> {
    stocks
        .iter()
        .filter(|stock| stock.matches_search(query) && sector.matches(stock))
        .collect()
}

// ============================================================================
// Cartes de résumé
// ============================================================================

/// Meilleure hausse, pire baisse, plus gros volume
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketSummary<'a> {
    pub top_gainer: Option<&'a Stock>,
    pub top_loser: Option<&'a Stock>,
    pub most_active: Option<&'a Stock>,
}

/// Calcule les trois cartes de résumé
///
/// En cas d'égalité, le premier titre dans l'ordre canonique gagne, comme un
/// tri stable suivi de [0].
pub fn summarize(stocks: &[Stock]) -> MarketSummary<'_> {
    MarketSummary {
        top_gainer: first_max_by(stocks, |a, b| a.percent_change.total_cmp(&b.percent_change)),
        top_loser: first_max_by(stocks, |a, b| b.percent_change.total_cmp(&a.percent_change)),
        most_active: first_max_by(stocks, |a, b| a.volume.cmp(&b.volume)),
    }
}

/// Premier élément maximal
///
/// CONCEPT : Iterator::max_by retourne le DERNIER maximum en cas d'égalité,
/// d'où le fold qui ne remplace que sur un ordre strictement supérieur.
fn first_max_by<F>(stocks: &[Stock], cmp: F) -> Option<&Stock>
where
    F: Fn(&Stock, &Stock) -> std::cmp::Ordering,
{
    stocks.iter().fold(None, |best, stock| match best {
        Some(current) if cmp(stock, current) != std::cmp::Ordering::Greater => Some(current),
        _ => Some(stock),
    })
}

// ============================================================================
// Hiérarchie de la heatmap
// ============================================================================

/// Un secteur de la heatmap avec ses titres
#[derive(Debug, Clone)]
pub struct SectorGroup<'a> {
    pub name: &'a str,
    pub stocks: Vec<&'a Stock>,
}

impl SectorGroup<'_> {
    /// Somme des poids des feuilles
    pub fn weight(&self) -> f64 {
        self.stocks.iter().map(|s| tile_weight(s)).sum()
    }
}

/// Poids d'une tuile : racine carrée du volume
pub fn tile_weight(stock: &Stock) -> f64 {
    (stock.volume as f64).sqrt()
}

/// Regroupe par secteur, secteurs dans l'ordre de première apparition
pub fn group_by_sector<'a>(stocks: &[&'a Stock]) -> Vec<SectorGroup<'a>> {
    let mut groups: Vec<SectorGroup<'a>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for &stock in stocks {
        let sector = stock.sector.as_str();
        match index.get(sector) {
            Some(&i) => groups[i].stocks.push(stock),
            None => {
                index.insert(sector, groups.len());
                groups.push(SectorGroup {
                    name: sector,
                    stocks: vec![stock],
                });
            }
        }
    }

    groups
}

// ============================================================================
// Échelle de couleur
// ============================================================================
// Domaine [-5, -2, -0.5, 0, 0.5, 2, 5] (en %), interpolation linéaire entre
// les paliers, valeurs hors domaine bornées.
// ============================================================================

const COLOR_STOPS: [(f64, (u8, u8, u8)); 7] = [
    (-5.0, (153, 27, 27)),   // perte forte
    (-2.0, (220, 38, 38)),   // perte moyenne
    (-0.5, (248, 113, 113)), // perte légère
    (0.0, (100, 116, 139)),  // neutre
    (0.5, (74, 222, 128)),   // gain léger
    (2.0, (22, 163, 74)),    // gain moyen
    (5.0, (20, 83, 45)),     // gain fort
];

/// Couleur RGB d'une variation en pourcentage
pub fn change_color(percent_change: f64) -> (u8, u8, u8) {
    let (first_at, first) = COLOR_STOPS[0];
    let (last_at, last) = COLOR_STOPS[COLOR_STOPS.len() - 1];

    if !percent_change.is_finite() {
        return COLOR_STOPS[3].1;
    }
    if percent_change <= first_at {
        return first;
    }
    if percent_change >= last_at {
        return last;
    }

    for pair in COLOR_STOPS.windows(2) {
        let (lo_at, lo) = pair[0];
        let (hi_at, hi) = pair[1];
        if percent_change <= hi_at {
            let t = (percent_change - lo_at) / (hi_at - lo_at);
            return (lerp(lo.0, hi.0, t), lerp(lo.1, hi.1, t), lerp(lo.2, hi.2, t));
        }
    }

    last
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fallback::mock_stocks;

    fn tickers(stocks: &[&Stock]) -> Vec<String> {
        stocks.iter().map(|s| s.ticker.clone()).collect()
    }

    #[test]
    fn test_search_appl_matches_only_aapl() {
        let stocks: Vec<Stock> = mock_stocks()
            .into_iter()
            .filter(|s| s.ticker == "AAPL" || s.ticker == "MSFT")
            .collect();

        let filtered = filter_stocks(&stocks, "appl", &SectorFilter::All);
        assert_eq!(tickers(&filtered), vec!["AAPL"]);
    }

    #[test]
    fn test_healthcare_filter_on_mock_set() {
        let stocks = mock_stocks();
        let filtered = filter_stocks(&stocks, "", &SectorFilter::parse("Healthcare"));
        assert_eq!(tickers(&filtered), vec!["JNJ", "UNH", "PFE", "MRK"]);
    }

    #[test]
    fn test_search_and_sector_combine() {
        let stocks = mock_stocks();
        let filtered = filter_stocks(&stocks, "inc", &SectorFilter::parse("Healthcare"));
        assert_eq!(tickers(&filtered), vec!["UNH", "PFE", "MRK"]);
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let stocks = mock_stocks();
        // "Inc." est toujours suivi d'un point, jamais d'un espace
        assert!(filter_stocks(&stocks, "inc ", &SectorFilter::All).is_empty());

        let filtered = filter_stocks(&stocks, " co", &SectorFilter::All);
        assert_eq!(tickers(&filtered), vec!["MSFT", "NVDA", "JPM", "BAC", "PG", "INTC", "VZ", "KO", "DIS", "MRK"]);
    }

    #[test]
    fn test_summary_on_mock_set() {
        let stocks = mock_stocks();
        let summary = summarize(&stocks);

        let gainer = summary.top_gainer.unwrap();
        assert_eq!(gainer.ticker, "INTC");
        assert_eq!(gainer.percent_change, 3.21);
        assert_eq!(summary.top_loser.unwrap().ticker, "PFE");
        assert_eq!(summary.most_active.unwrap().ticker, "TSLA");
    }

    #[test]
    fn test_summary_does_not_reorder_source() {
        let stocks = mock_stocks();
        let before = stocks.clone();
        let _ = summarize(&stocks);
        assert_eq!(stocks, before);
    }

    #[test]
    fn test_summary_ties_keep_first() {
        // NVDA et INTC ont le même volume : NVDA vient en premier
        let stocks: Vec<Stock> = mock_stocks()
            .into_iter()
            .filter(|s| s.ticker == "NVDA" || s.ticker == "INTC")
            .collect();
        assert_eq!(summarize(&stocks).most_active.unwrap().ticker, "NVDA");
    }

    #[test]
    fn test_summary_empty() {
        let summary = summarize(&[]);
        assert!(summary.top_gainer.is_none());
        assert!(summary.most_active.is_none());
    }

    #[test]
    fn test_group_by_sector_order_and_weight() {
        let stocks = mock_stocks();
        let refs: Vec<&Stock> = stocks.iter().collect();
        let groups = group_by_sector(&refs);

        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "Technology",
                "Consumer Cyclical",
                "Financial Services",
                "Consumer Defensive",
                "Healthcare",
                "Communication Services",
            ]
        );

        let total: usize = groups.iter().map(|g| g.stocks.len()).sum();
        assert_eq!(total, 20);

        let healthcare = groups.iter().find(|g| g.name == "Healthcare").unwrap();
        let expected: f64 = [7_654_300f64, 3_456_700.0, 34_567_800.0, 8_765_400.0]
            .iter()
            .map(|v| v.sqrt())
            .sum();
        assert!((healthcare.weight() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_change_color_scale() {
        assert_eq!(change_color(-10.0), (153, 27, 27));
        assert_eq!(change_color(10.0), (20, 83, 45));
        assert_eq!(change_color(0.0), (100, 116, 139));
        assert_eq!(change_color(f64::NAN), (100, 116, 139));

        // Milieu entre 0 et 0.5
        assert_eq!(change_color(0.25), (87, 169, 134));
    }
}
