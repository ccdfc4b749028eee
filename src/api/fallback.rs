// ============================================================================
// Données de secours
// ============================================================================
// Utilisées quand l'API est indisponible ou limitée : l'écran ne doit jamais
// être vide. 20 titres répartis sur 6 secteurs + la liste de 11 secteurs.
// ============================================================================

use crate::models::{Sector, Stock};

#[allow(clippy::too_many_arguments)]
fn stock(
    ticker: &str,
    name: &str,
    price: f64,
    previous_close: f64,
    percent_change: f64,
    volume: u64,
    market_cap: f64,
    sector: &str,
) -> Stock {
    Stock {
        ticker: ticker.to_string(),
        name: name.to_string(),
        price,
        previous_close,
        percent_change,
        volume,
        market_cap,
        sector: sector.to_string(),
    }
}

/// Les 20 titres de secours
pub fn mock_stocks() -> Vec<Stock> {
    vec![
        stock("AAPL", "Apple Inc.", 175.34, 173.21, 1.23, 65_432_100, 2.8e12, "Technology"),
        stock("MSFT", "Microsoft Corp.", 325.76, 320.45, 1.66, 32_145_600, 2.4e12, "Technology"),
        stock("GOOGL", "Alphabet Inc.", 142.89, 145.23, -1.61, 28_456_700, 1.8e12, "Technology"),
        stock("AMZN", "Amazon.com Inc.", 132.45, 135.67, -2.37, 45_678_900, 1.35e12, "Consumer Cyclical"),
        stock("META", "Meta Platforms Inc.", 315.67, 310.23, 1.75, 25_678_900, 8.0e11, "Technology"),
        stock("TSLA", "Tesla Inc.", 245.67, 250.34, -1.87, 78_945_600, 7.8e11, "Consumer Cyclical"),
        stock("NVDA", "NVIDIA Corp.", 435.23, 425.67, 2.25, 56_789_000, 1.07e12, "Technology"),
        stock("JPM", "JPMorgan Chase & Co.", 145.67, 147.89, -1.5, 15_678_900, 4.25e11, "Financial Services"),
        stock("BAC", "Bank of America Corp.", 32.45, 33.21, -2.29, 45_678_900, 2.6e11, "Financial Services"),
        stock("WMT", "Walmart Inc.", 65.34, 64.56, 1.21, 12_345_600, 5.2e11, "Consumer Defensive"),
        stock("PG", "Procter & Gamble Co.", 156.78, 155.43, 0.87, 8_765_400, 3.7e11, "Consumer Defensive"),
        stock("JNJ", "Johnson & Johnson", 165.43, 167.89, -1.47, 7_654_300, 4.3e11, "Healthcare"),
        stock("UNH", "UnitedHealth Group Inc.", 475.67, 480.23, -0.95, 3_456_700, 4.4e11, "Healthcare"),
        stock("HD", "Home Depot Inc.", 345.67, 340.23, 1.6, 4_567_800, 3.5e11, "Consumer Cyclical"),
        stock("PFE", "Pfizer Inc.", 32.45, 33.67, -3.62, 34_567_800, 1.8e11, "Healthcare"),
        stock("INTC", "Intel Corp.", 35.67, 34.56, 3.21, 56_789_000, 1.5e11, "Technology"),
        stock("VZ", "Verizon Communications Inc.", 40.23, 41.45, -2.94, 23_456_700, 1.7e11, "Communication Services"),
        stock("KO", "Coca-Cola Co.", 58.67, 57.89, 1.35, 15_678_900, 2.5e11, "Consumer Defensive"),
        stock("DIS", "Walt Disney Co.", 95.67, 93.45, 2.38, 12_345_600, 1.75e11, "Communication Services"),
        stock("MRK", "Merck & Co. Inc.", 105.34, 104.56, 0.75, 8_765_400, 2.65e11, "Healthcare"),
    ]
}

/// Liste de référence des secteurs
pub fn mock_sectors() -> Vec<Sector> {
    [
        "Technology",
        "Financial Services",
        "Healthcare",
        "Consumer Cyclical",
        "Consumer Defensive",
        "Communication Services",
        "Energy",
        "Industrials",
        "Basic Materials",
        "Real Estate",
        "Utilities",
    ]
    .iter()
    .enumerate()
    .map(|(i, name)| Sector::new(i as u32 + 1, name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mock_stocks_shape() {
        let stocks = mock_stocks();
        assert_eq!(stocks.len(), 20);

        let tickers: HashSet<&str> = stocks.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers.len(), 20);
    }

    #[test]
    fn test_mock_sectors_cover_mock_stocks() {
        let sectors = mock_sectors();
        assert_eq!(sectors.len(), 11);
        assert_eq!(sectors[0].id, 1);
        assert_eq!(sectors[10].name, "Utilities");

        let names: HashSet<&str> = sectors.iter().map(|s| s.name.as_str()).collect();
        assert!(mock_stocks().iter().all(|s| names.contains(s.sector.as_str())));
    }
}
