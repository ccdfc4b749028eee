// ============================================================================
// Structure : Stock
// ============================================================================
// Une ligne par instrument au moment du rafraîchissement
//
// CONCEPTS RUST :
// 1. #[serde(rename_all = "camelCase")] : même forme JSON que le dashboard web
//    (previousClose, percentChange, marketCap)
// 2. String vs &str :
//    - String : owned string (le Stock possède ses données)
//    - &str : borrowed, utilisé pour les requêtes de recherche
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Écart toléré (en points de pourcentage) par la politique Verify
const PERCENT_CHANGE_TOLERANCE: f64 = 0.05;

/// Un titre coté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    /// Symbole unique dans un snapshot (ex: "AAPL")
    pub ticker: String,

    /// Nom complet (ex: "Apple Inc.")
    pub name: String,

    /// Dernier prix
    pub price: f64,

    /// Clôture de la séance précédente
    pub previous_close: f64,

    /// Variation en pourcentage, telle que fournie par la source
    pub percent_change: f64,

    /// Volume échangé (actions)
    pub volume: u64,

    /// Capitalisation boursière
    pub market_cap: f64,

    /// Secteur (texte libre, pas forcément dans la liste de référence)
    pub sector: String,
}

impl Stock {
    /// Variation recalculée : (price - previous_close) / previous_close * 100
    ///
    /// None si la clôture précédente est nulle (division par zéro)
    pub fn computed_percent_change(&self) -> Option<f64> {
        if self.previous_close == 0.0 {
            None
        } else {
            Some(((self.price - self.previous_close) / self.previous_close) * 100.0)
        }
    }

    /// Recherche insensible à la casse sur le ticker OU le nom
    ///
    /// La requête est prise telle quelle : les espaces comptent. Une requête
    /// vide est contenue dans tout texte.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.ticker.to_lowercase().contains(&query) || self.name.to_lowercase().contains(&query)
    }

    /// Retourne true si le titre est en hausse
    pub fn is_positive(&self) -> bool {
        self.percent_change >= 0.0
    }

    /// Formatte la variation avec flèche : "▲ +1.23%"
    pub fn change_label(&self) -> String {
        let arrow = if self.is_positive() { "▲" } else { "▼" };
        format!("{} {:+.2}%", arrow, self.percent_change)
    }

    /// Volume en millions : "65.43M"
    pub fn volume_label(&self) -> String {
        format!("{:.2}M", self.volume as f64 / 1_000_000.0)
    }

    /// Capitalisation en milliards : "2800.00B"
    pub fn market_cap_label(&self) -> String {
        format!("{:.2}B", self.market_cap / 1_000_000_000.0)
    }
}

// ============================================================================
// Politique de validation de la variation
// ============================================================================
// La variation fournie par la source n'est pas forcément cohérente avec
// price/previous_close. On laisse le choix à la configuration.
// ============================================================================

/// Que faire de `percent_change` à la réception d'un snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercentChangePolicy {
    /// Garde la valeur fournie
    #[default]
    Trust,
    /// Remplace par la valeur recalculée
    Recompute,
    /// Garde la valeur fournie mais log les écarts
    Verify,
}

impl PercentChangePolicy {
    /// Parse "trust" / "recompute" / "verify"
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "trust" => Some(Self::Trust),
            "recompute" => Some(Self::Recompute),
            "verify" => Some(Self::Verify),
            _ => None,
        }
    }

    /// Applique la politique à tout le snapshot
    pub fn apply(&self, stocks: &mut [Stock]) {
        match self {
            Self::Trust => {}
            Self::Recompute => {
                for stock in stocks.iter_mut() {
                    if let Some(computed) = stock.computed_percent_change() {
                        stock.percent_change = computed;
                    }
                }
            }
            Self::Verify => {
                for stock in stocks.iter() {
                    if let Some(computed) = stock.computed_percent_change() {
                        if (computed - stock.percent_change).abs() > PERCENT_CHANGE_TOLERANCE {
                            warn!(
                                ticker = %stock.ticker,
                                supplied = stock.percent_change,
                                computed,
                                "Supplied percent change disagrees with price/previous close"
                            );
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(ticker: &str, name: &str, price: f64, previous_close: f64, percent_change: f64) -> Stock {
        Stock {
            ticker: ticker.to_string(),
            name: name.to_string(),
            price,
            previous_close,
            percent_change,
            volume: 1_000_000,
            market_cap: 1.0e9,
            sector: "Technology".to_string(),
        }
    }

    #[test]
    fn test_computed_percent_change() {
        let s = stock("AAPL", "Apple Inc.", 110.0, 100.0, 0.0);
        assert_eq!(s.computed_percent_change(), Some(10.0));

        let zero = stock("ZERO", "Zero Corp.", 10.0, 0.0, 0.0);
        assert!(zero.computed_percent_change().is_none());
    }

    #[test]
    fn test_matches_search() {
        let s = stock("AAPL", "Apple Inc.", 1.0, 1.0, 0.0);
        assert!(s.matches_search("appl"));
        assert!(s.matches_search("INC"));
        assert!(s.matches_search(""));
        assert!(!s.matches_search("msft"));
        assert!(s.matches_search("apple inc"));
        assert!(!s.matches_search("inc "));
        assert!(!s.matches_search(" appl"));
    }

    #[test]
    fn test_labels() {
        let s = stock("AAPL", "Apple Inc.", 1.0, 1.0, -1.5);
        assert_eq!(s.change_label(), "▼ -1.50%");
        assert_eq!(s.volume_label(), "1.00M");
        assert_eq!(s.market_cap_label(), "1.00B");
    }

    #[test]
    fn test_policy_trust_keeps_supplied_value() {
        let mut stocks = vec![stock("AAPL", "Apple Inc.", 110.0, 100.0, 3.0)];
        PercentChangePolicy::Trust.apply(&mut stocks);
        assert_eq!(stocks[0].percent_change, 3.0);

        PercentChangePolicy::Verify.apply(&mut stocks);
        assert_eq!(stocks[0].percent_change, 3.0);
    }

    #[test]
    fn test_policy_recompute_overwrites() {
        let mut stocks = vec![
            stock("AAPL", "Apple Inc.", 110.0, 100.0, 3.0),
            stock("ZERO", "Zero Corp.", 10.0, 0.0, 1.0),
        ];
        PercentChangePolicy::Recompute.apply(&mut stocks);
        assert_eq!(stocks[0].percent_change, 10.0);
        // Clôture nulle : la valeur fournie est conservée
        assert_eq!(stocks[1].percent_change, 1.0);
    }

    #[test]
    fn test_policy_from_name() {
        assert_eq!(PercentChangePolicy::from_name("Recompute"), Some(PercentChangePolicy::Recompute));
        assert_eq!(PercentChangePolicy::from_name("bogus"), None);
    }

    #[test]
    fn test_stock_json_is_camel_case() {
        let s = stock("AAPL", "Apple Inc.", 1.0, 1.0, 0.0);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("previousClose").is_some());
        assert!(json.get("marketCap").is_some());
    }
}
