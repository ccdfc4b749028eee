// ============================================================================
// Structure : Sector
// ============================================================================
// Liste de référence statique : alimente le filtre et regroupe la heatmap
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::Stock;

/// Valeur sentinelle du filtre "tous les secteurs"
pub const ALL_SECTORS: &str = "all";

/// Un secteur de la liste de référence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: u32,
    pub name: String,
}

impl Sector {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Filtre secteur de la vue
///
/// CONCEPT RUST : Enum au lieu d'une chaîne magique
/// - All remplace la sentinelle "all"
/// - Named compare le secteur exactement (sensible à la casse)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectorFilter {
    #[default]
    All,
    Named(String),
}

impl SectorFilter {
    /// "all" (sans tenir compte de la casse) -> All, sinon Named
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_SECTORS) {
            SectorFilter::All
        } else {
            SectorFilter::Named(value.to_string())
        }
    }

    /// Vérifie si un titre passe le filtre
    pub fn matches(&self, stock: &Stock) -> bool {
        match self {
            SectorFilter::All => true,
            SectorFilter::Named(name) => stock.sector == *name,
        }
    }

    /// Label pour l'affichage
    pub fn label(&self) -> &str {
        match self {
            SectorFilter::All => "All Sectors",
            SectorFilter::Named(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_in(sector: &str) -> Stock {
        Stock {
            ticker: "T".to_string(),
            name: "Test".to_string(),
            price: 1.0,
            previous_close: 1.0,
            percent_change: 0.0,
            volume: 0,
            market_cap: 0.0,
            sector: sector.to_string(),
        }
    }

    #[test]
    fn test_parse_sentinel() {
        assert_eq!(SectorFilter::parse("all"), SectorFilter::All);
        assert_eq!(SectorFilter::parse("ALL"), SectorFilter::All);
        assert_eq!(
            SectorFilter::parse("Healthcare"),
            SectorFilter::Named("Healthcare".to_string())
        );
    }

    #[test]
    fn test_named_filter_is_exact() {
        let filter = SectorFilter::Named("Healthcare".to_string());
        assert!(filter.matches(&stock_in("Healthcare")));
        assert!(!filter.matches(&stock_in("healthcare")));
        assert!(SectorFilter::All.matches(&stock_in("anything")));
    }
}
