// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod ohlc;     // Historique : HistoricalPoint, HistoricalSeries, Timeframe
pub mod sector;   // Secteurs et filtre secteur
pub mod snapshot; // Snapshot de marché (stocks + provenance)
pub mod stock;    // Stock et politique de variation

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use marketheat::models::stock::Stock;
// On peut faire : use marketheat::models::Stock;
pub use ohlc::{DataSource, Granularity, HistoricalPoint, HistoricalSeries, Timeframe, Trend};
pub use sector::{Sector, SectorFilter, ALL_SECTORS};
pub use snapshot::MarketSnapshot;
pub use stock::{PercentChangePolicy, Stock};
