// ============================================================================
// Module : api
// ============================================================================
// Ce module contient tout ce qui produit des données de marché : la source
// amont (Polygon.io), les données de secours et la gateway qui les combine.
// ============================================================================

pub mod fallback;  // 20 titres et 11 secteurs de secours
pub mod gateway;   // MarketGateway : jamais d'erreur, toujours des données
pub mod polygon;   // Client API Polygon.io
pub mod source;    // Trait MarketDataSource
pub mod synthetic; // Historique synthétique (marche aléatoire)

// Re-export des éléments principaux
pub use gateway::MarketGateway;
pub use polygon::PolygonClient;
pub use source::MarketDataSource;
pub use synthetic::generate_history;
