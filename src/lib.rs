// ============================================================================
// MarketHeat - Bibliothèque
// ============================================================================
// Heatmap de marché en terminal : gateway de données avec repli sur des
// données de démonstration, contrôleur d'état et interface ratatui.
// ============================================================================

pub mod api;
pub mod app;
pub mod config;
pub mod models;
pub mod ui;
pub mod views;
pub mod worker;
