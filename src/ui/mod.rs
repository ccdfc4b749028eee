// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;     // Écran historique (graphique ligne)
pub mod dashboard; // Header, cartes de résumé, footer, routing
pub mod events;    // Gestion des événements clavier
pub mod heatmap;   // Treemap secteur -> titre

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
