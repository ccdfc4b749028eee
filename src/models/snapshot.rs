use chrono::{DateTime, Utc};

use crate::models::{DataSource, Stock};

/// Résultat d'un rafraîchissement : les titres et leur provenance
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub stocks: Vec<Stock>,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(stocks: Vec<Stock>, source: DataSource) -> Self {
        Self {
            stocks,
            source,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == DataSource::Live
    }
}
