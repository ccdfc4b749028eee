//! Abstraction de la source de données de marché.
//!
//! [`MarketDataSource`] expose un appel async par endpoint amont. La gateway ne
//! connaît que ce trait : le client Polygon l'implémente pour la production,
//! les tests fournissent des sources en mémoire.
//!
//! Le trait est object-safe (via `async_trait`) pour être utilisé derrière un
//! `Arc<dyn MarketDataSource>`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Granularity, HistoricalPoint};

/// Dernière transaction d'un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct LastTrade {
    /// Prix de la transaction (`results.p`)
    pub price: f64,
    /// Taille de la transaction (`results.s`), utilisée comme volume
    pub size: u64,
}

/// Métadonnées de référence d'un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct TickerDetails {
    pub name: String,
    pub market_cap: f64,
    /// `sic_description` côté Polygon
    pub sector: String,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Tickers actifs, triés par capitalisation décroissante
    async fn list_tickers(&self, limit: usize) -> Result<Vec<String>>;

    async fn last_trade(&self, ticker: &str) -> Result<LastTrade>;

    /// Clôture du jour `date`
    async fn previous_close(&self, ticker: &str, date: NaiveDate) -> Result<f64>;

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails>;

    /// Barres agrégées entre `from` et `to` inclus, par ordre croissant
    async fn aggregates(
        &self,
        ticker: &str,
        granularity: Granularity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>>;
}
