// ============================================================================
// Market-Data Gateway
// ============================================================================
// Point d'entrée unique des données de marché pour le reste de l'application
//
// CONTRAT : les méthodes publiques ne retournent jamais d'erreur
// - échec d'un ticker : le ticker est ignoré (warn!)
// - échec de la liste ou aucun ticker valide : 20 titres de secours
// - échec ou vide côté historique : historique synthétique
// Les erreurs ne sortent que par les logs.
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::api::fallback::{mock_sectors, mock_stocks};
use crate::api::source::MarketDataSource;
use crate::api::synthetic::generate_history;
use crate::config::{Config, DEFAULT_MAX_TICKERS, TICKER_LIST_LIMIT};
use crate::models::{
    DataSource, HistoricalSeries, MarketSnapshot, PercentChangePolicy, Sector, Stock, Timeframe,
};

/// Gateway au-dessus d'une source de données quelconque
///
/// CONCEPT RUST : Arc<dyn Trait>
/// - La source réelle (Polygon) ou une source de test, choisie à l'exécution
/// - Arc : la gateway est partagée entre les tâches du worker
pub struct MarketGateway {
    source: Arc<dyn MarketDataSource>,
    max_tickers: usize,
    ticker_list_limit: usize,
    policy: PercentChangePolicy,
}

impl MarketGateway {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            max_tickers: DEFAULT_MAX_TICKERS,
            ticker_list_limit: TICKER_LIST_LIMIT,
            policy: PercentChangePolicy::default(),
        }
    }

    pub fn from_config(source: Arc<dyn MarketDataSource>, config: &Config) -> Self {
        Self {
            source,
            max_tickers: config.max_tickers,
            ticker_list_limit: config.ticker_list_limit,
            policy: config.percent_change_policy,
        }
    }

    pub fn with_policy(mut self, policy: PercentChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_tickers(mut self, max_tickers: usize) -> Self {
        self.max_tickers = max_tickers;
        self
    }

    /// Titres courants (jamais vide)
    pub async fn fetch_stocks(&self) -> Vec<Stock> {
        self.fetch_snapshot().await.stocks
    }

    /// Titres courants + provenance
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self) -> MarketSnapshot {
        let mut snapshot = match self.fetch_live_stocks().await {
            Ok(stocks) if !stocks.is_empty() => {
                info!(count = stocks.len(), "Fetched live stock data");
                MarketSnapshot::new(stocks, DataSource::Live)
            }
            Ok(_) => {
                warn!("No ticker survived the per-ticker fetch, using mock stock data");
                MarketSnapshot::new(mock_stocks(), DataSource::Synthetic)
            }
            Err(e) => {
                warn!(error = ?e, "Error fetching stock data, using mock stock data");
                MarketSnapshot::new(mock_stocks(), DataSource::Synthetic)
            }
        };

        self.policy.apply(&mut snapshot.stocks);
        snapshot
    }

    /// Liste de référence des secteurs
    ///
    /// Pas d'appel réseau : Polygon n'a pas d'endpoint équivalent à la
    /// classification utilisée par la heatmap.
    pub async fn fetch_sectors(&self) -> Vec<Sector> {
        mock_sectors()
    }

    /// Historique d'un ticker (jamais vide)
    #[instrument(skip(self, timeframe), fields(timeframe = timeframe.code()))]
    pub async fn fetch_history(&self, ticker: &str, timeframe: Timeframe) -> HistoricalSeries {
        let now = Utc::now();
        let from = timeframe.lookback_start(now).date_naive();
        let to = now.date_naive();
        let granularity = timeframe.granularity();

        debug!(%from, %to, "Requesting aggregates");
        match self.source.aggregates(ticker, granularity, from, to).await {
            Ok(points) if !points.is_empty() => {
                info!(points = points.len(), "Fetched live historical data");
                HistoricalSeries::new(ticker.to_string(), timeframe, DataSource::Live, points)
            }
            Ok(_) => {
                info!("Historical endpoint returned no rows, generating synthetic series");
                generate_history(ticker, timeframe)
            }
            Err(e) => {
                warn!(error = ?e, "Error fetching historical data, generating synthetic series");
                generate_history(ticker, timeframe)
            }
        }
    }

    // ========================================================================
    // Chemin "live"
    // ========================================================================

    /// Liste des tickers puis fetch de chacun en parallèle
    ///
    /// CONCEPT : join_all
    /// - Lance toutes les futures en même temps, attend qu'elles finissent toutes
    /// - Un échec n'interrompt pas les autres : chaque résultat est un Result
    async fn fetch_live_stocks(&self) -> Result<Vec<Stock>> {
        let listed = self
            .source
            .list_tickers(self.ticker_list_limit)
            .await
            .context("Échec de la récupération de la liste des tickers")?;

        let tickers = unique_tickers(listed, self.max_tickers);
        debug!(count = tickers.len(), "Fetching per-ticker data");

        let previous_day = Utc::now().date_naive() - Duration::days(1);
        let results = join_all(
            tickers
                .iter()
                .map(|ticker| self.fetch_stock(ticker, previous_day)),
        )
        .await;

        let mut stocks = Vec::with_capacity(results.len());
        for (ticker, result) in tickers.iter().zip(results) {
            match result {
                Ok(stock) => stocks.push(stock),
                Err(e) => warn!(ticker = %ticker, error = ?e, "Error fetching data for ticker, dropping it"),
            }
        }

        Ok(stocks)
    }

    /// Les trois appels d'un ticker : prix, clôture précédente, métadonnées
    async fn fetch_stock(&self, ticker: &str, previous_day: NaiveDate) -> Result<Stock> {
        let trade = self.source.last_trade(ticker).await?;
        let previous_close = self.source.previous_close(ticker, previous_day).await?;
        let details = self.source.ticker_details(ticker).await?;

        if previous_close == 0.0 {
            bail!("Clôture précédente nulle pour {}", ticker);
        }

        Ok(Stock {
            ticker: ticker.to_string(),
            name: details.name,
            price: trade.price,
            previous_close,
            percent_change: ((trade.price - previous_close) / previous_close) * 100.0,
            volume: trade.size,
            market_cap: details.market_cap,
            sector: details.sector,
        })
    }
}

/// Déduplique en gardant la première occurrence, puis tronque à `max`
fn unique_tickers(tickers: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .take(max)
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================
