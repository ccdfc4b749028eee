// ============================================================================
// API Client : Polygon.io
// ============================================================================
// Récupère prix, clôtures, métadonnées et historique depuis Polygon.io
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. Result<T, E> : gestion d'erreurs avec contexte (anyhow)
// 3. Serde : désérialisation JSON automatique
// 4. Generics : get_json::<T>() pour tous les endpoints
// ============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::api::source::{LastTrade, MarketDataSource, TickerDetails};
use crate::config::Config;
use crate::models::{Granularity, HistoricalPoint};

/// Timeout des requêtes HTTP
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Structures pour parser les réponses JSON de Polygon
// ============================================================================
// On ne déclare que les champs lus ; serde ignore le reste.
// Les champs optionnels deviennent des erreurs "champ manquant" plus bas.
// ============================================================================

#[derive(Debug, Deserialize)]
struct TickerListResponse {
    #[serde(default)]
    results: Vec<TickerListEntry>,
}

#[derive(Debug, Deserialize)]
struct TickerListEntry {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct LastTradeResponse {
    results: Option<TradeResult>,
}

/// Polygon abrège : p = prix, s = taille
#[derive(Debug, Deserialize)]
struct TradeResult {
    p: Option<f64>,
    s: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenCloseResponse {
    close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: Option<TickerDetailsResult>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResult {
    name: Option<String>,
    market_cap: Option<f64>,
    sic_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
}

/// Une barre agrégée : t = timestamp (ms), o/h/l/c = prix, v = volume
#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP Polygon.io
///
/// CONCEPT : Un seul reqwest::Client réutilisé
/// - Le client garde un pool de connexions
/// - Clone est bon marché (Arc interne)
#[derive(Debug, Clone)]
pub struct PolygonClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PolygonClient {
    /// Crée un client pour `base_url` (ex: "https://api.polygon.io")
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("marketheat/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Échec de la création du client HTTP")?;

        if api_key.is_none() {
            warn!("No Polygon API key configured, every upstream call will fall back to mock data");
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.api_key.clone())
    }

    /// GET + vérification du statut + parsing JSON
    ///
    /// CONCEPT RUST : Generics avec trait bound
    /// - T: DeserializeOwned : n'importe quel type désérialisable sans emprunt
    /// - Le type est choisi par l'appelant : self.get_json::<LastTradeResponse>(...)
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        // Sans clé, on échoue sans toucher au réseau
        let api_key = self
            .api_key
            .as_deref()
            .context("Clé API Polygon absente (POLYGON_API_KEY)")?;

        let url = build_url(&self.base_url, path);
        debug!(url = %url, "Sending HTTP request to Polygon");

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", api_key)])
            .query(query)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", path))?;

        let status = response.status();
        debug!(status = %status, path, "Received HTTP response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            bail!("Limite de requêtes Polygon atteinte (HTTP 429) sur {}", path);
        }
        if !status.is_success() {
            bail!("Polygon a retourné une erreur : HTTP {} sur {}", status, path);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Échec du parsing JSON de {}", path))
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    #[instrument(skip(self))]
    async fn list_tickers(&self, limit: usize) -> Result<Vec<String>> {
        let response: TickerListResponse = self
            .get_json(
                "/v3/reference/tickers",
                &[
                    ("market", "stocks".to_string()),
                    ("active", "true".to_string()),
                    ("sort", "market_cap".to_string()),
                    ("order", "desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(response.results.into_iter().map(|entry| entry.ticker).collect())
    }

    #[instrument(skip(self))]
    async fn last_trade(&self, ticker: &str) -> Result<LastTrade> {
        let response: LastTradeResponse = self
            .get_json(&format!("/v2/last/trade/{}", ticker), &[])
            .await?;
        parse_last_trade(response, ticker)
    }

    #[instrument(skip(self))]
    async fn previous_close(&self, ticker: &str, date: NaiveDate) -> Result<f64> {
        let response: OpenCloseResponse = self
            .get_json(&format!("/v1/open-close/{}/{}", ticker, date.format("%Y-%m-%d")), &[])
            .await?;
        response
            .close
            .with_context(|| format!("Champ 'close' manquant pour {} le {}", ticker, date))
    }

    #[instrument(skip(self))]
    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails> {
        let response: TickerDetailsResponse = self
            .get_json(&format!("/v3/reference/tickers/{}", ticker), &[])
            .await?;
        parse_ticker_details(response, ticker)
    }

    #[instrument(skip(self, granularity), fields(granularity = granularity.as_polygon_timespan()))]
    async fn aggregates(
        &self,
        ticker: &str,
        granularity: Granularity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>> {
        let path = format!(
            "/v2/aggs/ticker/{}/range/1/{}/{}/{}",
            ticker,
            granularity.as_polygon_timespan(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        );
        let response: AggregatesResponse = self.get_json(&path, &[]).await?;
        parse_aggregates(response.results.unwrap_or_default())
    }
}

// ============================================================================
// Fonctions de conversion (pures, testables sans réseau)
// ============================================================================

fn build_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url, path)
}

/// Volume Polygon (flottant) -> u64, jamais négatif
fn volume_from_f64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn parse_last_trade(response: LastTradeResponse, ticker: &str) -> Result<LastTrade> {
    let result = response
        .results
        .with_context(|| format!("Pas de dernière transaction pour {}", ticker))?;
    let price = result
        .p
        .with_context(|| format!("Champ 'results.p' manquant pour {}", ticker))?;
    let size = result
        .s
        .with_context(|| format!("Champ 'results.s' manquant pour {}", ticker))?;

    Ok(LastTrade {
        price,
        size: volume_from_f64(size),
    })
}

fn parse_ticker_details(response: TickerDetailsResponse, ticker: &str) -> Result<TickerDetails> {
    let details = response
        .results
        .with_context(|| format!("Pas de métadonnées pour {}", ticker))?;

    Ok(TickerDetails {
        name: details
            .name
            .with_context(|| format!("Champ 'name' manquant pour {}", ticker))?,
        market_cap: details
            .market_cap
            .with_context(|| format!("Champ 'market_cap' manquant pour {}", ticker))?,
        sector: details
            .sic_description
            .with_context(|| format!("Champ 'sic_description' manquant pour {}", ticker))?,
    })
}

/// Convertit les barres Polygon en HistoricalPoint (date seule, ordre conservé)
fn parse_aggregates(bars: Vec<AggregateBar>) -> Result<Vec<HistoricalPoint>> {
    bars.into_iter()
        .map(|bar| {
            let date = DateTime::from_timestamp_millis(bar.t)
                .with_context(|| format!("Timestamp invalide : {}", bar.t))?
                .date_naive();
            Ok(HistoricalPoint::new(date, bar.o, bar.h, bar.l, bar.c, volume_from_f64(bar.v)))
        })
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let url = build_url("https://api.polygon.io", "/v2/last/trade/AAPL");
        assert_eq!(url, "https://api.polygon.io/v2/last/trade/AAPL");
    }

    #[test]
    fn test_parse_last_trade() {
        let response: LastTradeResponse =
            serde_json::from_str(r#"{"status":"OK","results":{"T":"AAPL","p":175.34,"s":100}}"#).unwrap();
        let trade = parse_last_trade(response, "AAPL").unwrap();
        assert_eq!(trade.price, 175.34);
        assert_eq!(trade.size, 100);
    }

    #[test]
    fn test_parse_last_trade_missing_price() {
        let response: LastTradeResponse = serde_json::from_str(r#"{"results":{"s":100}}"#).unwrap();
        assert!(parse_last_trade(response, "AAPL").is_err());
    }

    #[test]
    fn test_parse_ticker_details() {
        let response: TickerDetailsResponse = serde_json::from_str(
            r#"{"results":{"ticker":"AAPL","name":"Apple Inc.","market_cap":2.8e12,"sic_description":"ELECTRONIC COMPUTERS"}}"#,
        )
        .unwrap();
        let details = parse_ticker_details(response, "AAPL").unwrap();
        assert_eq!(details.name, "Apple Inc.");
        assert_eq!(details.sector, "ELECTRONIC COMPUTERS");
    }

    #[test]
    fn test_parse_ticker_details_missing_sector() {
        let response: TickerDetailsResponse =
            serde_json::from_str(r#"{"results":{"name":"Apple Inc.","market_cap":1.0}}"#).unwrap();
        assert!(parse_ticker_details(response, "AAPL").is_err());
    }

    #[test]
    fn test_parse_aggregates() {
        // 1704067200000 ms = 2024-01-01T00:00:00Z
        let response: AggregatesResponse = serde_json::from_str(
            r#"{"resultsCount":2,"results":[
                {"t":1704067200000,"o":100.0,"h":110.0,"l":95.0,"c":105.0,"v":1234.6},
                {"t":1704153600000,"o":105.0,"h":111.0,"l":101.0,"c":108.0,"v":2000}
            ]}"#,
        )
        .unwrap();

        let points = parse_aggregates(response.results.unwrap()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(points[0].volume, 1235);
        assert_eq!(points[1].close, 108.0);
    }

    #[test]
    fn test_aggregates_without_results_is_empty() {
        let response: AggregatesResponse = serde_json::from_str(r#"{"resultsCount":0}"#).unwrap();
        assert!(response.results.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_volume_from_f64() {
        assert_eq!(volume_from_f64(-3.0), 0);
        assert_eq!(volume_from_f64(f64::NAN), 0);
        assert_eq!(volume_from_f64(10.4), 10);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let client = PolygonClient::new("http://127.0.0.1:9", None).unwrap();
        let result = client.last_trade("AAPL").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("POLYGON_API_KEY"));
    }
}
