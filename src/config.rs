// ============================================================================
// Configuration
// ============================================================================
// Lue depuis les variables d'environnement au démarrage
//
// | Variable                   | Défaut                  |
// |----------------------------|-------------------------|
// | POLYGON_API_KEY            | (absente -> mock)       |
// | MARKETHEAT_BASE_URL        | https://api.polygon.io  |
// | MARKETHEAT_REFRESH_SECS    | 60                      |
// | MARKETHEAT_MAX_TICKERS     | 20                      |
// | MARKETHEAT_PERCENT_CHANGE  | trust                   |
// ============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::models::PercentChangePolicy;

pub const API_KEY_VAR: &str = "POLYGON_API_KEY";
pub const BASE_URL_VAR: &str = "MARKETHEAT_BASE_URL";
pub const REFRESH_SECS_VAR: &str = "MARKETHEAT_REFRESH_SECS";
pub const MAX_TICKERS_VAR: &str = "MARKETHEAT_MAX_TICKERS";
pub const PERCENT_CHANGE_VAR: &str = "MARKETHEAT_PERCENT_CHANGE";

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_MAX_TICKERS: usize = 20;
/// Taille de la page demandée à /v3/reference/tickers
pub const TICKER_LIST_LIMIT: usize = 100;

/// Configuration complète de l'application
#[derive(Debug, Clone)]
pub struct Config {
    /// Clé API Polygon (None : toutes les requêtes échouent, données de secours)
    pub api_key: Option<String>,
    pub base_url: String,
    pub refresh_interval: Duration,
    pub max_tickers: usize,
    pub ticker_list_limit: usize,
    pub percent_change_policy: PercentChangePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            max_tickers: DEFAULT_MAX_TICKERS,
            ticker_list_limit: TICKER_LIST_LIMIT,
            percent_change_policy: PercentChangePolicy::default(),
        }
    }
}

impl Config {
    /// Lit la configuration depuis l'environnement du processus
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Lit la configuration via une fonction de lookup
    ///
    /// CONCEPT RUST : Closure en paramètre
    /// - Les tests passent une HashMap au lieu de modifier l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Une clé vide équivaut à une clé absente
        config.api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Some(url) = lookup(BASE_URL_VAR) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(REFRESH_SECS_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} invalide : {:?}", REFRESH_SECS_VAR, raw))?;
            if secs == 0 {
                bail!("{} doit être strictement positif", REFRESH_SECS_VAR);
            }
            config.refresh_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(MAX_TICKERS_VAR) {
            let max: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{} invalide : {:?}", MAX_TICKERS_VAR, raw))?;
            if max == 0 {
                bail!("{} doit être strictement positif", MAX_TICKERS_VAR);
            }
            config.max_tickers = max;
        }

        if let Some(raw) = lookup(PERCENT_CHANGE_VAR) {
            config.percent_change_policy = PercentChangePolicy::from_name(&raw).with_context(|| {
                format!(
                    "{} invalide : {:?} (attendu : trust, recompute ou verify)",
                    PERCENT_CHANGE_VAR, raw
                )
            })?;
        }

        Ok(config)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.max_tickers, 20);
        assert_eq!(config.percent_change_policy, PercentChangePolicy::Trust);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, " secret "),
            (BASE_URL_VAR, "http://localhost:8080/"),
            (REFRESH_SECS_VAR, "15"),
            (MAX_TICKERS_VAR, "5"),
            (PERCENT_CHANGE_VAR, "verify"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.max_tickers, 5);
        assert_eq!(config.percent_change_policy, PercentChangePolicy::Verify);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "   ")])).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[(REFRESH_SECS_VAR, "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(REFRESH_SECS_VAR, "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(MAX_TICKERS_VAR, "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(PERCENT_CHANGE_VAR, "maybe")])).is_err());
    }
}
