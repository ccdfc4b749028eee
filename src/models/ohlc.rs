// ============================================================================
// Structure : HistoricalPoint (Open, High, Low, Close, Volume)
// ============================================================================
// Représente une barre de l'historique d'un ticker (une heure ou un jour)
//
// CONCEPTS RUST :
// 1. NaiveDate : date calendaire sans fuseau (chrono), sérialisée en "2024-01-15"
// 2. f64 : floating point 64 bits pour les prix (précision suffisante)
// 3. u64 : unsigned 64 bits pour le volume (toujours positif)
// ============================================================================

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Période de temps demandée pour l'historique
///
/// CONCEPT : Timeframe vs Granularity
/// - Timeframe : fenêtre totale affichée (1 jour, 1 semaine, ...)
/// - Granularity : taille d'une barre (heure ou jour), déduite du timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 jour (barres horaires)
    OneDay,
    /// 7 jours
    OneWeek,
    /// 1 mois (30 jours pour les données synthétiques)
    OneMonth,
    /// 3 mois
    ThreeMonths,
    /// 1 an
    OneYear,
}

/// Granularité des barres demandées à l'API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    /// Segment d'URL Polygon ("hour" / "day")
    pub fn as_polygon_timespan(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl Timeframe {
    /// Retourne le nombre de jours correspondant
    pub fn to_days(&self) -> u32 {
        match self {
            Timeframe::OneDay => 1,
            Timeframe::OneWeek => 7,
            Timeframe::OneMonth => 30,
            Timeframe::ThreeMonths => 90,
            Timeframe::OneYear => 365,
        }
    }

    /// Retourne le label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1 Day",
            Timeframe::OneWeek => "1 Week",
            Timeframe::OneMonth => "1 Month",
            Timeframe::ThreeMonths => "3 Months",
            Timeframe::OneYear => "1 Year",
        }
    }

    /// Code court utilisé dans la configuration et les logs ("1d", "1w", ...)
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
            Timeframe::OneMonth => "1m",
            Timeframe::ThreeMonths => "3m",
            Timeframe::OneYear => "1y",
        }
    }

    /// Parse un code court, None si inconnu
    pub fn from_code(code: &str) -> Option<Timeframe> {
        match code.trim().to_lowercase().as_str() {
            "1d" => Some(Timeframe::OneDay),
            "1w" => Some(Timeframe::OneWeek),
            "1m" => Some(Timeframe::OneMonth),
            "3m" => Some(Timeframe::ThreeMonths),
            "1y" => Some(Timeframe::OneYear),
            _ => None,
        }
    }

    /// Parse un code court, un mois (30 jours) si inconnu
    pub fn from_code_or_default(code: &str) -> Timeframe {
        Self::from_code(code).unwrap_or_default()
    }

    /// 1D échantillonne à l'heure, tout le reste au jour
    pub fn granularity(&self) -> Granularity {
        match self {
            Timeframe::OneDay => Granularity::Hour,
            _ => Granularity::Day,
        }
    }

    /// Début de la fenêtre de recherche : "maintenant moins N jours/mois/années"
    ///
    /// CONCEPT : Mois calendaires
    /// - chrono::Months gère les fins de mois (31 mars - 1 mois = 28/29 février)
    /// - checked_sub_months retourne None seulement hors de la plage de dates
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            Timeframe::OneDay => return now - Duration::days(1),
            Timeframe::OneWeek => return now - Duration::days(7),
            Timeframe::OneMonth => 1,
            Timeframe::ThreeMonths => 3,
            Timeframe::OneYear => 12,
        };

        now.checked_sub_months(Months::new(months))
            .unwrap_or_else(|| now - Duration::days(self.to_days() as i64))
    }

    /// Retourne tous les timeframes disponibles (pour UI de sélection)
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::OneDay,
            Timeframe::OneWeek,
            Timeframe::OneMonth,
            Timeframe::ThreeMonths,
            Timeframe::OneYear,
        ]
    }

    /// Retourne le timeframe suivant (cycle)
    pub fn next(&self) -> Timeframe {
        match self {
            Timeframe::OneDay => Timeframe::OneWeek,
            Timeframe::OneWeek => Timeframe::OneMonth,
            Timeframe::OneMonth => Timeframe::ThreeMonths,
            Timeframe::ThreeMonths => Timeframe::OneYear,
            Timeframe::OneYear => Timeframe::OneDay, // Boucle
        }
    }

    /// Retourne le timeframe précédent (cycle)
    pub fn previous(&self) -> Timeframe {
        match self {
            Timeframe::OneDay => Timeframe::OneYear, // Boucle
            Timeframe::OneWeek => Timeframe::OneDay,
            Timeframe::OneMonth => Timeframe::OneWeek,
            Timeframe::ThreeMonths => Timeframe::OneMonth,
            Timeframe::OneYear => Timeframe::ThreeMonths,
        }
    }
}

impl Default for Timeframe {
    /// Repli pour les codes inconnus : 1 mois
    fn default() -> Self {
        Timeframe::OneMonth
    }
}

/// Provenance des données affichées
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Réponse réelle de l'API
    Live,
    /// Données de secours (mock ou marche aléatoire)
    Synthetic,
}

/// Direction de la série entre la première et la dernière clôture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Une barre OHLCV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Jour de la barre (ISO 8601, sans heure)
    pub date: NaiveDate,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,

    /// Volume échangé
    pub volume: u64,
}

impl HistoricalPoint {
    /// Constructeur : crée une nouvelle barre
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Vérifie si la barre est haussière (bullish)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// high >= max(open, close) et low <= min(open, close)
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// Historique d'un ticker pour un timeframe donné
///
/// CONCEPT RUST : Ownership
/// - HistoricalSeries possède le Vec
/// - La série est remplacée en entier à chaque changement de ticker/timeframe,
///   jamais complétée barre par barre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalSeries {
    /// Symbole du ticker
    pub ticker: String,

    /// Fenêtre demandée
    pub timeframe: Timeframe,

    /// Provenance (API ou générateur)
    pub source: DataSource,

    /// Barres triées par date croissante
    pub points: Vec<HistoricalPoint>,
}

impl HistoricalSeries {
    pub fn new(ticker: String, timeframe: Timeframe, source: DataSource, points: Vec<HistoricalPoint>) -> Self {
        Self {
            ticker,
            timeframe,
            source,
            points,
        }
    }

    /// Retourne le nombre de barres
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Barre la plus ancienne
    pub fn first(&self) -> Option<&HistoricalPoint> {
        self.points.first()
    }

    /// Barre la plus récente
    pub fn last(&self) -> Option<&HistoricalPoint> {
        self.points.last()
    }

    /// Compare close[last] à close[first] (couleur de la courbe)
    pub fn trend(&self) -> Trend {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if last.close > first.close => Trend::Up,
            (Some(first), Some(last)) if last.close < first.close => Trend::Down,
            _ => Trend::Flat,
        }
    }

    /// Variation totale en pourcentage (close[first] -> close[last])
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.first()?;
        let last = self.last()?;
        if first.close == 0.0 {
            return None;
        }
        Some(((last.close - first.close) / first.close) * 100.0)
    }

    /// Plus bas de la période
    ///
    /// CONCEPT RUST : f64::total_cmp
    /// - f64 n'implémente pas Ord (à cause de NaN)
    /// - total_cmp donne un ordre total sans unwrap()
    pub fn min_low(&self) -> Option<f64> {
        self.points.iter().map(|p| p.low).min_by(|a, b| a.total_cmp(b))
    }

    /// Plus haut de la période
    pub fn max_high(&self) -> Option<f64> {
        self.points.iter().map(|p| p.high).max_by(|a, b| a.total_cmp(b))
    }

    /// Vérifie l'ordre chronologique (dates croissantes, doublons permis en horaire)
    pub fn is_chronological(&self) -> bool {
        self.points.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
