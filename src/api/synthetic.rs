// ============================================================================
// Générateur d'historique synthétique
// ============================================================================
// Marche aléatoire OHLCV utilisée quand l'endpoint d'historique échoue ou
// ne retourne aucune barre.
//
// ALGORITHME :
// - days = timeframe.to_days(), base tirée dans [10, 500)
// - pour i de days à 0 : date = aujourd'hui - i jours
//   close = prev_close * (1 + r), r dans [-2%, +2%)
//   open  = prev_close * (1 + u), u dans [-0.5%, +0.5%)
//   high  = max(open, close) * (1 + [0, 1%))
//   low   = min(open, close) * (1 - [0, 1%))
//   volume dans [1 000 000, 11 000 000)
// - longueur = days + 1, du plus ancien au plus récent
// ============================================================================

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;

use crate::models::{DataSource, HistoricalPoint, HistoricalSeries, Timeframe};

const DAILY_VOLATILITY: f64 = 0.02;
const OPEN_NOISE: f64 = 0.005;
const WICK_NOISE: f64 = 0.01;
const MIN_VOLUME: u64 = 1_000_000;
const MAX_VOLUME: u64 = 11_000_000;

/// Génère un historique synthétique terminant aujourd'hui (UTC)
pub fn generate_history(ticker: &str, timeframe: Timeframe) -> HistoricalSeries {
    let today = Utc::now().date_naive();
    generate_history_with(&mut rand::thread_rng(), today, ticker, timeframe)
}

/// Même chose avec une source d'aléa et une date de fin explicites
///
/// CONCEPT RUST : R: Rng + ?Sized
/// - Accepte ThreadRng, StdRng seedé (tests), ou &mut dyn RngCore
pub fn generate_history_with<R: Rng + ?Sized>(
    rng: &mut R,
    today: NaiveDate,
    ticker: &str,
    timeframe: Timeframe,
) -> HistoricalSeries {
    let days = timeframe.to_days() as i64;
    let mut points = Vec::with_capacity(days as usize + 1);
    let mut prev_close: f64 = rng.gen_range(10.0..500.0);

    for i in (0..=days).rev() {
        let date = today - Duration::days(i);

        let change = rng.gen_range(-DAILY_VOLATILITY..DAILY_VOLATILITY);
        let close = prev_close * (1.0 + change);
        let open = prev_close * (1.0 + rng.gen_range(-OPEN_NOISE..OPEN_NOISE));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..WICK_NOISE));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..WICK_NOISE));
        let volume = rng.gen_range(MIN_VOLUME..MAX_VOLUME);

        points.push(HistoricalPoint::new(date, open, high, low, close, volume));
        prev_close = close;
    }

    HistoricalSeries::new(ticker.to_string(), timeframe, DataSource::Synthetic, points)
}
