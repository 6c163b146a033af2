//! Price-trend heuristic shown next to the advisor's answer

use crate::api::Quote;
use serde::Serialize;
use std::fmt;

/// Month-over-month move above which the stock is a buy
pub const BUY_THRESHOLD_PERCENT: f64 = 5.0;
/// Month-over-month move below which the stock is a sell
pub const SELL_THRESHOLD_PERCENT: f64 = -5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
        };
        f.write_str(label)
    }
}

/// Heuristic verdict and the sentence explaining it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub recommendation: Recommendation,
    pub rationale: &'static str,
    /// Change over the period in percent, when it could be computed
    pub change_percent: Option<f64>,
}

/// Percent change from the first to the last close
///
/// `None` for an empty history or a first close of zero.
pub fn price_change_percent(quotes: &[Quote]) -> Option<f64> {
    let first = quotes.first()?.close;
    let last = quotes.last()?.close;
    if first.abs() < f64::EPSILON {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Map a price change onto buy, sell or hold
pub fn recommend(change_percent: Option<f64>) -> Verdict {
    let (recommendation, rationale) = match change_percent {
        None => (
            Recommendation::Hold,
            "Insufficient data to make a strong recommendation.",
        ),
        Some(change) if change > BUY_THRESHOLD_PERCENT => (
            Recommendation::Buy,
            "The stock has shown strong growth over the past month.",
        ),
        Some(change) if change < SELL_THRESHOLD_PERCENT => (
            Recommendation::Sell,
            "The stock has shown significant decline over the past month.",
        ),
        Some(_) => (
            Recommendation::Hold,
            "Price movement over the past month is within a neutral range.",
        ),
    };

    Verdict {
        recommendation,
        rationale,
        change_percent,
    }
}
