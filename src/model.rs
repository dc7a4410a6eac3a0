use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candle timeframe supported by the application.
///
/// String representations match the config file format (e.g. `"1m"`, `"1h"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Day1,
}

impl TimeFrame {
    /// Parse a config-format string into a `TimeFrame`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::Min1),
            "3m" => Some(Self::Min3),
            "5m" => Some(Self::Min5),
            "15m" => Some(Self::Min15),
            "30m" => Some(Self::Min30),
            "1h" => Some(Self::Hour1),
            "4h" => Some(Self::Hour4),
            "1d" => Some(Self::Day1),
            _ => None,
        }
    }

    /// Return the config-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min3 => "3m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
        }
    }

    /// Return the Binance kline interval string for this timeframe.
    ///
    /// Binance uses the same spelling as the config file.
    pub fn binance_interval(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One OHLC bar. `index` is the position inside its `CandleSeries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub index: usize,
}

impl Candle {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_sell(&self) -> bool {
        self.close < self.open
    }

    pub fn is_buy(&self) -> bool {
        self.close > self.open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

impl fmt::Display for SwingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "Swing High"),
            Self::Low => write!(f, "Swing Low"),
        }
    }
}

/// Position of a swing relative to the previous swing of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingLabel {
    Initial,
    Higher,
    Lower,
}

impl fmt::Display for SwingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "Initial"),
            Self::Higher => write!(f, "Higher"),
            Self::Lower => write!(f, "Lower"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
    pub index: usize,
    pub candle_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinedSwingPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub index: usize,
    pub candle_range: f64,
    pub label: SwingLabel,
    pub kind: SwingKind,
}

impl RefinedSwingPoint {
    pub fn from_swing(swing: SwingPoint, label: SwingLabel) -> Self {
        Self {
            time: swing.time,
            price: swing.price,
            index: swing.index,
            candle_range: swing.candle_range,
            label,
            kind: swing.kind,
        }
    }
}

impl fmt::Display for RefinedSwingPoint {
    /// Renders the full label, e.g. `Higher Swing Low`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Supply,
    Demand,
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supply => write!(f, "Supply"),
            Self::Demand => write!(f, "Demand"),
        }
    }
}

/// A price band around a basing cluster that preceded a breakout.
///
/// `near_bound` is the edge facing current price: the lower edge of a supply zone and
/// the upper edge of a demand zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub near_bound: f64,
    pub far_bound: f64,
    pub time: DateTime<Utc>,
    pub kind: ZoneKind,
}

impl Zone {
    pub fn lower(&self) -> f64 {
        self.near_bound.min(self.far_bound)
    }

    pub fn upper(&self) -> f64 {
        self.near_bound.max(self.far_bound)
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower() && price <= self.upper()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    #[serde(rename = "No Clear Trend")]
    NoClearTrend,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uptrend => write!(f, "Uptrend"),
            Self::Downtrend => write!(f, "Downtrend"),
            Self::NoClearTrend => write!(f, "No Clear Trend"),
        }
    }
}
