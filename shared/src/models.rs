use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Positive finite prices, `high`/`low` bracketing open and close, non-negative volume.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
            && self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeFrame {
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute15 => "15m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Hour4 => "4h",
            TimeFrame::Day1 => "1d",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bar directional call of one indicator. Serialized as -1 / 0 / 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    pub fn is_active(self) -> bool {
        self != Signal::Flat
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.value()
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Short),
            0 => Ok(Signal::Flat),
            1 => Ok(Signal::Long),
            other => Err(format!("signal must be -1, 0 or 1, got {}", other)),
        }
    }
}

/// The indicators that produce directional signals. ADX only filters, so it has no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalIndicator {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "ROC")]
    Roc,
    #[serde(rename = "Stoch")]
    Stoch,
    #[serde(rename = "WillR")]
    WillR,
}

impl SignalIndicator {
    pub const ALL: [SignalIndicator; 5] = [
        SignalIndicator::Rsi,
        SignalIndicator::Macd,
        SignalIndicator::Roc,
        SignalIndicator::Stoch,
        SignalIndicator::WillR,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalIndicator::Rsi => "RSI",
            SignalIndicator::Macd => "MACD",
            SignalIndicator::Roc => "ROC",
            SignalIndicator::Stoch => "Stoch",
            SignalIndicator::WillR => "WillR",
        }
    }
}

impl fmt::Display for SignalIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived values for one bar. `None` while an indicator is warming up or undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub roc: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub willr: Option<f64>,
    pub willr_smoothed: Option<f64>,
    pub ema_trend: Option<f64>,
    pub adx: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub rsi: Signal,
    pub macd: Signal,
    pub roc: Signal,
    pub stoch: Signal,
    pub willr: Signal,
}

impl SignalSet {
    pub fn get(&self, indicator: SignalIndicator) -> Signal {
        match indicator {
            SignalIndicator::Rsi => self.rsi,
            SignalIndicator::Macd => self.macd,
            SignalIndicator::Roc => self.roc,
            SignalIndicator::Stoch => self.stoch,
            SignalIndicator::WillR => self.willr,
        }
    }

    pub fn set(&mut self, indicator: SignalIndicator, signal: Signal) {
        let slot = match indicator {
            SignalIndicator::Rsi => &mut self.rsi,
            SignalIndicator::Macd => &mut self.macd,
            SignalIndicator::Roc => &mut self.roc,
            SignalIndicator::Stoch => &mut self.stoch,
            SignalIndicator::WillR => &mut self.willr,
        };
        *slot = signal;
    }
}

/// A candle together with everything derived from it, aligned by bar index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    pub candle: Candle,
    pub indicators: IndicatorValues,
    pub signals: SignalSet,
}

impl From<Candle> for AnnotatedBar {
    fn from(candle: Candle) -> Self {
        AnnotatedBar {
            candle,
            indicators: IndicatorValues::default(),
            signals: SignalSet::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Long => Some(TradeDirection::Long),
            Signal::Short => Some(TradeDirection::Short),
            Signal::Flat => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "SL")]
    StopLoss,
    #[serde(rename = "TS")]
    TrailingStop,
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "Time")]
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: TradeDirection,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub reason: ExitReason,
    pub gross_return: f64,
    pub capital_after: f64,
}

/// Direction-only scoring of signals against the close `horizon` bars later.
/// Rates are percentages in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinRateStats {
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub total_signals: usize,
    pub evaluated_buy_signals: usize,
    pub evaluated_sell_signals: usize,
    pub buy_wins: usize,
    pub sell_wins: usize,
    pub win_rate: f64,
    pub buy_win_rate: f64,
    pub sell_win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlStats {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub open_position_at_end: bool,
    pub equity_curve: Vec<f64>,
    pub exit_reasons: Vec<Option<ExitReason>>,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub win_rates: WinRateStats,
    pub pnl: PnlStats,
}

/// Everything a backtest run hands to a reporting or charting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub horizon: usize,
    pub limit: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub fee_rate: f64,
    pub initial_capital: f64,
    pub use_trend_filter: bool,
    pub adx_threshold: f64,
    pub data_points: usize,
    pub indicator_parameters: BTreeMap<String, serde_json::Value>,
    pub results: BTreeMap<SignalIndicator, IndicatorReport>,
    pub series: Vec<AnnotatedBar>,
}
