// An open simulated position and its exit checks
use shared::models::{Candle, ExitReason, TradeDirection};

/// Exit thresholds as fractions of the entry price. 0 disables a rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub horizon: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub direction: TradeDirection,
    pub entry_index: usize,
    pub entry_price: f64,
    /// Highest high since entry for longs, lowest low for shorts.
    pub anchor: f64,
}

impl Position {
    /// Opens at the close of `candle`.
    pub fn open(direction: TradeDirection, entry_index: usize, candle: &Candle) -> Self {
        let anchor = match direction {
            TradeDirection::Long => candle.high,
            TradeDirection::Short => candle.low,
        };
        Self {
            direction,
            entry_index,
            entry_price: candle.close,
            anchor,
        }
    }

    pub fn update_anchor(&mut self, candle: &Candle) {
        self.anchor = match self.direction {
            TradeDirection::Long => self.anchor.max(candle.high),
            TradeDirection::Short => self.anchor.min(candle.low),
        };
    }

    /// First exit that fires on bar `index`, checked as SL, TS, TP, then time.
    ///
    /// Returns the reason and the fill price. Call [`Position::update_anchor`] first.
    pub fn check_exit(&self, index: usize, candle: &Candle, rules: &ExitRules) -> Option<(ExitReason, f64)> {
        let entry = self.entry_price;
        let (sl_hit, sl_price, ts_hit, ts_price, tp_hit, tp_price) = match self.direction {
            TradeDirection::Long => {
                let sl_price = entry * (1.0 - rules.stop_loss_pct);
                let ts_price = self.anchor * (1.0 - rules.trailing_stop_pct);
                let tp_price = entry * (1.0 + rules.take_profit_pct);
                (
                    candle.low <= sl_price,
                    sl_price,
                    candle.low <= ts_price,
                    ts_price,
                    candle.high >= tp_price,
                    tp_price,
                )
            }
            TradeDirection::Short => {
                let sl_price = entry * (1.0 + rules.stop_loss_pct);
                let ts_price = self.anchor * (1.0 + rules.trailing_stop_pct);
                let tp_price = entry * (1.0 - rules.take_profit_pct);
                (
                    candle.high >= sl_price,
                    sl_price,
                    candle.high >= ts_price,
                    ts_price,
                    candle.low <= tp_price,
                    tp_price,
                )
            }
        };

        if rules.stop_loss_pct > 0.0 && sl_hit {
            Some((ExitReason::StopLoss, sl_price))
        } else if rules.trailing_stop_pct > 0.0 && ts_hit {
            Some((ExitReason::TrailingStop, ts_price))
        } else if rules.take_profit_pct > 0.0 && tp_hit {
            Some((ExitReason::TakeProfit, tp_price))
        } else if index.saturating_sub(self.entry_index) >= rules.horizon {
            Some((ExitReason::Time, candle.close))
        } else {
            None
        }
    }

    /// Signed fractional return of exiting at `exit_price`, before fees.
    pub fn gross_return(&self, exit_price: f64) -> f64 {
        match self.direction {
            TradeDirection::Long => (exit_price - self.entry_price) / self.entry_price,
            TradeDirection::Short => (self.entry_price - exit_price) / self.entry_price,
        }
    }
}
