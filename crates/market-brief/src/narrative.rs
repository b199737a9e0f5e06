//! Rule-based prediction and strategy sentences
//!
//! Each rule is a predicate paired with a message template. Prediction rules
//! are evaluated per symbol in priority order and the first match wins; the
//! last rule always matches. Strategy rules are evaluated independently and
//! every match contributes a clause.

use crate::model::{MarketQuote, PriceTrend, QuoteMap};
use std::collections::BTreeMap;

/// Earnings surprise, in percent, that counts as a beat or a miss
pub const SURPRISE_THRESHOLD: f64 = 5.0;
/// Minimum session volume behind an "outperform" call
pub const VOLUME_FLOOR: u64 = 1_000_000;
/// Exposure above which the strategy is to reduce
pub const HIGH_EXPOSURE: f64 = 75.0;
/// Exposure below which the strategy is to increase
pub const LOW_EXPOSURE: f64 = 25.0;
/// Average share price considered high
pub const HIGH_AVERAGE_PRICE: f64 = 500.0;
/// Average share price considered low
pub const LOW_AVERAGE_PRICE: f64 = 20.0;

/// Inputs for one symbol's prediction
#[derive(Debug, Clone, Copy)]
pub struct SymbolSignal<'a> {
    pub symbol: &'a str,
    pub quote: Option<&'a MarketQuote>,
    pub surprise: f64,
}

impl SymbolSignal<'_> {
    fn has_data(&self) -> bool {
        self.quote.is_some_and(MarketQuote::has_data)
    }

    fn trend(&self) -> PriceTrend {
        self.quote.map_or(PriceTrend::Unknown, |q| q.price_trend)
    }

    fn volume(&self) -> u64 {
        self.quote.map_or(0, |q| q.volume)
    }
}

/// Inputs for the strategy sentence
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub exposure: f64,
    pub context: &'a str,
    pub quotes: &'a QuoteMap,
    pub symbols: &'a [String],
}

impl StrategyInput<'_> {
    fn quotes_with_data(&self) -> impl Iterator<Item = &MarketQuote> {
        self.symbols
            .iter()
            .filter_map(|s| self.quotes.get(s))
            .filter(|q| q.has_data())
    }

    fn average_price(&self) -> Option<f64> {
        let prices: Vec<f64> = self.quotes_with_data().map(|q| q.price).collect();
        if prices.is_empty() {
            None
        } else {
            Some(prices.iter().sum::<f64>() / prices.len() as f64)
        }
    }

    /// The single sector shared by every quote that reports one
    fn concentrated_sector(&self) -> Option<&str> {
        let mut sectors = self.quotes_with_data().filter_map(MarketQuote::known_sector);
        let first = sectors.next()?;
        if sectors.all(|s| s.eq_ignore_ascii_case(first)) {
            Some(first)
        } else {
            None
        }
    }

    fn mentions(&self, term: &str) -> bool {
        self.context.to_lowercase().contains(term)
    }

    fn mentions_word(&self, word: &str) -> bool {
        self.context
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w.eq_ignore_ascii_case(word))
    }
}

/// A (predicate, template) pair for one symbol
#[derive(Clone, Copy)]
pub struct PredictionRule {
    pub name: &'static str,
    pub applies: fn(&SymbolSignal<'_>) -> bool,
    pub render: fn(&SymbolSignal<'_>) -> String,
}

/// A (predicate, template) pair for the whole portfolio
#[derive(Clone, Copy)]
pub struct StrategyRule {
    pub name: &'static str,
    pub applies: fn(&StrategyInput<'_>) -> bool,
    pub render: fn(&StrategyInput<'_>) -> String,
}

/// Prediction rules in priority order; the last one is the catch-all.
pub fn default_prediction_rules() -> Vec<PredictionRule> {
    vec![
        PredictionRule {
            name: "insufficient-data",
            applies: |s| !s.has_data(),
            render: |s| format!("insufficient data to call {}", s.symbol),
        },
        PredictionRule {
            name: "outperform",
            applies: |s| {
                s.surprise > SURPRISE_THRESHOLD
                    && s.trend() == PriceTrend::Up
                    && s.volume() > VOLUME_FLOOR
            },
            render: |s| {
                format!(
                    "{} likely to outperform on a {:.2}% earnings beat and a rising price",
                    s.symbol, s.surprise
                )
            },
        },
        PredictionRule {
            name: "underperform",
            applies: |s| s.surprise < -SURPRISE_THRESHOLD && s.trend() == PriceTrend::Down,
            render: |s| {
                format!(
                    "{} likely to underperform after a {:.2}% earnings miss and a falling price",
                    s.symbol,
                    s.surprise.abs()
                )
            },
        },
        PredictionRule {
            name: "stable",
            applies: |_| true,
            render: |s| format!("{} expected to remain stable", s.symbol),
        },
    ]
}

/// Strategy rules; the three exposure bands are mutually exclusive.
pub fn default_strategy_rules() -> Vec<StrategyRule> {
    vec![
        StrategyRule {
            name: "reduce-exposure",
            applies: |i| i.exposure > HIGH_EXPOSURE,
            render: |i| format!("reduce exposure from {:.2}% of AUM", i.exposure),
        },
        StrategyRule {
            name: "increase-exposure",
            applies: |i| i.exposure < LOW_EXPOSURE,
            render: |i| format!("increase exposure from {:.2}% of AUM", i.exposure),
        },
        StrategyRule {
            name: "maintain-exposure",
            applies: |i| (LOW_EXPOSURE..=HIGH_EXPOSURE).contains(&i.exposure),
            render: |i| format!("maintain exposure at {:.2}% of AUM", i.exposure),
        },
        StrategyRule {
            name: "sector-concentration",
            applies: |i| i.concentrated_sector().is_some(),
            render: |i| {
                format!(
                    "diversify beyond the {} sector",
                    i.concentrated_sector().unwrap_or(MarketQuote::UNKNOWN_SECTOR)
                )
            },
        },
        StrategyRule {
            name: "high-price-level",
            applies: |i| i.average_price().is_some_and(|p| p > HIGH_AVERAGE_PRICE),
            render: |i| {
                format!(
                    "size new positions carefully at an average price of ${:.2}",
                    i.average_price().unwrap_or_default()
                )
            },
        },
        StrategyRule {
            name: "low-price-level",
            applies: |i| i.average_price().is_some_and(|p| p < LOW_AVERAGE_PRICE),
            render: |i| {
                format!(
                    "watch volatility in low-priced holdings (average ${:.2})",
                    i.average_price().unwrap_or_default()
                )
            },
        },
        StrategyRule {
            name: "geopolitical",
            applies: |i| i.mentions("china") || i.mentions("geopolitical"),
            render: |_| "hedge geographic and geopolitical risk".to_string(),
        },
        StrategyRule {
            name: "supply-chain",
            applies: |i| i.mentions("supply chain"),
            render: |_| "monitor supply chain disruptions".to_string(),
        },
        StrategyRule {
            name: "technology-demand",
            applies: |i| i.mentions_word("ai") || i.mentions("technology"),
            render: |_| "position for sustained AI and technology demand".to_string(),
        },
    ]
}

/// Assembles prediction and strategy sentences from ordered rules
pub struct NarrativeGenerator {
    prediction_rules: Vec<PredictionRule>,
    strategy_rules: Vec<StrategyRule>,
}

impl Default for NarrativeGenerator {
    fn default() -> Self {
        Self::new(default_prediction_rules(), default_strategy_rules())
    }
}

impl NarrativeGenerator {
    pub fn new(prediction_rules: Vec<PredictionRule>, strategy_rules: Vec<StrategyRule>) -> Self {
        Self {
            prediction_rules,
            strategy_rules,
        }
    }

    /// One clause per symbol
    pub fn prediction(
        &self,
        quotes: &QuoteMap,
        surprises: &BTreeMap<String, f64>,
        symbols: &[String],
    ) -> String {
        let clauses: Vec<String> = symbols
            .iter()
            .filter_map(|symbol| {
                let signal = SymbolSignal {
                    symbol,
                    quote: quotes.get(symbol),
                    surprise: surprises.get(symbol).copied().unwrap_or_default(),
                };
                self.prediction_rules
                    .iter()
                    .find(|rule| (rule.applies)(&signal))
                    .map(|rule| (rule.render)(&signal))
            })
            .collect();

        if clauses.is_empty() {
            return sentence(&["insufficient data for a prediction".to_string()]);
        }
        sentence(&clauses)
    }

    /// Every matching strategy clause
    pub fn strategy(
        &self,
        exposure: f64,
        context: &str,
        quotes: &QuoteMap,
        symbols: &[String],
    ) -> String {
        let input = StrategyInput {
            exposure,
            context,
            quotes,
            symbols,
        };

        let clauses: Vec<String> = self
            .strategy_rules
            .iter()
            .filter(|rule| (rule.applies)(&input))
            .map(|rule| (rule.render)(&input))
            .collect();

        sentence(&clauses)
    }
}

/// Join clauses with "; ", capitalise the first letter, end with a period
fn sentence(clauses: &[String]) -> String {
    let joined = clauses.join("; ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
