//! The bullet-point report returned to the UI

use crate::model::MarketQuote;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returned for an empty query
pub const NO_QUERY_RESPONSE: &str = "No query provided.";
/// Returned when any stage fails; no partial report is ever shown
pub const ERROR_RESPONSE: &str =
    "- **Error**: An error occurred while processing your request. Please try again.";
/// Market context shown when retrieval found nothing
pub const NO_NEWS_PLACEHOLDER: &str = "No relevant news found.";

/// Per-symbol bullet data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolLine {
    pub symbol: String,
    pub quote: MarketQuote,
    pub earnings_surprise: f64,
}

/// A finished report. Sections render in a fixed order: exposure, one line
/// per symbol, market context, prediction, strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub exposure: f64,
    /// Portfolio weights of the analysed symbols, in display order
    pub holdings: Vec<(String, f64)>,
    /// Total portfolio weight, shown when no analysed symbol is held
    pub total_aum: f64,
    pub symbols: Vec<SymbolLine>,
    /// Retrieved context, already truncated for display; may be empty
    pub market_context: String,
    pub prediction: String,
    pub strategy: String,
}

impl Brief {
    fn exposure_line(&self) -> String {
        let held = if self.holdings.is_empty() {
            format!("AUM: ${}", format_thousands(self.total_aum))
        } else {
            self.holdings
                .iter()
                .map(|(symbol, weight)| format!("{symbol}: ${}", format_thousands(*weight)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "- **Portfolio Exposure**: {:.2}% of AUM ({held}).",
            self.exposure
        )
    }

    fn symbol_line(line: &SymbolLine) -> String {
        format!(
            "- **{}**: Price ${:.2}, Volume {}, Trend {}, Earnings Surprise {:.2}%.",
            line.symbol,
            line.quote.price,
            format_thousands(line.quote.volume as f64),
            line.quote.price_trend,
            line.earnings_surprise
        )
    }

    fn context_line(&self) -> String {
        let context = self.market_context.trim();
        if context.is_empty() {
            return format!("- **Market Context**: {NO_NEWS_PLACEHOLDER}");
        }
        if context.ends_with(['.', '!', '?']) {
            format!("- **Market Context**: {context}")
        } else {
            format!("- **Market Context**: {context}.")
        }
    }

    /// The markdown bullet list
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.symbols.len() + 4);
        lines.push(self.exposure_line());
        lines.extend(self.symbols.iter().map(Self::symbol_line));
        lines.push(self.context_line());
        lines.push(format!("- **Prediction**: {}", self.prediction));
        lines.push(format!("- **Business Strategy**: {}", self.strategy));
        lines.join("\n")
    }

    /// Plain sentences for a text-to-speech service
    pub fn speech_text(&self) -> String {
        speech_text(&self.render())
    }
}

impl fmt::Display for Brief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Strip bullet and bold markers and turn line breaks into sentence breaks
pub fn speech_text(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("- ")
                .replace("**", "")
                .trim_end_matches('.')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(". ")
        + "."
}

/// Shorten `context` to `max_chars` characters, marking the cut with "..."
pub fn truncate_context(context: &str, max_chars: usize) -> String {
    if context.chars().count() <= max_chars {
        return context.to_string();
    }
    let cut: String = context.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Round to a whole number and group digits with commas
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
