use serde::{Deserialize, Serialize};

/// Display settings for integer currency amounts.
///
/// The domain currency has no fractional minor unit, so formatting is pure
/// digit grouping; there is never a decimal part to round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "Rp".to_string(),
            thousands_separator: '.',
        }
    }
}

/// Formats an integer amount with thousands grouping, e.g. `Rp 15.000`.
pub fn format_amount(amount: i64, format: &CurrencyFormat) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(format.thousands_separator);
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{} {}", format.symbol, grouped)
    } else {
        format!("{} {}", format.symbol, grouped)
    }
}
