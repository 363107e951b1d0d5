// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The semantic fields the pipeline understands. Nothing outside this set
/// is ever read from the upstream table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Ticker,
    PriceEarnings,
    PriceBook,
    ReturnOnEquity,
    ReturnOnInvestedCapital,
    DebtToEquity,
    DailyLiquidity,
    RevenueGrowth5y,
}

impl CanonicalField {
    /// Every field, in export order.
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Ticker,
        CanonicalField::PriceEarnings,
        CanonicalField::PriceBook,
        CanonicalField::ReturnOnEquity,
        CanonicalField::ReturnOnInvestedCapital,
        CanonicalField::DebtToEquity,
        CanonicalField::DailyLiquidity,
        CanonicalField::RevenueGrowth5y,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Ticker => "ticker",
            CanonicalField::PriceEarnings => "price_earnings",
            CanonicalField::PriceBook => "price_book",
            CanonicalField::ReturnOnEquity => "return_on_equity",
            CanonicalField::ReturnOnInvestedCapital => "return_on_invested_capital",
            CanonicalField::DebtToEquity => "debt_to_equity",
            CanonicalField::DailyLiquidity => "daily_liquidity",
            CanonicalField::RevenueGrowth5y => "revenue_growth_5y",
        }
    }

    /// Whether cells of this field go through the numeric parser.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, CanonicalField::Ticker)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CanonicalField::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown field `{}`", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for field in CanonicalField::ALL {
            assert_eq!(field.as_str().parse::<CanonicalField>(), Ok(field));
        }
        assert!("dividend_yield".parse::<CanonicalField>().is_err());
    }

    #[test]
    fn only_ticker_is_textual() {
        let textual: Vec<_> = CanonicalField::ALL
            .into_iter()
            .filter(|f| !f.is_numeric())
            .collect();
        assert_eq!(textual, vec![CanonicalField::Ticker]);
    }
}
