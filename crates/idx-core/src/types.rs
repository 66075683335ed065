//! Trading identifiers.
//!
//! Provides order side and currency pair types in the spelling the
//! exchange expects on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(format!("expected \"buy\" or \"sell\", got {other:?}")),
        }
    }
}

/// Currency pair in exchange notation, e.g. `btc_idr`.
///
/// The base currency is the asset being bought or sold; the quote
/// currency is what it is priced in. Both are lowercase alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Identifier used by the public API paths (`btcidr` for `btc_idr`).
    pub fn path_id(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

fn is_currency_code(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

impl FromStr for Pair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('_')
            .ok_or_else(|| format!("expected base_quote pair, got {s:?}"))?;
        if !is_currency_code(base) || !is_currency_code(quote) {
            return Err(format!(
                "pair currencies must be lowercase alphanumerics, got {s:?}"
            ));
        }
        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }
}

impl TryFrom<String> for Pair {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_parse() {
        assert_eq!("buy".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("sell".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert!("BUY".parse::<OrderSide>().is_err());
    }

    #[test]
    fn test_pair_parse() {
        let pair: Pair = "btc_idr".parse().unwrap();
        assert_eq!(pair.base(), "btc");
        assert_eq!(pair.quote(), "idr");
        assert_eq!(pair.path_id(), "btcidr");
        assert_eq!(pair.to_string(), "btc_idr");
    }

    #[test]
    fn test_pair_rejects_malformed() {
        assert!("btcidr".parse::<Pair>().is_err());
        assert!("BTC_IDR".parse::<Pair>().is_err());
        assert!("_idr".parse::<Pair>().is_err());
        assert!("btc_".parse::<Pair>().is_err());
        assert!("btc_idr_x".parse::<Pair>().is_err());
    }

    #[test]
    fn test_pair_serde() {
        let pair: Pair = serde_json::from_str("\"eth_btc\"").unwrap();
        assert_eq!(pair.base(), "eth");
        assert_eq!(serde_json::to_string(&pair).unwrap(), "\"eth_btc\"");
    }
}
