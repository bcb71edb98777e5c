use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

/// Exchange-independent asset identifier ("BTC", "ETH", ...).
///
/// Always trimmed and uppercase, never empty. Quote suffixes such as `_TL`
/// or `USDT` are stripped by the adapters before a symbol is built.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetSymbol(String);

impl AssetSymbol {
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();

        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSymbol(raw.to_string()));
        }

        Ok(AssetSymbol(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetSymbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AssetSymbol::new(s)
    }
}

impl TryFrom<String> for AssetSymbol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        AssetSymbol::new(&value)
    }
}

impl From<AssetSymbol> for String {
    fn from(symbol: AssetSymbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let symbol = AssetSymbol::new("  btc ").unwrap();
        assert_eq!(symbol.as_str(), "BTC");
        assert_eq!(symbol, "Btc".parse().unwrap());
    }

    #[test]
    fn rejects_empty_and_inner_whitespace() {
        assert!(AssetSymbol::new("").is_err());
        assert!(AssetSymbol::new("   ").is_err());
        assert!(AssetSymbol::new("BT C").is_err());
    }

    #[test]
    fn deserializes_through_normalization() {
        let symbol: AssetSymbol = serde_json::from_str("\"eth\"").unwrap();
        assert_eq!(symbol.to_string(), "ETH");
        assert!(serde_json::from_str::<AssetSymbol>("\"\"").is_err());
    }
}
