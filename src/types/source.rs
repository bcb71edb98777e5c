use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::Error;

/// Exchanges the collector knows how to poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Paribu,
    BtcTurk,
    Binance,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Paribu, SourceId::BtcTurk, SourceId::Binance];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Paribu => "paribu",
            SourceId::BtcTurk => "btcturk",
            SourceId::Binance => "binance",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownSource(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("BtcTurk".parse::<SourceId>().unwrap(), SourceId::BtcTurk);
        assert_eq!(" binance ".parse::<SourceId>().unwrap(), SourceId::Binance);
        assert!("kraken".parse::<SourceId>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SourceId::BtcTurk).unwrap(), "\"btcturk\"");
    }
}
