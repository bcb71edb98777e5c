use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{Error, Result};

/// Named look-back windows a trailing change can be requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

/// How a window is answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSpan {
    /// Compare the latest observation with the one `n` samples back
    /// (oldest available when fewer exist).
    Trailing(usize),
    /// Use the 24h change the exchange reports itself.
    ExchangeReported,
}

impl LookbackWindow {
    pub const ALL: [LookbackWindow; 3] = [
        LookbackWindow::OneHour,
        LookbackWindow::FourHours,
        LookbackWindow::TwentyFourHours,
    ];

    pub fn duration(&self) -> Duration {
        match self {
            LookbackWindow::OneHour => Duration::from_secs(60 * 60),
            LookbackWindow::FourHours => Duration::from_secs(4 * 60 * 60),
            LookbackWindow::TwentyFourHours => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Resolve the window against the collection period.
    ///
    /// Sample counts assume evenly spaced observations. A collector that
    /// overruns its period stretches every trailing window by the drift.
    pub fn span(&self, period: Duration) -> WindowSpan {
        match self {
            LookbackWindow::TwentyFourHours => WindowSpan::ExchangeReported,
            window => WindowSpan::Trailing(samples_for(window.duration(), period)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookbackWindow::OneHour => "1h",
            LookbackWindow::FourHours => "4h",
            LookbackWindow::TwentyFourHours => "24h",
        }
    }

    /// Largest sample count any trailing window needs at `period`.
    pub fn longest_trailing(period: Duration) -> usize {
        Self::ALL
            .iter()
            .filter_map(|w| match w.span(period) {
                WindowSpan::Trailing(n) => Some(n),
                WindowSpan::ExchangeReported => None,
            })
            .max()
            .unwrap_or(1)
    }
}

fn samples_for(window: Duration, period: Duration) -> usize {
    let period_ms = period.as_millis().max(1);
    ((window.as_millis() / period_ms) as usize).max(1)
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LookbackWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1h" | "1 hour" => Ok(LookbackWindow::OneHour),
            "4h" | "4 hours" => Ok(LookbackWindow::FourHours),
            "24h" | "24 hours" | "1d" => Ok(LookbackWindow::TwentyFourHours),
            _ => Err(Error::UnknownWindow(s.to_string())),
        }
    }
}
