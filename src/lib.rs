pub mod config;
pub mod error;
pub mod history;
pub mod market;
pub mod observability;
pub mod price_infra;
pub mod service;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use history::{AppendOutcome, HistoryStore, LookbackWindow};
pub use service::PriceService;
pub use types::{AssetSymbol, SourceId};
