pub mod store;
pub mod window;

pub use store::{AppendOutcome, HistoryStore};
pub use window::{LookbackWindow, WindowSpan};

/// Only finite, strictly positive prices are ever recorded.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
