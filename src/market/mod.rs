//! Read-side queries combining stored history with the latest snapshots.

pub mod view;

pub use view::{BoardRow, MarketView};
