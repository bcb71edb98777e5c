pub mod source;
pub mod symbol;

pub use source::SourceId;
pub use symbol::AssetSymbol;
