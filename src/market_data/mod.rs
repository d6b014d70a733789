pub mod candle;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{closes, load_candles, log_prices, log_returns, Candle};
