pub mod store;

pub use store::{PgTradingStore, TradingStore};
