pub mod memory;
pub mod provider;
pub mod types;
pub mod yahoo;

pub use memory::InMemoryProvider;
pub use provider::MarketDataProvider;
pub use yahoo::YahooFinanceProvider;
