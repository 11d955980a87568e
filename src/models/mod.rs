mod company;
mod insider;
mod stock_day;
mod trade;

pub use company::Company;
pub use insider::Insider;
pub use stock_day::{NewStockDay, PriceField, PricesDiff, StockDay};
pub use trade::{NewTrade, Trade, TradeKey};
