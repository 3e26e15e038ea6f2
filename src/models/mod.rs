mod analysis;
mod metrics;
mod news;
mod ticker;

pub use analysis::{AnalysisResult, HealthResponse, Rating, Verdict};
pub use metrics::{StockMetrics, StockSnapshot};
pub use news::NewsItem;
pub use ticker::{TickerError, TickerSymbol, MAX_TICKER_LEN};
