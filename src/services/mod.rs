pub mod analysis_service;
pub mod cache_service;
pub mod llm_service;
pub mod market_data_service;
pub mod news_service;
pub mod rate_limiter;
pub mod ticker_service;
pub mod verdict_service;
