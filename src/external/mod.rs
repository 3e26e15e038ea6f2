pub mod market_data_provider;
pub mod yahoo;
