pub mod bets;
pub mod dataset;
pub mod export;
pub mod fake_feed;
pub mod http_cache;
pub mod http_client;
pub mod record;
pub mod sim_cache;
pub mod simulate;
pub mod stats;
