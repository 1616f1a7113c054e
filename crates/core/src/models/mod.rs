pub mod cache;
pub mod chart;
pub mod period;
pub mod rate;
pub mod settings;
pub mod timestamp;
pub mod watchlist;
