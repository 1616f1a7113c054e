pub mod chart_service;
pub mod rate_client;
