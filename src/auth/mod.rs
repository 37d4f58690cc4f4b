pub mod jwt;
pub mod rate_limit;
