// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `authgate` HTTP server.

pub mod identity;
pub mod rate_limit;

pub use identity::identify;
pub use rate_limit::rate_limit;

#[cfg(test)]
mod middleware_tests;
