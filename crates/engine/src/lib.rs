pub mod circuit_breaker;
pub mod config;
pub mod location;
pub mod routes;
pub mod routing;
pub mod session;
