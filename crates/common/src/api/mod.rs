pub mod location;
pub mod routing;
pub mod session;
