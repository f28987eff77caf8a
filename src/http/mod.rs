//! HTTP surface: routes, static client and health

pub mod routes;

pub use routes::build_router;
