pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod utils;
