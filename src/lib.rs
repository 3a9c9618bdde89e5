pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod identity;
pub mod model;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
mod testing;
