pub mod api;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod state;
