pub mod app;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod extract;
pub mod orders;
pub mod products;
pub mod response;
pub mod state;
pub mod store;
