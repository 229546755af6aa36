pub mod app;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod lattice;
pub mod metrics;
pub mod render;
pub mod session;
pub mod timestamp;
pub mod types;
pub mod view;
