pub mod app;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod export;
pub mod loader;
pub mod output;
pub mod records;
pub mod release;
pub mod store;
pub mod summary;
